//! Auth feature module: endpoint wrappers, the session state machine, and the
//! navigation gate. It keeps authentication logic out of view code and must
//! avoid logging secrets or token material.
//!
//! Flow Overview: Login stores the issued access credential in the request
//! client and records the session. Registration issues no session; the user
//! verifies their email first. On startup the store asks "who am I" once; when
//! the credential is missing or expired the request client renews it through
//! the refresh cookie before the store gives up and resolves to anonymous.

pub mod client;
pub mod guards;
pub mod state;
pub mod types;

pub use guards::{GateDecision, RequireAuth};
pub use state::{SessionSnapshot, SessionState, SessionStore};
pub use types::{Role, Session};
