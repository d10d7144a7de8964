//! # Authgate (session and resilient-request layer)
//!
//! `authgate` keeps a client application signed in against a token-issuing API.
//! It holds a short-lived access credential in memory, renews it through the
//! server-managed refresh cookie when a call comes back `401`, and tracks the
//! signed-in identity so protected views can be gated.
//!
//! ## Components
//!
//! - [`credential::CredentialHolder`]: the in-memory access credential. Never persisted.
//! - [`api::ApiClient`]: attaches the credential, detects expiry, performs at most one
//!   coordinated refresh per request and retries once.
//! - [`auth::state::SessionStore`]: the session state machine (`Unresolved`,
//!   `Authenticated`, `Anonymous`) and the single source of truth for gating.
//! - [`broadcast::LogoutBroadcast`]: publish/subscribe channel used to force a logout
//!   without coupling the request client to the session store.
//! - [`auth::guards`]: the navigation gate, including the email-verification gate.
//!
//! ## Refresh Flow
//!
//! 1. **Dispatch:** the request is sent with `Authorization: Bearer <credential>` when one is held.
//! 2. **Expiry:** a `401` on any endpoint except login and refresh marks the request as retried
//!    and asks for a refresh. Concurrent expiries share a single `POST /auth/refresh`.
//! 3. **Retry:** on success the new credential is stored and the request is sent once more.
//! 4. **Forced logout:** on failure the credential is cleared, a logout event is broadcast and
//!    the original `401` is returned to the caller.
//!
//! Credentials and passwords are wrapped in `secrecy` types and must never be logged.

pub mod api;
pub mod auth;
pub mod broadcast;
pub mod cli;
pub mod config;
pub mod credential;
pub mod errors;
pub mod navigation;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub use errors::AppError;
