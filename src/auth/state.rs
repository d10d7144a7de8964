//! Session state machine. The store resolves the session once at startup
//! through the "who am I" endpoint, exposes the result through a watch channel
//! for guards and views, and ends the session on explicit logout or when a
//! forced logout is broadcast. Only non-sensitive identity metadata is kept here;
//! the access credential stays with the request client.

use crate::{
    api::ApiClient,
    auth::{
        client,
        types::{LoginRequest, Session},
    },
    broadcast::{LogoutBroadcast, LogoutReason},
    errors::AppError,
    navigation::{Navigator, Route},
};
use std::sync::{Arc, Weak};
use tokio::{
    sync::{OnceCell, broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unresolved,
    Authenticated,
    Anonymous,
}

/// What views and guards read: the session (if any) and whether it is still being resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub loading: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::unresolved()
    }
}

impl SessionSnapshot {
    #[must_use]
    pub const fn unresolved() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }

    #[must_use]
    pub fn resolved(session: Option<Session>) -> Self {
        Self {
            session,
            loading: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        match (self.loading, &self.session) {
            (_, Some(_)) => SessionState::Authenticated,
            (true, None) => SessionState::Unresolved,
            (false, None) => SessionState::Anonymous,
        }
    }
}

struct StoreInner {
    client: ApiClient,
    broadcast: LogoutBroadcast,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionSnapshot>,
    bootstrap: OnceCell<()>,
}

/// Cloneable handle to the application-wide session state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    #[must_use]
    pub fn new(
        client: ApiClient,
        broadcast: LogoutBroadcast,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::unresolved());
        Self {
            inner: Arc::new(StoreInner {
                client,
                broadcast,
                navigator,
                state,
                bootstrap: OnceCell::new(),
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().state()
    }

    /// Subscribes to session changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// Resolves the startup state. The "who am I" call runs once per store;
    /// concurrent callers wait for it and later calls return the current state.
    /// Failures are the normal case for a visitor without a session and are not
    /// reported.
    pub async fn initialize(&self) -> SessionState {
        self.inner
            .bootstrap
            .get_or_init(|| async {
                let session = match client::fetch_session(&self.inner.client).await {
                    Ok(session) => Some(session),
                    Err(err) => {
                        debug!(error = %err, "no session at startup");
                        None
                    }
                };
                // A login that finished first already resolved the session.
                self.inner.state.send_if_modified(|snapshot| {
                    if !snapshot.loading {
                        debug!("session resolved before startup lookup finished");
                        return false;
                    }
                    *snapshot = SessionSnapshot::resolved(session);
                    info!(state = ?snapshot.state(), "session resolved");
                    true
                });
            })
            .await;
        self.state()
    }

    /// Records a session returned by a successful login. Moves the user off the
    /// login, register and callback views.
    pub fn login(&self, session: Session) {
        info!(user_id = %session.id, verified = session.email_verified, "session established");
        self.inner
            .state
            .send_replace(SessionSnapshot::resolved(Some(session)));

        if self.inner.navigator.current().is_pre_auth() {
            self.inner.navigator.navigate(Route::Dashboard);
        }
    }

    /// Logs in with email and password, then records the session.
    ///
    /// # Errors
    /// Returns an [`AppError`] for rejected credentials; the session is left unchanged.
    pub async fn sign_in(&self, request: &LoginRequest) -> Result<Session, AppError> {
        let session = client::login(&self.inner.client, request).await?;
        self.login(session.clone());
        Ok(session)
    }

    /// Finishes a social sign-in: trades the authorization code from the
    /// callback URL for a credential, then records the session.
    ///
    /// # Errors
    /// Returns an [`AppError`] if the code is rejected; the session is left unchanged.
    pub async fn complete_oauth(&self, code: &str) -> Result<Session, AppError> {
        let session = client::exchange_oauth_code(&self.inner.client, code).await?;
        self.login(session.clone());
        Ok(session)
    }

    /// Ends the session. The server call is best-effort; the local session ends
    /// regardless. Safe to call repeatedly.
    pub async fn logout(&self) {
        if let Err(err) = client::logout(&self.inner.client).await {
            warn!(error = %err, "server logout failed; ending local session anyway");
        }
        self.end_session(false);
    }

    /// Revokes every session of the user on the server, then ends the local one.
    pub async fn logout_all(&self) {
        if let Err(err) = client::logout_all(&self.inner.client).await {
            warn!(error = %err, "server logout-all failed; ending local session anyway");
        }
        self.end_session(false);
    }

    /// Re-reads the identity, e.g. after a profile edit or email verification.
    /// Only an authorization failure ends the session; other errors leave it as is.
    ///
    /// # Errors
    /// Returns the underlying [`AppError`].
    pub async fn refresh_session(&self) -> Result<Session, AppError> {
        match client::fetch_session(&self.inner.client).await {
            Ok(session) => {
                self.inner
                    .state
                    .send_replace(SessionSnapshot::resolved(Some(session.clone())));
                Ok(session)
            }
            Err(err) => {
                if err.is_unauthorized() {
                    self.end_session(true);
                }
                Err(err)
            }
        }
    }

    /// Asks every subscriber, this store included, to end the session.
    pub fn request_logout(&self) {
        self.inner.broadcast.emit(LogoutReason::Requested);
    }

    /// Subscribes to the logout broadcast for the lifetime of the store. Each
    /// event ends the local session without calling the server, which already
    /// considers the session invalid.
    #[must_use]
    pub fn listen_for_forced_logout(&self) -> JoinHandle<()> {
        let mut receiver = self.inner.broadcast.subscribe();
        let inner: Weak<StoreInner> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            loop {
                let reason = match receiver.recv().await {
                    Ok(reason) => reason,
                    // Missed events were logouts too.
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "logout listener lagged");
                        LogoutReason::Requested
                    }
                    Err(RecvError::Closed) => break,
                };

                let Some(inner) = inner.upgrade() else {
                    break;
                };
                info!(?reason, "forced logout");
                Self { inner }.end_session(true);
            }
        })
    }

    /// A forced logout keeps `loading` as it is so a pending startup
    /// resolution still finishes through `initialize`. It only leaves protected
    /// views, and not while the session is still resolving; the gate takes
    /// over once it is.
    fn end_session(&self, forced: bool) {
        self.inner.client.clear_credentials();
        let mut resolving = false;
        self.inner.state.send_modify(|snapshot| {
            snapshot.session = None;
            if forced {
                resolving = snapshot.loading;
            } else {
                snapshot.loading = false;
            }
        });

        if !forced || (!resolving && self.inner.navigator.current().is_protected()) {
            self.inner.navigator.navigate(Route::Login);
        }
    }
}
