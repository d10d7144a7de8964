//! Navigation gate for protected views. Decisions are deferred while the
//! session is still resolving so a returning user is never bounced to the login
//! view during startup. This is a UX guard; real access control lives on the API.

use crate::{
    auth::state::{SessionSnapshot, SessionStore},
    navigation::{Navigator, Route},
};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Session still resolving; render a neutral waiting state.
    Pending,
    Allow,
    RedirectToLogin,
    /// Signed in but the email address is not verified yet.
    RedirectToVerifyEmail,
    /// Root entry point for a signed-in user.
    RedirectToDashboard,
}

impl GateDecision {
    #[must_use]
    pub const fn redirect(self) -> Option<Route> {
        match self {
            Self::Pending | Self::Allow => None,
            Self::RedirectToLogin => Some(Route::Login),
            Self::RedirectToVerifyEmail => Some(Route::VerifyEmailSent),
            Self::RedirectToDashboard => Some(Route::Dashboard),
        }
    }
}

/// Gate outcome for a protected view.
#[must_use]
pub fn decide(snapshot: &SessionSnapshot) -> GateDecision {
    if snapshot.loading {
        return GateDecision::Pending;
    }
    match &snapshot.session {
        None => GateDecision::RedirectToLogin,
        Some(session) if !session.email_verified => GateDecision::RedirectToVerifyEmail,
        Some(_) => GateDecision::Allow,
    }
}

/// Gate outcome for any route: public views always render, `/` forwards to
/// the dashboard or the login view once the session is known.
#[must_use]
pub fn decide_for(route: Route, snapshot: &SessionSnapshot) -> GateDecision {
    if route.is_protected() {
        return decide(snapshot);
    }
    if route != Route::Root {
        return GateDecision::Allow;
    }

    if snapshot.loading {
        GateDecision::Pending
    } else if snapshot.session.is_some() {
        GateDecision::RedirectToDashboard
    } else {
        GateDecision::RedirectToLogin
    }
}

/// Applies gate decisions for the current session, navigating on redirects.
#[derive(Clone)]
pub struct RequireAuth {
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl RequireAuth {
    #[must_use]
    pub fn new(store: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    /// Evaluates `route` against the current snapshot. `Pending` has no side effect.
    pub fn check(&self, route: Route) -> GateDecision {
        self.apply(route, &self.store.snapshot())
    }

    /// Waits until the session is resolved, then evaluates `route`.
    pub async fn enforce(&self, route: Route) -> GateDecision {
        let mut changes = self.store.watch();
        let snapshot = match changes.wait_for(|snapshot| !snapshot.loading).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.store.snapshot(),
        };
        self.apply(route, &snapshot)
    }

    fn apply(&self, route: Route, snapshot: &SessionSnapshot) -> GateDecision {
        let decision = decide_for(route, snapshot);
        if let Some(target) = decision.redirect() {
            debug!(%route, %target, "navigation gate redirect");
            self.navigator.navigate(target);
        }
        decision
    }
}
