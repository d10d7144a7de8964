//! Application routes and the navigation seam used by the session store and
//! the navigation gate. Rendering lives elsewhere; this module only knows where
//! the user is and where they should go.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Register,
    AuthCallback,
    VerifyEmailSent,
    VerifyEmail,
    ResendVerification,
    ForgotPassword,
    ResetPassword,
    Dashboard,
    Profile,
    Settings,
}

impl Route {
    pub const ALL: [Self; 12] = [
        Self::Root,
        Self::Login,
        Self::Register,
        Self::AuthCallback,
        Self::VerifyEmailSent,
        Self::VerifyEmail,
        Self::ResendVerification,
        Self::ForgotPassword,
        Self::ResetPassword,
        Self::Dashboard,
        Self::Profile,
        Self::Settings,
    ];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::AuthCallback => "/auth/callback",
            Self::VerifyEmailSent => "/auth/verify-email-sent",
            Self::VerifyEmail => "/auth/verify-email",
            Self::ResendVerification => "/auth/resend-verification",
            Self::ForgotPassword => "/forgot-password",
            Self::ResetPassword => "/reset-password",
            Self::Dashboard => "/dashboard",
            Self::Profile => "/profile",
            Self::Settings => "/settings",
        }
    }

    /// Resolves a location to a route. Query strings and fragments are ignored;
    /// unknown paths fall back to the root redirect.
    #[must_use]
    pub fn parse(location: &str) -> Self {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        Self::ALL
            .into_iter()
            .find(|route| route.path() == path)
            .unwrap_or(Self::Root)
    }

    /// Views behind the navigation gate.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard | Self::Profile | Self::Settings)
    }

    /// Views a signed-in user is bounced away from after login.
    #[must_use]
    pub const fn is_pre_auth(self) -> bool {
        matches!(self, Self::Login | Self::Register | Self::AuthCallback)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.path())
    }
}

/// Where the user currently is, and how to send them elsewhere.
pub trait Navigator: Send + Sync {
    fn current(&self) -> Route;
    fn navigate(&self, to: Route);
}

/// In-memory navigation history; the last entry is the current route.
#[derive(Clone, Debug)]
pub struct HistoryNavigator {
    entries: Arc<Mutex<Vec<Route>>>,
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new(Route::Root)
    }
}

impl HistoryNavigator {
    #[must_use]
    pub fn new(start: Route) -> Self {
        Self {
            entries: Arc::new(Mutex::new(vec![start])),
        }
    }

    #[must_use]
    pub fn history(&self) -> Vec<Route> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for HistoryNavigator {
    fn current(&self) -> Route {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
            .unwrap_or(Route::Root)
    }

    fn navigate(&self, to: Route) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(to);
    }
}
