use crate::{
    api::ApiClient,
    auth::{GateDecision, RequireAuth, SessionStore, types::LoginRequest},
    broadcast::LogoutBroadcast,
    cli::globals::GlobalArgs,
    credential::CredentialHolder,
    navigation::{HistoryNavigator, Navigator, Route},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
    pub visits: Vec<Route>,
    pub logout_all: bool,
}

#[must_use]
pub const fn describe(decision: GateDecision) -> &'static str {
    match decision {
        GateDecision::Pending => "waiting for session",
        GateDecision::Allow => "allowed",
        GateDecision::RedirectToLogin => "redirected to login",
        GateDecision::RedirectToVerifyEmail => "redirected to email verification",
        GateDecision::RedirectToDashboard => "redirected to dashboard",
    }
}

/// Execute the session walkthrough.
/// # Errors
/// Returns an error if the client cannot be built or the login is rejected.
pub async fn execute(args: Args) -> Result<()> {
    let broadcast = LogoutBroadcast::new();
    let client = ApiClient::new(
        args.globals.api_config(),
        CredentialHolder::new(),
        broadcast.clone(),
    )
    .context("Failed to build API client")?;

    let history = HistoryNavigator::new(Route::Login);
    let navigator: Arc<dyn Navigator> = Arc::new(history.clone());
    let store = SessionStore::new(client, broadcast, navigator.clone());
    let _listener = store.listen_for_forced_logout();
    let gate = RequireAuth::new(store.clone(), navigator.clone());

    let startup = store.initialize().await;
    println!("startup session: {startup:?}");

    let session = store
        .sign_in(&LoginRequest {
            email: args.email,
            password: args.password,
        })
        .await
        .context("Login failed")?;
    println!(
        "signed in as {} <{}> (role: {:?}, email verified: {})",
        session.display_name(),
        session.email,
        session.role,
        session.email_verified
    );

    for route in args.visits {
        navigator.navigate(route);
        let decision = gate.enforce(route).await;
        println!("{route}: {}", describe(decision));
    }

    if args.logout_all {
        store.logout_all().await;
    } else {
        store.logout().await;
    }
    println!("signed out: {:?}", store.state());
    debug!(history = ?history.history(), "navigation history");

    Ok(())
}
