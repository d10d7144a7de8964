use anyhow::Result;
use authgate::{
    AppError,
    api::ApiClient,
    auth::{
        GateDecision, RequireAuth, SessionState, SessionStore, client,
        types::LoginRequest,
    },
    broadcast::{LogoutBroadcast, LogoutReason},
    config::ApiConfig,
    credential::CredentialHolder,
    navigation::{HistoryNavigator, Navigator, Route},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use std::{net::TcpListener, sync::Arc, time::Duration};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: &str = "6f0c2f3e-8a1b-4d4e-9c57-2b1a0e7d9f44";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn user_json(verified: bool) -> Value {
    json!({
        "id": USER_ID,
        "email": "katherine@example.com",
        "firstName": "Katherine",
        "lastName": "Johnson",
        "role": "USER",
        "emailVerified": verified
    })
}

struct Harness {
    client: ApiClient,
    broadcast: LogoutBroadcast,
    history: HistoryNavigator,
    store: SessionStore,
    gate: RequireAuth,
}

fn harness(server: &MockServer, start: Route) -> Result<Harness> {
    let broadcast = LogoutBroadcast::new();
    let client = ApiClient::new(
        ApiConfig::new(format!("{}/api", server.uri())),
        CredentialHolder::new(),
        broadcast.clone(),
    )?;
    let history = HistoryNavigator::new(start);
    let navigator: Arc<dyn Navigator> = Arc::new(history.clone());
    let store = SessionStore::new(client.clone(), broadcast.clone(), navigator.clone());
    let gate = RequireAuth::new(store.clone(), navigator);
    Ok(Harness {
        client,
        broadcast,
        history,
        store,
        gate,
    })
}

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthorized" }))
}

fn login_request() -> LoginRequest {
    LoginRequest {
        email: "katherine@example.com".to_string(),
        password: SecretString::from("Orbital-Mechanics-1962!".to_string()),
    }
}

async fn requests_to(server: &MockServer, route: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == route)
        .collect()
}

#[tokio::test]
async fn expired_credential_is_renewed_transparently() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(unauthorized())
        .with_priority(10)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Dashboard)?;
    h.client
        .credentials()
        .set(Some(SecretString::from("stale".to_string())));

    let session = client::fetch_session(&h.client).await?;

    assert_eq!(session.email, "katherine@example.com");
    let held = h.client.credentials().get();
    assert_eq!(held.as_ref().map(ExposeSecret::expose_secret), Some("fresh"));
    Ok(())
}

#[tokio::test]
async fn a_request_is_retried_at_most_once() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Dashboard)?;
    let err = client::fetch_session(&h.client)
        .await
        .expect_err("expected the retried request to fail");

    assert!(err.is_unauthorized());
    Ok(())
}

#[tokio::test]
async fn rejected_login_never_refreshes() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "fresh" })))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Login)?;
    let err = h
        .store
        .sign_in(&login_request())
        .await
        .expect_err("expected bad credentials");

    assert_eq!(
        err,
        AppError::Http {
            status: 401,
            message: "Invalid credentials".to_string(),
        }
    );
    assert!(!h.client.credentials().is_present());
    assert_eq!(h.history.current(), Route::Login);
    Ok(())
}

#[tokio::test]
async fn failed_refresh_clears_credential_and_broadcasts() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Refresh token expired" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Dashboard)?;
    let mut events = h.broadcast.subscribe();
    h.client
        .credentials()
        .set(Some(SecretString::from("stale".to_string())));

    let err = client::fetch_session(&h.client)
        .await
        .expect_err("expected the original 401");

    assert_eq!(
        err,
        AppError::Http {
            status: 401,
            message: "Unauthorized".to_string(),
        }
    );
    assert!(!h.client.credentials().is_present());
    assert_eq!(events.try_recv()?, LogoutReason::RefreshFailed);
    Ok(())
}

#[tokio::test]
async fn concurrent_expiries_share_one_refresh() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(unauthorized())
        .with_priority(10)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "fresh" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Dashboard)?;
    h.client
        .credentials()
        .set(Some(SecretString::from("stale".to_string())));

    let (me, profile) = tokio::join!(
        client::fetch_session(&h.client),
        client::fetch_profile(&h.client)
    );

    assert_eq!(me?.email, "katherine@example.com");
    assert_eq!(profile?.email, "katherine@example.com");
    Ok(())
}

#[tokio::test]
async fn forced_logout_ends_the_session_and_gates_protected_views() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-1",
            "tokenType": "Bearer",
            "expiresIn": 900,
            "user": user_json(true)
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Login)?;
    let _listener = h.store.listen_for_forced_logout();
    h.store.sign_in(&login_request()).await?;
    assert_eq!(h.store.state(), SessionState::Authenticated);
    assert_eq!(h.gate.check(Route::Dashboard), GateDecision::Allow);

    let mut changes = h.store.watch();
    let result = client::fetch_profile(&h.client).await;
    assert!(result.is_err());

    tokio::time::timeout(
        Duration::from_secs(2),
        changes.wait_for(|snapshot| snapshot.session.is_none()),
    )
    .await??;

    assert_eq!(h.store.state(), SessionState::Anonymous);
    assert!(!h.client.credentials().is_present());
    assert_eq!(h.history.current(), Route::Login);
    assert_eq!(h.gate.check(Route::Settings), GateDecision::RedirectToLogin);
    Ok(())
}

#[tokio::test]
async fn gate_waits_for_startup_resolution() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(unauthorized().set_delay(Duration::from_millis(150)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;

    let h = harness(&server, Route::Dashboard)?;
    let store = h.store.clone();
    let startup = tokio::spawn(async move { store.initialize().await });

    assert_eq!(h.store.state(), SessionState::Unresolved);
    assert_eq!(h.gate.check(Route::Dashboard), GateDecision::Pending);
    assert_eq!(h.history.history(), vec![Route::Dashboard]);

    let decision = h.gate.enforce(Route::Dashboard).await;

    assert_eq!(startup.await?, SessionState::Anonymous);
    assert_eq!(decision, GateDecision::RedirectToLogin);
    assert_eq!(h.history.current(), Route::Login);
    Ok(())
}

#[tokio::test]
async fn initialize_resolves_only_once() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Root)?;
    let (first, second) = tokio::join!(h.store.initialize(), h.store.initialize());
    let third = h.store.initialize().await;

    assert_eq!(first, SessionState::Authenticated);
    assert_eq!(second, SessionState::Authenticated);
    assert_eq!(third, SessionState::Authenticated);
    assert_eq!(h.gate.check(Route::Root), GateDecision::RedirectToDashboard);
    Ok(())
}

#[tokio::test]
async fn logout_is_idempotent() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-1",
            "user": user_json(true)
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Login)?;
    h.store.sign_in(&login_request()).await?;
    assert_eq!(h.history.current(), Route::Dashboard);

    h.store.logout().await;
    let after_first = h.store.snapshot();
    h.store.logout().await;

    assert_eq!(h.store.snapshot(), after_first);
    assert_eq!(h.store.state(), SessionState::Anonymous);
    assert!(!h.client.credentials().is_present());
    assert_eq!(h.history.current(), Route::Login);
    Ok(())
}

#[tokio::test]
async fn logout_ends_the_session_when_the_server_is_down() -> Result<()> {
    let broadcast = LogoutBroadcast::new();
    let client = ApiClient::new(
        ApiConfig::new("http://127.0.0.1:9/api"),
        CredentialHolder::new(),
        broadcast.clone(),
    )?;
    client
        .credentials()
        .set(Some(SecretString::from("access-1".to_string())));
    let history = HistoryNavigator::new(Route::Profile);
    let store = SessionStore::new(client.clone(), broadcast, Arc::new(history.clone()));

    store.logout().await;

    assert_eq!(store.state(), SessionState::Anonymous);
    assert!(!client.credentials().is_present());
    assert_eq!(history.current(), Route::Login);
    Ok(())
}

#[tokio::test]
async fn startup_restores_the_session_from_the_refresh_cookie() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refresh_token=r1; HttpOnly")
                .set_body_json(json!({ "accessToken": "access-1", "user": user_json(true) })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer renewed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(unauthorized())
        .with_priority(10)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(header("cookie", "refresh_token=r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "renewed" })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Login)?;
    client::login(&h.client, &login_request()).await?;
    // Only the cookie outlives a reload; the access credential does not.
    h.client.clear_credentials();

    let state = h.store.initialize().await;

    assert_eq!(state, SessionState::Authenticated);
    let me = requests_to(&server, "/api/auth/me").await;
    assert_eq!(me.len(), 2);
    assert!(me[0].headers.get("authorization").is_none());
    let held = h.client.credentials().get();
    assert_eq!(held.as_ref().map(ExposeSecret::expose_secret), Some("renewed"));
    Ok(())
}

#[tokio::test]
async fn unverified_email_is_gated_until_verified() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-1",
            "user": user_json(false)
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
        .mount(&server)
        .await;

    let h = harness(&server, Route::Login)?;
    let session = h.store.sign_in(&login_request()).await?;
    assert!(!session.email_verified);

    assert_eq!(
        h.gate.check(Route::Dashboard),
        GateDecision::RedirectToVerifyEmail
    );
    assert_eq!(h.history.current(), Route::VerifyEmailSent);
    assert_eq!(h.gate.check(Route::VerifyEmailSent), GateDecision::Allow);

    h.store.refresh_session().await?;

    assert_eq!(h.gate.check(Route::Dashboard), GateDecision::Allow);
    Ok(())
}

#[tokio::test]
async fn login_during_startup_refresh_survives_the_failed_refresh() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-1",
            "user": user_json(true)
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(unauthorized())
        .with_priority(10)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(unauthorized().set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Login)?;
    let _listener = h.store.listen_for_forced_logout();
    let mut events = h.broadcast.subscribe();
    let store = h.store.clone();
    let startup = tokio::spawn(async move { store.initialize().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    h.store.sign_in(&login_request()).await?;
    assert_eq!(h.store.state(), SessionState::Authenticated);

    assert_eq!(startup.await?, SessionState::Authenticated);
    assert_eq!(h.store.state(), SessionState::Authenticated);
    let held = h.client.credentials().get();
    assert_eq!(held.as_ref().map(ExposeSecret::expose_secret), Some("access-1"));
    assert!(events.try_recv().is_err());
    assert_eq!(h.history.history(), vec![Route::Login, Route::Dashboard]);
    Ok(())
}

#[tokio::test]
async fn failed_startup_lookup_keeps_visitors_on_public_views() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;

    let h = harness(&server, Route::ResetPassword)?;
    let _listener = h.store.listen_for_forced_logout();

    assert_eq!(h.store.initialize().await, SessionState::Anonymous);
    // Let the listener handle the broadcast from the failed refresh.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(h.store.state(), SessionState::Anonymous);
    assert_eq!(h.history.history(), vec![Route::ResetPassword]);
    assert_eq!(h.gate.check(Route::ResetPassword), GateDecision::Allow);
    Ok(())
}

#[tokio::test]
async fn concurrent_expiries_with_failing_refresh_broadcast_once() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(unauthorized())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(unauthorized().set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Dashboard)?;
    let mut events = h.broadcast.subscribe();
    h.client
        .credentials()
        .set(Some(SecretString::from("stale".to_string())));

    let (me, profile, again) = tokio::join!(
        client::fetch_session(&h.client),
        client::fetch_profile(&h.client),
        client::fetch_session(&h.client)
    );

    let original = AppError::Http {
        status: 401,
        message: "Unauthorized".to_string(),
    };
    assert_eq!(me.expect_err("expected 401"), original);
    assert_eq!(profile.expect_err("expected 401"), original);
    assert_eq!(again.expect_err("expected 401"), original);

    let mut received = Vec::new();
    while let Ok(reason) = events.try_recv() {
        received.push(reason);
    }
    assert_eq!(received, vec![LogoutReason::RefreshFailed]);
    assert!(!h.client.credentials().is_present());
    Ok(())
}

#[tokio::test]
async fn refresh_session_keeps_the_session_on_server_errors() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-1",
            "user": user_json(true)
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({ "message": "Maintenance" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Login)?;
    h.store.sign_in(&login_request()).await?;
    let before = h.store.snapshot();

    let err = h
        .store
        .refresh_session()
        .await
        .expect_err("expected the server error");

    assert_eq!(err.status(), Some(503));
    assert_eq!(h.store.snapshot(), before);
    assert!(h.client.credentials().is_present());
    assert_eq!(h.history.current(), Route::Dashboard);
    Ok(())
}

#[tokio::test]
async fn oauth_callback_signs_the_user_in() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/oauth/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-oauth",
            "user": user_json(true)
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .and(header("authorization", "Bearer access-oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::AuthCallback)?;
    let session = h.store.complete_oauth("one-time-code").await?;

    assert_eq!(session.email, "katherine@example.com");
    assert_eq!(h.store.state(), SessionState::Authenticated);
    assert_eq!(h.history.current(), Route::Dashboard);
    assert_eq!(h.gate.check(Route::Dashboard), GateDecision::Allow);
    client::fetch_profile(&h.client).await?;
    Ok(())
}

#[tokio::test]
async fn logout_all_ends_the_session() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-1",
            "user": user_json(true)
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout-all"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Route::Login)?;
    h.store.sign_in(&login_request()).await?;
    h.store.logout_all().await;

    assert_eq!(h.store.state(), SessionState::Anonymous);
    assert!(!h.client.credentials().is_present());
    assert_eq!(h.history.current(), Route::Login);
    Ok(())
}
