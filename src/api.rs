//! Resilient HTTP client for the backend API. Every call goes through
//! [`ApiClient::send`], which attaches the in-memory credential, notices an
//! expired one (`401`), renews it through the refresh endpoint and retries the
//! original request exactly once. When renewal fails the credential is dropped
//! and a logout is broadcast so the session store can react.
//!
//! The client never logs credential or body contents.

use crate::{
    APP_USER_AGENT,
    broadcast::{LogoutBroadcast, LogoutReason},
    config::ApiConfig,
    credential::CredentialHolder,
    errors::AppError,
};
use reqwest::{Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, debug_span, info, warn};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const OAUTH_EXCHANGE_PATH: &str = "/auth/oauth/exchange";
/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// Description of a request that can be dispatched more than once.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl RequestSpec {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Encodes `body` as the JSON payload.
    ///
    /// # Errors
    /// Returns [`AppError::Serialization`] if the body cannot be encoded.
    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self, AppError> {
        let value = serde_json::to_value(body)
            .map_err(|err| AppError::Serialization(format!("Failed to encode request: {err}")))?;
        self.body = Some(value);
        Ok(self)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Per-request marker: set once the request has gone through a refresh-and-retry cycle.
#[derive(Clone, Copy, Debug, Default)]
struct PendingMarker {
    retried: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(alias = "token")]
    access_token: Option<String>,
}

struct Inner {
    http: reqwest::Client,
    config: ApiConfig,
    credentials: CredentialHolder,
    broadcast: LogoutBroadcast,
    refresh_gate: Mutex<()>,
}

/// Cloneable handle to the shared request client.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    /// Builds a client around injected credential and broadcast handles.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] if the HTTP client cannot be constructed.
    pub fn new(
        config: ApiConfig,
        credentials: CredentialHolder,
        broadcast: LogoutBroadcast,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(config.include_credentials)
            .timeout(config.timeout)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                credentials,
                broadcast,
                refresh_gate: Mutex::new(()),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialHolder {
        &self.inner.credentials
    }

    #[must_use]
    pub fn broadcast(&self) -> &LogoutBroadcast {
        &self.inner.broadcast
    }

    /// Stores a credential issued by a login response.
    pub(crate) fn store_credential(&self, credential: SecretString) {
        self.inner.credentials.set(Some(credential));
    }

    pub fn clear_credentials(&self) {
        self.inner.credentials.clear();
    }

    /// Fetches JSON.
    ///
    /// # Errors
    /// Returns an [`AppError`] if the request fails or the body cannot be decoded.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.send_json(&RequestSpec::get(path)).await
    }

    /// Posts JSON and ignores the response body.
    ///
    /// # Errors
    /// Returns an [`AppError`] if encoding or the request fails.
    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<(), AppError> {
        self.send_empty(&RequestSpec::post(path).with_json(body)?)
            .await
    }

    /// Posts JSON and parses a JSON response.
    ///
    /// # Errors
    /// Returns an [`AppError`] if encoding, the request, or decoding fails.
    pub async fn post_json_response<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        self.send_json(&RequestSpec::post(path).with_json(body)?)
            .await
    }

    /// Puts JSON and parses a JSON response.
    ///
    /// # Errors
    /// Returns an [`AppError`] if encoding, the request, or decoding fails.
    pub async fn put_json_response<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        self.send_json(&RequestSpec::put(path).with_json(body)?)
            .await
    }

    /// Posts an empty body.
    ///
    /// # Errors
    /// Returns an [`AppError`] if the request fails.
    pub async fn post_empty(&self, path: &str) -> Result<(), AppError> {
        self.send_empty(&RequestSpec::post(path)).await
    }

    /// Sends `request` and decodes the JSON response.
    ///
    /// # Errors
    /// Returns an [`AppError`] if the request fails or the body cannot be decoded.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &RequestSpec) -> Result<T, AppError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    }

    /// Sends `request` and discards the response body.
    ///
    /// # Errors
    /// Returns an [`AppError`] if the request fails.
    pub async fn send_empty(&self, request: &RequestSpec) -> Result<(), AppError> {
        self.send(request).await.map(|_| ())
    }

    /// Sends a request, renewing the credential and retrying once on `401`.
    /// Non-success responses come back as [`AppError::Http`].
    ///
    /// # Errors
    /// Returns an [`AppError`] for network failures, timeouts, and HTTP errors,
    /// including the original `401` when the credential could not be renewed.
    pub async fn send(&self, request: &RequestSpec) -> Result<Response, AppError> {
        let mut marker = PendingMarker::default();

        loop {
            let (response, generation) = self.dispatch(request).await?;
            if response.status().is_success() {
                return Ok(response);
            }

            let status = response.status();
            let error = error_from_response(response).await;

            if status != StatusCode::UNAUTHORIZED || marker.retried || !triggers_refresh(&request.path)
            {
                return Err(error);
            }

            marker.retried = true;
            if !self.renew_credential(generation).await {
                return Err(error);
            }
            debug!(path = %request.path, "retrying request with renewed credential");
        }
    }

    /// Sends the request once with whatever credential is held right now.
    async fn dispatch(&self, request: &RequestSpec) -> Result<(Response, u64), AppError> {
        let url = self.inner.config.endpoint(&request.path)?;
        let snapshot = self.inner.credentials.snapshot();

        let mut builder = self.inner.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(credential) = &snapshot.credential {
            builder = builder.bearer_auth(credential.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let span = debug_span!(
            "api.request",
            http.method = %request.method,
            path = %request.path,
            authenticated = snapshot.credential.is_some()
        );
        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        Ok((response, snapshot.generation))
    }

    /// Makes sure a fresh credential is held, sharing one refresh call among
    /// every request that failed with the same stale credential.
    ///
    /// Returns `true` when the caller should retry.
    async fn renew_credential(&self, seen_generation: u64) -> bool {
        let _guard = self.inner.refresh_gate.lock().await;

        let current = self.inner.credentials.snapshot();
        if current.generation != seen_generation {
            // Someone else refreshed (or cleared) while we waited.
            return current.credential.is_some();
        }

        // A login can land while the refresh is in flight; its credential wins.
        match self.request_refresh().await {
            Ok(credential) => {
                if self.inner.credentials.replace_if(seen_generation, Some(credential)) {
                    info!("access credential renewed");
                    true
                } else {
                    debug!("credential replaced during refresh; keeping the newer one");
                    self.inner.credentials.is_present()
                }
            }
            Err(err) => {
                if self.inner.credentials.replace_if(seen_generation, None) {
                    warn!(error = %err, "credential refresh failed; forcing logout");
                    self.inner.broadcast.emit(LogoutReason::RefreshFailed);
                    false
                } else {
                    debug!(error = %err, "refresh failed after the credential was replaced");
                    self.inner.credentials.is_present()
                }
            }
        }
    }

    /// Exchanges the durable refresh cookie for a new access credential.
    async fn request_refresh(&self) -> Result<SecretString, AppError> {
        let (response, _) = self.dispatch(&RequestSpec::post(REFRESH_PATH)).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let payload: RefreshResponse = response
            .json()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode refresh response: {err}")))?;

        payload
            .access_token
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| AppError::Parse("Refresh response did not include a credential.".to_string()))
    }
}

/// The endpoints that establish or renew credentials never trigger a refresh themselves.
#[must_use]
pub fn triggers_refresh(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    ![LOGIN_PATH, REFRESH_PATH, OAUTH_EXCHANGE_PATH]
        .iter()
        .any(|endpoint| path.ends_with(*endpoint))
}

/// Maps transport errors into user-facing `AppError` variants with timeout detection.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        AppError::Serialization(format!("Failed to build request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn error_from_response(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AppError::Http {
        status,
        message: sanitize_body(&body),
    }
}

/// Prefers a JSON `message` field, otherwise trims and truncates the raw body.
fn sanitize_body(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string));
    let text = message.as_deref().unwrap_or(body).trim();

    if text.is_empty() {
        "Request failed.".to_string()
    } else {
        text.chars().take(MAX_ERROR_CHARS).collect()
    }
}
