//! Client wrappers for the auth and account endpoints. Every call goes through
//! the shared [`ApiClient`], so authenticated calls get transparent credential
//! renewal and route code never touches tokens directly.

use crate::{
    api::{ApiClient, LOGIN_PATH, OAUTH_EXCHANGE_PATH, RequestSpec},
    auth::types::{
        ChangePasswordRequest, CodeExchangeRequest, EmailRequest, LoginRequest, LoginResponse,
        MessageResponse, RegisterRequest, ResetPasswordRequest, ResetTokenStatus, Session,
        UpdateProfileRequest, VerifyEmailResponse,
    },
    errors::AppError,
};
use tracing::debug;

pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const LOGOUT_ALL_PATH: &str = "/auth/logout-all";
pub const ME_PATH: &str = "/auth/me";
pub const VERIFY_EMAIL_PATH: &str = "/users/verify-email";
pub const RESEND_VERIFICATION_PATH: &str = "/users/resend-verification";
pub const SEND_VERIFICATION_PATH: &str = "/users/send-verification";
pub const FORGOT_PASSWORD_PATH: &str = "/users/forgot-password";
pub const RESET_PASSWORD_VALIDATE_PATH: &str = "/users/reset-password/validate";
pub const RESET_PASSWORD_PATH: &str = "/users/reset-password";
pub const CHANGE_PASSWORD_PATH: &str = "/users/change-password";
pub const PROFILE_PATH: &str = "/users/profile";

/// Logs in and keeps the issued access credential in the client's holder.
/// A `401` here is a bad-credentials error for the form, never a refresh trigger.
///
/// # Errors
/// Returns an [`AppError`] if the credentials are rejected or the call fails.
pub async fn login(client: &ApiClient, request: &LoginRequest) -> Result<Session, AppError> {
    let response: LoginResponse = client.post_json_response(LOGIN_PATH, request).await?;
    client.store_credential(response.access_token);
    debug!(user_id = %response.user.id, "login accepted");
    Ok(response.user)
}

/// Exchanges the one-time code from a social sign-in callback. The response
/// has the same shape as a login and its credential is kept the same way.
///
/// # Errors
/// Returns an [`AppError`] if the code is unknown, expired or already used.
pub async fn exchange_oauth_code(client: &ApiClient, code: &str) -> Result<Session, AppError> {
    let request = CodeExchangeRequest {
        code: code.to_string(),
    };
    let response: LoginResponse = client
        .post_json_response(OAUTH_EXCHANGE_PATH, &request)
        .await?;
    client.store_credential(response.access_token);
    debug!(user_id = %response.user.id, "authorization code exchanged");
    Ok(response.user)
}

/// Creates an account. No session or credential is issued; the user has to
/// verify their email first.
///
/// # Errors
/// Returns an [`AppError`] on validation failures (duplicate email, weak password).
pub async fn register(
    client: &ApiClient,
    request: &RegisterRequest,
) -> Result<MessageResponse, AppError> {
    client.post_json_response(REGISTER_PATH, request).await
}

/// Fetches the current identity ("who am I").
///
/// # Errors
/// Returns an [`AppError`] when no session can be established.
pub async fn fetch_session(client: &ApiClient) -> Result<Session, AppError> {
    client.get_json(ME_PATH).await
}

/// Clears the server-side durable session.
///
/// # Errors
/// Returns an [`AppError`] if the server call fails.
pub async fn logout(client: &ApiClient) -> Result<(), AppError> {
    client.post_empty(LOGOUT_PATH).await
}

/// Revokes every session of the current user.
///
/// # Errors
/// Returns an [`AppError`] if the server call fails.
pub async fn logout_all(client: &ApiClient) -> Result<(), AppError> {
    client.post_empty(LOGOUT_ALL_PATH).await
}

/// Consumes an email verification token from a verification link.
///
/// # Errors
/// Returns an [`AppError`] if the token is invalid or expired.
pub async fn verify_email(client: &ApiClient, token: &str) -> Result<VerifyEmailResponse, AppError> {
    let request = RequestSpec::post(VERIFY_EMAIL_PATH).with_query("token", token);
    client.send_json(&request).await
}

/// Requests a new verification email. The answer is the same whether or not
/// the account exists.
///
/// # Errors
/// Returns an [`AppError`] if the call fails.
pub async fn resend_verification(
    client: &ApiClient,
    request: &EmailRequest,
) -> Result<MessageResponse, AppError> {
    client
        .post_json_response(RESEND_VERIFICATION_PATH, request)
        .await
}

/// Sends a verification email to the signed-in user.
///
/// # Errors
/// Returns an [`AppError`] if the call fails.
pub async fn send_verification(client: &ApiClient) -> Result<MessageResponse, AppError> {
    client
        .send_json(&RequestSpec::post(SEND_VERIFICATION_PATH))
        .await
}

/// Starts a password reset. Does not reveal whether the account exists.
///
/// # Errors
/// Returns an [`AppError`] if the call fails.
pub async fn forgot_password(
    client: &ApiClient,
    request: &EmailRequest,
) -> Result<MessageResponse, AppError> {
    client
        .post_json_response(FORGOT_PASSWORD_PATH, request)
        .await
}

/// Checks whether a reset token can still be used.
///
/// # Errors
/// Returns an [`AppError`] if the call fails.
pub async fn validate_reset_token(client: &ApiClient, token: &str) -> Result<bool, AppError> {
    let request = RequestSpec::get(RESET_PASSWORD_VALIDATE_PATH).with_query("token", token);
    let status: ResetTokenStatus = client.send_json(&request).await?;
    Ok(status.valid)
}

/// Sets a new password using a reset token.
///
/// # Errors
/// Returns an [`AppError`] if the token is rejected or the password is too weak.
pub async fn reset_password(
    client: &ApiClient,
    request: &ResetPasswordRequest,
) -> Result<MessageResponse, AppError> {
    client.post_json_response(RESET_PASSWORD_PATH, request).await
}

/// Changes the signed-in user's password.
///
/// # Errors
/// Returns an [`AppError`] if the current password is wrong or the call fails.
pub async fn change_password(
    client: &ApiClient,
    request: &ChangePasswordRequest,
) -> Result<MessageResponse, AppError> {
    client
        .post_json_response(CHANGE_PASSWORD_PATH, request)
        .await
}

/// # Errors
/// Returns an [`AppError`] if the call fails.
pub async fn fetch_profile(client: &ApiClient) -> Result<Session, AppError> {
    client.get_json(PROFILE_PATH).await
}

/// # Errors
/// Returns an [`AppError`] if the call fails.
pub async fn update_profile(
    client: &ApiClient,
    request: &UpdateProfileRequest,
) -> Result<Session, AppError> {
    client.put_json_response(PROFILE_PATH, request).await
}
