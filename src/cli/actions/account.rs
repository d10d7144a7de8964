use crate::{
    api::ApiClient,
    auth::{
        client,
        types::{EmailRequest, RegisterRequest, ResetPasswordRequest},
    },
    broadcast::LogoutBroadcast,
    cli::globals::GlobalArgs,
    credential::CredentialHolder,
    navigation::Route,
};
use anyhow::{Context, Result, anyhow};
use secrecy::SecretString;

/// Email flows that do not involve the session state machine.
#[derive(Debug)]
pub enum AccountCommand {
    Register {
        email: String,
        password: SecretString,
        first_name: Option<String>,
        last_name: Option<String>,
    },
    VerifyEmail {
        token: String,
    },
    ResendVerification {
        email: String,
    },
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        token: String,
        password: Option<SecretString>,
        validate_only: bool,
    },
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: AccountCommand,
}

/// Execute an account action.
/// # Errors
/// Returns an error if the client cannot be built or the server rejects the request.
pub async fn execute(args: Args) -> Result<()> {
    let client = ApiClient::new(
        args.globals.api_config(),
        CredentialHolder::new(),
        LogoutBroadcast::new(),
    )
    .context("Failed to build API client")?;

    match args.command {
        AccountCommand::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let response = client::register(
                &client,
                &RegisterRequest {
                    email,
                    password,
                    first_name,
                    last_name,
                },
            )
            .await
            .context("Registration failed")?;
            print_message(&response.message, "Account created.");
            println!("next: {}", Route::VerifyEmailSent);
        }
        AccountCommand::VerifyEmail { token } => {
            let response = client::verify_email(&client, &token)
                .await
                .context("Email verification failed")?;
            print_message(&response.message, "Email verified.");
            println!("next: {}", Route::Login);
        }
        AccountCommand::ResendVerification { email } => {
            let response = client::resend_verification(&client, &EmailRequest { email })
                .await
                .context("Resending the verification email failed")?;
            print_message(&response.message, "Verification email requested.");
        }
        AccountCommand::ForgotPassword { email } => {
            let response = client::forgot_password(&client, &EmailRequest { email })
                .await
                .context("Password reset request failed")?;
            print_message(&response.message, "Password reset requested.");
        }
        AccountCommand::ResetPassword {
            token,
            password,
            validate_only,
        } => {
            let valid = client::validate_reset_token(&client, &token)
                .await
                .context("Reset token validation failed")?;
            if !valid {
                return Err(anyhow!("Reset token is invalid or expired"));
            }
            if validate_only {
                println!("reset token is valid");
                return Ok(());
            }

            let new_password =
                password.ok_or_else(|| anyhow!("missing required argument: --password"))?;
            let response = client::reset_password(
                &client,
                &ResetPasswordRequest {
                    token,
                    new_password,
                },
            )
            .await
            .context("Password reset failed")?;
            print_message(&response.message, "Password updated.");
            println!("next: {}", Route::Login);
        }
    }

    Ok(())
}

fn print_message(message: &str, fallback: &str) {
    let message = message.trim();
    if message.is_empty() {
        println!("{fallback}");
    } else {
        println!("{message}");
    }
}
