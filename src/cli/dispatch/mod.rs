//! Command-line argument dispatch.
//!
//! This module maps validated CLI arguments to the matching action: the
//! session walkthrough or one of the account email flows.

use crate::cli::{
    actions::{
        Action,
        account::{self, AccountCommand},
        session,
    },
    commands::{
        ARG_API_URL, ARG_EMAIL, ARG_INCLUDE_CREDENTIALS, ARG_PASSWORD, ARG_TIMEOUT_MS, ARG_TOKEN,
        CMD_FORGOT_PASSWORD, CMD_REGISTER, CMD_RESEND_VERIFICATION, CMD_RESET_PASSWORD,
        CMD_SESSION, CMD_VERIFY_EMAIL,
    },
    globals::GlobalArgs,
};
use crate::config::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_MS};
use crate::navigation::Route;
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use secrecy::SecretString;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or the subcommand is unknown.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let globals = globals(matches);

    let (name, sub_m) = matches
        .subcommand()
        .context("missing subcommand, see --help")?;

    let action = match name {
        CMD_SESSION => Action::Session(session::Args {
            globals,
            email: required(sub_m, ARG_EMAIL)?,
            password: SecretString::from(required(sub_m, ARG_PASSWORD)?),
            visits: sub_m
                .get_many::<String>("visit")
                .map(|values| values.map(|value| Route::parse(value)).collect())
                .unwrap_or_else(|| vec![Route::Dashboard]),
            logout_all: sub_m.get_flag("logout-all"),
        }),
        CMD_REGISTER => account_action(
            globals,
            AccountCommand::Register {
                email: required(sub_m, ARG_EMAIL)?,
                password: SecretString::from(required(sub_m, ARG_PASSWORD)?),
                first_name: optional(sub_m, "first-name"),
                last_name: optional(sub_m, "last-name"),
            },
        ),
        CMD_VERIFY_EMAIL => account_action(
            globals,
            AccountCommand::VerifyEmail {
                token: required(sub_m, ARG_TOKEN)?,
            },
        ),
        CMD_RESEND_VERIFICATION => account_action(
            globals,
            AccountCommand::ResendVerification {
                email: required(sub_m, ARG_EMAIL)?,
            },
        ),
        CMD_FORGOT_PASSWORD => account_action(
            globals,
            AccountCommand::ForgotPassword {
                email: required(sub_m, ARG_EMAIL)?,
            },
        ),
        CMD_RESET_PASSWORD => account_action(
            globals,
            AccountCommand::ResetPassword {
                token: required(sub_m, ARG_TOKEN)?,
                password: optional(sub_m, ARG_PASSWORD).map(SecretString::from),
                validate_only: sub_m.get_flag("validate-only"),
            },
        ),
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok(action)
}

fn globals(matches: &ArgMatches) -> GlobalArgs {
    let api_base_url = matches
        .get_one::<String>(ARG_API_URL)
        .cloned()
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    let mut globals = GlobalArgs::new(api_base_url);
    globals.include_credentials = matches
        .get_one::<bool>(ARG_INCLUDE_CREDENTIALS)
        .copied()
        .unwrap_or(true);
    globals.timeout_ms = matches
        .get_one::<u64>(ARG_TIMEOUT_MS)
        .copied()
        .unwrap_or(DEFAULT_TIMEOUT_MS);
    globals
}

const fn account_action(globals: GlobalArgs, command: AccountCommand) -> Action {
    Action::Account(account::Args { globals, command })
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    optional(matches, id).with_context(|| format!("missing required argument: --{id}"))
}

fn optional(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
