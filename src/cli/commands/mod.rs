pub mod logging;

use crate::config::{
    DEFAULT_API_BASE_URL, ENV_API_BASE_URL, ENV_INCLUDE_CREDENTIALS, ENV_TIMEOUT_MS, parse_flag,
};
use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::{
        ValueParser,
        styling::{AnsiColor, Effects, Styles},
    },
};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_INCLUDE_CREDENTIALS: &str = "include-credentials";
pub const ARG_TIMEOUT_MS: &str = "timeout-ms";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_TOKEN: &str = "token";

pub const CMD_SESSION: &str = "session";
pub const CMD_REGISTER: &str = "register";
pub const CMD_VERIFY_EMAIL: &str = "verify-email";
pub const CMD_RESEND_VERIFICATION: &str = "resend-verification";
pub const CMD_FORGOT_PASSWORD: &str = "forgot-password";
pub const CMD_RESET_PASSWORD: &str = "reset-password";

#[must_use]
pub fn validator_flag() -> ValueParser {
    ValueParser::from(move |value: &str| -> std::result::Result<bool, String> {
        parse_flag(value).ok_or_else(|| "expected true or false".to_string())
    })
}

fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long("email")
        .help("Account email address")
        .env("AUTHGATE_EMAIL")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .short('p')
        .long("password")
        .help("Account password")
        .env("AUTHGATE_PASSWORD")
        .hide_env_values(true)
}

fn token_arg(help: &'static str) -> Arg {
    Arg::new(ARG_TOKEN)
        .short('t')
        .long("token")
        .help(help)
        .required(true)
}

fn session_command() -> Command {
    Command::new(CMD_SESSION)
        .about("Resolve the session, log in, evaluate protected routes, then log out")
        .arg(email_arg())
        .arg(password_arg().required(true))
        .arg(
            Arg::new("visit")
                .long("visit")
                .help("Route to evaluate with the navigation gate (repeatable)")
                .action(ArgAction::Append)
                .default_value("/dashboard"),
        )
        .arg(
            Arg::new("logout-all")
                .long("logout-all")
                .help("Revoke every session of the user when done")
                .action(ArgAction::SetTrue),
        )
}

fn account_commands() -> [Command; 5] {
    [
        Command::new(CMD_REGISTER)
            .about("Create an account; a verification email is sent")
            .arg(email_arg())
            .arg(password_arg().required(true))
            .arg(
                Arg::new("first-name")
                    .long("first-name")
                    .help("First name"),
            )
            .arg(Arg::new("last-name").long("last-name").help("Last name")),
        Command::new(CMD_VERIFY_EMAIL)
            .about("Confirm an email address with the token from the verification link")
            .arg(token_arg("Verification token")),
        Command::new(CMD_RESEND_VERIFICATION)
            .about("Send a new verification email")
            .arg(email_arg()),
        Command::new(CMD_FORGOT_PASSWORD)
            .about("Request a password reset link")
            .arg(email_arg()),
        Command::new(CMD_RESET_PASSWORD)
            .about("Set a new password with a reset token")
            .arg(token_arg("Password reset token"))
            .arg(password_arg().required_unless_present("validate-only"))
            .arg(
                Arg::new("validate-only")
                    .long("validate-only")
                    .help("Only check whether the token is still valid")
                    .action(ArgAction::SetTrue),
            ),
    ]
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("authgate")
        .about("Session and resilient-request client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("Base URL of the backend API")
                .env(ENV_API_BASE_URL)
                .global(true)
                .default_value(DEFAULT_API_BASE_URL),
        )
        .arg(
            Arg::new(ARG_INCLUDE_CREDENTIALS)
                .long("include-credentials")
                .help("Keep cookies between calls so the refresh cookie is sent")
                .env(ENV_INCLUDE_CREDENTIALS)
                .global(true)
                .default_value("true")
                .value_parser(validator_flag()),
        )
        .arg(
            Arg::new(ARG_TIMEOUT_MS)
                .long("timeout-ms")
                .help("Request timeout in milliseconds")
                .env(ENV_TIMEOUT_MS)
                .global(true)
                .default_value("10000")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .subcommand(session_command())
        .subcommands(account_commands());

    logging::with_args(command)
}
