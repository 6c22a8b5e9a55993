//! CLI entry point for robinstock.

pub mod auth;

use clap::{Parser, Subcommand};

/// Robinhood authentication CLI
#[derive(Parser, Debug)]
#[command(name = "robinstock", version, about = "Robinhood API authentication CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authentication management
    Auth(AuthArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands for login, status, and logout.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in, running identity verification if the server asks for it
    #[command(
        after_help = "Password: ROBINHOOD_PASSWORD, else prompted without echo (piped stdin is read as one line)."
    )]
    Login(LoginArgs),
    /// Show the stored credential for an account
    Status(AccountArgs),
    /// Delete the stored credential for an account
    Logout(AccountArgs),
}

/// Arguments for `robinstock auth login`.
///
/// The password is read from `ROBINHOOD_PASSWORD`. If unset, it is prompted
/// for with echo off, or read as one line when stdin is not a terminal.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account username (usually an email address)
    pub username: String,

    /// One-time code for accounts with app-based MFA
    #[arg(long)]
    pub mfa_code: Option<String>,
}

/// Arguments naming a single account.
#[derive(Parser, Debug)]
pub struct AccountArgs {
    /// Account username (usually an email address)
    pub username: String,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
