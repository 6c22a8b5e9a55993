//! CLI auth command handlers for login, status, and logout.

use std::io::{IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::auth::{AuthError, AuthService, VerificationError};
use crate::config::ClientConfig;
use crate::session::Session;

const PASSWORD_ENV: &str = "ROBINHOOD_PASSWORD";

fn service() -> Result<AuthService, Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    Ok(AuthService::from_config(&config)?)
}

fn read_password() -> Result<String, Box<dyn std::error::Error>> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    let password = if std::io::stdin().is_terminal() {
        prompt_hidden("Password: ")?
    } else {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };
    if password.is_empty() {
        return Err("no password provided".into());
    }
    Ok(password)
}

/// Read one line from the terminal with echo off.
fn prompt_hidden(prompt: &str) -> std::io::Result<String> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    terminal::enable_raw_mode()?;
    let result = read_hidden_line();
    let _ = terminal::disable_raw_mode();
    eprintln!();
    result
}

fn read_hidden_line() -> std::io::Result<String> {
    let mut line = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(line),
            KeyCode::Backspace => {
                line.pop();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "password entry aborted",
                ));
            }
            KeyCode::Char(ch) => line.push(ch),
            _ => {}
        }
    }
}

/// Handle `robinstock auth login <username>`.
pub async fn handle_login(
    username: &str,
    mfa_code: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = service()?;
    let password = read_password()?;
    let mut session = Session::new();

    println!("⏳ Logging in as {username}...");
    match service.login(&mut session, username, &password, mfa_code).await {
        Ok(credential) => {
            println!("✅ Login successful!");
            if let Some(expires) = credential.expires_at() {
                println!("   Expires {}", expires.format("%Y-%m-%d %H:%M"));
            }
            Ok(())
        }
        Err(AuthError::MfaRequired) => {
            eprintln!("❌ MFA code required. Re-run with --mfa-code <code>.");
            std::process::exit(1);
        }
        Err(AuthError::Verification(VerificationError::ChallengeTimeout { .. })) => {
            eprintln!("❌ Verification was not approved in time. Approve the prompt in the app and try again.");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle `robinstock auth status <username>`.
pub async fn handle_status(username: &str) -> Result<(), Box<dyn std::error::Error>> {
    let service = service()?;

    println!("🔐 Authentication Status\n");
    match service.status(username) {
        Some(credential) => {
            let status = match credential.expires_at() {
                Some(expires) => format!("✅ Logged in (expires {})", expires.format("%Y-%m-%d %H:%M")),
                None => "✅ Logged in".to_string(),
            };
            println!("  {username}: {status}");
        }
        None => println!("  {username}: ❌ Not logged in"),
    }
    Ok(())
}

/// Handle `robinstock auth logout <username>`.
pub async fn handle_logout(username: &str) -> Result<(), Box<dyn std::error::Error>> {
    let service = service()?;
    let mut session = Session::new();
    service.logout(&mut session, username)?;
    println!("✅ Logged out {username}");
    Ok(())
}
