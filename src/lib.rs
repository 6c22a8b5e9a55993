//! Robinstock: authentication client for the Robinhood private API.
//!
//! Logs in with a password grant, drives the "Sheriff" identity
//! verification workflow when the server demands it, and persists the
//! resulting credential per identity.
//!
//! # Quick Start
//!
//! ```no_run
//! use robinstock::auth::AuthService;
//! use robinstock::config::ClientConfig;
//! use robinstock::session::Session;
//!
//! # async fn example() -> robinstock::error::Result<()> {
//! let service = AuthService::from_config(&ClientConfig::from_env()?)?;
//! let mut session = Session::new();
//! service
//!     .login(&mut session, "alice@example.com", "hunter2", None)
//!     .await?;
//! assert!(session.is_authenticated());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;
pub mod urls;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
