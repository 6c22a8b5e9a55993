//! Error types for robinstock.

use strum::Display;
use thiserror::Error;

use crate::auth::AuthError;

/// Top-level error for configuration and auth operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used to decide how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Verification,
    Timeout,
    Network,
    Cancelled,
    Unknown,
}

impl Error {
    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Io(_) => ErrorCategory::Unknown,
            Self::Auth(auth) => match auth {
                err if err.is_timeout() => ErrorCategory::Timeout,
                AuthError::Verification(_) => ErrorCategory::Verification,
                AuthError::NotAuthenticated
                | AuthError::MfaRequired
                | AuthError::ChallengeRequired { .. }
                | AuthError::LoginRejected { .. }
                | AuthError::RefreshRejected { .. }
                | AuthError::MissingAccessToken => ErrorCategory::Authentication,
                AuthError::Network(_) => ErrorCategory::Network,
                AuthError::Cancelled => ErrorCategory::Cancelled,
                _ => ErrorCategory::Unknown,
            },
        }
    }

    /// Whether starting the operation over could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, Error>;
