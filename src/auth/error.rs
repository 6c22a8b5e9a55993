use std::time::Duration;

use thiserror::Error;

use crate::util::wait::Cancelled;

/// Errors surfaced by login, refresh, logout and the transport beneath them.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("MFA required but not provided")]
    MfaRequired,
    #[error("Challenge required: {challenge_id}")]
    ChallengeRequired { challenge_id: String },
    #[error("Login failed: {}", describe_rejection(.status, .detail))]
    LoginRejected { status: u16, detail: Option<String> },
    #[error("Refresh failed: {}", describe_rejection(.status, .detail))]
    RefreshRejected { status: u16, detail: Option<String> },
    #[error("No access token in response")]
    MissingAccessToken,
    #[error("Sheriff verification failed: {0}")]
    Verification(#[from] VerificationError),
    #[error("Generate device token: {0}")]
    DeviceToken(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Terminal failures of the identity verification workflow.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("failed to start sheriff verification: {0}")]
    StartFailed(String),
    #[error("no machine ID in response")]
    MissingMachineId,
    #[error("unable to get inquiry data within {}s", .waited.as_secs())]
    InquiryTimeout { waited: Duration },
    #[error("malformed inquiry: {0}")]
    MalformedInquiry(String),
    #[error("no challenge ID")]
    MissingChallengeId,
    #[error("unexpected challenge status for {challenge_id}: {status}")]
    UnexpectedStatus { challenge_id: String, status: String },
    #[error("challenge {challenge_id} not validated within {}s", .waited.as_secs())]
    ChallengeTimeout {
        challenge_id: String,
        waited: Duration,
    },
    #[error("workflow approval failed after validation of {challenge_id}: {reason}")]
    ApprovalFailed { challenge_id: String, reason: String },
    #[error("verification cancelled")]
    Cancelled,
}

impl VerificationError {
    /// Whether the failure was a polling budget running out.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::InquiryTimeout { .. } | Self::ChallengeTimeout { .. }
        )
    }
}

impl AuthError {
    /// Whether the failure was a verification polling budget running out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Verification(inner) if inner.is_timeout())
    }
}

fn describe_rejection(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => detail.clone(),
        _ => format!("status {status}"),
    }
}

impl From<Cancelled> for AuthError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<Cancelled> for VerificationError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
