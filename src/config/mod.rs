//! Client configuration (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

use crate::error::Error;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.robinhood.com";
/// OAuth client identifier used by the official web app.
pub const DEFAULT_CLIENT_ID: &str = "c82SH0WZOsabOXGP2sxqcj34FxkvfnWRZBKlBjFS";
/// Value of the `X-Robinhood-API-Version` header.
pub const DEFAULT_API_VERSION: &str = "1.431.4";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Polling cadences and budgets for identity verification.
///
/// The defaults mirror what the live service has been observed to need; they
/// are knobs, not protocol constants.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use robinstock::config::VerificationTiming;
///
/// let timing = VerificationTiming::builder()
///     .challenge_timeout(Duration::from_secs(300))
///     .build();
/// assert_eq!(timing.inquiry_timeout, Duration::from_secs(20));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct VerificationTiming {
    /// Wait between inquiry polls.
    #[builder(default = Duration::from_secs(4))]
    pub inquiry_poll_interval: Duration,
    /// Budget for the inquiry to materialize, from loop entry.
    #[builder(default = Duration::from_secs(20))]
    pub inquiry_timeout: Duration,
    /// Wait after a challenge reports `issued`.
    #[builder(default = Duration::from_secs(15))]
    pub challenge_pending_interval: Duration,
    /// Wait after a failed or empty challenge status poll.
    #[builder(default = Duration::from_secs(5))]
    pub challenge_retry_interval: Duration,
    /// Budget for the challenge to be validated, from loop entry.
    #[builder(default = Duration::from_secs(120))]
    pub challenge_timeout: Duration,
}

impl Default for VerificationTiming {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Settings shared by the transport and the auth service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub client_id: String,
    pub api_version: String,
    pub request_timeout: Duration,
    /// Directory for persisted credentials. `None` uses `~/.tokens`.
    pub token_dir: Option<PathBuf>,
    pub timing: VerificationTiming,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            token_dir: None,
            timing: VerificationTiming::default(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from the environment (and a `.env` file if present).
    ///
    /// Recognized: `ROBINHOOD_BASE_URL`, `ROBINHOOD_CLIENT_ID`,
    /// `ROBINHOOD_TOKEN_DIR`, `ROBINHOOD_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, Error> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("ROBINHOOD_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(client_id) = lookup("ROBINHOOD_CLIENT_ID") {
            config.client_id = client_id;
        }
        if let Some(dir) = lookup("ROBINHOOD_TOKEN_DIR") {
            config.token_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup("ROBINHOOD_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Configuration(format!(
                    "ROBINHOOD_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_token_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.token_dir = Some(dir.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_timing(mut self, timing: VerificationTiming) -> Self {
        self.timing = timing;
        self
    }
}
