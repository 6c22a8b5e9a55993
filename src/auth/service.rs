use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::credential::Credential;
use super::device::DeviceToken;
use super::error::{AuthError, VerificationError};
use super::response::{LoginOutcome, TokenGrant};
use super::store::{CredentialStore, CredentialStoreConfig, FileCredentialStore};
use super::verification::SheriffVerifier;
use crate::config::{ClientConfig, VerificationTiming, DEFAULT_CLIENT_ID};
use crate::session::Session;
use crate::transport::{ApiResponse, HttpTransport, RestTransport};
use crate::urls::Endpoints;
use crate::util::wait;

const SCOPE: &str = "internal";
const REQUESTED_LIFETIME_SECS: &str = "86400";
const CHALLENGE_TYPE: &str = "email";

/// Login, refresh and logout against the OAuth token endpoint.
///
/// The service holds no credential itself: results are installed on the
/// caller's [`Session`] and persisted through the [`CredentialStore`].
///
/// # Example
/// ```no_run
/// use robinstock::auth::AuthService;
/// use robinstock::config::ClientConfig;
/// use robinstock::session::Session;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = AuthService::from_config(&ClientConfig::from_env()?)?;
/// let mut session = Session::new();
/// let credential = service
///     .login(&mut session, "alice@example.com", "hunter2", None)
///     .await?;
/// assert!(session.is_authenticated());
/// println!("token expires in {}s", credential.expires_in);
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    transport: Arc<dyn RestTransport>,
    store: Arc<dyn CredentialStore>,
    endpoints: Endpoints,
    client_id: String,
    timing: VerificationTiming,
}

impl AuthService {
    pub fn new(transport: Arc<dyn RestTransport>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            store,
            endpoints: Endpoints::default(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            timing: VerificationTiming::default(),
        }
    }

    /// Service backed by the HTTP transport and the file credential store.
    pub fn from_config(config: &ClientConfig) -> Result<Self, AuthError> {
        let transport = Arc::new(HttpTransport::new(config)?);
        let store = Arc::new(match &config.token_dir {
            Some(dir) => FileCredentialStore::new(CredentialStoreConfig::new(dir.clone())),
            None => FileCredentialStore::new_default(),
        });
        Ok(Self::new(transport, store)
            .with_endpoints(Endpoints::new(config.base_url.clone()))
            .with_client_id(config.client_id.clone())
            .with_timing(config.timing.clone()))
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_timing(mut self, timing: VerificationTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Log in with a password grant.
    ///
    /// A live stored credential for `username` is reused without touching the
    /// network. Otherwise the grant is posted, identity verification is run if
    /// the server demands it, and the resulting credential is persisted and
    /// installed on `session`.
    pub async fn login(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
        mfa_code: Option<&str>,
    ) -> Result<Credential, AuthError> {
        self.login_with_cancel(session, username, password, mfa_code, &CancellationToken::new())
            .await
    }

    /// [`login`](Self::login), aborting promptly once `cancel` fires.
    pub async fn login_with_cancel(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
        mfa_code: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Credential, AuthError> {
        if let Some(credential) = self.store.load(username) {
            tracing::info!(identity = username, "Using stored credential");
            session.install(credential.clone());
            return Ok(credential);
        }

        let device_token = DeviceToken::generate()?;
        let payload = json!({
            "username": username,
            "password": password,
            "mfa_code": mfa_code.unwrap_or_default(),
            "device_token": device_token.as_str(),
            "client_id": self.client_id,
            "grant_type": "password",
            "scope": SCOPE,
            "expires_in": REQUESTED_LIFETIME_SECS,
            "challenge_type": CHALLENGE_TYPE,
        });

        let login_url = self.endpoints.login();
        let response = self.post(&login_url, &payload, cancel).await?;
        let mut outcome = LoginOutcome::from_response(&response);

        if let LoginOutcome::VerificationRequired { workflow_id } = &outcome {
            tracing::info!(identity = username, "Sheriff verification required, starting workflow");
            SheriffVerifier::new(self.transport.as_ref(), &self.endpoints, &self.timing, cancel)
                .run(device_token.as_str(), workflow_id)
                .await
                .map_err(|err| match err {
                    VerificationError::Cancelled => AuthError::Cancelled,
                    other => AuthError::Verification(other),
                })?;
            tracing::info!(identity = username, "Retrying login after Sheriff verification");
            let retried = self.post(&login_url, &payload, cancel).await?;
            outcome = LoginOutcome::from_response(&retried);
        }

        let grant = match outcome {
            LoginOutcome::Granted(grant) => grant,
            LoginOutcome::VerificationRequired { workflow_id } => {
                return Err(AuthError::InvalidResponse(format!(
                    "verification workflow {workflow_id} still pending after approval"
                )));
            }
            LoginOutcome::MfaRequired => return Err(AuthError::MfaRequired),
            LoginOutcome::ChallengeRequired { challenge_id } => {
                return Err(AuthError::ChallengeRequired { challenge_id });
            }
            LoginOutcome::Rejected { status, detail } => {
                return Err(AuthError::LoginRejected { status, detail });
            }
        };

        let credential = issue_credential(grant, device_token.into_string())?;
        self.store.save(username, &credential)?;
        session.install(credential.clone());
        tracing::info!(identity = username, expires_in = credential.expires_in, "Login successful");
        Ok(credential)
    }

    /// Exchange a refresh token for a new credential.
    ///
    /// The result is installed on `session` but not persisted, since the
    /// refresh grant does not name the identity.
    pub async fn refresh(
        &self,
        session: &mut Session,
        refresh_token: &str,
        device_token: &str,
    ) -> Result<Credential, AuthError> {
        self.refresh_with_cancel(session, refresh_token, device_token, &CancellationToken::new())
            .await
    }

    pub async fn refresh_with_cancel(
        &self,
        session: &mut Session,
        refresh_token: &str,
        device_token: &str,
        cancel: &CancellationToken,
    ) -> Result<Credential, AuthError> {
        let payload = json!({
            "client_id": self.client_id,
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
            "device_token": device_token,
            "scope": SCOPE,
        });
        let response = self.post(&self.endpoints.login(), &payload, cancel).await?;

        let grant = match LoginOutcome::from_response(&response) {
            LoginOutcome::Granted(grant) => grant,
            LoginOutcome::Rejected { status, detail } => {
                return Err(AuthError::RefreshRejected { status, detail });
            }
            LoginOutcome::MfaRequired => return Err(AuthError::MfaRequired),
            LoginOutcome::ChallengeRequired { challenge_id } => {
                return Err(AuthError::ChallengeRequired { challenge_id });
            }
            LoginOutcome::VerificationRequired { workflow_id } => {
                return Err(AuthError::InvalidResponse(format!(
                    "refresh answered with verification workflow {workflow_id}"
                )));
            }
        };

        let credential = issue_credential(grant, device_token.to_string())?;
        session.install(credential.clone());
        tracing::debug!(expires_in = credential.expires_in, "Refreshed credential");
        Ok(credential)
    }

    /// Forget the credential for `identity`, locally and on disk.
    pub fn logout(&self, session: &mut Session, identity: &str) -> Result<(), AuthError> {
        session.clear();
        self.store.delete(identity)?;
        tracing::info!(identity, "Logged out");
        Ok(())
    }

    /// Live stored credential for `identity`, without network access.
    pub fn status(&self, identity: &str) -> Option<Credential> {
        self.store.load(identity)
    }

    async fn post(
        &self,
        url: &str,
        payload: &Value,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, AuthError> {
        wait::until_cancelled(cancel, self.transport.post(url, payload, None)).await?
    }
}

fn issue_credential(grant: TokenGrant, device_token: String) -> Result<Credential, AuthError> {
    if grant.access_token.is_empty() {
        return Err(AuthError::MissingAccessToken);
    }
    Ok(Credential {
        access_token: grant.access_token,
        refresh_token: grant.refresh_token,
        token_type: grant.token_type,
        device_token,
        expires_in: grant.expires_in,
        issued_at: Some(Utc::now()),
    })
}
