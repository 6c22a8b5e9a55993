#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use robinstock::auth::{AuthError, AuthService, Credential, CredentialStore};
use robinstock::config::{ClientConfig, VerificationTiming};
use robinstock::transport::HttpTransport;
use robinstock::urls::Endpoints;
use wiremock::MockServer;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: Mutex<HashMap<String, Credential>>,
    saves: Mutex<usize>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, identity: &str, credential: Credential) {
        self.credentials
            .lock()
            .expect("store lock poisoned")
            .insert(identity.to_string(), credential);
    }

    pub fn get(&self, identity: &str) -> Option<Credential> {
        self.credentials
            .lock()
            .expect("store lock poisoned")
            .get(identity)
            .cloned()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().expect("store lock poisoned")
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self, identity: &str) -> Option<Credential> {
        let mut credentials = self.credentials.lock().expect("store lock poisoned");
        match credentials.get(identity) {
            Some(credential) if credential.is_expired() => {
                credentials.remove(identity);
                None
            }
            other => other.cloned(),
        }
    }

    fn save(&self, identity: &str, credential: &Credential) -> Result<(), AuthError> {
        *self.saves.lock().expect("store lock poisoned") += 1;
        self.credentials
            .lock()
            .expect("store lock poisoned")
            .insert(identity.to_string(), credential.stamped(Utc::now()));
        Ok(())
    }

    fn delete(&self, identity: &str) -> Result<(), AuthError> {
        self.credentials
            .lock()
            .expect("store lock poisoned")
            .remove(identity);
        Ok(())
    }
}

pub fn credential(access_token: &str, expires_in: u64) -> Credential {
    Credential {
        access_token: access_token.to_string(),
        refresh_token: format!("{access_token}-refresh"),
        token_type: "Bearer".to_string(),
        device_token: "11111111-2222-3333-4444-555555555555".to_string(),
        expires_in,
        issued_at: Some(Utc::now()),
    }
}

/// Millisecond cadences so verification flows finish quickly against a mock server.
pub fn fast_timing() -> VerificationTiming {
    VerificationTiming::builder()
        .inquiry_poll_interval(Duration::from_millis(10))
        .inquiry_timeout(Duration::from_millis(500))
        .challenge_pending_interval(Duration::from_millis(10))
        .challenge_retry_interval(Duration::from_millis(10))
        .challenge_timeout(Duration::from_millis(300))
        .build()
}

pub fn service(server: &MockServer, store: Arc<InMemoryCredentialStore>) -> AuthService {
    let config = ClientConfig::default().with_base_url(server.uri());
    let transport = Arc::new(HttpTransport::new(&config).expect("transport"));
    AuthService::new(transport, store)
        .with_endpoints(Endpoints::new(server.uri()))
        .with_timing(fast_timing())
}
