//! Caller-owned authentication state.

use crate::auth::{AuthError, Credential};

/// Holds the active credential for one user of the API.
///
/// Login and refresh install their result here; the transport reads it when
/// an authenticated call is requested. Each caller owns its own session, so
/// concurrent users of one transport never see each other's tokens.
#[derive(Debug, Clone, Default)]
pub struct Session {
    credential: Option<Credential>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Replace the active credential.
    pub fn install(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    pub fn clear(&mut self) {
        self.credential = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential
            .as_ref()
            .is_some_and(|credential| !credential.access_token.is_empty())
    }

    /// `Authorization` header value for the active credential.
    pub fn authorization(&self) -> Result<String, AuthError> {
        match &self.credential {
            Some(credential) if !credential.access_token.is_empty() => {
                Ok(credential.authorization_header())
            }
            _ => Err(AuthError::NotAuthenticated),
        }
    }
}
