//! Endpoint URLs used by the auth flow.

use crate::config::DEFAULT_BASE_URL;

/// URL builder rooted at a configurable API host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// OAuth2 token endpoint, for password and refresh grants.
    pub fn login(&self) -> String {
        format!("{}/oauth2/token/", self.base_url)
    }

    /// Starts a verification machine for a workflow.
    pub fn user_machine(&self) -> String {
        format!("{}/pathfinder/user_machine/", self.base_url)
    }

    pub fn inquiry(&self, machine_id: &str) -> String {
        format!("{}/pathfinder/inquiries/{machine_id}/user_view/", self.base_url)
    }

    pub fn challenge_status(&self, challenge_id: &str) -> String {
        format!("{}/push/{challenge_id}/get_prompts_status/", self.base_url)
    }
}
