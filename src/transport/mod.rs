//! REST transport consumed by the auth flow.

pub mod http;
#[cfg(test)]
pub(crate) mod test_support;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::AuthError;
use crate::session::Session;

/// Status and decoded JSON body of one HTTP exchange.
///
/// An empty body decodes to `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// Whether the body carries any data (not null and not an empty container).
    pub fn has_body(&self) -> bool {
        match &self.body {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::String(text) => !text.is_empty(),
            _ => true,
        }
    }

    /// String at a nested path, e.g. `["type_context", "result"]`.
    pub fn str_at(&self, path: &[&str]) -> Option<&str> {
        path.iter()
            .try_fold(&self.body, |value, key| value.get(key))
            .and_then(Value::as_str)
    }
}

/// JSON GET/POST capability.
///
/// Passing a session requests an authenticated call; a session without a
/// credential fails with [`AuthError::NotAuthenticated`] before any I/O.
#[async_trait]
pub trait RestTransport: Send + Sync {
    async fn get(&self, url: &str, session: Option<&Session>) -> Result<ApiResponse, AuthError>;

    async fn post(
        &self,
        url: &str,
        body: &Value,
        session: Option<&Session>,
    ) -> Result<ApiResponse, AuthError>;
}
