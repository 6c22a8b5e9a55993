//! reqwest-backed transport with the headers the API expects.

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;

use super::{ApiResponse, RestTransport};
use crate::auth::AuthError;
use crate::config::ClientConfig;
use crate::session::Session;

const API_VERSION_HEADER: &str = "x-robinhood-api-version";

/// JSON transport over a shared `reqwest::Client`.
///
/// Cloning is cheap and clones share the connection pool, so one transport
/// can serve unrelated sessions concurrently.
///
/// # Example
/// ```no_run
/// use robinstock::config::ClientConfig;
/// use robinstock::transport::HttpTransport;
///
/// let transport = HttpTransport::new(&ClientConfig::default())?;
/// # Ok::<(), robinstock::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(10)
            .default_headers(default_headers(&config.api_version))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client. Its default headers are used as-is.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        session: Option<&Session>,
    ) -> Result<ApiResponse, AuthError> {
        let mut request: RequestBuilder = self.client.request(method.clone(), url);
        if let Some(session) = session {
            request = request.header(AUTHORIZATION, session.authorization()?);
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = decode_body(&bytes)?;
        tracing::debug!(%method, url, status, "API response");
        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl RestTransport for HttpTransport {
    async fn get(&self, url: &str, session: Option<&Session>) -> Result<ApiResponse, AuthError> {
        self.send(Method::GET, url, None, session).await
    }

    async fn post(
        &self,
        url: &str,
        body: &Value,
        session: Option<&Session>,
    ) -> Result<ApiResponse, AuthError> {
        self.send(Method::POST, url, Some(body), session).await
    }
}

/// Headers sent on every request.
pub fn default_headers(api_version: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=1"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("robinstock/", env!("CARGO_PKG_VERSION"))),
    );
    if let Ok(val) = HeaderValue::from_str(api_version) {
        headers.insert(API_VERSION_HEADER, val);
    }
    headers
}

fn decode_body(bytes: &[u8]) -> Result<Value, AuthError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_headers_carry_api_version() {
        let headers = default_headers("1.431.4");
        assert_eq!(headers.get(API_VERSION_HEADER).unwrap(), "1.431.4");
        assert_eq!(headers.get(ACCEPT).unwrap(), "*/*");
        assert!(headers
            .get(USER_AGENT)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("robinstock/"));
    }

    #[test]
    fn blank_body_decodes_to_null() {
        assert_eq!(decode_body(b"").unwrap(), Value::Null);
        assert_eq!(decode_body(b" \n").unwrap(), Value::Null);
    }

    #[test]
    fn json_body_decodes() {
        assert_eq!(decode_body(br#"{"id":"m-1"}"#).unwrap(), json!({"id": "m-1"}));
    }

    #[test]
    fn html_body_is_serialization_error() {
        assert!(matches!(
            decode_body(b"<html>oops</html>"),
            Err(AuthError::Serialization(_))
        ));
    }
}
