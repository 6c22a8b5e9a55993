//! Typed decode of token endpoint responses.
//!
//! The endpoint reports verification demands, MFA prompts and challenges in
//! the body, often with an error status. A response is decoded once into
//! [`LoginOutcome`] so callers match on variants instead of probing keys.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::transport::ApiResponse;

/// Tokens returned by a successful grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Decoded token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A step-up identity verification workflow must run first.
    VerificationRequired { workflow_id: String },
    /// The account needs an MFA code the caller did not supply.
    MfaRequired,
    /// A legacy challenge (SMS/email code) was issued.
    ChallengeRequired { challenge_id: String },
    /// The server refused the grant.
    Rejected { status: u16, detail: Option<String> },
    Granted(TokenGrant),
}

impl LoginOutcome {
    /// Classify a response.
    ///
    /// Priority: verification, MFA, challenge, HTTP error status, grant. The
    /// body signals win over the status code because they arrive with 4xx.
    pub fn from_response(response: &ApiResponse) -> Self {
        // a non-object body carries no signals, only the status
        let body = RawTokenResponse::deserialize(&response.body).unwrap_or_default();

        if let Some(workflow_id) = body
            .verification_workflow
            .and_then(|workflow| workflow.id)
            .filter(|id| !id.is_empty())
        {
            return Self::VerificationRequired { workflow_id };
        }
        if body.mfa_required {
            return Self::MfaRequired;
        }
        if let Some(challenge) = body.challenge {
            return Self::ChallengeRequired {
                challenge_id: challenge.id.unwrap_or_default(),
            };
        }
        if response.status >= 400 {
            return Self::Rejected {
                status: response.status,
                detail: body.detail,
            };
        }
        Self::Granted(TokenGrant {
            access_token: body.access_token.unwrap_or_default(),
            refresh_token: body.refresh_token.unwrap_or_default(),
            token_type: body.token_type.unwrap_or_default(),
            expires_in: body.expires_in,
        })
    }
}

/// Token endpoint body. Every field tolerates a wrong JSON type so one odd
/// field does not hide the rest.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTokenResponse {
    #[serde(deserialize_with = "text")]
    access_token: Option<String>,
    #[serde(deserialize_with = "text")]
    refresh_token: Option<String>,
    #[serde(deserialize_with = "text")]
    token_type: Option<String>,
    #[serde(deserialize_with = "seconds")]
    expires_in: u64,
    #[serde(deserialize_with = "flag")]
    mfa_required: bool,
    #[serde(deserialize_with = "id_ref")]
    challenge: Option<IdRef>,
    #[serde(deserialize_with = "id_ref")]
    verification_workflow: Option<IdRef>,
    #[serde(deserialize_with = "text")]
    detail: Option<String>,
}

/// Nested object identified by an `id` field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IdRef {
    #[serde(deserialize_with = "text")]
    id: Option<String>,
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Value::deserialize(deserializer)?
        .as_bool()
        .unwrap_or_default())
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(lenient_u64(&Value::deserialize(deserializer)?))
}

fn id_ref<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<IdRef>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => IdRef::deserialize(value).ok(),
        _ => None,
    })
}

/// Integer from a JSON number or numeric string; anything else is zero.
fn lenient_u64(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or_default(),
        Value::String(text) => text.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}
