//! Sheriff identity verification workflow.
//!
//! A risky login is answered with a verification workflow ID. Resolving it
//! takes four steps against the API:
//!
//! 1. start a verification machine for the workflow,
//! 2. poll the machine's inquiry until it names a challenge,
//! 3. poll the challenge until the user approves it (push or email),
//! 4. post a continuation to the inquiry and expect an approved workflow.
//!
//! The whole sequence runs inside one login call and cannot be resumed.

use std::fmt;
use std::time::Duration;

use serde_json::{json, Value};
use strum::Display;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::VerificationError;
use crate::config::VerificationTiming;
use crate::transport::{ApiResponse, RestTransport};
use crate::urls::Endpoints;
use crate::util::wait;

const APPROVED_RESULT: &str = "workflow_status_approved";

/// Progress through the workflow, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStage {
    Starting,
    AwaitingInquiry,
    AwaitingChallengeResolution,
    Completing,
    Approved,
}

/// `challenge_status` reported by the prompt status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeStatus {
    Issued,
    Validated,
    Other(String),
}

impl From<&str> for ChallengeStatus {
    fn from(value: &str) -> Self {
        match value {
            "issued" => Self::Issued,
            "validated" => Self::Validated,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issued => f.write_str("issued"),
            Self::Validated => f.write_str("validated"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// Drives one verification workflow to approval or a terminal error.
///
/// # Example
/// ```no_run
/// use robinstock::auth::SheriffVerifier;
/// use robinstock::config::{ClientConfig, VerificationTiming};
/// use robinstock::transport::HttpTransport;
/// use robinstock::urls::Endpoints;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new(&ClientConfig::default())?;
/// let endpoints = Endpoints::default();
/// let timing = VerificationTiming::default();
/// let cancel = CancellationToken::new();
/// SheriffVerifier::new(&transport, &endpoints, &timing, &cancel)
///     .run("00112233-4455-6677-8899-aabbccddeeff", "workflow-id")
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SheriffVerifier<'a> {
    transport: &'a dyn RestTransport,
    endpoints: &'a Endpoints,
    timing: &'a VerificationTiming,
    cancel: &'a CancellationToken,
}

impl<'a> SheriffVerifier<'a> {
    pub fn new(
        transport: &'a dyn RestTransport,
        endpoints: &'a Endpoints,
        timing: &'a VerificationTiming,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            transport,
            endpoints,
            timing,
            cancel,
        }
    }

    /// Run the workflow for `workflow_id`, returning once it is approved.
    pub async fn run(&self, device_token: &str, workflow_id: &str) -> Result<(), VerificationError> {
        let result = self.drive(device_token, workflow_id).await;
        match &result {
            Ok(()) => tracing::info!(stage = %VerificationStage::Approved, "Final workflow approval successful"),
            Err(err) => tracing::warn!(
                error = %err,
                timed_out = err.is_timeout(),
                "Sheriff verification ended without approval"
            ),
        }
        result
    }

    async fn drive(&self, device_token: &str, workflow_id: &str) -> Result<(), VerificationError> {
        let machine_id = self.start(device_token, workflow_id).await?;
        let inquiry_url = self.endpoints.inquiry(&machine_id);
        let inquiry = self.await_inquiry(&inquiry_url).await?;
        let challenge_id = challenge_id(&inquiry)?;
        self.await_validation(&challenge_id).await?;
        self.complete(&inquiry_url, &challenge_id).await
    }

    async fn start(&self, device_token: &str, workflow_id: &str) -> Result<String, VerificationError> {
        tracing::info!(stage = %VerificationStage::Starting, workflow_id, "Starting Sheriff verification workflow");
        let payload = json!({
            "device_id": device_token,
            "flow": "suv",
            "input": { "workflow_id": workflow_id },
        });
        let response = wait::until_cancelled(
            self.cancel,
            self.transport
                .post(&self.endpoints.user_machine(), &payload, None),
        )
        .await?
        .map_err(|err| VerificationError::StartFailed(err.to_string()))?;

        match response.str_at(&["id"]) {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(VerificationError::MissingMachineId),
        }
    }

    async fn await_inquiry(&self, inquiry_url: &str) -> Result<ApiResponse, VerificationError> {
        tracing::info!(stage = %VerificationStage::AwaitingInquiry, "Waiting for inquiry data");
        let budget = self.timing.inquiry_timeout;
        let started = Instant::now();

        while started.elapsed() < budget {
            match wait::until_cancelled(self.cancel, self.transport.get(inquiry_url, None)).await? {
                Ok(response) if response.has_body() => return Ok(response),
                Ok(response) => {
                    tracing::debug!(status = response.status, "Empty inquiry response, retrying")
                }
                Err(err) => tracing::debug!(error = %err, "Failed to get inquiry, retrying"),
            }
            self.pause(self.timing.inquiry_poll_interval, started, budget)
                .await?;
        }

        Err(VerificationError::InquiryTimeout { waited: budget })
    }

    async fn await_validation(&self, challenge_id: &str) -> Result<(), VerificationError> {
        tracing::info!(
            stage = %VerificationStage::AwaitingChallengeResolution,
            challenge_id,
            "Polling sheriff challenge status"
        );
        let status_url = self.endpoints.challenge_status(challenge_id);
        let budget = self.timing.challenge_timeout;
        let started = Instant::now();

        while started.elapsed() < budget {
            let response =
                match wait::until_cancelled(self.cancel, self.transport.get(&status_url, None))
                    .await?
                {
                    Ok(response) if response.has_body() => response,
                    Ok(_) => {
                        tracing::debug!(challenge_id, "Empty challenge status response, retrying");
                        self.pause(self.timing.challenge_retry_interval, started, budget)
                            .await?;
                        continue;
                    }
                    Err(err) => {
                        tracing::debug!(challenge_id, error = %err, "Challenge status request failed, retrying");
                        self.pause(self.timing.challenge_retry_interval, started, budget)
                            .await?;
                        continue;
                    }
                };

            let status = ChallengeStatus::from(response.str_at(&["challenge_status"]).unwrap_or_default());
            tracing::info!(challenge_id, status = %status, "Current challenge status");
            match status {
                ChallengeStatus::Validated => return Ok(()),
                ChallengeStatus::Issued => {
                    self.pause(self.timing.challenge_pending_interval, started, budget)
                        .await?;
                }
                ChallengeStatus::Other(status) => {
                    return Err(VerificationError::UnexpectedStatus {
                        challenge_id: challenge_id.to_string(),
                        status,
                    });
                }
            }
        }

        Err(VerificationError::ChallengeTimeout {
            challenge_id: challenge_id.to_string(),
            waited: budget,
        })
    }

    async fn complete(&self, inquiry_url: &str, challenge_id: &str) -> Result<(), VerificationError> {
        tracing::info!(stage = %VerificationStage::Completing, challenge_id, "Sheriff ID validation successful");
        let payload = json!({
            "sequence": 0,
            "user_input": { "status": "continue" },
        });
        let approval_failed = |reason: String| VerificationError::ApprovalFailed {
            challenge_id: challenge_id.to_string(),
            reason,
        };

        let response = wait::until_cancelled(self.cancel, self.transport.post(inquiry_url, &payload, None))
            .await?
            .map_err(|err| approval_failed(err.to_string()))?;

        match response.str_at(&["type_context", "result"]) {
            Some(APPROVED_RESULT) => Ok(()),
            Some(other) => Err(approval_failed(format!("workflow result {other}"))),
            None => Err(approval_failed(format!(
                "no workflow result in response (status {})",
                response.status
            ))),
        }
    }

    /// Sleep for `interval`, clipped to what remains of the loop budget.
    async fn pause(
        &self,
        interval: Duration,
        started: Instant,
        budget: Duration,
    ) -> Result<(), VerificationError> {
        let remaining = budget.saturating_sub(started.elapsed());
        wait::sleep(interval.min(remaining), self.cancel).await?;
        Ok(())
    }
}

fn challenge_id(inquiry: &ApiResponse) -> Result<String, VerificationError> {
    let context = inquiry
        .body
        .get("context")
        .filter(|value| value.is_object())
        .ok_or_else(|| VerificationError::MalformedInquiry("no context in inquiry data".to_string()))?;
    let challenge = context
        .get("sheriff_challenge")
        .filter(|value| value.is_object())
        .ok_or_else(|| {
            VerificationError::MalformedInquiry("no sheriff_challenge in context".to_string())
        })?;
    match challenge.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(VerificationError::MissingChallengeId),
    }
}
