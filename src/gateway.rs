//! Submission gateway: delivers a finished registration to the remote
//! intake endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::GatewayError;
use crate::wizard::WirePayload;

/// What the intake endpoint returned on success.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReceipt {
    pub status: u16,
}

/// Accepts a finalized record. Exactly one attempt per call, no retries.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, payload: &WirePayload) -> Result<GatewayReceipt, GatewayError>;
}

/// Posts the payload as JSON to a fixed endpoint.
///
/// Only an exact `200 OK` counts as success. Any other status is a
/// rejection carrying the body's `message` field when present.
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGateway {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

}

#[async_trait]
impl SubmissionGateway for HttpGateway {
    async fn submit(&self, payload: &WirePayload) -> Result<GatewayReceipt, GatewayError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let body: serde_json::Value = serde_json::from_str(&text).unwrap_or_default();

        if status == StatusCode::OK {
            tracing::debug!(endpoint = %self.endpoint, "Intake endpoint accepted submission");
            return Ok(GatewayReceipt {
                status: status.as_u16(),
            });
        }

        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from);
        tracing::warn!(
            endpoint = %self.endpoint,
            status = status.as_u16(),
            message = message.as_deref().unwrap_or(""),
            "Intake endpoint rejected submission"
        );
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
