//! Primary delivery channel: the always-on agent's HTTP send endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use taskdeck_common::types::NormalizedAddress;
use tracing;

use crate::error::{NotifyError, Result};
use crate::PrimaryChannel;

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
}

/// Shape of the agent's `POST /send` response. Only an explicit
/// `success: true` counts as delivered; a missing field deserializes to
/// `false` and is treated as failure (fail-closed).
#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Sends rendered messages through the delivery agent.
///
/// Single attempt per call: retry and fallback policy belongs to the
/// dispatcher, not the channel.
pub struct AgentChannel {
    client: reqwest::Client,
    base_url: String,
    sender_address: Option<String>,
    timeout: Duration,
}

impl AgentChannel {
    pub fn new(base_url: &str, sender_address: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            sender_address,
            timeout,
        }
    }
}

#[async_trait]
impl PrimaryChannel for AgentChannel {
    async fn send(&self, address: &NormalizedAddress, message: &str) -> Result<()> {
        let url = format!("{}/send", self.base_url);
        let payload = SendRequest {
            to: address.as_str(),
            message,
            from: self.sender_address.as_deref(),
        };

        // Transport failures convert through `HttpError`; everything below
        // here is the agent answering, which fails closed as
        // `PrimaryDeliveryFailed`.
        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::PrimaryDeliveryFailed(format!(
                "agent returned HTTP {status}"
            )));
        }

        let body: SendResponse = resp
            .json()
            .await
            .map_err(|e| NotifyError::PrimaryDeliveryFailed(format!("unparseable response: {e}")))?;

        if body.success {
            tracing::debug!(to = %address, "Agent accepted message");
            Ok(())
        } else {
            let reason = body
                .error
                .unwrap_or_else(|| "agent did not confirm success".to_string());
            tracing::warn!(to = %address, reason = %reason, "Agent rejected message");
            Err(NotifyError::PrimaryDeliveryFailed(reason))
        }
    }
}
