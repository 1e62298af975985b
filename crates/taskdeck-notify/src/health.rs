//! Liveness probing of the primary delivery agent.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use taskdeck_common::types::HealthState;
use tracing;

use crate::HealthCheck;

/// Shape of the agent's `GET /health` body. Anything that fails to parse
/// into this, or parses with `connected != true`, counts as unreachable.
#[derive(Debug, Deserialize)]
struct AgentHealthResponse {
    #[serde(default)]
    connected: bool,
    #[serde(default)]
    uptime: Option<f64>,
    #[serde(default, rename = "agentAddress")]
    agent_address: Option<String>,
}

/// Bounded-time check of whether the delivery agent is reachable.
///
/// Probe failures are swallowed into `reachable: false`; callers never see
/// an error and never block past the supplied timeout.
pub struct AgentHealthProbe {
    client: reqwest::Client,
    base_url: String,
}

impl AgentHealthProbe {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl HealthCheck for AgentHealthProbe {
    /// Probes `GET {base}/health` once, returning within `timeout`.
    async fn check(&self, timeout: Duration) -> HealthState {
        let url = format!("{}/health", self.base_url);
        let reachable = match self.client.get(&url).timeout(timeout).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<AgentHealthResponse>().await {
                    Ok(body) => {
                        if body.connected {
                            tracing::debug!(
                                uptime = ?body.uptime,
                                agent_address = ?body.agent_address,
                                "Delivery agent healthy"
                            );
                            true
                        } else {
                            tracing::warn!("Delivery agent reports disconnected");
                            false
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Unparseable agent health body");
                        false
                    }
                }
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "Agent health returned non-success");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Agent health probe failed");
                false
            }
        };

        HealthState {
            reachable,
            checked_at: Utc::now(),
        }
    }
}
