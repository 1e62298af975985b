//! Per-batch orchestration: one event, many recipients, one aggregate.

use std::sync::Arc;
use std::time::Duration;
use taskdeck_common::types::{
    DeliveryArtifact, DeliveryOutcome, DispatchResult, NotificationEvent, Recipient,
    RecipientOutcome,
};
use tokio::sync::Semaphore;
use tracing;

use crate::artifact_log::ArtifactLog;
use crate::channels::agent::AgentChannel;
use crate::channels::qr::QrChannel;
use crate::config::NotifyConfig;
use crate::directory::{resolve_recipients, UserDirectory};
use crate::error::NotifyError;
use crate::health::AgentHealthProbe;
use crate::{address, template, FallbackChannel, HealthCheck, PrimaryChannel};

/// The notification orchestrator.
///
/// One `dispatch` call covers one event and its recipient list: a single
/// health probe up front, then a bounded-concurrency fan-out in which every
/// recipient independently walks primary-then-fallback. Recipient failures
/// become outcome values; nothing aborts the batch except the overall
/// deadline, and even then every recipient gets an outcome.
pub struct NotificationDispatcher {
    config: NotifyConfig,
    probe: Arc<dyn HealthCheck>,
    primary: Arc<dyn PrimaryChannel>,
    fallback: Arc<dyn FallbackChannel>,
    artifact_log: Arc<ArtifactLog>,
}

impl NotificationDispatcher {
    /// Builds a dispatcher with the real agent and QR channels.
    pub fn new(config: NotifyConfig) -> Self {
        let primary = Arc::new(AgentChannel::new(
            &config.agent_base_url,
            config.sender_address.clone(),
            Duration::from_secs(config.send_timeout_secs),
        ));
        let fallback = Arc::new(QrChannel::new(
            &config.artifact_dir,
            &config.artifact_public_prefix,
        ));
        let artifact_log = Arc::new(ArtifactLog::new(config.artifact_retention));
        let probe = Arc::new(AgentHealthProbe::new(&config.agent_base_url));
        Self::with_channels(config, probe, primary, fallback, artifact_log)
    }

    /// Builds a dispatcher around caller-supplied probe and channels. The
    /// seam the tests stub through.
    pub fn with_channels(
        config: NotifyConfig,
        probe: Arc<dyn HealthCheck>,
        primary: Arc<dyn PrimaryChannel>,
        fallback: Arc<dyn FallbackChannel>,
        artifact_log: Arc<ArtifactLog>,
    ) -> Self {
        Self {
            config,
            probe,
            primary,
            fallback,
            artifact_log,
        }
    }

    pub fn artifact_log(&self) -> &Arc<ArtifactLog> {
        &self.artifact_log
    }

    /// Looks up `user_ids` through the directory and dispatches to whatever
    /// they resolve to. Missing records and missing addresses come back as
    /// skipped outcomes.
    pub async fn dispatch_to_users(
        &self,
        event: &NotificationEvent,
        directory: &dyn UserDirectory,
        user_ids: &[String],
    ) -> DispatchResult {
        let recipients = resolve_recipients(directory, user_ids).await;
        self.dispatch(event, &recipients).await
    }

    /// Dispatches `event` to `recipients` and returns a complete aggregate.
    ///
    /// Always completes with a result: every error the channels can produce
    /// is converted into a per-recipient [`DeliveryOutcome`]. `outcomes`
    /// maps 1:1, in input order, onto `recipients`.
    pub async fn dispatch(
        &self,
        event: &NotificationEvent,
        recipients: &[Recipient],
    ) -> DispatchResult {
        if !self.config.enabled {
            tracing::debug!(
                event = event.kind(),
                reason = %NotifyError::SubsystemDisabled,
                "Dispatch short-circuited"
            );
            return DispatchResult::empty();
        }
        if recipients.is_empty() {
            return DispatchResult::empty();
        }

        let deadline = tokio::time::Instant::now()
            + Duration::from_secs(self.config.dispatch_deadline_secs);

        // One probe per batch. The result is read-only for the rest of the
        // batch so every recipient sees the same reachability decision. The
        // probe's own timeout is clamped to the remaining deadline so a
        // stalled probe cannot push the batch past it.
        let health_timeout = Duration::from_secs(self.config.health_timeout_secs)
            .min(deadline.saturating_duration_since(tokio::time::Instant::now()));
        let health = self.probe.check(health_timeout).await;
        tracing::info!(
            event = event.kind(),
            recipients = recipients.len(),
            agent_reachable = health.reachable,
            "Dispatching notification batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut handles = Vec::with_capacity(recipients.len());

        for (idx, recipient) in recipients.iter().enumerate() {
            let semaphore = semaphore.clone();
            let primary = self.primary.clone();
            let fallback = self.fallback.clone();
            let artifact_log = self.artifact_log.clone();
            let event = event.clone();
            let recipient = recipient.clone();
            let prefix = self.config.default_route_prefix.clone();
            let send_timeout = Duration::from_secs(self.config.send_timeout_secs);
            let artifact_timeout = Duration::from_secs(self.config.artifact_timeout_secs);
            let reachable = health.reachable;

            handles.push(tokio::spawn(async move {
                // Closed semaphore cannot happen here; treat it as a failed
                // recipient rather than panicking.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            idx,
                            DeliveryOutcome::Failed {
                                reason: "dispatcher shutting down".to_string(),
                            },
                            None,
                        )
                    }
                };
                let (outcome, artifact) = deliver_one(
                    primary.as_ref(),
                    fallback.as_ref(),
                    reachable,
                    &prefix,
                    send_timeout,
                    artifact_timeout,
                    &event,
                    &recipient,
                )
                .await;
                if let Some(artifact) = &artifact {
                    artifact_log.append(artifact.clone());
                }
                (idx, outcome, artifact)
            }));
        }

        let mut outcomes: Vec<Option<DeliveryOutcome>> = vec![None; recipients.len()];
        let mut artifacts: Vec<DeliveryArtifact> = Vec::new();
        let mut timed_out = false;

        // `timeout_at` polls the task before the timer, so recipients that
        // finished before the deadline are still collected even once it has
        // elapsed; only genuinely in-flight tasks get aborted.
        for mut handle in handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok((idx, outcome, artifact))) => {
                    outcomes[idx] = Some(outcome);
                    if let Some(artifact) = artifact {
                        artifacts.push(artifact);
                    }
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Recipient delivery task failed");
                }
                Err(_) => {
                    if !timed_out {
                        tracing::warn!(
                            event = event.kind(),
                            "Dispatch deadline elapsed, abandoning in-flight deliveries"
                        );
                        timed_out = true;
                    }
                    handle.abort();
                }
            }
        }

        let outcomes: Vec<RecipientOutcome> = recipients
            .iter()
            .zip(outcomes)
            .map(|(recipient, outcome)| RecipientOutcome {
                recipient_id: recipient.id.clone(),
                outcome: outcome.unwrap_or(DeliveryOutcome::Failed {
                    reason: "timeout".to_string(),
                }),
            })
            .collect();

        let any_delivered = outcomes.iter().any(|o| o.outcome.is_out());
        tracing::info!(
            event = event.kind(),
            any_delivered,
            artifacts = artifacts.len(),
            "Dispatch batch complete"
        );

        DispatchResult {
            any_delivered,
            outcomes,
            artifacts,
        }
    }
}

/// One recipient's walk through the delivery state machine:
/// address resolution, primary attempt (only when the probe said
/// reachable), fallback attempt, terminal outcome.
#[allow(clippy::too_many_arguments)]
async fn deliver_one(
    primary: &dyn PrimaryChannel,
    fallback: &dyn FallbackChannel,
    reachable: bool,
    prefix: &str,
    send_timeout: Duration,
    artifact_timeout: Duration,
    event: &NotificationEvent,
    recipient: &Recipient,
) -> (DeliveryOutcome, Option<DeliveryArtifact>) {
    let raw = match &recipient.address {
        Some(raw) => raw,
        None => {
            return (
                DeliveryOutcome::Skipped {
                    reason: "no address".to_string(),
                },
                None,
            )
        }
    };

    let address = match address::normalize(raw, prefix) {
        Ok(address) => address,
        Err(e) => {
            tracing::warn!(recipient = %recipient.id, error = %e, "Skipping recipient");
            return (
                DeliveryOutcome::Skipped {
                    reason: e.to_string(),
                },
                None,
            );
        }
    };

    let message = template::render(event, &recipient.display_name);

    let primary_attempt: crate::error::Result<()> = if reachable {
        match tokio::time::timeout(send_timeout, primary.send(&address, &message)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::PrimaryDeliveryFailed(
                "send timed out".to_string(),
            )),
        }
    } else {
        Err(NotifyError::AgentUnreachable)
    };

    match primary_attempt {
        Ok(()) => return (DeliveryOutcome::Delivered, None),
        Err(e @ NotifyError::AgentUnreachable) => {
            tracing::debug!(recipient = %recipient.id, reason = %e, "Using fallback");
        }
        Err(e) => {
            tracing::warn!(
                recipient = %recipient.id,
                error = %e,
                "Primary delivery failed, falling back"
            );
        }
    }

    match tokio::time::timeout(artifact_timeout, fallback.produce(&address, &message)).await {
        Ok(Ok(artifact)) => (
            DeliveryOutcome::Queued {
                artifact_path: artifact.artifact_path.clone(),
            },
            Some(artifact),
        ),
        Ok(Err(e)) => {
            tracing::error!(recipient = %recipient.id, error = %e, "Fallback failed");
            (
                DeliveryOutcome::Failed {
                    reason: e.to_string(),
                },
                None,
            )
        }
        Err(_) => (
            DeliveryOutcome::Failed {
                reason: "fallback timed out".to_string(),
            },
            None,
        ),
    }
}
