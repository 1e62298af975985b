//! Outbound notification dispatcher for TaskDeck.
//!
//! Given a task event and a set of recipients, the dispatcher gets a message
//! "out" through one of two channels and reports exactly what happened:
//!
//! - **Primary**: an always-on delivery agent reached over HTTP
//!   ([`channels::agent::AgentChannel`]), guarded by a per-batch liveness
//!   probe ([`health::AgentHealthProbe`]).
//! - **Fallback**: a scannable QR artifact embedding a deep link plus the
//!   pre-filled message ([`channels::qr::QrChannel`]), produced when the
//!   agent is down or rejects a send. Producing the artifact does not
//!   confirm delivery; the outcome model keeps that distinction.
//!
//! The entry point is [`dispatcher::NotificationDispatcher::dispatch`].
//! Individual recipient failures never abort a batch and no error escapes
//! the dispatch boundary; callers always get a complete per-recipient
//! aggregate.

pub mod address;
pub mod artifact_log;
pub mod channels;
pub mod config;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod health;
pub mod template;


use async_trait::async_trait;
use std::time::Duration;
use taskdeck_common::types::{DeliveryArtifact, HealthState, NormalizedAddress};

use crate::error::Result;

/// Liveness check of the primary delivery agent, run once per dispatch
/// batch. Implementations must complete within `timeout` and must swallow
/// probe failures into `reachable: false` rather than erroring.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self, timeout: Duration) -> HealthState;
}

/// The primary delivery path: hands a rendered message to the always-on
/// agent for immediate delivery.
///
/// Implementations make exactly one attempt; retry and fallback policy
/// belongs to the dispatcher.
#[async_trait]
pub trait PrimaryChannel: Send + Sync {
    /// Delivers `message` to `address` through the agent.
    ///
    /// # Errors
    ///
    /// Returns [`error::NotifyError::HttpError`] when the request never
    /// reaches the agent, and [`error::NotifyError::PrimaryDeliveryFailed`]
    /// when the agent answers with anything other than an explicit success
    /// flag.
    async fn send(&self, address: &NormalizedAddress, message: &str) -> Result<()>;
}

/// The fallback path: produces a self-contained artifact a human can use to
/// complete delivery manually. Success means "artifact produced", never
/// "message received".
#[async_trait]
pub trait FallbackChannel: Send + Sync {
    /// Builds and persists a scannable artifact for `(address, message)`.
    ///
    /// # Errors
    ///
    /// Returns [`error::NotifyError::ArtifactPersistenceFailed`] when the
    /// artifact cannot be written; there is no further fallback.
    async fn produce(&self, address: &NormalizedAddress, message: &str)
        -> Result<DeliveryArtifact>;
}
