/// Errors that can occur within the notification subsystem.
///
/// Everything here is recipient- or batch-local: the dispatcher captures
/// these and converts them into `DeliveryOutcome` values, so none of them
/// escape the `dispatch` boundary.
///
/// # Examples
///
/// ```rust
/// use taskdeck_notify::error::NotifyError;
///
/// let err = NotifyError::InvalidAddress("(no digits)".to_string());
/// assert!(err.to_string().contains("no digits"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// A contact address could not be normalized into a routable form.
    /// Recipient-local; never fatal to the batch.
    #[error("Notify: invalid contact address: {0}")]
    InvalidAddress(String),

    /// The health probe reported the primary agent unreachable. Triggers
    /// the fallback path for the whole batch.
    #[error("Notify: delivery agent unreachable")]
    AgentUnreachable,

    /// The agent rejected the send, timed out, or answered without an
    /// explicit success flag. Triggers fallback for that recipient.
    #[error("Notify: primary delivery failed: {0}")]
    PrimaryDeliveryFailed(String),

    /// The fallback artifact could not be rendered or persisted. Terminal
    /// for that recipient.
    #[error("Notify: artifact persistence failed: {0}")]
    ArtifactPersistenceFailed(String),

    /// The global enable switch is off; `dispatch` short-circuits before
    /// any network attempt.
    #[error("Notify: subsystem disabled by configuration")]
    SubsystemDisabled,

    /// An HTTP request to the agent failed at the transport level
    /// (connection refused, timed out, broken stream).
    #[error("Notify: HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
