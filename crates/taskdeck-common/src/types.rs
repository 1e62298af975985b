use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A task event that should be announced to one or more users.
///
/// Each variant carries exactly the fields its message template needs.
/// Payloads are immutable once constructed; the dispatcher never mutates
/// them. Timestamps are caller-supplied so that rendering stays
/// deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    TaskAssigned {
        title: String,
        description: String,
        due_date: NaiveDate,
        assignee_name: String,
        assigner_name: String,
    },
    TaskReminder {
        title: String,
        due_date: NaiveDate,
    },
    TaskStatusChanged {
        title: String,
        old_status: String,
        new_status: String,
        changed_by: String,
    },
    TaskCompleted {
        title: String,
        completed_by: String,
    },
    TaskRevoked {
        title: String,
        revoked_by: String,
    },
    NewMessage {
        sender_name: String,
        body: String,
    },
    NewNotice {
        title: String,
        body: String,
        important: bool,
    },
    AdminBroadcast {
        body: String,
        sent_at: DateTime<Utc>,
    },
}

impl NotificationEvent {
    /// Short tag used in logs (e.g., `"task_assigned"`).
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::TaskAssigned { .. } => "task_assigned",
            NotificationEvent::TaskReminder { .. } => "task_reminder",
            NotificationEvent::TaskStatusChanged { .. } => "task_status_changed",
            NotificationEvent::TaskCompleted { .. } => "task_completed",
            NotificationEvent::TaskRevoked { .. } => "task_revoked",
            NotificationEvent::NewMessage { .. } => "new_message",
            NotificationEvent::NewNotice { .. } => "new_notice",
            NotificationEvent::AdminBroadcast { .. } => "admin_broadcast",
        }
    }
}

/// A delivery target: one user, with whatever contact address their record
/// carries. A recipient without an address is skipped, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl Recipient {
    pub fn new(id: &str, display_name: &str, address: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            address: address.map(|a| a.to_string()),
        }
    }
}

/// A contact address that has been through normalization and is safe to
/// hand to a delivery channel. Digits only, routing prefix applied.
///
/// # Examples
///
/// ```
/// use taskdeck_common::types::NormalizedAddress;
///
/// let addr = NormalizedAddress::new_unchecked("919876543210");
/// assert_eq!(addr.as_str(), "919876543210");
/// assert_eq!(addr.to_string(), "919876543210");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedAddress(String);

impl NormalizedAddress {
    /// Wraps an already-normalized string. Callers outside the normalizer
    /// should obtain addresses through `address::normalize` instead.
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What happened for one recipient in one dispatch batch.
///
/// `Queued` means a fallback artifact was produced; it does NOT confirm the
/// user received anything. Only `Delivered` carries that confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// The primary agent accepted the message.
    Delivered,
    /// A fallback artifact was produced; delivery needs manual follow-through.
    Queued { artifact_path: String },
    /// The recipient was not attempted (no address, invalid address,
    /// missing user record).
    Skipped { reason: String },
    /// Both paths failed, or the dispatch deadline elapsed first.
    Failed { reason: String },
}

impl DeliveryOutcome {
    /// `true` for outcomes where a message went "out" in some form.
    pub fn is_out(&self) -> bool {
        matches!(
            self,
            DeliveryOutcome::Delivered | DeliveryOutcome::Queued { .. }
        )
    }
}

/// One recipient's outcome, correlated to the input list by `recipient_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientOutcome {
    pub recipient_id: String,
    pub outcome: DeliveryOutcome,
}

/// Aggregate result of one dispatch batch.
///
/// `outcomes` preserves a 1:1, input-ordered mapping from recipients to
/// outcomes regardless of completion order. Callers can distinguish "fully
/// delivered", "queued behind fallback artifacts", "partial", and "entirely
/// failed" from the per-recipient detail; `any_delivered` is only the coarse
/// summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    pub any_delivered: bool,
    pub outcomes: Vec<RecipientOutcome>,
    pub artifacts: Vec<DeliveryArtifact>,
}

impl DispatchResult {
    /// Success-shaped empty result, used when the subsystem is disabled or
    /// the recipient list is empty.
    pub fn empty() -> Self {
        Self {
            any_delivered: false,
            outcomes: Vec::new(),
            artifacts: Vec::new(),
        }
    }
}

/// A scannable fallback artifact: QR code file plus the message it embeds.
///
/// Created by the fallback channel, retained in the bounded artifact log,
/// read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryArtifact {
    pub address: NormalizedAddress,
    /// Public path the UI can serve the artifact from.
    pub artifact_path: String,
    pub rendered_message: String,
    pub created_at: DateTime<Utc>,
}

/// Reachability of the primary delivery agent, computed once per dispatch
/// batch and never cached across batches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthState {
    pub reachable: bool,
    pub checked_at: DateTime<Utc>,
}
