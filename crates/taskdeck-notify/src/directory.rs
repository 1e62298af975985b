//! Narrow view onto the user store.
//!
//! The persistence layer is an external collaborator; the dispatcher only
//! needs to turn user ids into delivery targets. A missing record or a
//! record without a contact address becomes a skipped recipient, never an
//! error.

use async_trait::async_trait;
use taskdeck_common::types::Recipient;

/// What the dispatcher needs from a user record.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
}

/// Record lookup keyed by user id, implemented by the persistence layer.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Option<UserRecord>;
}

/// Resolves user ids into recipients, one per input id, in input order.
///
/// Ids with no record resolve to an address-less recipient so the
/// dispatcher reports them as skipped rather than silently dropping them.
pub async fn resolve_recipients(directory: &dyn UserDirectory, ids: &[String]) -> Vec<Recipient> {
    let mut recipients = Vec::with_capacity(ids.len());
    for id in ids {
        match directory.find_by_id(id).await {
            Some(record) => recipients.push(Recipient {
                id: record.id,
                display_name: record.name,
                address: record.phone,
            }),
            None => recipients.push(Recipient {
                id: id.clone(),
                display_name: id.clone(),
                address: None,
            }),
        }
    }
    recipients
}
