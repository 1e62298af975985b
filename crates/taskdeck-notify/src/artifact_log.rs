//! Bounded in-process retention of fallback artifacts.

use std::collections::VecDeque;
use std::sync::RwLock;
use taskdeck_common::types::DeliveryArtifact;

/// Process-wide log of fallback artifacts for operator inspection.
///
/// Bounded: once `retention` entries are held, appending evicts the oldest.
/// A `RwLock` keeps reads from queueing behind each other; the only write
/// is a single in-memory mutation, so readers never wait on I/O.
pub struct ArtifactLog {
    retention: usize,
    entries: RwLock<VecDeque<DeliveryArtifact>>,
}

impl ArtifactLog {
    pub fn new(retention: usize) -> Self {
        Self {
            retention,
            entries: RwLock::new(VecDeque::with_capacity(retention.min(64))),
        }
    }

    pub fn append(&self, artifact: DeliveryArtifact) {
        let mut entries = self.entries.write().unwrap();
        if entries.len() >= self.retention {
            entries.pop_front();
        }
        entries.push_back(artifact);
    }

    /// Up to `limit` most recent artifacts, newest first.
    pub fn recent(&self, limit: usize) -> Vec<DeliveryArtifact> {
        let entries = self.entries.read().unwrap();
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
