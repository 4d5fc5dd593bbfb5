//! Bounded, newest-first log of delivery outcomes.
//!
//! The log is constructor-injected into the dispatcher rather than living
//! as process-wide state, so tests and multi-tenant embeddings each get an
//! isolated history. Entries are append/evict-only and never mutated once
//! recorded.

use std::collections::VecDeque;

use tokio::sync::RwLock;

use hookwire_core::DeliveryRecord;

/// In-memory delivery history with a fixed capacity.
///
/// New records are inserted at the front; once the log exceeds its
/// capacity the oldest entry at the tail is evicted. Intended for a
/// settings or debugging surface that polls `recent()` periodically.
#[derive(Debug)]
pub struct DeliveryLog {
    entries: RwLock<VecDeque<DeliveryRecord>>,
    capacity: usize,
}

impl DeliveryLog {
    /// Creates an empty log with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(crate::DELIVERY_LOG_CAPACITY)
    }

    /// Creates an empty log holding at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: RwLock::new(VecDeque::with_capacity(capacity)), capacity }
    }

    /// Appends a completed delivery record, evicting the oldest entry when
    /// the log is full.
    pub async fn record(&self, entry: DeliveryRecord) {
        let mut entries = self.entries.write().await;
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Snapshot of recorded deliveries, most recent first.
    pub async fn recent(&self) -> Vec<DeliveryRecord> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the log holds no records.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Removes all recorded deliveries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

impl Default for DeliveryLog {
    fn default() -> Self {
        Self::new()
    }
}
