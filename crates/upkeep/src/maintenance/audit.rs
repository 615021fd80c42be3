//! Bounded, append-only log of classification decisions.
//!
//! Process-wide state with no persistence guarantee: entries are lost on
//! restart. Operators read it to review what the classifier decided and which
//! vendors it was allowed to pick from.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ClassificationResult, VendorSummary};

/// Default number of entries returned by [`ClassificationAuditLog::recent`].
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Default retention cap. Oldest entries are evicted past this point.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Immutable record of one classification decision and its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub timestamp: DateTime<Utc>,
    pub request_title: String,
    pub request_description: String,
    pub classification: ClassificationResult,
    pub available_vendors: Vec<VendorSummary>,
}

/// Size-capped deque guarded by a mutex. Appends are O(1) and never fail;
/// readers get a snapshot and never block appenders for long.
#[derive(Debug)]
pub struct ClassificationAuditLog {
    entries: Mutex<VecDeque<AuditLogEntry>>,
    capacity: usize,
}

impl Default for ClassificationAuditLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ClassificationAuditLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn append(&self, entry: AuditLogEntry) {
        let mut entries = self.entries.lock().expect("audit log mutex poisoned");
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Up to `limit` most recent entries, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<AuditLogEntry> {
        let entries = self.entries.lock().expect("audit log mutex poisoned");
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("audit log mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
