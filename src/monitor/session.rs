//! Per-session history types.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::ocr::ParsedFields;

/// Number of entries kept per session. Older entries are evicted first.
pub const HISTORY_CAPACITY: usize = 10;

/// Result of one successful monitoring tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub fields: ParsedFields,
    pub raw_text: String,
    pub timestamp: DateTime<Local>,
}

/// Published to subscribers after each successful tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionEvent {
    pub session_id: String,
    pub entry: HistoryEntry,
}

/// Sliding window of the most recent entries, oldest first.
#[derive(Clone, Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest when full. A zero-capacity
    /// history keeps nothing.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies the entries out in chronological order.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}
