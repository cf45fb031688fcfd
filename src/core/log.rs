//! Bounded, user-facing battle log.
//!
//! Entries are stored newest first. Each entry carries a monotonically
//! increasing sequence number so a front end can poll with `since(cursor)`
//! without missing or repeating entries (entries older than the capacity
//! are dropped).

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogKind {
    System,
    Attack,
    Critical,
    Dodge,
    Defense,
    Heal,
    Loot,
    LevelUp,
    Skill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    pub kind: LogKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BattleLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_seq: u64,
}

impl BattleLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            next_seq: 1,
        }
    }

    /// Append an entry and return its sequence number.
    pub fn push(&mut self, kind: LogKind, message: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        if self.entries.len() >= self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(LogEntry {
            seq,
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        });
        seq
    }

    /// Entries newer than `cursor`, oldest first.
    pub fn since(&self, cursor: u64) -> Vec<LogEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|entry| entry.seq > cursor)
            .cloned()
            .collect()
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Sequence number of the newest entry (0 when nothing was logged).
    pub fn cursor(&self) -> u64 {
        self.next_seq - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
