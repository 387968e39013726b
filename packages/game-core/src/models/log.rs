use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::Phase;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub round: u32,
    pub phase: Phase,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only public narration log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameLog {
    entries: Vec<LogEntry>,
}

impl GameLog {
    pub fn push(&mut self, round: u32, phase: Phase, message: impl Into<String>) {
        self.entries.push(LogEntry {
            round,
            phase,
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn tail(&self, n: usize) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
