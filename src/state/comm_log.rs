use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_HISTORY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Info,
    Tx,
    Rx,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: LogKind,
    pub message: String,
}

impl LogEntry {
    fn now(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
        }
    }
}

/// Bounded history of traffic with the controller, oldest entries dropped first.
#[derive(Clone)]
pub struct CommLog {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl CommLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(MAX_HISTORY)))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, kind: LogKind, message: impl Into<String>) {
        let entry = LogEntry::now(kind, message);
        let mut entries = self.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn history(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Drop all entries, leaving a marker that the log was cleared.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.clear();
        entries.push_back(LogEntry::now(LogKind::Info, "Log cleared"));
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CommLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_entries_evicted() {
        let log = CommLog::with_capacity(3);
        for i in 0..5 {
            log.push(LogKind::Tx, format!("00 rd {i}"));
        }

        let messages: Vec<_> = log.history().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["00 rd 2", "00 rd 3", "00 rd 4"]);
    }

    #[test]
    fn test_clear_leaves_marker() {
        let log = CommLog::new();
        log.push(LogKind::Rx, "OK");
        log.clear();

        let history = log.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, LogKind::Info);
        assert_eq!(history[0].message, "Log cleared");
    }

    #[test]
    fn test_clear_is_atomic_with_concurrent_pushes() {
        let log = CommLog::new();
        let writer = {
            let log = log.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    log.push(LogKind::Tx, format!("00 rd {i}"));
                }
            })
        };

        for _ in 0..50 {
            log.clear();
            let history = log.history();
            let marker = history.iter().position(|e| e.message == "Log cleared");
            // Nothing may precede the marker left by the latest clear.
            assert_eq!(marker, Some(0), "{history:?}");
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(LogKind::Tx).unwrap(), "tx");
        assert_eq!(serde_json::to_value(LogKind::Warning).unwrap(), "warning");
    }
}
