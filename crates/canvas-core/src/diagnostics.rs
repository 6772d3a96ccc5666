//! Passive diagnostic stream.
//!
//! Nothing here affects layout; the log only exists to explain failures
//! reported from the field, so it is bounded and cheap to append to.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 200;
/// A pass slower than one 60Hz frame is worth recording.
pub const SLOW_PASS_MS: f64 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Error,
    Warning,
    Info,
    Dom,
    Performance,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticEntry {
    pub timestamp_ms: f64,
    pub kind: DiagnosticKind,
    pub component: String,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct DiagnosticLog {
    entries: VecDeque<DiagnosticEntry>,
    capacity: usize,
    dropped: u64,
    error_count: u64,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl DiagnosticLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
            error_count: 0,
        }
    }

    pub fn record(
        &mut self,
        timestamp_ms: f64,
        kind: DiagnosticKind,
        component: &str,
        message: impl Into<String>,
    ) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        if kind == DiagnosticKind::Error {
            self.error_count += 1;
        }
        self.entries.push_back(DiagnosticEntry {
            timestamp_ms,
            kind,
            component: component.to_string(),
            message: message.into(),
        });
    }

    /// Records a performance entry only when `duration_ms` is slow.
    pub fn record_pass_duration(&mut self, timestamp_ms: f64, component: &str, duration_ms: f64) -> bool {
        if duration_ms <= SLOW_PASS_MS {
            return false;
        }
        self.record(
            timestamp_ms,
            DiagnosticKind::Performance,
            component,
            format!("slow pass: {:.1}ms", duration_ms),
        );
        true
    }

    /// Records a browser-reported task (`longtask`, `measure`) that ran
    /// longer than `threshold_ms`.
    pub fn record_long_task(
        &mut self,
        timestamp_ms: f64,
        entry_type: &str,
        name: &str,
        duration_ms: f64,
        threshold_ms: f64,
    ) -> bool {
        if !duration_ms.is_finite() || duration_ms <= threshold_ms {
            return false;
        }
        self.record(
            timestamp_ms,
            DiagnosticKind::Performance,
            entry_type,
            format!("long task {}: {:.1}ms", name, duration_ms),
        );
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = &DiagnosticEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dropped = 0;
        self.error_count = 0;
    }

    pub fn to_json(&self) -> String {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Export<'a> {
            dropped: u64,
            error_count: u64,
            entries: Vec<&'a DiagnosticEntry>,
        }
        let export = Export {
            dropped: self.dropped,
            error_count: self.error_count,
            entries: self.entries.iter().collect(),
        };
        serde_json::to_string(&export).unwrap_or_else(|_| "{}".to_string())
    }

    /// Restore entries persisted by a previous session, oldest first.
    pub fn restore(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Import {
            #[serde(default)]
            dropped: u64,
            entries: Vec<DiagnosticEntry>,
        }
        let import: Import = serde_json::from_str(json)?;
        let n = import.entries.len();
        self.dropped += import.dropped;
        for entry in import.entries {
            if self.entries.len() == self.capacity {
                self.entries.pop_front();
                self.dropped += 1;
            }
            if entry.kind == DiagnosticKind::Error {
                self.error_count += 1;
            }
            self.entries.push_back(entry);
        }
        Ok(n)
    }
}
