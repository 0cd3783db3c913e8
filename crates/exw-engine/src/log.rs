use exw_schemas::{LogEntry, Severity};

/// Append-only human-readable session log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ts_ms: u64, severity: Severity, message: impl Into<String>) {
        self.entries.push(LogEntry::new(ts_ms, severity, message));
    }

    /// Arrival order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }
}
