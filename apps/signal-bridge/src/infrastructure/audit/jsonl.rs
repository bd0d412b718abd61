//! JSON Lines audit sink.
//!
//! One self-contained JSON record per line, appended with a single write so
//! concurrent appends never interleave within a record. Write failures are
//! swallowed: the audit trail is advisory to the trading path, and a broken
//! sink must never abort an order.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::application::ports::{AuditRecord, AuditSink};

/// Append-only JSON Lines file sink.
pub struct JsonlAuditLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonlAuditLog {
    /// Create a sink writing to `path`. The file is opened lazily on the
    /// first append and created if absent.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    /// The configured log location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, line: &[u8]) -> std::io::Result<()> {
        let mut guard = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            *guard = Some(file);
        }

        if let Some(file) = guard.as_mut() {
            // One write per record keeps concurrent appends atomic.
            if let Err(err) = file.write_all(line) {
                // Drop the handle so the next append reopens fresh.
                *guard = None;
                return Err(err);
            }
        }
        Ok(())
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&self, record: AuditRecord) {
        let mut line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "Audit record failed to serialize, dropping");
                return;
            }
        };
        line.push('\n');

        if let Err(err) = self.write_line(line.as_bytes()) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "Audit append failed, dropping record"
            );
        }
    }
}
