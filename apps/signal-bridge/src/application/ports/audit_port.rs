//! Audit Port (Driven Port)
//!
//! Append-only sink for every inbound instruction and broker interaction.
//! Logging is strictly advisory to the trading path: `append` is infallible
//! by contract, and sink implementations swallow their own write failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// An inbound instruction, recorded before dispatch branches.
    Instruction,
    /// A broker login attempt.
    Login,
    /// An open-order attempt.
    OpenOrder,
    /// A close-order attempt.
    CloseOrder,
    /// A positions listing attempt.
    Positions,
    /// A deal confirmation fetch.
    Confirm,
    /// The outbound result, recorded before returning to the caller.
    Outcome,
}

/// One immutable audit record.
///
/// Timestamps are server-assigned at construction; records are ordered by
/// write time in the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record id.
    pub id: Uuid,
    /// UTC timestamp assigned when the record was created.
    pub timestamp: DateTime<Utc>,
    /// Kind tag.
    pub kind: AuditKind,
    /// Operation-specific fields (status, payload, body, ...).
    #[serde(flatten)]
    pub fields: serde_json::Value,
}

impl AuditRecord {
    /// Create a record with a fresh id and the current UTC time.
    ///
    /// `fields` should be a JSON object; its entries are flattened into the
    /// serialized record.
    #[must_use]
    pub fn new(kind: AuditKind, fields: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            fields,
        }
    }
}

/// Sink for audit records.
///
/// Implementations must never propagate write failures to the caller; a
/// failed append is surfaced only through a best-effort side channel (a
/// `tracing` warning).
pub trait AuditSink: Send + Sync {
    /// Append one record.
    fn append(&self, record: AuditRecord);
}
