//! Ports (interfaces) for external systems.

mod audit_port;
mod broker_port;

pub use audit_port::{AuditKind, AuditRecord, AuditSink};
pub use broker_port::{
    BrokerError, BrokerPort, BrokerSession, CloseOrder, Confirmation, OpenOrder,
};
