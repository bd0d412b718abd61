// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Signal Bridge - Rust Core Library
//!
//! Bridges an external alert source to a session-authenticated broker REST
//! API: each validated instruction triggers a fresh broker login, instrument
//! resolution, and a market open or close, with every step appended to an
//! audit log.
//!
//! # Architecture
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: instruction and position models, error taxonomy
//!   - `instruction`: inbound trade instruction, side parsing and inversion
//!   - `position`: open position as reported live by the broker
//!   - `errors`: one tagged variant per failure kind
//!
//! - **Application**: orchestration over ports
//!   - `ports`: interfaces for external systems (`BrokerPort`, `AuditSink`)
//!   - `dispatcher`: sequences login → resolve → order/reconcile per
//!     instruction kind
//!   - `resolver`: symbol → instrument identifier resolution
//!   - `reconciler`: close-all-on-instrument semantics
//!
//! - **Infrastructure**: adapters (implementations)
//!   - `broker::ig`: IG-style REST adapter (header-token sessions, OTC
//!     market orders, method-override close)
//!   - `audit`: JSON Lines sink, in-memory sink
//!   - `http`: axum webhook controller

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - instruction and position models, error taxonomy.
pub mod domain;

/// Application layer - dispatcher, resolver, reconciler, port definitions.
pub mod application;

/// Infrastructure layer - broker, audit, and HTTP adapters.
pub mod infrastructure;

/// Environment-sourced process configuration, built once at startup.
pub mod config;

// Domain re-exports
pub use domain::errors::DispatchError;
pub use domain::identifiers::{AccountId, DealId, DealReference, Epic};
pub use domain::instruction::{Instruction, InstructionKind, Side};
pub use domain::position::Position;

// Application re-exports
pub use application::dispatcher::{DispatchOutcome, Dispatcher, EntryDirection, OrderDefaults};
pub use application::ports::{
    AuditKind, AuditRecord, AuditSink, BrokerError, BrokerPort, BrokerSession, CloseOrder,
    Confirmation, OpenOrder,
};
pub use application::reconciler::{CloseReport, DealCloseResult, PositionReconciler};
pub use application::resolver::EpicResolver;

// Infrastructure re-exports
pub use infrastructure::audit::{InMemoryAuditLog, JsonlAuditLog};
pub use infrastructure::broker::ig::{IgBrokerAdapter, IgConfig, IgEnvironment, IgError};
pub use infrastructure::http::{AppState, create_router};

pub use config::{BridgeConfig, ConfigError};
