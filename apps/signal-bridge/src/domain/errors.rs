//! Error taxonomy for instruction dispatch.
//!
//! One variant per failure kind so callers branch on kind rather than
//! matching message strings. Broker rejection bodies are carried verbatim.

use thiserror::Error;

/// A dispatch failure, reported synchronously to the caller and recorded in
/// the audit log. Nothing in here is retried internally.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Login failed, or succeeded at the transport level without yielding
    /// both security tokens.
    #[error("authentication failed: {message}")]
    Auth {
        /// What went wrong (never includes credentials).
        message: String,
        /// HTTP status of the login response, when one was received.
        status: Option<u16>,
    },

    /// No instrument was derivable from the instruction.
    #[error("no instrument resolvable from {input:?}")]
    UnresolvedInstrument {
        /// The symbol or epic input as given.
        input: String,
    },

    /// The broker rejected an open or close request.
    #[error("order rejected: HTTP {status}: {body}")]
    OrderRejected {
        /// HTTP status of the rejection.
        status: u16,
        /// Broker response body, verbatim.
        body: String,
    },

    /// An exit was requested but no matching open position exists.
    #[error("no open position matching {target}")]
    NoOpenPosition {
        /// The epic or deal id the exit targeted.
        target: String,
    },

    /// A broker call failed below the HTTP-response level (connection
    /// refused, timeout, undecodable body).
    #[error("broker call failed: {message}")]
    Broker {
        /// Error details.
        message: String,
    },
}

impl DispatchError {
    /// Stable kind tag for responses and audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth_failed",
            Self::UnresolvedInstrument { .. } => "unresolved_instrument",
            Self::OrderRejected { .. } => "order_rejected",
            Self::NoOpenPosition { .. } => "no_open_position",
            Self::Broker { .. } => "broker_error",
        }
    }
}
