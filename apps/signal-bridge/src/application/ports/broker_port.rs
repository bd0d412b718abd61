//! Broker Port (Driven Port)
//!
//! Interface for the brokerage: session login, position listing, and market
//! order execution. One implementation talks to the real broker; tests
//! substitute mocks.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::DispatchError;
use crate::domain::identifiers::{AccountId, DealId, DealReference, Epic};
use crate::domain::instruction::Side;
use crate::domain::position::Position;

/// Short-lived broker credentials for one invocation.
///
/// Created fresh per instruction, discarded when the invocation completes,
/// never persisted. Both tokens are always present; a login that cannot
/// produce both fails instead of returning a partial session.
#[derive(Clone)]
pub struct BrokerSession {
    cst: String,
    security_token: String,
    account_id: Option<AccountId>,
}

impl BrokerSession {
    /// Assemble a session from the two login tokens.
    #[must_use]
    pub fn new(
        cst: impl Into<String>,
        security_token: impl Into<String>,
        account_id: Option<AccountId>,
    ) -> Self {
        Self {
            cst: cst.into(),
            security_token: security_token.into(),
            account_id,
        }
    }

    /// Client session token, sent on every authenticated call.
    #[must_use]
    pub fn cst(&self) -> &str {
        &self.cst
    }

    /// Account security token, sent on every authenticated call.
    #[must_use]
    pub fn security_token(&self) -> &str {
        &self.security_token
    }

    /// Account the session was opened for, when the broker reports it.
    #[must_use]
    pub const fn account_id(&self) -> Option<&AccountId> {
        self.account_id.as_ref()
    }
}

// Tokens are credentials; keep them out of logs and debug output.
impl fmt::Debug for BrokerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerSession")
            .field("cst", &"<redacted>")
            .field("security_token", &"<redacted>")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// A market order opening a new position.
///
/// Always force-open, never with a guaranteed stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrder {
    /// Instrument to trade.
    pub epic: Epic,
    /// Direction.
    pub direction: Side,
    /// Order size.
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    /// Order currency code.
    pub currency: String,
    /// Contract expiry tag.
    pub expiry: String,
}

/// A market order closing (part of) an existing deal.
///
/// `direction` must be the opposite of the direction the deal was opened
/// with; the caller is responsible for the inversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseOrder {
    /// Deal to close.
    pub deal_id: DealId,
    /// Closing direction (inverse of the open direction).
    pub direction: Side,
    /// Size to close.
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    /// Order currency code.
    pub currency: String,
    /// Contract expiry tag.
    pub expiry: String,
}

/// Broker acknowledgment of an executed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    /// Reference assigned by the order endpoint.
    pub deal_reference: DealReference,
    /// Deal id from the confirms endpoint, when the fetch succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<DealId>,
    /// Deal status from the confirms endpoint (e.g. "ACCEPTED").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Broker reason tag, populated on rejected confirmations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Confirmation {
    /// A confirmation carrying only the deal reference, used when the
    /// confirms fetch fails after a successful submit.
    #[must_use]
    pub const fn reference_only(deal_reference: DealReference) -> Self {
        Self {
            deal_reference,
            deal_id: None,
            status: None,
            reason: None,
        }
    }
}

/// Broker port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrokerError {
    /// Login failed, or did not yield both security tokens.
    #[error("authentication failed: {message}")]
    Auth {
        /// Error details (never credentials).
        message: String,
        /// Login response status, when one was received.
        status: Option<u16>,
    },

    /// The broker answered with a non-success status.
    #[error("request rejected: HTTP {status}: {body}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Connection-level failure (refused, timeout, undecodable body).
    #[error("broker connection error: {message}")]
    Connection {
        /// Error details.
        message: String,
    },
}

impl BrokerError {
    /// Map a failed open/close call into the dispatch taxonomy. A broker
    /// rejection keeps its status and body verbatim.
    #[must_use]
    pub fn into_order_error(self) -> DispatchError {
        match self {
            Self::Auth { message, status } => DispatchError::Auth { message, status },
            Self::Rejected { status, body } => DispatchError::OrderRejected { status, body },
            Self::Connection { message } => DispatchError::Broker { message },
        }
    }

    /// Map a failed query (positions listing) into the dispatch taxonomy.
    /// Rejections of reads are broker failures, not order rejections.
    #[must_use]
    pub fn into_query_error(self) -> DispatchError {
        match self {
            Self::Auth { message, status } => DispatchError::Auth { message, status },
            Self::Rejected { status, body } => DispatchError::Broker {
                message: format!("HTTP {status}: {body}"),
            },
            Self::Connection { message } => DispatchError::Broker { message },
        }
    }
}

/// Port for broker interactions.
///
/// Every implementation performs a fresh login per call to `login`; whether
/// sessions could be cached is an implementation policy hidden behind this
/// trait.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Authenticate and return a fresh session.
    async fn login(&self) -> Result<BrokerSession, BrokerError>;

    /// List all open positions on the account.
    async fn open_positions(&self, session: &BrokerSession)
    -> Result<Vec<Position>, BrokerError>;

    /// Open a market position.
    async fn open_market(
        &self,
        session: &BrokerSession,
        order: &OpenOrder,
    ) -> Result<Confirmation, BrokerError>;

    /// Close (part of) an existing deal at market.
    async fn close_deal(
        &self,
        session: &BrokerSession,
        order: &CloseOrder,
    ) -> Result<Confirmation, BrokerError>;
}
