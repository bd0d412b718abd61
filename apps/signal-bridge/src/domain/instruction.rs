//! Inbound trade instruction.
//!
//! An instruction is immutable once received. The front end builds it from
//! the webhook payload (applying defaults) and hands it to the dispatcher.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::identifiers::{DealId, Epic};

/// What the alert source asks the bridge to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionKind {
    /// Connectivity check; acknowledged, never reaches the broker.
    Test,
    /// List currently open positions.
    Positions,
    /// Open a market position on the resolved instrument.
    Entry,
    /// Close open positions on the resolved instrument (or one deal).
    Exit,
    /// Anything else; acknowledged and ignored, not an error.
    #[serde(untagged)]
    Other(String),
}

impl InstructionKind {
    /// Parse an instruction kind from the webhook `type` field.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "test" => Self::Test,
            "positions" => Self::Positions,
            "entry" => Self::Entry,
            "exit" => Self::Exit,
            other => Self::Other(other.to_string()),
        }
    }

    /// Tag used in audit records and responses.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Test => "test",
            Self::Positions => "positions",
            Self::Entry => "entry",
            Self::Exit => "exit",
            Self::Other(other) => other,
        }
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Long.
    Buy,
    /// Short.
    Sell,
}

impl Side {
    /// Parse a side, case-insensitively. Returns `None` for anything that is
    /// neither buy nor sell.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }

    /// The opposite direction. Closing a deal always trades against the
    /// direction it was opened with.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Wire representation expected by the broker.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// A validated inbound instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    /// Instruction kind.
    pub kind: InstructionKind,
    /// Alert symbol, if supplied (e.g. "GER40").
    pub symbol: Option<String>,
    /// Explicit broker instrument identifier, if supplied.
    pub epic: Option<Epic>,
    /// Trade direction (defaults to buy upstream).
    pub side: Side,
    /// Order size (defaults to 1 upstream).
    pub quantity: Decimal,
    /// Explicit deal to close, for dealId-based exits.
    pub deal_id: Option<DealId>,
}

impl Instruction {
    /// The symbol-or-epic input as given, for error reporting.
    #[must_use]
    pub fn instrument_input(&self) -> String {
        self.epic
            .as_ref()
            .map(|e| e.as_str().to_string())
            .or_else(|| self.symbol.clone())
            .unwrap_or_default()
    }
}
