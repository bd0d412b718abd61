//! Open position as reported live by the broker.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::identifiers::{DealId, Epic};
use super::instruction::Side;

/// One open position. Sourced from the broker on every query, never cached;
/// identity is the deal id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Broker deal identifier.
    pub deal_id: DealId,
    /// Instrument the position is held on.
    pub epic: Epic,
    /// Direction the position was opened with.
    pub direction: Side,
    /// Position size.
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    /// Position currency.
    pub currency: String,
    /// Contract expiry tag ("-" for cash instruments).
    pub expiry: String,
}

impl Position {
    /// Direction a close order for this position must carry.
    #[must_use]
    pub const fn closing_direction(&self) -> Side {
        self.direction.opposite()
    }
}
