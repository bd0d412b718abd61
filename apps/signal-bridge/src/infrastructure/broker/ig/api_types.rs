//! IG API request and response types.
//!
//! These types map directly to the dealing API's wire format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::{CloseOrder, OpenOrder};
use crate::domain::identifiers::{DealId, Epic};
use crate::domain::instruction::Side;
use crate::domain::position::Position;

use super::error::IgError;

// ============================================================================
// Session Types
// ============================================================================

/// Login request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest<'a> {
    /// Account username.
    pub identifier: &'a str,
    /// Account password, sent in clear over TLS.
    pub password: &'a str,
    /// The password above is not pre-encrypted.
    pub encrypted_password: bool,
}

/// Login response body. The security tokens arrive in the response headers,
/// not here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Account the session was opened for.
    #[serde(default)]
    pub current_account_id: Option<String>,
}

// ============================================================================
// Position Types
// ============================================================================

/// Response from the positions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionsResponse {
    /// One entry per open position.
    pub positions: Vec<PositionEntry>,
}

/// One `{market, position}` pair from the positions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionEntry {
    /// Instrument descriptor.
    pub market: PositionMarket,
    /// The open position itself.
    pub position: PositionDetail,
}

/// Instrument descriptor attached to a position.
///
/// Carries the broker's full descriptor for debugging even where only the
/// epic and expiry are consumed.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
#[serde(rename_all = "camelCase")]
pub struct PositionMarket {
    /// Instrument identifier.
    pub epic: String,
    /// Contract expiry tag.
    pub expiry: String,
    /// Human-readable instrument name.
    #[serde(default)]
    pub instrument_name: Option<String>,
}

/// Broker-side position fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDetail {
    /// Deal identifier.
    pub deal_id: String,
    /// Direction the position was opened with ("BUY"/"SELL").
    pub direction: String,
    /// Position size.
    pub size: Decimal,
    /// Position currency.
    pub currency: String,
}

impl PositionEntry {
    /// Convert to the domain position model.
    pub fn to_position(&self) -> Result<Position, IgError> {
        let direction = Side::parse(&self.position.direction).ok_or_else(|| {
            IgError::UnexpectedPayload(format!(
                "unknown position direction {:?}",
                self.position.direction
            ))
        })?;

        Ok(Position {
            deal_id: DealId::new(&self.position.deal_id),
            epic: Epic::new(&self.market.epic),
            direction,
            size: self.position.size,
            currency: self.position.currency.clone(),
            expiry: self.market.expiry.clone(),
        })
    }
}

// ============================================================================
// Order Types
// ============================================================================

/// OTC market order opening a position.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOtcRequest {
    /// Instrument identifier.
    pub epic: String,
    /// Contract expiry tag.
    pub expiry: String,
    /// Order direction.
    pub direction: String,
    /// Order size.
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    /// Always "MARKET".
    pub order_type: String,
    /// Order currency code.
    pub currency_code: String,
    /// Open a new position instead of netting against an opposite one.
    pub force_open: bool,
    /// Never request a guaranteed stop.
    pub guaranteed_stop: bool,
}

impl OpenOtcRequest {
    /// Build the wire request for an open order.
    #[must_use]
    pub fn from_order(order: &OpenOrder) -> Self {
        Self {
            epic: order.epic.as_str().to_string(),
            expiry: order.expiry.clone(),
            direction: order.direction.as_wire().to_string(),
            size: order.size,
            order_type: "MARKET".to_string(),
            currency_code: order.currency.clone(),
            force_open: true,
            guaranteed_stop: false,
        }
    }
}

/// OTC market order closing (part of) a deal. Sent through the same endpoint
/// as opens, with the close verb emulated by a method-override header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseOtcRequest {
    /// Deal to close.
    pub deal_id: String,
    /// Closing direction (inverse of the open direction).
    pub direction: String,
    /// Size to close.
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    /// Always "MARKET".
    pub order_type: String,
    /// Order currency code.
    pub currency_code: String,
    /// Contract expiry tag.
    pub expiry: String,
    /// Net against the open deal rather than opening a new one.
    pub force_open: bool,
}

impl CloseOtcRequest {
    /// Build the wire request for a close order.
    #[must_use]
    pub fn from_order(order: &CloseOrder) -> Self {
        Self {
            deal_id: order.deal_id.as_str().to_string(),
            direction: order.direction.as_wire().to_string(),
            size: order.size,
            order_type: "MARKET".to_string(),
            currency_code: order.currency.clone(),
            expiry: order.expiry.clone(),
            force_open: false,
        }
    }
}

/// Response from the order endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealReferenceResponse {
    /// Reference for the submitted order.
    pub deal_reference: String,
}

/// Response from the confirms endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    /// Deal id assigned once the order executed.
    #[serde(default)]
    pub deal_id: Option<String>,
    /// Deal status (e.g. "ACCEPTED", "REJECTED").
    #[serde(default)]
    pub deal_status: Option<String>,
    /// Rejection reason tag, when present.
    #[serde(default)]
    pub reason: Option<String>,
}
