//! Inbound webhook payload.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::identifiers::{DealId, Epic};
use crate::domain::instruction::{Instruction, InstructionKind, Side};

/// Raw webhook body as the alert source sends it. Every field is optional;
/// defaults are applied when the payload becomes an [`Instruction`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookPayload {
    /// Shared secret, checked before anything else.
    pub secret: Option<String>,
    /// Instruction type.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Alert symbol.
    pub symbol: Option<String>,
    /// Explicit instrument identifier.
    pub epic: Option<String>,
    /// Trade side.
    pub side: Option<String>,
    /// Order size.
    pub qty: Option<Decimal>,
    /// Deal to close, for dealId-based exits.
    #[serde(rename = "dealId", alias = "deal_id")]
    pub deal_id: Option<String>,
}

impl WebhookPayload {
    /// Parse a request body leniently: anything that is not a JSON object
    /// becomes an empty payload (which then fails the secret check or is
    /// acknowledged as an unknown instruction).
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    /// Apply defaults and build the validated instruction: side defaults to
    /// buy, quantity to 1, and an unrecognized (or missing) type stays as-is
    /// for the dispatcher to acknowledge.
    #[must_use]
    pub fn into_instruction(self) -> Instruction {
        Instruction {
            kind: InstructionKind::parse(self.kind.as_deref().unwrap_or_default()),
            symbol: self.symbol,
            epic: self.epic.map(Epic::new),
            side: self.side.as_deref().and_then(Side::parse).unwrap_or(Side::Buy),
            quantity: self.qty.unwrap_or(Decimal::ONE),
            deal_id: self.deal_id.map(DealId::new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_payload() {
        let payload = WebhookPayload::from_bytes(
            br#"{"secret":"S","type":"entry","symbol":"GER40","side":"sell","qty":2.5}"#,
        );
        assert_eq!(payload.secret.as_deref(), Some("S"));

        let instruction = payload.into_instruction();
        assert_eq!(instruction.kind, InstructionKind::Entry);
        assert_eq!(instruction.symbol.as_deref(), Some("GER40"));
        assert_eq!(instruction.side, Side::Sell);
        assert_eq!(instruction.quantity, Decimal::new(25, 1));
    }

    #[test]
    fn defaults_side_to_buy_and_qty_to_one() {
        let payload = WebhookPayload::from_bytes(br#"{"secret":"S","type":"entry"}"#);
        let instruction = payload.into_instruction();
        assert_eq!(instruction.side, Side::Buy);
        assert_eq!(instruction.quantity, Decimal::ONE);
    }

    #[test]
    fn side_is_case_insensitive() {
        let upper = WebhookPayload::from_bytes(br#"{"type":"entry","side":"BUY"}"#)
            .into_instruction();
        let lower = WebhookPayload::from_bytes(br#"{"type":"entry","side":"buy"}"#)
            .into_instruction();
        assert_eq!(upper.side, lower.side);
    }

    #[test]
    fn malformed_body_becomes_an_empty_payload() {
        let payload = WebhookPayload::from_bytes(b"not json at all");
        assert!(payload.secret.is_none());
        assert!(payload.kind.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let payload = WebhookPayload::from_bytes(
            br#"{"secret":"S","type":"test","interval":"5m","price":17000.5}"#,
        );
        assert_eq!(payload.secret.as_deref(), Some("S"));
        assert_eq!(payload.kind.as_deref(), Some("test"));
    }

    #[test]
    fn deal_id_accepts_both_spellings() {
        let camel = WebhookPayload::from_bytes(br#"{"type":"exit","dealId":"DI1"}"#);
        assert_eq!(camel.deal_id.as_deref(), Some("DI1"));

        let snake = WebhookPayload::from_bytes(br#"{"type":"exit","deal_id":"DI2"}"#);
        assert_eq!(snake.deal_id.as_deref(), Some("DI2"));
    }
}
