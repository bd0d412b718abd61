//! Position reconciliation: "close all open positions on an instrument".
//!
//! The reconciler lists live positions, picks the ones matching the target,
//! and closes each against its recorded open direction. Partial failures are
//! surfaced per deal rather than collapsed into one status.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DispatchError;
use crate::domain::identifiers::{DealId, DealReference, Epic};
use crate::domain::instruction::Side;
use crate::domain::position::Position;

use super::ports::{BrokerError, BrokerPort, BrokerSession, CloseOrder};

/// Outcome of one close attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealCloseResult {
    /// Deal the close targeted.
    pub deal_id: DealId,
    /// Direction the close was issued with (inverse of the open direction).
    pub direction: Side,
    /// Whether the broker accepted the close.
    pub ok: bool,
    /// Deal reference of the closing order, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_reference: Option<DealReference>,
    /// Broker error, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated outcome of an exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseReport {
    /// Number of deals the broker accepted a close for.
    pub closed_count: usize,
    /// Per-deal detail, in the order the broker reported the positions.
    pub deals: Vec<DealCloseResult>,
}

impl CloseReport {
    /// True when every targeted deal closed.
    #[must_use]
    pub fn all_closed(&self) -> bool {
        self.closed_count == self.deals.len()
    }
}

/// Closes open positions through the order gateway.
pub struct PositionReconciler<B: BrokerPort> {
    broker: Arc<B>,
}

impl<B: BrokerPort> PositionReconciler<B> {
    /// Create a reconciler over a broker port.
    pub fn new(broker: Arc<B>) -> Self {
        Self { broker }
    }

    /// Close every open position on `epic`.
    ///
    /// Zero matches is an error (an exit was requested with nothing to
    /// close), not a silent success. With N matches, exactly N close calls
    /// are issued; each failure is recorded per deal.
    pub async fn close_all_for_instrument(
        &self,
        session: &BrokerSession,
        epic: &Epic,
    ) -> Result<CloseReport, DispatchError> {
        let matching: Vec<Position> = self
            .list_positions(session)
            .await?
            .into_iter()
            .filter(|p| &p.epic == epic)
            .collect();

        if matching.is_empty() {
            return Err(DispatchError::NoOpenPosition {
                target: epic.as_str().to_string(),
            });
        }

        Ok(self.close_positions(session, matching).await)
    }

    /// Close the single deal identified by `deal_id`.
    ///
    /// The live position list supplies the open direction and size to
    /// invert; an unknown deal id means there is nothing to close.
    pub async fn close_single_deal(
        &self,
        session: &BrokerSession,
        deal_id: &DealId,
    ) -> Result<CloseReport, DispatchError> {
        let position = self
            .list_positions(session)
            .await?
            .into_iter()
            .find(|p| &p.deal_id == deal_id)
            .ok_or_else(|| DispatchError::NoOpenPosition {
                target: deal_id.as_str().to_string(),
            })?;

        Ok(self.close_positions(session, vec![position]).await)
    }

    /// First open position on `epic`, in whatever order the broker reports
    /// them. No ordering guarantee is assumed or required.
    pub async fn first_match_for_instrument(
        &self,
        session: &BrokerSession,
        epic: &Epic,
    ) -> Result<Option<Position>, DispatchError> {
        Ok(self
            .list_positions(session)
            .await?
            .into_iter()
            .find(|p| &p.epic == epic))
    }

    async fn list_positions(
        &self,
        session: &BrokerSession,
    ) -> Result<Vec<Position>, DispatchError> {
        self.broker
            .open_positions(session)
            .await
            .map_err(BrokerError::into_query_error)
    }

    async fn close_positions(
        &self,
        session: &BrokerSession,
        positions: Vec<Position>,
    ) -> CloseReport {
        let mut deals = Vec::with_capacity(positions.len());
        let mut closed_count = 0;

        for position in positions {
            let direction = position.closing_direction();
            let order = CloseOrder {
                deal_id: position.deal_id.clone(),
                direction,
                size: position.size,
                currency: position.currency.clone(),
                expiry: position.expiry.clone(),
            };

            match self.broker.close_deal(session, &order).await {
                Ok(confirmation) => {
                    closed_count += 1;
                    deals.push(DealCloseResult {
                        deal_id: position.deal_id,
                        direction,
                        ok: true,
                        deal_reference: Some(confirmation.deal_reference),
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        deal_id = %position.deal_id,
                        error = %err,
                        "Close rejected"
                    );
                    deals.push(DealCloseResult {
                        deal_id: position.deal_id,
                        direction,
                        ok: false,
                        deal_reference: None,
                        error: Some(err.into_order_error().to_string()),
                    });
                }
            }
        }

        CloseReport {
            closed_count,
            deals,
        }
    }
}
