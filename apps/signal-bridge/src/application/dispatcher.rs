//! Core dispatcher: sequences broker calls per instruction kind.
//!
//! State machine over the instruction type, terminal on the first applicable
//! branch. Every branch writes an inbound-instruction audit record before
//! branching and an outbound-result record before returning. Unknown
//! instruction kinds are acknowledged and ignored, never errors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::errors::DispatchError;
use crate::domain::instruction::{Instruction, InstructionKind, Side};
use crate::domain::position::Position;

use super::ports::{
    AuditKind, AuditRecord, AuditSink, BrokerError, BrokerPort, BrokerSession, Confirmation,
    OpenOrder,
};
use super::reconciler::{CloseReport, DealCloseResult, PositionReconciler};
use super::resolver::EpicResolver;

/// How the direction of an `entry` order is chosen.
///
/// Source revisions disagreed on whether entries always buy or follow the
/// alert's `side` field, so the choice is configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDirection {
    /// Use the instruction's `side` field (which defaults to buy).
    FromInstruction,
    /// Every entry buys, whatever the instruction says.
    AlwaysBuy,
}

/// Fixed order parameters applied to every broker order.
#[derive(Debug, Clone)]
pub struct OrderDefaults {
    /// Currency code sent with open orders.
    pub currency: String,
    /// Contract expiry tag sent with open orders ("-" for cash).
    pub expiry: String,
    /// Entry direction policy.
    pub entry_direction: EntryDirection,
}

/// Result record returned to the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The instruction required no broker interaction.
    Acknowledged {
        /// The instruction kind that was acknowledged.
        kind: String,
    },
    /// Open positions as the broker reports them right now.
    Positions {
        /// The live position list.
        positions: Vec<Position>,
    },
    /// A position was opened.
    Entered {
        /// Broker confirmation of the opening order.
        confirmation: Confirmation,
    },
    /// Open positions were closed.
    Closed {
        /// Number of deals the broker accepted a close for.
        closed_count: usize,
        /// Per-deal detail.
        deals: Vec<DealCloseResult>,
    },
}

/// Sequences the broker session, resolution, and order components for one
/// instruction at a time.
///
/// Instructions are processed independently; the audit sink is the only
/// state shared across invocations.
pub struct Dispatcher<B: BrokerPort> {
    broker: Arc<B>,
    audit: Arc<dyn AuditSink>,
    resolver: EpicResolver,
    reconciler: PositionReconciler<B>,
    defaults: OrderDefaults,
}

impl<B: BrokerPort> Dispatcher<B> {
    /// Wire a dispatcher from its collaborators.
    pub fn new(
        broker: Arc<B>,
        audit: Arc<dyn AuditSink>,
        resolver: EpicResolver,
        defaults: OrderDefaults,
    ) -> Self {
        let reconciler = PositionReconciler::new(Arc::clone(&broker));
        Self {
            broker,
            audit,
            resolver,
            reconciler,
            defaults,
        }
    }

    /// Process one instruction to a terminal success or failure.
    pub async fn dispatch(
        &self,
        instruction: &Instruction,
    ) -> Result<DispatchOutcome, DispatchError> {
        self.audit.append(AuditRecord::new(
            AuditKind::Instruction,
            json!({ "instruction": instruction }),
        ));

        let result = self.run(instruction).await;

        match &result {
            Ok(outcome) => self.audit.append(AuditRecord::new(
                AuditKind::Outcome,
                json!({ "ok": true, "outcome": outcome }),
            )),
            Err(err) => self.audit.append(AuditRecord::new(
                AuditKind::Outcome,
                json!({ "ok": false, "error_kind": err.kind(), "error": err.to_string() }),
            )),
        }

        result
    }

    async fn run(&self, instruction: &Instruction) -> Result<DispatchOutcome, DispatchError> {
        match &instruction.kind {
            InstructionKind::Test => {
                tracing::info!("Test instruction acknowledged");
                Ok(DispatchOutcome::Acknowledged {
                    kind: "test".to_string(),
                })
            }
            InstructionKind::Other(kind) => {
                tracing::info!(kind = %kind, "Unrecognized instruction kind ignored");
                Ok(DispatchOutcome::Acknowledged { kind: kind.clone() })
            }
            InstructionKind::Positions => {
                let session = self.login().await?;
                let positions = self
                    .broker
                    .open_positions(&session)
                    .await
                    .map_err(BrokerError::into_query_error)?;
                Ok(DispatchOutcome::Positions { positions })
            }
            InstructionKind::Entry => {
                let session = self.login().await?;
                let epic = self.resolver.resolve(instruction)?;
                let direction = match self.defaults.entry_direction {
                    EntryDirection::FromInstruction => instruction.side,
                    EntryDirection::AlwaysBuy => Side::Buy,
                };

                let order = OpenOrder {
                    epic,
                    direction,
                    size: instruction.quantity,
                    currency: self.defaults.currency.clone(),
                    expiry: self.defaults.expiry.clone(),
                };

                tracing::info!(
                    epic = %order.epic,
                    direction = %order.direction,
                    size = %order.size,
                    "Opening market position"
                );

                let confirmation = self
                    .broker
                    .open_market(&session, &order)
                    .await
                    .map_err(BrokerError::into_order_error)?;

                Ok(DispatchOutcome::Entered { confirmation })
            }
            InstructionKind::Exit => {
                let session = self.login().await?;
                let report = self.close(&session, instruction).await?;

                Ok(DispatchOutcome::Closed {
                    closed_count: report.closed_count,
                    deals: report.deals,
                })
            }
        }
    }

    /// Fresh login per instruction; sessions are never cached or reused.
    async fn login(&self) -> Result<BrokerSession, DispatchError> {
        self.broker.login().await.map_err(|err| match err {
            BrokerError::Auth { message, status } => DispatchError::Auth { message, status },
            other => DispatchError::Auth {
                message: other.to_string(),
                status: None,
            },
        })
    }

    async fn close(
        &self,
        session: &BrokerSession,
        instruction: &Instruction,
    ) -> Result<CloseReport, DispatchError> {
        if let Some(deal_id) = &instruction.deal_id {
            tracing::info!(deal_id = %deal_id, "Closing single deal");
            return self.reconciler.close_single_deal(session, deal_id).await;
        }

        let epic = self.resolver.resolve(instruction)?;
        tracing::info!(epic = %epic, "Closing all open positions on instrument");
        self.reconciler
            .close_all_for_instrument(session, &epic)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::CloseOrder;
    use crate::domain::identifiers::{DealId, DealReference, Epic};
    use crate::infrastructure::audit::InMemoryAuditLog;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const DAX: &str = "IX.D.DAX.IFMM.IP";

    #[derive(Default)]
    struct MockBroker {
        fail_login: bool,
        positions: Vec<Position>,
        open_calls: Mutex<Vec<OpenOrder>>,
        close_calls: Mutex<Vec<CloseOrder>>,
        login_calls: Mutex<usize>,
    }

    #[async_trait]
    impl BrokerPort for MockBroker {
        async fn login(&self) -> Result<BrokerSession, BrokerError> {
            *self.login_calls.lock().unwrap() += 1;
            if self.fail_login {
                return Err(BrokerError::Auth {
                    message: "login rejected".to_string(),
                    status: Some(401),
                });
            }
            Ok(BrokerSession::new("cst", "sec", None))
        }

        async fn open_positions(
            &self,
            _session: &BrokerSession,
        ) -> Result<Vec<Position>, BrokerError> {
            Ok(self.positions.clone())
        }

        async fn open_market(
            &self,
            _session: &BrokerSession,
            order: &OpenOrder,
        ) -> Result<Confirmation, BrokerError> {
            self.open_calls.lock().unwrap().push(order.clone());
            Ok(Confirmation {
                deal_reference: DealReference::new("REF1"),
                deal_id: Some(DealId::new("DI1")),
                status: Some("ACCEPTED".to_string()),
                reason: None,
            })
        }

        async fn close_deal(
            &self,
            _session: &BrokerSession,
            order: &CloseOrder,
        ) -> Result<Confirmation, BrokerError> {
            self.close_calls.lock().unwrap().push(order.clone());
            Ok(Confirmation::reference_only(DealReference::new("REF2")))
        }
    }

    fn dispatcher(
        broker: Arc<MockBroker>,
        audit: Arc<InMemoryAuditLog>,
        entry_direction: EntryDirection,
    ) -> Dispatcher<MockBroker> {
        let mut aliases = HashMap::new();
        for alias in ["GER40", "DE40", "DAX"] {
            aliases.insert(alias.to_string(), Epic::new(DAX));
        }
        Dispatcher::new(
            broker,
            audit,
            EpicResolver::new(aliases),
            OrderDefaults {
                currency: "EUR".to_string(),
                expiry: "-".to_string(),
                entry_direction,
            },
        )
    }

    fn instruction(kind: InstructionKind) -> Instruction {
        Instruction {
            kind,
            symbol: Some("GER40".to_string()),
            epic: None,
            side: Side::Buy,
            quantity: Decimal::ONE,
            deal_id: None,
        }
    }

    fn position(deal_id: &str, direction: Side) -> Position {
        Position {
            deal_id: DealId::new(deal_id),
            epic: Epic::new(DAX),
            direction,
            size: Decimal::ONE,
            currency: "EUR".to_string(),
            expiry: "-".to_string(),
        }
    }

    #[tokio::test]
    async fn test_instruction_is_acknowledged_without_broker_calls() {
        let broker = Arc::new(MockBroker::default());
        let audit = Arc::new(InMemoryAuditLog::new());
        let dispatcher = dispatcher(Arc::clone(&broker), Arc::clone(&audit), EntryDirection::FromInstruction);

        let outcome = dispatcher
            .dispatch(&instruction(InstructionKind::Test))
            .await
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Acknowledged { kind } if kind == "test"));
        assert_eq!(*broker.login_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_kind_is_acknowledged_not_an_error() {
        let broker = Arc::new(MockBroker::default());
        let audit = Arc::new(InMemoryAuditLog::new());
        let dispatcher = dispatcher(Arc::clone(&broker), audit, EntryDirection::FromInstruction);

        let outcome = dispatcher
            .dispatch(&instruction(InstructionKind::Other("rebalance".to_string())))
            .await
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Acknowledged { kind } if kind == "rebalance"));
        assert_eq!(*broker.login_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn entry_opens_one_market_order_on_the_resolved_instrument() {
        let broker = Arc::new(MockBroker::default());
        let audit = Arc::new(InMemoryAuditLog::new());
        let dispatcher = dispatcher(Arc::clone(&broker), audit, EntryDirection::FromInstruction);

        let outcome = dispatcher
            .dispatch(&instruction(InstructionKind::Entry))
            .await
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Entered { .. }));

        let calls = broker.open_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].epic.as_str(), DAX);
        assert_eq!(calls[0].direction, Side::Buy);
        assert_eq!(calls[0].size, Decimal::ONE);
        assert_eq!(*broker.login_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn entry_side_follows_instruction_under_from_instruction_policy() {
        let broker = Arc::new(MockBroker::default());
        let audit = Arc::new(InMemoryAuditLog::new());
        let dispatcher = dispatcher(Arc::clone(&broker), audit, EntryDirection::FromInstruction);

        let mut sell = instruction(InstructionKind::Entry);
        sell.side = Side::Sell;
        dispatcher.dispatch(&sell).await.unwrap();

        assert_eq!(broker.open_calls.lock().unwrap()[0].direction, Side::Sell);
    }

    #[tokio::test]
    async fn entry_side_is_ignored_under_always_buy_policy() {
        let broker = Arc::new(MockBroker::default());
        let audit = Arc::new(InMemoryAuditLog::new());
        let dispatcher = dispatcher(Arc::clone(&broker), audit, EntryDirection::AlwaysBuy);

        let mut sell = instruction(InstructionKind::Entry);
        sell.side = Side::Sell;
        dispatcher.dispatch(&sell).await.unwrap();

        assert_eq!(broker.open_calls.lock().unwrap()[0].direction, Side::Buy);
    }

    #[tokio::test]
    async fn exit_closes_every_matching_position() {
        let broker = Arc::new(MockBroker {
            positions: vec![position("DI1", Side::Buy), position("DI2", Side::Sell)],
            ..Default::default()
        });
        let audit = Arc::new(InMemoryAuditLog::new());
        let dispatcher = dispatcher(Arc::clone(&broker), audit, EntryDirection::FromInstruction);

        let outcome = dispatcher
            .dispatch(&instruction(InstructionKind::Exit))
            .await
            .unwrap();

        assert!(
            matches!(outcome, DispatchOutcome::Closed { closed_count, .. } if closed_count == 2)
        );

        let calls = broker.close_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].direction, Side::Sell);
        assert_eq!(calls[1].direction, Side::Buy);
    }

    #[tokio::test]
    async fn exit_with_deal_id_closes_that_deal_only() {
        let broker = Arc::new(MockBroker {
            positions: vec![position("DI1", Side::Buy), position("DI2", Side::Buy)],
            ..Default::default()
        });
        let audit = Arc::new(InMemoryAuditLog::new());
        let dispatcher = dispatcher(Arc::clone(&broker), audit, EntryDirection::FromInstruction);

        let mut exit = instruction(InstructionKind::Exit);
        exit.deal_id = Some(DealId::new("DI2"));
        let outcome = dispatcher.dispatch(&exit).await.unwrap();

        assert!(
            matches!(outcome, DispatchOutcome::Closed { closed_count, .. } if closed_count == 1)
        );
        let calls = broker.close_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].deal_id.as_str(), "DI2");
    }

    #[tokio::test]
    async fn failed_login_stops_the_branch() {
        let broker = Arc::new(MockBroker {
            fail_login: true,
            ..Default::default()
        });
        let audit = Arc::new(InMemoryAuditLog::new());
        let dispatcher = dispatcher(Arc::clone(&broker), audit, EntryDirection::FromInstruction);

        let err = dispatcher
            .dispatch(&instruction(InstructionKind::Entry))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Auth { status: Some(401), .. }));
        assert!(broker.open_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn every_dispatch_audits_instruction_and_outcome() {
        let broker = Arc::new(MockBroker::default());
        let audit = Arc::new(InMemoryAuditLog::new());
        let dispatcher = dispatcher(broker, Arc::clone(&audit), EntryDirection::FromInstruction);

        dispatcher
            .dispatch(&instruction(InstructionKind::Entry))
            .await
            .unwrap();

        let records = audit.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, AuditKind::Instruction);
        assert_eq!(records[1].kind, AuditKind::Outcome);
        assert_eq!(records[1].fields["ok"], true);
    }

    #[tokio::test]
    async fn failed_dispatch_audits_the_error_kind() {
        let broker = Arc::new(MockBroker::default());
        let audit = Arc::new(InMemoryAuditLog::new());
        let dispatcher = dispatcher(broker, Arc::clone(&audit), EntryDirection::FromInstruction);

        let mut unresolvable = instruction(InstructionKind::Entry);
        unresolvable.symbol = Some("SPX500".to_string());
        dispatcher.dispatch(&unresolvable).await.unwrap_err();

        let records = audit.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].fields["ok"], false);
        assert_eq!(records[1].fields["error_kind"], "unresolved_instrument");
    }
}
