//! IG broker adapter implementing `BrokerPort`.
//!
//! Every broker call attempt — login, positions, open, close, confirm —
//! appends exactly one audit record, success or failure, before the result
//! is returned. Credentials and session tokens never reach the audit log.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::application::ports::{
    AuditKind, AuditRecord, AuditSink, BrokerError, BrokerPort, BrokerSession, CloseOrder,
    Confirmation, OpenOrder,
};
use crate::domain::identifiers::{DealId, DealReference};
use crate::domain::position::Position;

use super::api_types::{
    CloseOtcRequest, ConfirmResponse, DealReferenceResponse, OpenOtcRequest, PositionsResponse,
};
use super::config::IgConfig;
use super::error::IgError;
use super::http_client::{ApiResponse, IgHttpClient, Operation};

/// IG dealing API adapter.
pub struct IgBrokerAdapter {
    client: IgHttpClient,
    audit: Arc<dyn AuditSink>,
}

impl IgBrokerAdapter {
    /// Create a new adapter.
    pub fn new(config: &IgConfig, audit: Arc<dyn AuditSink>) -> Result<Self, IgError> {
        let client = IgHttpClient::new(config)?;
        Ok(Self { client, audit })
    }

    /// Fetch the confirmation for a submitted order.
    ///
    /// A failed fetch never retracts the order; the confirmation then
    /// carries only the deal reference.
    async fn confirm(
        &self,
        session: &BrokerSession,
        deal_reference: DealReference,
    ) -> Confirmation {
        let path = format!("/confirms/{deal_reference}");
        let result: Result<ApiResponse<ConfirmResponse>, IgError> =
            self.client.get(Operation::Confirm, &path, session).await;

        match result {
            Ok(response) => {
                self.audit.append(AuditRecord::new(
                    AuditKind::Confirm,
                    json!({
                        "deal_reference": deal_reference,
                        "status": response.status,
                        "body": body_value(&response.body),
                    }),
                ));
                Confirmation {
                    deal_reference,
                    deal_id: response.value.deal_id.map(DealId::new),
                    status: response.value.deal_status,
                    reason: response.value.reason,
                }
            }
            Err(err) => {
                self.audit.append(AuditRecord::new(
                    AuditKind::Confirm,
                    json!({
                        "deal_reference": deal_reference,
                        "status": err.status(),
                        "error": err.to_string(),
                    }),
                ));
                tracing::warn!(
                    deal_reference = %deal_reference,
                    error = %err,
                    "Confirm fetch failed, returning reference only"
                );
                Confirmation::reference_only(deal_reference)
            }
        }
    }
}

#[async_trait]
impl BrokerPort for IgBrokerAdapter {
    async fn login(&self) -> Result<BrokerSession, BrokerError> {
        match self.client.login().await {
            Ok(success) => {
                self.audit.append(AuditRecord::new(
                    AuditKind::Login,
                    json!({
                        "status": success.status,
                        "body": body_value(&success.body),
                    }),
                ));
                tracing::info!(
                    account_id = ?success.session.account_id(),
                    "Broker login succeeded"
                );
                Ok(success.session)
            }
            Err(err) => {
                self.audit.append(AuditRecord::new(
                    AuditKind::Login,
                    json!({
                        "status": err.status(),
                        "error": err.to_string(),
                    }),
                ));
                tracing::warn!(error = %err, "Broker login failed");
                Err(err.into())
            }
        }
    }

    async fn open_positions(
        &self,
        session: &BrokerSession,
    ) -> Result<Vec<Position>, BrokerError> {
        let result: Result<ApiResponse<PositionsResponse>, IgError> = self
            .client
            .get(Operation::Positions, "/positions", session)
            .await;

        match result {
            Ok(response) => {
                self.audit.append(AuditRecord::new(
                    AuditKind::Positions,
                    json!({
                        "status": response.status,
                        "count": response.value.positions.len(),
                    }),
                ));
                response
                    .value
                    .positions
                    .iter()
                    .map(|entry| entry.to_position().map_err(BrokerError::from))
                    .collect()
            }
            Err(err) => {
                self.audit.append(AuditRecord::new(
                    AuditKind::Positions,
                    json!({
                        "status": err.status(),
                        "error": err.to_string(),
                    }),
                ));
                Err(err.into())
            }
        }
    }

    async fn open_market(
        &self,
        session: &BrokerSession,
        order: &OpenOrder,
    ) -> Result<Confirmation, BrokerError> {
        let request = OpenOtcRequest::from_order(order);
        let payload = serde_json::to_value(&request).unwrap_or(serde_json::Value::Null);

        let result: Result<ApiResponse<DealReferenceResponse>, IgError> = self
            .client
            .post(Operation::OpenPosition, "/positions/otc", session, &request)
            .await;

        match result {
            Ok(response) => {
                self.audit.append(AuditRecord::new(
                    AuditKind::OpenOrder,
                    json!({
                        "request": payload,
                        "status": response.status,
                        "body": body_value(&response.body),
                    }),
                ));
                let reference = DealReference::new(response.value.deal_reference);
                Ok(self.confirm(session, reference).await)
            }
            Err(err) => {
                self.audit.append(AuditRecord::new(
                    AuditKind::OpenOrder,
                    json!({
                        "request": payload,
                        "status": err.status(),
                        "error": err.to_string(),
                    }),
                ));
                Err(err.into())
            }
        }
    }

    async fn close_deal(
        &self,
        session: &BrokerSession,
        order: &CloseOrder,
    ) -> Result<Confirmation, BrokerError> {
        let request = CloseOtcRequest::from_order(order);
        let payload = serde_json::to_value(&request).unwrap_or(serde_json::Value::Null);

        let result: Result<ApiResponse<DealReferenceResponse>, IgError> = self
            .client
            .post(
                Operation::ClosePosition,
                "/positions/otc",
                session,
                &request,
            )
            .await;

        match result {
            Ok(response) => {
                self.audit.append(AuditRecord::new(
                    AuditKind::CloseOrder,
                    json!({
                        "request": payload,
                        "status": response.status,
                        "body": body_value(&response.body),
                    }),
                ));
                let reference = DealReference::new(response.value.deal_reference);
                Ok(self.confirm(session, reference).await)
            }
            Err(err) => {
                self.audit.append(AuditRecord::new(
                    AuditKind::CloseOrder,
                    json!({
                        "request": payload,
                        "status": err.status(),
                        "error": err.to_string(),
                    }),
                ));
                Err(err.into())
            }
        }
    }
}

/// Audit response bodies as JSON when they parse, verbatim text otherwise.
fn body_value(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}
