//! HTTP Controller (Driver Adapter)
//!
//! Axum routes delegating to the dispatcher. The controller owns the shared
//! secret check; by the time an instruction reaches the dispatcher it is
//! validated.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::application::dispatcher::Dispatcher;
use crate::application::ports::BrokerPort;

use super::request::WebhookPayload;
use super::response::WebhookResponse;

/// Application state shared across handlers.
pub struct AppState<B: BrokerPort> {
    /// The core dispatcher.
    pub dispatcher: Arc<Dispatcher<B>>,
    /// Shared secret every webhook payload must carry.
    pub shared_secret: String,
}

impl<B: BrokerPort> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            shared_secret: self.shared_secret.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<B: BrokerPort + 'static>(state: AppState<B>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/webhook", post(webhook))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Webhook endpoint.
///
/// The body is parsed leniently; anything unreadable degrades to an empty
/// payload, which fails the secret check. A mismatched secret short-circuits
/// with 401 and zero broker calls.
async fn webhook<B: BrokerPort>(
    State(state): State<AppState<B>>,
    body: Bytes,
) -> impl IntoResponse {
    let payload = WebhookPayload::from_bytes(&body);

    if payload.secret.as_deref() != Some(state.shared_secret.as_str()) {
        tracing::warn!("Webhook rejected: bad secret");
        return (
            StatusCode::UNAUTHORIZED,
            Json(WebhookResponse::unauthorized()),
        );
    }

    let instruction = payload.into_instruction();
    tracing::info!(kind = instruction.kind.as_str(), "Webhook instruction received");

    match state.dispatcher.dispatch(&instruction).await {
        Ok(outcome) => (StatusCode::OK, Json(WebhookResponse::success(outcome))),
        Err(err) => {
            tracing::warn!(error = %err, "Instruction failed");
            (StatusCode::OK, Json(WebhookResponse::failure(&err)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatcher::{EntryDirection, OrderDefaults};
    use crate::application::ports::{
        BrokerError, BrokerSession, CloseOrder, Confirmation, OpenOrder,
    };
    use crate::application::resolver::EpicResolver;
    use crate::domain::identifiers::{DealReference, Epic};
    use crate::domain::position::Position;
    use crate::infrastructure::audit::InMemoryAuditLog;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct MockBroker {
        login_calls: Mutex<usize>,
    }

    #[async_trait]
    impl BrokerPort for MockBroker {
        async fn login(&self) -> Result<BrokerSession, BrokerError> {
            *self.login_calls.lock().unwrap() += 1;
            Ok(BrokerSession::new("cst", "sec", None))
        }

        async fn open_positions(
            &self,
            _session: &BrokerSession,
        ) -> Result<Vec<Position>, BrokerError> {
            Ok(vec![])
        }

        async fn open_market(
            &self,
            _session: &BrokerSession,
            _order: &OpenOrder,
        ) -> Result<Confirmation, BrokerError> {
            Ok(Confirmation::reference_only(DealReference::new("REF1")))
        }

        async fn close_deal(
            &self,
            _session: &BrokerSession,
            _order: &CloseOrder,
        ) -> Result<Confirmation, BrokerError> {
            Ok(Confirmation::reference_only(DealReference::new("REF2")))
        }
    }

    fn router(broker: Arc<MockBroker>) -> Router {
        let mut aliases = HashMap::new();
        aliases.insert("GER40".to_string(), Epic::new("IX.D.DAX.IFMM.IP"));
        let dispatcher = Dispatcher::new(
            broker,
            Arc::new(InMemoryAuditLog::new()),
            EpicResolver::new(aliases),
            OrderDefaults {
                currency: "EUR".to_string(),
                expiry: "-".to_string(),
                entry_direction: EntryDirection::FromInstruction,
            },
        );
        create_router(AppState {
            dispatcher: Arc::new(dispatcher),
            shared_secret: "S".to_string(),
        })
    }

    fn post_webhook(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_answers_ok() {
        let response = router(Arc::new(MockBroker::default()))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_secret_is_unauthorized_with_zero_broker_calls() {
        let broker = Arc::new(MockBroker::default());
        let response = router(Arc::clone(&broker))
            .oneshot(post_webhook(r#"{"secret":"wrong","type":"entry","symbol":"GER40"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "bad secret");
        assert_eq!(*broker.login_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_treated_as_missing_secret() {
        let broker = Arc::new(MockBroker::default());
        let response = router(Arc::clone(&broker))
            .oneshot(post_webhook("{{{{ not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(*broker.login_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_instruction_is_acknowledged() {
        let response = router(Arc::new(MockBroker::default()))
            .oneshot(post_webhook(r#"{"secret":"S","type":"test"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["result"], "acknowledged");
    }

    #[tokio::test]
    async fn entry_returns_the_deal_reference() {
        let broker = Arc::new(MockBroker::default());
        let response = router(Arc::clone(&broker))
            .oneshot(post_webhook(
                r#"{"secret":"S","type":"entry","symbol":"GER40","qty":1,"side":"buy"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["result"], "entered");
        assert_eq!(json["confirmation"]["deal_reference"], "REF1");
        assert_eq!(*broker.login_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn exit_with_nothing_open_reports_the_error_kind() {
        let response = router(Arc::new(MockBroker::default()))
            .oneshot(post_webhook(r#"{"secret":"S","type":"exit","symbol":"GER40"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error_kind"], "no_open_position");
    }
}
