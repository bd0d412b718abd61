//! Webhook response DTOs.

use serde::Serialize;

use crate::application::dispatcher::DispatchOutcome;
use crate::domain::errors::DispatchError;

/// Response returned to the alert source.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    /// Whether the instruction ran to a successful terminal state.
    pub ok: bool,
    /// Error kind tag, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Human-readable error, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Outcome fields, on success.
    #[serde(flatten)]
    pub outcome: Option<DispatchOutcome>,
}

impl WebhookResponse {
    /// Successful dispatch.
    #[must_use]
    pub const fn success(outcome: DispatchOutcome) -> Self {
        Self {
            ok: true,
            error_kind: None,
            error: None,
            outcome: Some(outcome),
        }
    }

    /// Failed dispatch.
    #[must_use]
    pub fn failure(err: &DispatchError) -> Self {
        Self {
            ok: false,
            error_kind: Some(err.kind().to_string()),
            error: Some(err.to_string()),
            outcome: None,
        }
    }

    /// Secret mismatch.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self {
            ok: false,
            error_kind: Some("unauthorized".to_string()),
            error: Some("bad secret".to_string()),
            outcome: None,
        }
    }
}
