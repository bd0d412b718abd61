//! IG-specific error types.

use thiserror::Error;

use crate::application::ports::BrokerError;

/// Errors from the IG adapter.
#[derive(Debug, Error, Clone)]
pub enum IgError {
    /// Adapter constructed without complete credentials.
    #[error("missing broker credentials")]
    MissingCredentials,

    /// Login was rejected by the broker.
    #[error("authentication failed: HTTP {status}: {body}")]
    Auth {
        /// HTTP status of the login response.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Login returned success without both security token headers.
    #[error("login response (HTTP {status}) missing CST or X-SECURITY-TOKEN header")]
    MissingSecurityTokens {
        /// HTTP status of the login response.
        status: u16,
    },

    /// The API answered a non-login call with a non-success status.
    #[error("API error: HTTP {status}: {body}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Network-level failure (connection refused, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// The response decoded but did not carry usable data.
    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),
}

impl IgError {
    /// HTTP status of the broker response, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. }
            | Self::MissingSecurityTokens { status }
            | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<IgError> for BrokerError {
    fn from(err: IgError) -> Self {
        match err {
            IgError::MissingCredentials => Self::Auth {
                message: "missing broker credentials".to_string(),
                status: None,
            },
            IgError::Auth { status, body } => Self::Auth {
                message: body,
                status: Some(status),
            },
            IgError::MissingSecurityTokens { status } => Self::Auth {
                message: "login response missing security tokens".to_string(),
                status: Some(status),
            },
            IgError::Api { status, body } => Self::Rejected { status, body },
            IgError::Network(msg) | IgError::JsonParse(msg) | IgError::UnexpectedPayload(msg) => {
                Self::Connection { message: msg }
            }
        }
    }
}
