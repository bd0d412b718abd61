//! HTTP client for the dealing API.
//!
//! Owns the transport policy: which `VERSION` marker each operation sends
//! and which operations emulate their verb through the `_method` override
//! header. Orchestration code never sees these quirks.

use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::ports::BrokerSession;
use crate::domain::identifiers::AccountId;

use super::api_types::{SessionRequest, SessionResponse};
use super::config::IgConfig;
use super::error::IgError;

/// Dealing API operations, each with its own transport parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `POST /session`.
    Session,
    /// `GET /positions`.
    Positions,
    /// `POST /positions/otc` (open).
    OpenPosition,
    /// Close via `POST /positions/otc` with a DELETE override.
    ClosePosition,
    /// `GET /confirms/{dealReference}`.
    Confirm,
}

impl Operation {
    /// API version marker. The markers are inconsistent across operations;
    /// that inconsistency lives here and nowhere else.
    #[must_use]
    pub const fn version(self) -> &'static str {
        match self {
            Self::Session | Self::Positions | Self::OpenPosition => "2",
            Self::ClosePosition | Self::Confirm => "1",
        }
    }

    /// Verb sent through the `_method` override header, for operations whose
    /// real verb may not survive every intermediary.
    #[must_use]
    pub const fn method_override(self) -> Option<&'static str> {
        match self {
            Self::ClosePosition => Some("DELETE"),
            _ => None,
        }
    }
}

/// A decoded API response, keeping the raw body for auditing.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status.
    pub status: u16,
    /// Response body, verbatim.
    pub body: String,
    /// Decoded body.
    pub value: T,
}

/// Outcome of a successful login.
#[derive(Debug)]
pub struct LoginSuccess {
    /// The assembled session.
    pub session: BrokerSession,
    /// HTTP status of the login response.
    pub status: u16,
    /// Login response body (account metadata, no credentials).
    pub body: String,
}

/// HTTP client for the dealing API.
#[derive(Debug, Clone)]
pub struct IgHttpClient {
    client: Client,
    api_key: String,
    username: String,
    password: String,
    base_url: String,
}

impl IgHttpClient {
    /// Create a new HTTP client from config.
    pub fn new(config: &IgConfig) -> Result<Self, IgError> {
        if config.api_key.is_empty() || config.username.is_empty() || config.password.is_empty() {
            return Err(IgError::MissingCredentials);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IgError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            base_url: config.base_url().to_string(),
        })
    }

    /// Authenticate and assemble a session from the token headers.
    ///
    /// Both `CST` and `X-SECURITY-TOKEN` must be present on a success
    /// response; a response missing either never yields a session.
    pub async fn login(&self) -> Result<LoginSuccess, IgError> {
        let url = format!("{}/session", self.base_url);
        let request = SessionRequest {
            identifier: &self.username,
            password: &self.password,
            encrypted_password: false,
        };

        let response = self
            .client
            .post(&url)
            .header("X-IG-API-KEY", &self.api_key)
            .header("Accept", "application/json; charset=UTF-8")
            .header("VERSION", Operation::Session.version())
            .json(&request)
            .send()
            .await
            .map_err(|e| IgError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let cst = header_string(&response, "CST");
        let security_token = header_string(&response, "X-SECURITY-TOKEN");
        let body = response
            .text()
            .await
            .map_err(|e| IgError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(IgError::Auth { status, body });
        }

        let (Some(cst), Some(security_token)) = (cst, security_token) else {
            return Err(IgError::MissingSecurityTokens { status });
        };

        let account_id = serde_json::from_str::<SessionResponse>(&body)
            .ok()
            .and_then(|s| s.current_account_id)
            .map(AccountId::new);

        Ok(LoginSuccess {
            session: BrokerSession::new(cst, security_token, account_id),
            status,
            body,
        })
    }

    /// Authenticated GET.
    pub async fn get<T: DeserializeOwned>(
        &self,
        operation: Operation,
        path: &str,
        session: &BrokerSession,
    ) -> Result<ApiResponse<T>, IgError> {
        self.request(Method::GET, operation, path, session, None::<&()>)
            .await
    }

    /// Authenticated POST.
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        operation: Operation,
        path: &str,
        session: &BrokerSession,
        body: &B,
    ) -> Result<ApiResponse<T>, IgError> {
        self.request(Method::POST, operation, path, session, Some(body))
            .await
    }

    async fn request<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        operation: Operation,
        path: &str,
        session: &BrokerSession,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, IgError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .request(method, &url)
            .header("X-IG-API-KEY", &self.api_key)
            .header("Accept", "application/json; charset=UTF-8")
            .header("VERSION", operation.version())
            .header("CST", session.cst())
            .header("X-SECURITY-TOKEN", session.security_token());

        if let Some(verb) = operation.method_override() {
            request = request.header("_method", verb);
        }
        if let Some(b) = body {
            request = request.json(b);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IgError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| IgError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(IgError::Api { status, body: text });
        }

        let value = if text.is_empty() {
            serde_json::from_str("null")
        } else {
            serde_json::from_str(&text)
        }
        .map_err(|e| IgError::JsonParse(e.to_string()))?;

        Ok(ApiResponse {
            status,
            body: text,
            value,
        })
    }
}

fn header_string(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
