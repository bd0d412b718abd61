//! IG adapter configuration.

use std::time::Duration;

/// Environment for the dealing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgEnvironment {
    /// Demo account (simulated money).
    Demo,
    /// Live account (real money).
    Live,
}

impl IgEnvironment {
    /// Base URL for the dealing API.
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        match self {
            Self::Demo => "https://demo-api.ig.com/gateway/deal",
            Self::Live => "https://api.ig.com/gateway/deal",
        }
    }

    /// Check if this is live trading.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl std::fmt::Display for IgEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Demo => write!(f, "DEMO"),
            Self::Live => write!(f, "LIVE"),
        }
    }
}

/// Configuration for the IG broker adapter.
#[derive(Debug, Clone)]
pub struct IgConfig {
    /// API key sent on every call.
    pub api_key: String,
    /// Account username (login identifier).
    pub username: String,
    /// Account password.
    pub password: String,
    /// Trading environment.
    pub environment: IgEnvironment,
    /// Fixed per-call HTTP timeout.
    pub timeout: Duration,
    /// Base URL override (tests point this at a mock server).
    base_url: Option<String>,
}

impl IgConfig {
    /// Create a new configuration with the default timeout.
    #[must_use]
    pub fn new(
        api_key: String,
        username: String,
        password: String,
        environment: IgEnvironment,
    ) -> Self {
        Self {
            api_key,
            username,
            password,
            environment,
            timeout: Duration::from_secs(10),
            base_url: None,
        }
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the dealing API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Effective dealing API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_environment_url() {
        let env = IgEnvironment::Demo;
        assert!(env.base_url().contains("demo"));
        assert!(!env.is_live());
    }

    #[test]
    fn live_environment_url() {
        let env = IgEnvironment::Live;
        assert!(!env.base_url().contains("demo"));
        assert!(env.is_live());
    }

    #[test]
    fn config_defaults_base_url_from_environment() {
        let config = IgConfig::new(
            "key".to_string(),
            "user".to_string(),
            "pass".to_string(),
            IgEnvironment::Demo,
        );
        assert_eq!(config.base_url(), "https://demo-api.ig.com/gateway/deal");
    }

    #[test]
    fn config_base_url_override_wins() {
        let config = IgConfig::new(
            "key".to_string(),
            "user".to_string(),
            "pass".to_string(),
            IgEnvironment::Demo,
        )
        .with_base_url("http://127.0.0.1:9000");
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn config_with_timeout() {
        let config = IgConfig::new(
            "key".to_string(),
            "user".to_string(),
            "pass".to_string(),
            IgEnvironment::Demo,
        )
        .with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn environment_display() {
        assert_eq!(format!("{}", IgEnvironment::Demo), "DEMO");
        assert_eq!(format!("{}", IgEnvironment::Live), "LIVE");
    }
}
