//! Process configuration.
//!
//! Everything is environment-sourced, read exactly once at startup into a
//! [`BridgeConfig`] value, and passed explicitly into each component — no ad
//! hoc environment reads anywhere else. Missing credentials fail here,
//! before any broker call.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::application::dispatcher::{EntryDirection, OrderDefaults};
use crate::domain::identifiers::Epic;
use crate::infrastructure::broker::ig::{IgConfig, IgEnvironment};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    #[error("missing required environment variable {name}")]
    Missing {
        /// Variable name.
        name: &'static str,
    },

    /// A variable is present but unusable.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Complete bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Shared secret every webhook payload must carry.
    pub shared_secret: String,
    /// Broker adapter configuration.
    pub broker: IgConfig,
    /// Webhook listen port.
    pub http_port: u16,
    /// Audit log location.
    pub audit_log_path: PathBuf,
    /// Fixed order parameters.
    pub defaults: OrderDefaults,
    /// Symbol alias table for instrument resolution.
    pub aliases: HashMap<String, Epic>,
}

/// Default webhook port.
const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default per-call broker timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default instrument the builtin aliases point at.
const DEFAULT_EPIC: &str = "IX.D.DAX.IFMM.IP";

/// Builtin synonyms for the default instrument.
const DEFAULT_ALIASES: [&str; 4] = ["GER40", "DE40", "DAX", "GERMANY40"];

impl BridgeConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary lookup (tests inject a
    /// map instead of mutating the process environment).
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let shared_secret = required(&lookup, "WEBHOOK_SECRET")?;
        let api_key = required(&lookup, "IG_API_KEY")?;
        let username = required(&lookup, "IG_USERNAME")?;
        let password = required(&lookup, "IG_PASSWORD")?;

        let environment = match lookup("IG_ENV").as_deref().map(str::to_uppercase).as_deref() {
            Some("LIVE") => IgEnvironment::Live,
            _ => IgEnvironment::Demo,
        };

        let http_port = parse_or(&lookup, "HTTP_PORT", DEFAULT_HTTP_PORT)?;
        let timeout_secs = parse_or(&lookup, "BROKER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        let audit_log_path = lookup("AUDIT_LOG_PATH")
            .unwrap_or_else(|| "audit.jsonl".to_string())
            .into();

        let default_epic = lookup("DEFAULT_EPIC").unwrap_or_else(|| DEFAULT_EPIC.to_string());
        let mut aliases: HashMap<String, Epic> = DEFAULT_ALIASES
            .iter()
            .map(|alias| ((*alias).to_string(), Epic::new(&default_epic)))
            .collect();
        if let Some(extra) = lookup("EPIC_ALIASES") {
            for (alias, epic) in parse_aliases(&extra)? {
                aliases.insert(alias, epic);
            }
        }

        let entry_direction = match lookup("ENTRY_DIRECTION")
            .as_deref()
            .map(str::to_lowercase)
            .as_deref()
        {
            None | Some("side") => EntryDirection::FromInstruction,
            Some("buy") => EntryDirection::AlwaysBuy,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "ENTRY_DIRECTION",
                    reason: format!("expected \"side\" or \"buy\", got {other:?}"),
                });
            }
        };

        let defaults = OrderDefaults {
            currency: lookup("ORDER_CURRENCY").unwrap_or_else(|| "EUR".to_string()),
            expiry: lookup("ORDER_EXPIRY").unwrap_or_else(|| "-".to_string()),
            entry_direction,
        };

        let broker = IgConfig::new(api_key, username, password, environment)
            .with_timeout(Duration::from_secs(timeout_secs));

        Ok(Self {
            shared_secret,
            broker,
            http_port,
            audit_log_path,
            defaults,
            aliases,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing { name }),
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

/// Parse `"SYMBOL=EPIC,SYMBOL=EPIC"` pairs.
fn parse_aliases(raw: &str) -> Result<Vec<(String, Epic)>, ConfigError> {
    raw.split(',')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            pair.split_once('=')
                .map(|(alias, epic)| (alias.trim().to_string(), Epic::new(epic.trim())))
                .ok_or_else(|| ConfigError::Invalid {
                    name: "EPIC_ALIASES",
                    reason: format!("expected SYMBOL=EPIC, got {pair:?}"),
                })
        })
        .collect()
}
