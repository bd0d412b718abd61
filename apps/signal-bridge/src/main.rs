//! Signal Bridge Binary
//!
//! Starts the webhook-to-broker bridge.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin signal-bridge
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `WEBHOOK_SECRET`: Shared secret every webhook payload must carry
//! - `IG_API_KEY`: Broker API key
//! - `IG_USERNAME`: Broker account username
//! - `IG_PASSWORD`: Broker account password
//!
//! ## Optional
//! - `IG_ENV`: DEMO | LIVE (default: DEMO)
//! - `HTTP_PORT`: Webhook listen port (default: 8080)
//! - `AUDIT_LOG_PATH`: Audit log location (default: audit.jsonl)
//! - `DEFAULT_EPIC`: Instrument the builtin aliases resolve to
//! - `EPIC_ALIASES`: Extra `SYMBOL=EPIC` pairs, comma-separated
//! - `ORDER_CURRENCY`: Currency code for open orders (default: EUR)
//! - `ORDER_EXPIRY`: Expiry tag for open orders (default: "-")
//! - `ENTRY_DIRECTION`: side | buy (default: side)
//! - `BROKER_TIMEOUT_SECS`: Per-call broker timeout (default: 10)
//! - `RUST_LOG`: Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use signal_bridge::application::dispatcher::Dispatcher;
use signal_bridge::application::ports::AuditSink;
use signal_bridge::application::resolver::EpicResolver;
use signal_bridge::config::BridgeConfig;
use signal_bridge::infrastructure::audit::JsonlAuditLog;
use signal_bridge::infrastructure::broker::ig::IgBrokerAdapter;
use signal_bridge::infrastructure::http::{AppState, create_router};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    init_tracing();

    tracing::info!("Starting Signal Bridge");

    let config = BridgeConfig::from_env()?;
    log_config(&config);

    let audit: Arc<dyn AuditSink> = Arc::new(JsonlAuditLog::new(&config.audit_log_path));
    let broker = Arc::new(IgBrokerAdapter::new(&config.broker, Arc::clone(&audit))?);
    let dispatcher = Arc::new(Dispatcher::new(
        broker,
        audit,
        EpicResolver::new(config.aliases.clone()),
        config.defaults.clone(),
    ));

    let app = create_router(AppState {
        dispatcher,
        shared_secret: config.shared_secret.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Webhook endpoint ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Signal bridge stopped");
    Ok(())
}

/// Load a .env file when present; absence is fine.
fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Initialize the tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("signal_bridge=info")),
        )
        .init();
}

/// Log the parsed configuration. Secrets and credentials stay out of here.
fn log_config(config: &BridgeConfig) {
    tracing::info!(
        environment = %config.broker.environment,
        http_port = config.http_port,
        audit_log = %config.audit_log_path.display(),
        aliases = config.aliases.len(),
        "Configuration loaded"
    );
    if config.broker.environment.is_live() {
        tracing::warn!("LIVE trading environment - orders will execute with real money");
    }
}

/// Resolve when a shutdown signal arrives.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutdown signal received");
    }
}
