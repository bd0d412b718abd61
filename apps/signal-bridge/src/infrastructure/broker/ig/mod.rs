//! IG-style broker adapter.
//!
//! Talks to a session-authenticated dealing REST API: `POST /session` yields
//! two security tokens in the response headers, which every subsequent call
//! carries; positions and OTC market orders live under `/positions`. The
//! transport quirks (per-operation `VERSION` markers, close emulated through
//! a method-override header) are confined to the HTTP client.

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;

pub use adapter::IgBrokerAdapter;
pub use config::{IgConfig, IgEnvironment};
pub use error::IgError;
