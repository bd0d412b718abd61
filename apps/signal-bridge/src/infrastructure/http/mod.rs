//! HTTP front end.
//!
//! The webhook controller is a thin pass-through: it validates the shared
//! secret, tolerates malformed payloads, and hands the dispatcher a
//! validated instruction.

mod controller;
mod request;
mod response;

pub use controller::{AppState, create_router};
pub use request::WebhookPayload;
pub use response::WebhookResponse;
