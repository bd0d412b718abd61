//! Domain layer.
//!
//! Models the bridge's own vocabulary: instructions, positions, identifiers,
//! and the error taxonomy. Nothing in here knows about HTTP or the broker's
//! wire format.

pub mod errors;
pub mod identifiers;
pub mod instruction;
pub mod position;
