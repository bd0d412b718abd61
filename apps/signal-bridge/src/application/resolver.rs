//! Symbol → instrument identifier resolution.
//!
//! Resolution precedence:
//! 1. an explicit epic on the instruction is used verbatim;
//! 2. the normalized symbol is looked up in the configured alias table;
//! 3. a normalized symbol that already follows the broker's identifier
//!    convention (dot-separated uppercase segments) is accepted as-is;
//! 4. otherwise the instruction is unresolvable.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::domain::errors::DispatchError;
use crate::domain::identifiers::Epic;
use crate::domain::instruction::Instruction;

/// Broker identifier convention: at least three dot-separated segments of
/// uppercase letters and digits, e.g. `IX.D.DAX.IFMM.IP`.
#[allow(clippy::expect_used)] // static pattern, guaranteed to parse
fn epic_pattern() -> &'static regex::Regex {
    static EPIC_PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    EPIC_PATTERN.get_or_init(|| {
        regex::Regex::new(r"^[A-Z0-9]+(\.[A-Z0-9]+){2,}$").expect("static epic pattern is valid")
    })
}

/// Maps alert symbols to broker instrument identifiers.
#[derive(Debug, Clone)]
pub struct EpicResolver {
    aliases: HashMap<String, Epic>,
}

impl EpicResolver {
    /// Create a resolver over a closed alias table. Alias keys are
    /// normalized (trimmed, uppercased) at construction so lookups are
    /// case-insensitive.
    #[must_use]
    pub fn new(aliases: HashMap<String, Epic>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(alias, epic)| (normalize(&alias), epic))
            .collect();
        Self { aliases }
    }

    /// Resolve an instruction to exactly one instrument identifier.
    pub fn resolve(&self, instruction: &Instruction) -> Result<Epic, DispatchError> {
        if let Some(epic) = &instruction.epic {
            let trimmed = epic.as_str().trim();
            if !trimmed.is_empty() {
                return Ok(Epic::new(trimmed));
            }
        }

        let symbol = instruction.symbol.as_deref().unwrap_or_default();
        let normalized = normalize(symbol);
        if normalized.is_empty() {
            return Err(DispatchError::UnresolvedInstrument {
                input: instruction.instrument_input(),
            });
        }

        if let Some(epic) = self.aliases.get(&normalized) {
            return Ok(epic.clone());
        }

        if epic_pattern().is_match(&normalized) {
            return Ok(Epic::new(normalized));
        }

        Err(DispatchError::UnresolvedInstrument {
            input: instruction.instrument_input(),
        })
    }
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
