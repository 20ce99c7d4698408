//! Location fields from a free-text residential address.
//!
//! Positional heuristic: segments are comma-separated, state is the
//! second-to-last segment, city the third-to-last, and the zip is the
//! first standalone 6-digit token found scanning from the last segment
//! backward. Addresses with a different segment layout parse to partial
//! or shifted results; that behaviour is part of the feature contract
//! models were trained on and must stay as is.

use regex::Regex;
use std::sync::OnceLock;

static ZIP_PATTERN: OnceLock<Regex> = OnceLock::new();

// The pattern is a literal, so compiling it cannot fail at runtime; this
// is the one `expect` outside tests.
fn zip_pattern() -> &'static Regex {
    ZIP_PATTERN.get_or_init(|| Regex::new(r"\b\d{6}\b").expect("zip pattern is a valid regex"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl Location {
    /// Parse an address. `None` yields an all-absent location.
    pub fn parse(address: Option<&str>) -> Self {
        let Some(address) = address else {
            return Self::default();
        };

        let parts: Vec<&str> = address.split(',').map(str::trim).collect();

        let zip_code = parts
            .iter()
            .rev()
            .find_map(|part| zip_pattern().find(part))
            .map(|m| m.as_str().to_string());

        let n = parts.len();
        let state = (n >= 2).then(|| parts[n - 2].to_string());
        let city = (n >= 3).then(|| parts[n - 3].to_string());

        Self { city, state, zip_code }
    }
}
