use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Pattern for the tracked counter, e.g. `1234 [ 56.7 %`:
/// - a run of digits (total)
/// - optional whitespace, a literal `[`, optional whitespace
/// - a decimal number with optional fraction (percentage)
/// - optional whitespace and a literal `%`
const FIELD_PATTERN: &str = r"(\d+)\s*\[\s*(\d+\.?\d*)\s*%";

static FIELD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FIELD_PATTERN).expect("FIELD_PATTERN is a valid regex"));

/// Numbers extracted from recognized text.
///
/// `None` means the pattern did not match, not that parsing failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedFields {
    pub total: Option<u64>,
    pub percentage: Option<f64>,
}

/// Extracts the total/percentage pair from the first match in `text`.
///
/// Later matches are ignored. A total too large for `u64` is reported as
/// `None` while the percentage is still returned.
pub fn parse_fields(text: &str) -> ParsedFields {
    let Some(caps) = FIELD_REGEX.captures(text) else {
        return ParsedFields::default();
    };

    ParsedFields {
        total: caps[1].parse().ok(),
        percentage: caps[2].parse().ok(),
    }
}
