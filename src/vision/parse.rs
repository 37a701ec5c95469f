//! Numeric reading extraction from free-form response text
//!
//! The service answers in natural language; only the leading decimal numeral
//! and an optional one-letter unit are kept. Absence of a match is a normal,
//! representable result, never a failure.

use std::sync::OnceLock;

use regex::Regex;

/// A parsed reading: the numeric value and an optional unit letter
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParsedReading {
    pub value: Option<f64>,
    pub unit: Option<char>,
}

impl ParsedReading {
    /// Whether a numeric value was recognized
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }
}

fn reading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // A decimal numeral, then optionally a degree glyph and a single unit
    // letter. The letter must not be followed by more letters, so words in
    // prose ("reads 37 degrees exactly") do not masquerade as units.
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s*°?\s*([a-z])?\b").expect("reading pattern is valid")
    })
}

/// Extract a numeric value (and optional unit letter) from response text.
///
/// Returns a default (empty) reading when no numeral is found; malformed
/// input is never an error.
pub fn parse_reading(text: &str) -> ParsedReading {
    let Some(caps) = reading_pattern().captures(text) else {
        return ParsedReading::default();
    };

    let value = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
    if value.is_none() {
        return ParsedReading::default();
    }

    let unit = caps
        .get(2)
        .and_then(|m| m.as_str().chars().next())
        .map(|c| c.to_ascii_uppercase());

    ParsedReading { value, unit }
}
