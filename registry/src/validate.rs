//! Request payload validators.
//!
//! These run *before* a payload reaches the registry: the request layer runs
//! each validator in sequence and rejects on the first message returned. The
//! registry itself treats them as black boxes — they see the raw string
//! payload, not records.

use regex::RegexSet;
use std::collections::BTreeMap;

/// Raw request payload: field name → string value, as received from the
/// (out-of-scope) HTTP layer.
pub type RequestData = BTreeMap<String, String>;

/// A payload screen: `None` means the payload passes, `Some(message)` is a
/// human-readable rejection.
pub trait Validator: Send + Sync {
    /// Inspect a payload.
    fn validate(&self, data: &RequestData) -> Option<String>;
}

/// Run validators in order; the first message short-circuits.
#[must_use]
pub fn run_validators(validators: &[Box<dyn Validator>], data: &RequestData) -> Option<String> {
    validators.iter().find_map(|v| v.validate(data))
}

/// Case-insensitive token match against a configured word list.
#[derive(Clone, Debug)]
pub struct BannedWordsValidator {
    words: Vec<String>,
}

impl BannedWordsValidator {
    /// Build from a configured word list; matching is case-insensitive.
    #[must_use]
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.into().to_lowercase())
                .collect(),
        }
    }
}

impl Validator for BannedWordsValidator {
    fn validate(&self, data: &RequestData) -> Option<String> {
        for value in data.values() {
            for token in value.split(|c: char| !c.is_alphanumeric()) {
                if token.is_empty() {
                    continue;
                }
                let token = token.to_lowercase();
                if self.words.contains(&token) {
                    return Some(format!("the word '{token}' is not allowed"));
                }
            }
        }
        None
    }
}

/// Small set of SQL keyword/operator patterns screening free-text fields.
///
/// This is a request-layer tripwire, not the real defense — the store binds
/// every data value as a parameter regardless.
#[derive(Clone, Debug)]
pub struct SqlInjectionValidator {
    patterns: RegexSet,
}

const SQL_PATTERNS: &[&str] = &[
    r"(?i)\b(select|insert|update|delete|drop|alter|union)\b[\s\S]*\b(from|into|table|set|where|select)\b",
    r"(?i)(--|/\*|\*/|;)",
    r"(?i)\b(or|and)\b\s+\d+\s*=\s*\d+",
    r#"(?i)['"]\s*(or|and)\s"#,
];

impl SqlInjectionValidator {
    /// Build the stock pattern set.
    #[must_use]
    pub fn new() -> Self {
        // The patterns are fixed literals; compilation cannot fail at
        // runtime, and an empty set fails open rather than panicking.
        let patterns = RegexSet::new(SQL_PATTERNS).unwrap_or_else(|_| RegexSet::empty());
        Self { patterns }
    }
}

impl Default for SqlInjectionValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for SqlInjectionValidator {
    fn validate(&self, data: &RequestData) -> Option<String> {
        for (field, value) in data {
            if self.patterns.is_match(value) {
                return Some(format!("field '{field}' contains disallowed SQL patterns"));
            }
        }
        None
    }
}
