//! Structured-response recovery — turns "usually JSON" model output into a `serde_json::Value`.
//!
//! Order of attempts:
//! 1. direct parse of the whole text
//! 2. parse of the `{ … }` candidate (first `{` to last `}`)
//! 3. each repair applied on its own to the candidate, first success wins
//! 4. all repairs applied in sequence, for output with several defects at once
//!
//! Never panics: every failure comes back as a `RecoveryFailure` carrying a kind and a
//! truncated sample for diagnostics.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Maximum characters of offending text kept in a failure sample.
const SAMPLE_CHARS: usize = 200;

static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(['"])?([a-zA-Z0-9_]+)(['"])?:"#).unwrap());
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());
static NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryErrorKind {
    EmptyInput,
    NoValidJson,
    JsonRecoveryFailed,
}

impl RecoveryErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryErrorKind::EmptyInput => "empty_input",
            RecoveryErrorKind::NoValidJson => "no_valid_json",
            RecoveryErrorKind::JsonRecoveryFailed => "json_recovery_failed",
        }
    }
}

/// Tagged failure value returned when no JSON could be recovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryFailure {
    pub error: RecoveryErrorKind,
    pub sample: String,
}

impl fmt::Display for RecoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sample.is_empty() {
            write!(f, "{}", self.error.as_str())
        } else {
            write!(f, "{} (sample: {})", self.error.as_str(), self.sample)
        }
    }
}

impl std::error::Error for RecoveryFailure {}

type Repair = fn(&str) -> String;

/// Textual repairs, in the order they are tried.
const REPAIRS: &[(&str, Repair)] = &[
    ("quote_bare_keys", quote_bare_keys),
    ("single_to_double_quotes", single_to_double_quotes),
    ("strip_trailing_commas", strip_trailing_commas),
    ("unescape_quotes", unescape_quotes),
    ("collapse_newlines", collapse_newlines),
];

/// Recovers one JSON value from raw model output.
pub fn coerce_json(text: &str) -> Result<Value, RecoveryFailure> {
    if text.trim().is_empty() {
        debug!("coerce_json: empty input");
        return Err(failure(RecoveryErrorKind::EmptyInput, ""));
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        debug!("coerce_json: direct parse succeeded");
        return Ok(value);
    }

    let Some(candidate) = extract_candidate(text) else {
        debug!("coerce_json: no {{...}} candidate in {} chars", text.len());
        return Err(failure(RecoveryErrorKind::NoValidJson, text));
    };

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        debug!("coerce_json: extracted candidate parsed as-is");
        return Ok(value);
    }

    for (name, repair) in REPAIRS {
        if let Ok(value) = serde_json::from_str::<Value>(&repair(candidate)) {
            debug!("coerce_json: recovered with repair '{name}'");
            return Ok(value);
        }
    }

    let combined = REPAIRS
        .iter()
        .fold(candidate.to_string(), |acc, (_, repair)| repair(&acc));
    if let Ok(value) = serde_json::from_str::<Value>(&combined) {
        debug!("coerce_json: recovered with all repairs combined");
        return Ok(value);
    }

    debug!("coerce_json: recovery failed for {} char candidate", candidate.len());
    Err(failure(RecoveryErrorKind::JsonRecoveryFailed, candidate))
}

/// The substring from the first `{` to the last `}`, if they appear in that order.
fn extract_candidate(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn quote_bare_keys(s: &str) -> String {
    BARE_KEY.replace_all(s, "\"${2}\":").into_owned()
}

fn single_to_double_quotes(s: &str) -> String {
    s.replace('\'', "\"")
}

fn strip_trailing_commas(s: &str) -> String {
    TRAILING_COMMA.replace_all(s, "${1}").into_owned()
}

fn unescape_quotes(s: &str) -> String {
    s.replace("\\\"", "\"")
}

fn collapse_newlines(s: &str) -> String {
    NEWLINE_RUN.replace_all(s, " ").into_owned()
}

fn failure(error: RecoveryErrorKind, text: &str) -> RecoveryFailure {
    RecoveryFailure {
        error,
        sample: sample(text),
    }
}

fn sample(text: &str) -> String {
    let cut = truncate_chars(text, SAMPLE_CHARS);
    if cut.len() < text.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}

/// Returns at most the first `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
