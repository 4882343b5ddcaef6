//! Field text → normalized value pipeline

use crate::error::{ParseError, ParseResult};
use crate::normalize::normalize;
use crate::rewrite::LiteralRewriter;
use crate::value::NormalizedValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How field text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Strict JSON; wrapper objects are kept as data
    Plain,
    /// JSON, Shell literal syntax and Extended JSON wrappers
    #[default]
    Extended,
}

/// Parse text as JSON, falling back to Shell literal rewriting.
///
/// Returns the parsed tree and whether the rewriter was needed.
///
/// # Errors
/// [`ParseError::Syntax`] when the text is not JSON even after rewriting;
/// the position refers to the rewritten text in that case.
pub fn parse_shell_json(text: &str) -> ParseResult<(Value, bool)> {
    let first = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok((value, false)),
        Err(e) => e,
    };

    let rewritten = LiteralRewriter::new().rewrite(text);
    if !rewritten.changed() {
        return Err(ParseError::syntax(&first, false));
    }
    tracing::debug!(rules = ?rewritten.applied, "rewrote shell literals");

    serde_json::from_str::<Value>(&rewritten.text)
        .map(|value| (value, true))
        .map_err(|e| ParseError::syntax(&e, true))
}

/// Parse one field's text into a normalized tree
///
/// # Errors
/// Syntax errors from parsing, or invalid wrapper payloads in
/// [`InputMode::Extended`].
pub fn parse_field(text: &str, mode: InputMode) -> ParseResult<NormalizedValue> {
    match mode {
        InputMode::Plain => serde_json::from_str::<Value>(text)
            .map(NormalizedValue::from)
            .map_err(|e| ParseError::syntax(&e, false)),
        InputMode::Extended => {
            let (value, _) = parse_shell_json(text)?;
            normalize(&value)
        }
    }
}
