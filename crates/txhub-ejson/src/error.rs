//! Error types for field parsing
//!
//! Provides error handling for:
//! - Text that is neither JSON nor recognized Shell syntax
//! - Extended JSON wrappers whose payload cannot be converted

use crate::tag::ExtendedTag;

/// Errors raised while turning field text into a normalized value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Input is not valid JSON, even after Shell literal rewriting
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        /// Parser message
        message: String,
        /// 1-based line of the failure
        line: usize,
        /// 1-based column of the failure
        column: usize,
        /// Whether the Shell literal rewriter had been applied
        rewritten: bool,
    },

    /// A recognized wrapper carries a payload that does not convert
    #[error("invalid {tag} value at {path}: {value:?} ({reason})")]
    InvalidExtendedValue {
        /// Wrapper tag
        tag: ExtendedTag,
        /// JSON path of the wrapper object
        path: String,
        /// Offending payload text
        value: String,
        /// Why the conversion failed
        reason: String,
    },
}

impl ParseError {
    /// Create syntax error from a serde_json failure
    #[must_use]
    pub fn syntax(source: &serde_json::Error, rewritten: bool) -> Self {
        Self::Syntax {
            message: source.to_string(),
            line: source.line(),
            column: source.column(),
            rewritten,
        }
    }

    /// Create invalid extended value error
    pub fn invalid_value(
        tag: ExtendedTag,
        path: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidExtendedValue {
            tag,
            path: path.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a plain syntax failure
    #[inline]
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{\"a\":}").unwrap_err();
        let err = ParseError::syntax(&source, false);
        assert!(err.to_string().starts_with("syntax error at line 1"));
        assert!(err.is_syntax());
    }

    #[test]
    fn invalid_value_display() {
        let err = ParseError::invalid_value(ExtendedTag::NumberLong, "$.amount", "12x", "not an integer");
        assert_eq!(
            err.to_string(),
            "invalid $numberLong value at $.amount: \"12x\" (not an integer)"
        );
        assert!(!err.is_syntax());
    }
}
