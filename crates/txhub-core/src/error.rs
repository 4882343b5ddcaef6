//! Error types for Transaction Hub
//!
//! Every error is recovered at the operation that raised it: the session
//! records it, notifies the operator and hands it back to the caller.

use crate::types::FieldSlot;
use txhub_ejson::ParseError;

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Page URL lacks the identifier parameter
    #[error("missing \"{name}\" parameter in the page URL")]
    MissingParameter { name: String },

    /// Identifier is empty or blank at submit time
    #[error("no valid transaction identifier was provided")]
    MissingIdentifier,

    /// Fetch or submit failed on the wire
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Fetch succeeded but neither record is present
    #[error("no data found for transaction {transaction_id}")]
    NoDataFound { transaction_id: String },

    /// Field text is neither JSON nor recognized Shell syntax
    #[error("invalid JSON in {slot} field: {source}")]
    JsonSyntax {
        slot: FieldSlot,
        #[source]
        source: ParseError,
    },

    /// Self-declared identifier disagrees with the session identifier
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// Flat field edit could not be applied
    #[error("cannot edit {slot}.{key}: {reason}")]
    InvalidField {
        slot: FieldSlot,
        key: String,
        reason: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl HubError {
    /// Create JSON syntax error for a slot
    #[inline]
    pub fn json_syntax(slot: FieldSlot, source: ParseError) -> Self {
        Self::JsonSyntax { slot, source }
    }

    /// Create flat field error
    pub fn invalid_field(slot: FieldSlot, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            slot,
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Check if the operator can simply try the same action again
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::NoDataFound { .. })
    }

    /// Short heading for the notification surface
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::MissingParameter { .. } | Self::Config(_) => "Configuration error",
            Self::MissingIdentifier | Self::Consistency(_) | Self::InvalidField { .. } => {
                "Validation error"
            }
            Self::JsonSyntax { .. } => "Invalid JSON",
            Self::NoDataFound { .. } => "No data",
            Self::Network(_) => "Network error",
        }
    }
}

/// Transport failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// Request never produced a response
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-success HTTP status, with the response body
    #[error("Error {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl NetworkError {
    /// Create status error
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

/// Identifier disagreement between a record and the session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} mismatch: expected {expected:?}, found {actual:?}")]
pub struct ConsistencyError {
    /// Offending field, e.g. `transaction.id`
    pub field: String,
    /// Session identifier
    pub expected: String,
    /// Value carried by the record
    pub actual: String,
}

/// Result type alias for hub operations
pub type HubResult<T> = Result<T, HubError>;
