//! Format error types
//!
//! Errors raised while decoding the bracket notation or mapping decoded nodes
//! onto record fields.

use thiserror::Error;

/// Errors that can occur while decoding bracket-encoded text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Input ended inside an open list
    #[error("unbalanced braces: list opened at byte {offset} is never closed")]
    Unbalanced { offset: usize },

    /// Input ended inside a quoted string
    #[error("unterminated string starting at byte {offset}")]
    UnterminatedString { offset: usize },

    /// A byte that cannot appear at this point of the grammar
    #[error("unexpected {found:?} at byte {offset}")]
    Unexpected { offset: usize, found: char },

    /// Input is empty or holds only whitespace
    #[error("empty input")]
    Empty,

    /// Node bytes are not valid UTF-8
    #[error("node is not valid UTF-8")]
    InvalidUtf8,

    /// Positional field is absent
    #[error("missing field {index}")]
    MissingField { index: usize },

    /// Positional field is present but has the wrong shape or value
    #[error("invalid field {index}: {message}")]
    InvalidField { index: usize, message: String },

    /// Bare value that no notation text decodes back to
    #[error("bare value {value:?} cannot be written: {reason}")]
    Unrepresentable { value: String, reason: &'static str },
}

impl FormatError {
    /// Create an unexpected character error
    #[inline]
    pub fn unexpected(offset: usize, found: char) -> Self {
        Self::Unexpected { offset, found }
    }

    /// Create a missing field error
    #[inline]
    pub fn missing_field(index: usize) -> Self {
        Self::MissingField { index }
    }

    /// Create an unrepresentable value error
    #[inline]
    pub fn unrepresentable(value: &str, reason: &'static str) -> Self {
        Self::Unrepresentable {
            value: value.to_string(),
            reason,
        }
    }

    /// Create an invalid field error
    #[inline]
    pub fn invalid_field(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidField {
            index,
            message: message.into(),
        }
    }
}
