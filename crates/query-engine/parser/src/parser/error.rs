//! Errors that can be thrown while parsing query parameters.

use std::fmt;

use thiserror::Error;

use super::QueryParameter;

/// The category of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    SyntaxError,
    UnknownProperty,
    TypeMismatch,
    InvalidPaging,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseErrorKind::SyntaxError => write!(f, "Syntax error"),
            ParseErrorKind::UnknownProperty => write!(f, "Unknown property"),
            ParseErrorKind::TypeMismatch => write!(f, "Type mismatch"),
            ParseErrorKind::InvalidPaging => write!(f, "Invalid paging"),
        }
    }
}

/// A query parameter that could not be parsed.
///
/// `position` is the character offset of the offending token inside the raw parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in {parameter} at position {position}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub parameter: QueryParameter,
    pub position: usize,
    pub message: String,
}

/// A failure inside a single parameter value, before we know which parameter it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Failure {
    pub kind: ParseErrorKind,
    pub position: usize,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ParseErrorKind, position: usize, message: impl Into<String>) -> Self {
        Failure {
            kind,
            position,
            message: message.into(),
        }
    }

    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::SyntaxError, position, message)
    }

    pub fn within(self, parameter: QueryParameter) -> ParseError {
        ParseError {
            kind: self.kind,
            parameter,
            position: self.position,
            message: self.message,
        }
    }
}
