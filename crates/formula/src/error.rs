//! Error types for formula parsing, validation and evaluation.

use std::fmt;

use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

use crate::argument::ArgumentKind;
use crate::context::ContextError;
use crate::value::Value;

/// A parse error with user-friendly context and error messages.
///
/// This error type provides more helpful information than the default nom errors,
/// including the position of the error and a description of what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseErrorInfo<I> {
    /// The input position where the error occurred
    pub input: I,
    /// A description of what went wrong
    pub message: String,
    /// The kind of error (from nom)
    pub kind: ErrorKind,
}

impl<I> ParseErrorInfo<I> {
    /// Create a new parse error with a custom message.
    pub fn new(input: I, message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            input,
            message: message.into(),
            kind,
        }
    }

    /// Create a parse error from a nom ErrorKind with a default message.
    pub fn from_kind(input: I, kind: ErrorKind) -> Self {
        let message = match kind {
            ErrorKind::Digit => "expected a number".to_string(),
            ErrorKind::Alpha => "expected a function name".to_string(),
            ErrorKind::Tag => "unexpected token".to_string(),
            ErrorKind::Char => "unexpected character".to_string(),
            ErrorKind::NonEmpty => "unexpected trailing input".to_string(),
            ErrorKind::Eof => "unexpected end of input".to_string(),
            _ => format!("parse error: {:?}", kind),
        };

        Self {
            input,
            message,
            kind,
        }
    }
}

impl ParseErrorInfo<&str> {
    /// Detach the error from the borrowed input so it can outlive the source text.
    pub fn into_owned(self) -> ParseErrorInfo<String> {
        ParseErrorInfo {
            input: self.input.to_string(),
            message: self.message,
            kind: self.kind,
        }
    }
}

impl<I: fmt::Display> fmt::Display for ParseErrorInfo<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at: {}", self.message, self.input)
    }
}

impl<I: fmt::Display + fmt::Debug> std::error::Error for ParseErrorInfo<I> {}

impl<I> ParseError<I> for ParseErrorInfo<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        Self::from_kind(input, kind)
    }

    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Helper function to create a parse error with a custom message.
pub fn parse_error<I>(input: I, message: impl Into<String>) -> ParseErrorInfo<I> {
    ParseErrorInfo::new(input, message, ErrorKind::Fail)
}

/// Raised by an argument type when a value cannot be coerced into it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {value:?} to {expected}")]
pub struct TypeCoercionError {
    pub expected: ArgumentKind,
    pub value: Value,
}

impl TypeCoercionError {
    pub fn new(expected: ArgumentKind, value: Value) -> Self {
        Self { expected, value }
    }
}

/// Everything that can go wrong between formula text and a value.
#[derive(Debug, Error)]
pub enum FormulaError {
    #[error("invalid formula: {0}")]
    Parse(#[from] ParseErrorInfo<String>),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    #[error("invalid number of arguments for `{function}`: got {}", args.len())]
    InvalidNumberOfArguments { function: String, args: Vec<Value> },

    #[error("invalid argument for `{function}`: {argument:?}")]
    InvalidFormulaArgumentType { function: String, argument: Value },

    #[error(transparent)]
    TypeCoercion(#[from] TypeCoercionError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("`{function}` failed: {message}")]
    Execution { function: String, message: String },

    #[error("cannot convert rich text to a formula: {0}")]
    Conversion(String),
}

impl FormulaError {
    pub(crate) fn execution(function: &str, message: impl Into<String>) -> Self {
        FormulaError::Execution {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

pub type FormulaResult<T> = Result<T, FormulaError>;
