//! Error types for docbridge
//!
//! Every failure is terminal for the statement being translated:
//! there is no partial operation.

use thiserror::Error;
use crate::core::path::PathError;

/// Errors that can occur while translating a statement
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslateError {
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("Unsupported condition: {0}")]
    UnsupportedCondition(String),

    #[error("Malformed literal: {0}")]
    MalformedLiteral(String),

    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),

    #[error("Malformed path: {0}")]
    MalformedPath(#[from] PathError),

    #[error("No collection reference found in {0} statement")]
    MissingCollection(String),
}

impl TranslateError {
    /// Short, stable name of the error kind (used by the CLI and batch logs)
    pub fn kind(&self) -> &'static str {
        match self {
            TranslateError::UnsupportedStatement(_) => "UnsupportedStatement",
            TranslateError::UnsupportedCondition(_) => "UnsupportedCondition",
            TranslateError::MalformedLiteral(_) => "MalformedLiteral",
            TranslateError::MalformedMarkup(_) => "MalformedMarkup",
            TranslateError::MalformedPath(_) => "MalformedPath",
            TranslateError::MissingCollection(_) => "MissingCollection",
        }
    }
}

/// Result type for translation
pub type Result<T> = std::result::Result<T, TranslateError>;
