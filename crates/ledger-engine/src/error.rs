//! Error types for ledger-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate lookup failed: {0}")]
    RateLookup(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
