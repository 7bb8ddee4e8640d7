//! Construction-time errors
//!
//! Parsing itself never fails; only building a parser from custom
//! configuration or rule patterns can.

use thiserror::Error;

pub type Result<T, E = QueryError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid parser config: {0}")]
    InvalidConfig(String),
    #[error("config decode error: {0}")]
    Json(#[from] serde_json::Error),
}
