//! # Error Types
//!
//! Errors raised while constructing or decoding core values. Higher layers
//! wrap these in their own error enums.

use thiserror::Error;

/// Error produced by the foundational types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A value failed validation at construction.
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization or deserialization of a core value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
