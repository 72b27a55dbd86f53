//! Error types for the subcast relay
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the subcast relay
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (bad file, missing key pattern)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key pattern failed to compile
    #[error("Invalid key pattern '{pattern}': {source}")]
    Pattern {
        /// The offending pattern text
        pattern: String,
        /// The underlying regex error
        source: regex::Error,
    },

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a pattern error
    pub fn pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            source,
        }
    }
}
