//! Error types shared across Brawl crates.

use thiserror::Error;

/// Top-level error type for Brawl operations.
///
/// Library crates return their own narrower enums; this one is what a host
/// application collects them into.
#[derive(Debug, Error)]
pub enum BrawlError {
    /// Combat contract violation
    #[error("combat error: {0}")]
    Combat(String),

    /// Configuration could not be loaded or validated
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Brawl operations.
pub type BrawlResult<T> = Result<T, BrawlError>;
