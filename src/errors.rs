//! Error types for SupportRAG
//!
//! Parsing and normalisation problems never show up here: they are absorbed
//! where they happen with documented fallbacks. What remains are provider
//! failures (embedding, index, generation) and configuration problems.

use thiserror::Error;

/// Main error type for the support assistant
#[derive(Error, Debug)]
pub enum SupportError {
    /// Configuration errors (missing credentials, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index errors
    #[error("Vector index error: {0}")]
    Index(String),

    /// Answer generation errors
    #[error("Generation error: {0}")]
    Generation(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for support operations
pub type Result<T> = std::result::Result<T, SupportError>;

impl SupportError {
    /// True for problems the operator must fix before any request can succeed
    pub fn is_config(&self) -> bool {
        matches!(self, SupportError::Config(_))
    }

    /// First line of the error message, safe to show to an end user
    pub fn brief(&self) -> String {
        let full = self.to_string();
        let line = full.lines().next().unwrap_or_default();
        if line.chars().count() > 160 {
            let truncated: String = line.chars().take(157).collect();
            format!("{}...", truncated)
        } else {
            line.to_string()
        }
    }
}

/// Convert anyhow errors to SupportError
impl From<anyhow::Error> for SupportError {
    fn from(err: anyhow::Error) -> Self {
        SupportError::Generic(err.to_string())
    }
}
