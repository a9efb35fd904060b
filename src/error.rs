//! Error types for the tiktok-im-extractor library.
//!
//! Every failure the extraction pipeline can hit is a variant of
//! [`ExtractError`]. Each variant also carries a [`Severity`], which the
//! orchestrator uses to pick a log level and to decide whether the run can
//! keep going.

use thiserror::Error;

/// Errors that can occur while extracting TikTok artifacts.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// No forensic case is open, so nothing can be ingested
    #[error("No case currently open")]
    NoCurrentCase,

    /// Query execution or row fetch against an application database failed
    #[error("Database error: {0}")]
    Query(#[from] rusqlite::Error),

    /// A normalized record could not be written to the case database
    #[error("Error adding artifact to the case database: {0}")]
    Persistence(String),

    /// A record was stored but announcing it to the case failed
    #[error("Error posting artifact: {0}")]
    Posting(String),

    /// A message payload did not have the shape its type tag promises
    #[error("Message payload decode error: {0}")]
    Decode(String),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database discovery failed
    #[error("Database discovery error: {0}")]
    Discovery(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// How bad an [`ExtractError`] is for the extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Stops the whole run
    Fatal,
    /// Data was lost
    Severe,
    /// A side channel failed, or the item can be skipped without data loss
    Warning,
}

impl Severity {
    /// Label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Severe => "severe",
            Self::Warning => "warning",
        }
    }
}

impl ExtractError {
    /// Classify this error for logging and flow control.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::NoCurrentCase => Severity::Fatal,
            Self::Persistence(_) | Self::Pool(_) | Self::Io(_) => Severity::Severe,
            _ => Severity::Warning,
        }
    }

    /// True when the run has to stop.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.severity(), Severity::Fatal)
    }
}

/// Convenience type alias for Result with ExtractError
pub type Result<T> = std::result::Result<T, ExtractError>;
