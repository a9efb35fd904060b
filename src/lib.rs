//! TikTok IM Extractor
//!
//! A Rust library for pulling contacts and direct messages out of the
//! TikTok Android application's SQLite databases and handing them to a
//! forensic case as normalized communication artifacts.
//!
//! # Features
//!
//! - Discover the app's databases in an extracted device image
//! - Decode the JSON message payloads into readable bodies
//! - Ingest contacts and messages into a SQLite-backed case database
//! - Export the case to CSV or JSON

/// Configuration management
pub mod config;
/// Typed column access over result rows
pub mod cursor;
/// Case database operations and connection pooling
pub mod db;
/// Message payload decoding
pub mod decoder;
/// Database discovery in extracted images
pub mod discovery;
/// Error types
pub mod error;
/// Case export to CSV and JSON
pub mod export;
/// Extraction orchestrator
pub mod extractor;
/// Host platform seams
pub mod host;
/// Logging setup and utilities
pub mod logging;
/// Row-to-record mapping
pub mod mappers;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Case database schema definitions
pub mod schema;

// Re-export key components for easier access
pub use db::CaseDatabase;
pub use discovery::ImageDirectoryLocator;
pub use error::{ExtractError, Result};
pub use extractor::{ExtractionReport, TiktokAnalyzer};
pub use models::{ContactRecord, Direction, MessageRecord, ReadStatus};
