//! Error types for the dashstache template engine.
//!
//! Rendering itself never fails: missing data degrades to a placeholder.
//! These errors come from the edges (loading, config, input conversion).

use thiserror::Error;

pub use dashstache_ast::{ParseError, Position};

/// All errors that can occur in dashstache
#[derive(Error, Debug)]
pub enum DashstacheError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Data error: {message}")]
    Data { message: String },

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dashstache operations
pub type Result<T> = std::result::Result<T, DashstacheError>;
