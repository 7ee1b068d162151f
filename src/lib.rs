//! Roadmap - Roll up and filter hierarchical work-item schedules.
//!
//! This library provides the core functionality for the `roadmap` CLI tool:
//! building the work-item tree, aggregating dates and progress bottom-up,
//! and projecting the result through area, type, keyword and tag filters
//! into Gantt-ready tasks and links.

pub mod cli;
pub mod commands;
pub mod config;
pub mod dates;
pub mod models;
pub mod roadmap;
pub mod source;


/// Library-level error type for roadmap operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for roadmap operations.
pub type Result<T> = std::result::Result<T, Error>;
