//! # Support Search
//!
//! Main library for the support site search binary.
//!
//! This crate reads the process settings, wires the engine client, the
//! entity stores, the indexing pipeline and the compound search together,
//! and implements the commands of the `support-search` CLI.

pub mod cli;
pub mod commands;
pub mod config;
pub mod fixtures;
pub mod telemetry;

pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur while starting up or running a command.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Setup error that is not tied to a single setting.
    #[error("Setup error: {0}")]
    Setup(String),

    /// Indexing pipeline error.
    #[error("Indexing error: {0}")]
    Indexing(#[from] support_search_pipeline::IndexingError),

    /// Search error.
    #[error("Search error: {0}")]
    Search(#[from] support_search_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The log subscriber could not be installed.
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl AppError {
    /// Create a setup error.
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    /// Create a telemetry error.
    pub fn telemetry(msg: impl Into<String>) -> Self {
        Self::Telemetry(msg.into())
    }
}
