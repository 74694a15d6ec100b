//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use schemata_core::{CompileError, RetrieveError, SystemError};
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more documents violate the schema
    #[error("{failed} of {total} document(s) failed validation")]
    ValidationFailed { failed: usize, total: usize },

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// The schema asset could not be compiled
    #[error("Schema error: {0}")]
    Compile(#[from] CompileError),

    /// Some resource types of the schema asset do not compile
    #[error("{failed} of {total} resource type(s) failed to compile")]
    CheckFailed { failed: usize, total: usize },

    /// A document could not be decoded at all
    #[error("Cannot read {}: {source}", path.display())]
    Undecodable {
        path: PathBuf,
        #[source]
        source: SystemError,
    },

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A schema file could not be loaded
    #[error("{0}")]
    Retrieve(#[from] RetrieveError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ValidationFailed { .. } => 1,
            Self::InvalidArgs(_) => 2,
            Self::Compile(_) | Self::CheckFailed { .. } => 3,
            Self::Undecodable { .. } => 4,
            Self::Io(_) | Self::FileNotFound { .. } | Self::Retrieve(_) => 5,
            Self::Config(_) => 6,
            Self::Json(_) | Self::Yaml(_) => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}
