//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use crate::logging::LogFormat;
use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schemata CLI - validate resource documents against a schema asset
///
/// Compiles the definition of one resource type from a JSON or YAML schema
/// asset and reports every violation found in each document.
#[derive(Parser, Debug)]
#[command(
    name = "schemata",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SCHEMATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results [default: human]
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Log output format
    #[arg(long, value_enum, global = true, env = "SCHEMATA_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate documents against the definition of a resource type
    Validate(ValidateArgs),

    /// List the resource types defined by a schema asset
    Types(SchemaArgs),

    /// Compile every resource type of a schema asset and report failures
    Check(SchemaArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the schema asset (JSON or YAML); falls back to `schema` in the config
    #[arg(short, long, value_name = "SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Resource type to validate against
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub resource_type: String,

    /// Document format; detected from the file extension when omitted
    #[arg(short, long, value_enum)]
    pub format: Option<DocumentFormat>,

    /// Stop after this many errors per document (0 reports all)
    #[arg(long, value_name = "N")]
    pub max_errors: Option<usize>,

    /// Documents to validate (`-` reads standard input)
    #[arg(value_name = "DOCUMENT", required = true, num_args = 1..)]
    pub documents: Vec<PathBuf>,
}

/// Arguments for commands that only need a schema asset
#[derive(Parser, Debug)]
pub struct SchemaArgs {
    /// Path to the schema asset (JSON or YAML); falls back to `schema` in the config
    #[arg(short, long, value_name = "SCHEMA")]
    pub schema: Option<PathBuf>,
}

/// Output format options
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable formatted output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Serialization format of documents
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DocumentFormat {
    /// JSON documents
    Json,
    /// YAML documents
    Yaml,
}

impl From<DocumentFormat> for schemata_core::Format {
    fn from(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::Json => schemata_core::Format::Json,
            DocumentFormat::Yaml => schemata_core::Format::Yaml,
        }
    }
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
