//! Decoding of schema assets and documents from JSON or YAML bytes
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::store::error::RetrieveError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Supported serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml)
    Yaml,
}

impl Format {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self, RetrieveError> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref()
        {
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            _ => Err(RetrieveError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Get file extensions for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Json => &["json"],
            Format::Yaml => &["yaml", "yml"],
        }
    }

    /// Lowercase name of the format
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }

    /// Single-byte tag mixed into source digests
    pub(crate) fn tag(&self) -> u8 {
        match self {
            Format::Json => b'j',
            Format::Yaml => b'y',
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a byte stream could not be turned into a structured tree
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Stateless decoder shared by the schema store and the validator
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaParser;

impl SchemaParser {
    /// Decode bytes in the given format into a generic JSON tree
    pub fn decode(bytes: &[u8], format: Format) -> Result<Value, DecodeError> {
        match format {
            Format::Json => Self::decode_json(bytes),
            Format::Yaml => Self::decode_yaml(bytes),
        }
    }

    /// Decode JSON bytes
    pub fn decode_json(bytes: &[u8]) -> Result<Value, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode YAML bytes
    pub fn decode_yaml(bytes: &[u8]) -> Result<Value, DecodeError> {
        // Parse as YAML first so YAML-specific errors surface with YAML positions
        let yaml_value: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
        Ok(serde_json::to_value(yaml_value)?)
    }
}
