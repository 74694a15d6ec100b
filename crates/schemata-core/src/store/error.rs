//! Error types for schema compilation and reference retrieval
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations
pub type CompileResult<T> = Result<T, CompileError>;

/// The three permanent ways a schema asset can fail to compile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileErrorKind {
    /// The master document (or a keyword inside it) is not well-formed
    ParseFailure,
    /// The requested resource type has no definition
    UnknownType,
    /// A `$ref` target does not exist or cannot be reached
    UnresolvedReference,
}

impl CompileErrorKind {
    /// Stable reason string for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseFailure => "parse-failure",
            Self::UnknownType => "unknown-type",
            Self::UnresolvedReference => "unresolved-reference",
        }
    }
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration errors raised while compiling a sub-schema
///
/// All variants describe a bad schema asset. None of them is retryable, and
/// no partially compiled schema is ever handed out alongside one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The document could not be parsed, or a keyword value is malformed
    #[error("Failed to parse schema '{source_name}': {reason}")]
    ParseFailure { source_name: String, reason: String },

    /// No definition exists for the resource type
    #[error("Unknown resource type '{resource_type}' in schema '{source_name}'")]
    UnknownType {
        resource_type: String,
        source_name: String,
    },

    /// A reference could not be resolved
    #[error("Unresolved reference '{reference}' at '{location}': {reason}")]
    UnresolvedReference {
        reference: String,
        location: String,
        reason: String,
    },
}

impl CompileError {
    /// Create a parse failure
    pub fn parse_failure(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse failure for a malformed keyword value
    pub fn invalid_keyword(
        source_name: &str,
        location: &str,
        keyword: &str,
        expected: &str,
    ) -> Self {
        Self::parse_failure(
            source_name,
            format!("keyword '{}' at '{}' must be {}", keyword, location, expected),
        )
    }

    /// Create an unknown-type error
    pub fn unknown_type(resource_type: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::UnknownType {
            resource_type: resource_type.into(),
            source_name: source_name.into(),
        }
    }

    /// Create an unresolved-reference error
    pub fn unresolved(
        reference: impl Into<String>,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvedReference {
            reference: reference.into(),
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// The kind of this error
    pub fn kind(&self) -> CompileErrorKind {
        match self {
            Self::ParseFailure { .. } => CompileErrorKind::ParseFailure,
            Self::UnknownType { .. } => CompileErrorKind::UnknownType,
            Self::UnresolvedReference { .. } => CompileErrorKind::UnresolvedReference,
        }
    }

    /// Stable reason string (`parse-failure`, `unknown-type`, `unresolved-reference`)
    pub fn reason(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Compile errors come from the schema asset itself, so retrying never helps
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

/// Errors raised while fetching a referenced schema document
#[derive(Error, Debug)]
pub enum RetrieveError {
    /// The retriever has no document for this URI
    #[error("No schema document is available for '{uri}'")]
    NotFound { uri: String },

    /// The document exists but could not be read
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file extension does not name a supported format
    #[error("Unsupported file format for '{}'. Expected .yaml, .yml, or .json", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The URI escapes the retriever's base directory
    #[error("Path traversal detected in reference '{uri}'")]
    PathTraversal { uri: String },
}

impl RetrieveError {
    /// Create a not-found error
    pub fn not_found(uri: impl Into<String>) -> Self {
        Self::NotFound { uri: uri.into() }
    }

    /// Create an I/O error with path context
    pub fn io_error(path: PathBuf, error: std::io::Error) -> Self {
        Self::Io {
            path,
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        let err = CompileError::parse_failure("schema.json", "expected value at line 1");
        assert_eq!(err.reason(), "parse-failure");
        assert!(!err.is_recoverable());

        let err = CompileError::unknown_type("Patient", "schema.json");
        assert_eq!(err.kind(), CompileErrorKind::UnknownType);
        assert_eq!(
            err.to_string(),
            "Unknown resource type 'Patient' in schema 'schema.json'"
        );

        let err = CompileError::unresolved("#/definitions/Missing", "#/definitions/A", "not found");
        assert_eq!(err.reason(), "unresolved-reference");
    }

    #[test]
    fn test_invalid_keyword_is_parse_failure() {
        let err = CompileError::invalid_keyword("s.json", "#/definitions/A", "required", "an array of strings");
        assert_eq!(err.kind(), CompileErrorKind::ParseFailure);
        assert!(err.to_string().contains("keyword 'required' at '#/definitions/A'"));
    }
}
