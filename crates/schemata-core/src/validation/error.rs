//! Validation outcome types
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::store::parser::{DecodeError, Format};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One constraint violation found in a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[error("{path}: {message} ({keyword})")]
pub struct ValidationError {
    /// Location of the offending value, e.g. `contained[0].status`
    pub path: String,
    /// Human-readable description
    pub message: String,
    /// The constraint keyword that failed, e.g. `required`
    pub keyword: String,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new<P, M, K>(path: P, message: M, keyword: K) -> Self
    where
        P: Into<String>,
        M: Into<String>,
        K: Into<String>,
    {
        Self {
            path: path.into(),
            message: message.into(),
            keyword: keyword.into(),
        }
    }
}

/// Result of validating one document
///
/// `valid` is derived from `errors` and cannot be set independently.
/// `truncated` is only ever set on an invalid outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    valid: bool,
    errors: Vec<ValidationError>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    truncated: bool,
}

impl ValidationOutcome {
    /// An outcome with no errors
    pub fn success() -> Self {
        Self::from_errors(Vec::new())
    }

    /// Build an outcome from ordered errors
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            truncated: false,
        }
    }

    /// Mark the errors as cut off by an error limit
    pub fn with_truncation(mut self, truncated: bool) -> Self {
        self.truncated = truncated && !self.valid;
        self
    }

    /// Whether the document satisfied every constraint
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The violations in walk order
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Take ownership of the violations
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Number of violations
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Whether the document has more violations than were collected
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl Default for ValidationOutcome {
    fn default() -> Self {
        Self::success()
    }
}

impl From<Vec<ValidationError>> for ValidationOutcome {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::from_errors(errors)
    }
}

// `valid` is recomputed on the way in so a payload cannot contradict its errors
impl<'de> Deserialize<'de> for ValidationOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            #[serde(default)]
            errors: Vec<ValidationError>,
            #[serde(default)]
            truncated: bool,
        }

        let wire = Wire::deserialize(deserializer)?;
        Ok(Self::from_errors(wire.errors).with_truncation(wire.truncated))
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return write!(f, "valid");
        }

        write!(f, "invalid: {} error(s)", self.errors.len())?;
        if self.truncated {
            write!(f, ", more not reported")?;
        }
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

/// Failures outside the document's control
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SystemError {
    #[error("document cannot be decoded as {format}: {reason}")]
    Decode { format: Format, reason: String },
}

impl SystemError {
    /// Create a decode error
    pub fn decode(format: Format, error: &DecodeError) -> Self {
        Self::Decode {
            format,
            reason: error.to_string(),
        }
    }

    /// System errors are never retried by the core
    pub fn is_recoverable(&self) -> bool {
        false
    }
}
