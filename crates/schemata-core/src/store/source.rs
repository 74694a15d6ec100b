//! Raw schema assets as handed to the store by an external loader
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::store::error::RetrieveError;
use crate::store::parser::Format;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Content identity of a schema source: SHA-256 over the format tag and bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceDigest([u8; 32]);

impl SourceDigest {
    fn of(format: Format, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([format.tag()]);
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for SourceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// A named byte stream holding one schema document
///
/// Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone)]
pub struct SchemaSource {
    name: String,
    bytes: Arc<[u8]>,
    format: Format,
    digest: SourceDigest,
}

impl SchemaSource {
    /// Create a source from raw bytes
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>, format: Format) -> Self {
        let bytes: Vec<u8> = bytes.into();
        let digest = SourceDigest::of(format, &bytes);
        Self {
            name: name.into(),
            bytes: bytes.into(),
            format,
            digest,
        }
    }

    /// Create a JSON source from text
    pub fn json(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, text.into().into_bytes(), Format::Json)
    }

    /// Create a YAML source from text
    pub fn yaml(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, text.into().into_bytes(), Format::Yaml)
    }

    /// Read a source from disk, detecting the format from the extension
    pub fn from_path(path: &Path) -> Result<Self, RetrieveError> {
        let format = Format::from_path(path)?;
        let bytes =
            std::fs::read(path).map_err(|e| RetrieveError::io_error(path.to_path_buf(), e))?;
        Ok(Self::new(path.display().to_string(), bytes, format))
    }

    /// Name used in error messages and as the document URI
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The declared format
    pub fn format(&self) -> Format {
        self.format
    }

    /// Content digest used as the document cache key
    pub fn digest(&self) -> SourceDigest {
        self.digest
    }
}
