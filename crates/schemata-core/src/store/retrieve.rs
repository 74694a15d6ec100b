//! Retrieval of documents named by cross-document references
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::store::error::RetrieveError;
use crate::store::source::SchemaSource;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Answers "give me the document for URI `u`" for external `$ref`s
pub trait Retrieve: Send + Sync {
    /// Fetch the source named by `uri`
    fn retrieve(&self, uri: &str) -> Result<SchemaSource, RetrieveError>;
}

/// Retriever for self-contained schema assets: every external reference is unresolved
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRetrieve;

impl Retrieve for NoRetrieve {
    fn retrieve(&self, uri: &str) -> Result<SchemaSource, RetrieveError> {
        Err(RetrieveError::not_found(uri))
    }
}

/// Retriever backed by sources registered up front
#[derive(Debug, Default, Clone)]
pub struct InMemoryRetriever {
    sources: HashMap<String, SchemaSource>,
}

impl InMemoryRetriever {
    /// Create an empty retriever
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under a URI
    pub fn with_source(mut self, uri: impl Into<String>, source: SchemaSource) -> Self {
        self.insert(uri, source);
        self
    }

    /// Register a source under a URI
    pub fn insert(&mut self, uri: impl Into<String>, source: SchemaSource) {
        self.sources.insert(uri.into(), source);
    }
}

impl Retrieve for InMemoryRetriever {
    fn retrieve(&self, uri: &str) -> Result<SchemaSource, RetrieveError> {
        self.sources
            .get(uri)
            .cloned()
            .ok_or_else(|| RetrieveError::not_found(uri))
    }
}

/// Retriever that maps relative URIs to files under a base directory
#[derive(Debug, Clone)]
pub struct DirectoryRetriever {
    base_dir: PathBuf,
}

impl DirectoryRetriever {
    /// Create a retriever rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Whether a relative path stays inside the base directory
    fn is_safe_path(&self, relative: &Path) -> bool {
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return false;
        }

        let full_path = self.base_dir.join(relative);
        match (full_path.canonicalize(), self.base_dir.canonicalize()) {
            (Ok(canonical_path), Ok(canonical_base)) => canonical_path.starts_with(canonical_base),
            // Missing files are reported as not found by the read itself
            (Err(_), Ok(_)) => true,
            _ => false,
        }
    }
}

impl Retrieve for DirectoryRetriever {
    fn retrieve(&self, uri: &str) -> Result<SchemaSource, RetrieveError> {
        let relative = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
        if !self.is_safe_path(relative) {
            return Err(RetrieveError::PathTraversal {
                uri: uri.to_string(),
            });
        }

        let path = self.base_dir.join(relative);
        if !path.exists() {
            return Err(RetrieveError::not_found(uri));
        }
        let source = SchemaSource::from_path(&path)?;
        // Name the document by its URI so references back into it resolve locally
        Ok(SchemaSource::new(uri, source.bytes().to_vec(), source.format()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_no_retrieve() {
        assert!(matches!(
            NoRetrieve.retrieve("common.json"),
            Err(RetrieveError::NotFound { .. })
        ));
    }

    #[test]
    fn test_in_memory() {
        let retriever = InMemoryRetriever::new()
            .with_source("common.json", SchemaSource::json("common.json", "{}"));
        assert!(retriever.retrieve("common.json").is_ok());
        assert!(retriever.retrieve("other.json").is_err());
    }

    #[test]
    fn test_directory_retriever() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("common.json"), r#"{"definitions": {}}"#).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/types.yaml"), "definitions: {}\n").unwrap();

        let retriever = DirectoryRetriever::new(dir.path());
        let source = retriever.retrieve("common.json").unwrap();
        assert_eq!(source.name(), "common.json");

        let nested = retriever.retrieve("nested/types.yaml").unwrap();
        assert_eq!(nested.format(), crate::store::parser::Format::Yaml);

        assert!(matches!(
            retriever.retrieve("missing.json"),
            Err(RetrieveError::NotFound { .. })
        ));
        assert!(matches!(
            retriever.retrieve("../escape.json"),
            Err(RetrieveError::PathTraversal { .. })
        ));
        assert!(matches!(
            retriever.retrieve("/etc/passwd.json"),
            Err(RetrieveError::PathTraversal { .. })
        ));
    }
}
