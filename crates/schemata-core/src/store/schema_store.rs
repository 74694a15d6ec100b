//! The schema store: parse once, compile once per resource type
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::store::compiled::CompiledSchema;
use crate::store::document::{SchemaDocument, SubSchemaHandle};
use crate::store::error::{CompileError, CompileResult};
use crate::store::resolver::{DocumentLoader, ReferenceResolver};
use crate::store::retrieve::{NoRetrieve, Retrieve};
use crate::store::source::{SchemaSource, SourceDigest};
use crate::validation::validator::Validator;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

/// Configuration for store behavior
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Longest chain of `$ref` hops allowed without descending into the instance
    pub max_reference_depth: usize,
    /// Whether compiled schemas are cached per (source, resource type)
    pub cache_compiled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_reference_depth: 256,
            cache_compiled: true,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// Parsed documents held, including retrieved ones
    pub documents: usize,
    /// Compilation slots held (successful or failed)
    pub compiled: usize,
}

type CompileCell = Arc<OnceLock<CompileResult<Arc<CompiledSchema>>>>;

/// Owns parsed schema documents and their compiled sub-schemas
///
/// Safe to share across threads. Compilation for a given `(source, resource
/// type)` pair runs at most once even under concurrent first use; callers for
/// other resource types are never blocked by it.
pub struct SchemaStore {
    config: StoreConfig,
    retriever: Box<dyn Retrieve>,
    documents: RwLock<HashMap<SourceDigest, Arc<SchemaDocument>>>,
    retrieved: RwLock<HashMap<String, Arc<SchemaDocument>>>,
    compiled: Mutex<HashMap<(SourceDigest, String), CompileCell>>,
}

impl fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaStore")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaStore {
    /// Create a store with default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store with custom configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            retriever: Box::new(NoRetrieve),
            documents: RwLock::new(HashMap::new()),
            retrieved: RwLock::new(HashMap::new()),
            compiled: Mutex::new(HashMap::new()),
        }
    }

    /// Use a retriever for cross-document references
    pub fn with_retriever(mut self, retriever: impl Retrieve + 'static) -> Self {
        self.retriever = Box::new(retriever);
        self
    }

    /// The active configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Parse a source, reusing the cached document for identical content
    pub fn document(&self, source: &SchemaSource) -> CompileResult<Arc<SchemaDocument>> {
        let digest = source.digest();
        if let Some(document) = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&digest)
        {
            return Ok(Arc::clone(document));
        }

        let document = Arc::new(SchemaDocument::parse(source)?);
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(documents.entry(digest).or_insert(document)))
    }

    /// Look up the named view for a resource type
    pub fn sub_schema(
        &self,
        source: &SchemaSource,
        resource_type: &str,
    ) -> CompileResult<SubSchemaHandle> {
        SubSchemaHandle::new(self.document(source)?, resource_type)
    }

    /// Compile the sub-schema for a resource type
    pub fn compile(
        &self,
        source: &SchemaSource,
        resource_type: &str,
    ) -> CompileResult<Arc<CompiledSchema>> {
        if !self.config.cache_compiled {
            return self.compile_uncached(source, resource_type);
        }

        let cell = {
            let mut compiled = self.compiled.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                compiled
                    .entry((source.digest(), resource_type.to_string()))
                    .or_default(),
            )
        };

        cell.get_or_init(|| self.compile_uncached(source, resource_type))
            .clone()
    }

    /// Build a validator for a resource type
    pub fn validator(&self, source: &SchemaSource, resource_type: &str) -> CompileResult<Validator> {
        Ok(Validator::new(self.compile(source, resource_type)?))
    }

    /// Compile every resource type the source defines
    ///
    /// Returns the per-type failures; the outer error is reserved for a
    /// document that does not parse at all.
    pub fn warm_up(&self, source: &SchemaSource) -> CompileResult<Vec<(String, CompileError)>> {
        let document = self.document(source)?;
        let failures = document
            .resource_types()
            .into_iter()
            .filter_map(|resource_type| {
                self.compile(source, resource_type)
                    .err()
                    .map(|e| (resource_type.to_string(), e))
            })
            .collect();
        Ok(failures)
    }

    /// Cache statistics
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            documents: self.documents.read().unwrap_or_else(PoisonError::into_inner).len(),
            compiled: self.compiled.lock().unwrap_or_else(PoisonError::into_inner).len(),
        }
    }

    /// Drop every cached document and compilation
    pub fn clear(&self) {
        self.documents.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.retrieved.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.compiled.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn compile_uncached(
        &self,
        source: &SchemaSource,
        resource_type: &str,
    ) -> CompileResult<Arc<CompiledSchema>> {
        let handle = self.sub_schema(source, resource_type)?;
        let compiled = ReferenceResolver::new(self, self.config.max_reference_depth).compile(&handle)?;
        Ok(Arc::new(compiled))
    }
}

impl DocumentLoader for SchemaStore {
    fn load(&self, uri: &str) -> CompileResult<Arc<SchemaDocument>> {
        if let Some(document) = self
            .retrieved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
        {
            return Ok(Arc::clone(document));
        }

        let source = self
            .retriever
            .retrieve(uri)
            .map_err(|e| CompileError::unresolved(uri, uri, e.to_string()))?;
        let document = self.document(&source)?;

        let mut retrieved = self.retrieved.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(retrieved.entry(uri.to_string()).or_insert(document)))
    }
}

/// Process-wide store for callers that do not manage their own
pub fn global_store() -> &'static SchemaStore {
    static STORE: OnceLock<SchemaStore> = OnceLock::new();
    STORE.get_or_init(SchemaStore::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::retrieve::InMemoryRetriever;
    use serde_json::json;

    fn source() -> SchemaSource {
        SchemaSource::json(
            "store.json",
            json!({
                "definitions": {
                    "A": {"type": "object", "properties": {"b": {"$ref": "#/definitions/B"}}},
                    "B": {"type": "string"},
                    "Broken": {"$ref": "#/definitions/Nowhere"}
                }
            })
            .to_string(),
        )
    }

    #[test]
    fn test_compile_is_cached() {
        let store = SchemaStore::new();
        let first = store.compile(&source(), "A").unwrap();
        let second = store.compile(&source(), "A").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.stats(), StoreStats { documents: 1, compiled: 1 });
    }

    #[test]
    fn test_uncached_recompiles() {
        let store = SchemaStore::with_config(StoreConfig {
            cache_compiled: false,
            ..StoreConfig::default()
        });
        let first = store.compile(&source(), "A").unwrap();
        let second = store.compile(&source(), "A").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(store.stats().compiled, 0);
    }

    #[test]
    fn test_errors_are_cached_and_stable() {
        let store = SchemaStore::new();
        let first = store.compile(&source(), "Broken").unwrap_err();
        let second = store.compile(&source(), "Broken").unwrap_err();
        assert_eq!(first, second);
        assert_eq!(first.reason(), "unresolved-reference");
    }

    #[test]
    fn test_warm_up_reports_failures() {
        let store = SchemaStore::new();
        let failures = store.warm_up(&source()).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "Broken");

        let bad = SchemaSource::json("bad.json", "{not json");
        assert_eq!(store.warm_up(&bad).unwrap_err().reason(), "parse-failure");
    }

    #[test]
    fn test_external_reference_through_retriever() {
        let common = SchemaSource::json(
            "common.json",
            json!({"definitions": {"code": {"type": "string", "pattern": "^\\S+$"}}}).to_string(),
        );
        let main = SchemaSource::json(
            "main.json",
            json!({"definitions": {"A": {"properties": {"c": {"$ref": "common.json#/definitions/code"}}}}})
                .to_string(),
        );

        let store = SchemaStore::new()
            .with_retriever(InMemoryRetriever::new().with_source("common.json", common));
        let compiled = store.compile(&main, "A").unwrap();
        assert!(compiled
            .nodes()
            .any(|(_, n)| n.location() == "common.json#/definitions/code"));
        assert_eq!(store.stats().documents, 2);

        let without = SchemaStore::new();
        assert_eq!(without.compile(&main, "A").unwrap_err().reason(), "unresolved-reference");
    }

    #[test]
    fn test_clear() {
        let store = SchemaStore::new();
        store.compile(&source(), "A").unwrap();
        store.clear();
        assert_eq!(store.stats(), StoreStats::default());
    }
}
