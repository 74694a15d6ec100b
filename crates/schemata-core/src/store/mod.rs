//! Schema store: parsing, sub-schema lookup and compilation
//!
//! This module provides:
//! - JSON and YAML schema assets
//! - Resource type lookup under `definitions` (or `$defs`)
//! - `$ref` resolution, including recursive and cross-document references
//! - Parse-once / compile-once caching with single-flight semantics
//!
//! # Example Usage
//!
//! ```rust
//! use schemata_core::store::{SchemaSource, SchemaStore};
//!
//! let source = SchemaSource::json(
//!     "schema.json",
//!     r#"{"definitions": {"Basic": {"type": "object", "required": ["status"]}}}"#,
//! );
//! let store = SchemaStore::new();
//! let compiled = store.compile(&source, "Basic")?;
//! assert_eq!(compiled.resource_type(), "Basic");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

pub mod compiled;
pub mod document;
pub mod error;
pub mod parser;
pub(crate) mod resolver;
pub mod retrieve;
pub mod schema_store;
pub mod source;

pub use compiled::{CompiledSchema, InstanceType, NodeId, NodeKind, SchemaNode, TypeSet};
pub use document::{SchemaDocument, SubSchemaHandle};
pub use error::{CompileError, CompileErrorKind, CompileResult, RetrieveError};
pub use parser::{DecodeError, Format, SchemaParser};
pub use retrieve::{DirectoryRetriever, InMemoryRetriever, NoRetrieve, Retrieve};
pub use schema_store::{global_store, SchemaStore, StoreConfig, StoreStats};
pub use source::{SchemaSource, SourceDigest};
