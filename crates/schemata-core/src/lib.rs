//! Schemata Core - schema-driven document validation
//!
//! Given a JSON or YAML schema asset that defines resource types under
//! `definitions`, this crate answers one question: does a document conform to
//! the definition registered for its resource type, and if not, where and why?
//!
//! ## Features
//!
//! - **Schema Store**: parse-once, compile-once caching of sub-schemas, with
//!   recursive and cross-document `$ref` resolution
//! - **Exhaustive Validation**: every independent violation is collected in a
//!   single pass, in a deterministic order
//! - **Readable Paths**: errors point into the document as `contained[0].status`
//! - **Vocabulary**: the closed value sets of the REST capability vocabulary
//!
//! ## Quick Start
//!
//! ```rust
//! use schemata_core::{SchemaSource, SchemaStore};
//! use serde_json::json;
//!
//! let source = SchemaSource::json(
//!     "capability.schema.json",
//!     r#"{
//!         "definitions": {
//!             "CapabilityStatement": {
//!                 "type": "object",
//!                 "required": ["status"],
//!                 "properties": {
//!                     "status": {"enum": ["draft", "active", "retired", "unknown"]}
//!                 }
//!             }
//!         }
//!     }"#,
//! );
//!
//! let store = SchemaStore::new();
//! let validator = store.validator(&source, "CapabilityStatement")?;
//!
//! let outcome = validator.validate(&json!({"status": "bogus"}));
//! assert!(!outcome.is_valid());
//! assert_eq!(outcome.errors()[0].path, "status");
//! assert_eq!(outcome.errors()[0].keyword, "enum");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The library never logs; callers decide what to surface.

pub mod store;
pub mod validation;
pub mod vocabulary;

pub use store::{
    global_store, CompileError, CompileErrorKind, CompileResult, CompiledSchema,
    DirectoryRetriever, Format, InMemoryRetriever, NoRetrieve, Retrieve, RetrieveError,
    SchemaDocument, SchemaSource, SchemaStore, StoreConfig, StoreStats, SubSchemaHandle,
};
pub use validation::{
    ErrorReporter, InstancePath, SystemError, ValidationConfig, ValidationError,
    ValidationOutcome, Validator,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
