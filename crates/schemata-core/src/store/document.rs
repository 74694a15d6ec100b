//! Parsed master schema documents and named views into them
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::store::error::{CompileError, CompileResult};
use crate::store::parser::SchemaParser;
use crate::store::source::{SchemaSource, SourceDigest};
use serde_json::Value;
use std::sync::Arc;

/// Map keys under which resource type definitions are looked up, in order
const DEFINITION_KEYS: [&str; 2] = ["definitions", "$defs"];

/// An immutable, parsed schema document
#[derive(Debug)]
pub struct SchemaDocument {
    name: String,
    digest: SourceDigest,
    root: Value,
    definitions_key: Option<&'static str>,
}

impl SchemaDocument {
    /// Parse a source into a document
    pub fn parse(source: &SchemaSource) -> CompileResult<Self> {
        let root = SchemaParser::decode(source.bytes(), source.format())
            .map_err(|e| CompileError::parse_failure(source.name(), e.to_string()))?;

        if !root.is_object() {
            return Err(CompileError::parse_failure(
                source.name(),
                "schema document must be an object at the root level",
            ));
        }

        let mut definitions_key = None;
        for key in DEFINITION_KEYS {
            match root.get(key) {
                Some(Value::Object(_)) => {
                    definitions_key = Some(key);
                    break;
                }
                Some(_) => {
                    return Err(CompileError::invalid_keyword(
                        source.name(),
                        &format!("#/{}", key),
                        key,
                        "an object",
                    ));
                }
                None => {}
            }
        }

        Ok(Self {
            name: source.name().to_string(),
            digest: source.digest(),
            root,
            definitions_key,
        })
    }

    /// Name of the source this document was parsed from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Digest of the source bytes
    pub fn digest(&self) -> SourceDigest {
        self.digest
    }

    /// The whole parsed tree
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Resource type names in declared order
    pub fn resource_types(&self) -> Vec<&str> {
        self.definitions_key
            .and_then(|key| self.root.get(key))
            .and_then(Value::as_object)
            .map(|defs| defs.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether a definition exists for the resource type
    pub fn has_type(&self, resource_type: &str) -> bool {
        self.definitions_key
            .and_then(|key| self.root.get(key))
            .and_then(|defs| defs.get(resource_type))
            .is_some()
    }

    /// Resolve a JSON pointer (without the leading `#`) inside this document
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.root.pointer(pointer)
    }

    /// JSON pointer (without `#`) addressing a resource type definition
    pub(crate) fn definition_pointer(&self, resource_type: &str) -> Option<String> {
        let key = self.definitions_key?;
        Some(format!("/{}/{}", escape_pointer_token(key), escape_pointer_token(resource_type)))
    }
}

/// A named view into a shared [`SchemaDocument`]
#[derive(Debug, Clone)]
pub struct SubSchemaHandle {
    document: Arc<SchemaDocument>,
    resource_type: String,
    pointer: String,
}

impl SubSchemaHandle {
    /// Look up the definition of a resource type
    pub fn new(document: Arc<SchemaDocument>, resource_type: &str) -> CompileResult<Self> {
        if !document.has_type(resource_type) {
            return Err(CompileError::unknown_type(resource_type, document.name()));
        }
        let pointer = document
            .definition_pointer(resource_type)
            .ok_or_else(|| CompileError::unknown_type(resource_type, document.name()))?;

        Ok(Self {
            document,
            resource_type: resource_type.to_string(),
            pointer,
        })
    }

    /// The resource type name
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Fragment address, e.g. `#/definitions/Patient`
    pub fn fragment(&self) -> String {
        format!("#{}", self.pointer)
    }

    /// JSON pointer without the leading `#`
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// The document this handle points into
    pub fn document(&self) -> &Arc<SchemaDocument> {
        &self.document
    }

    /// The raw definition tree
    pub fn schema(&self) -> Option<&Value> {
        self.document.pointer(&self.pointer)
    }
}

/// Escape one JSON pointer reference token (RFC 6901)
pub(crate) fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
