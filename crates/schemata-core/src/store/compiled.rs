//! Reference-flattened constraint trees ready for validation
//!
//! A compiled schema is an arena of [`SchemaNode`]s. Every `$ref` has been
//! replaced by the [`NodeId`] of its target, so recursive definitions are
//! simply edges back into the arena.
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use regex::Regex;
use serde_json::Value;
use std::fmt;

/// Index of a node inside a [`CompiledSchema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position in the arena
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The seven JSON instance types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl InstanceType {
    const ALL: [InstanceType; 7] = [
        InstanceType::Null,
        InstanceType::Boolean,
        InstanceType::Object,
        InstanceType::Array,
        InstanceType::Number,
        InstanceType::Integer,
        InstanceType::String,
    ];

    /// Parse a `type` keyword entry
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    /// Keyword spelling of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
        }
    }

    /// Most specific type of a value (integral numbers report `Integer`)
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::String(_) => Self::String,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0) {
                    Self::Integer
                } else {
                    Self::Number
                }
            }
        }
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of types accepted by a `type` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeSet(u8);

impl TypeSet {
    /// Add a type to the set
    pub fn insert(&mut self, ty: InstanceType) {
        self.0 |= ty.bit();
    }

    /// Whether a value of the given (most specific) type is accepted
    pub fn accepts(&self, found: InstanceType) -> bool {
        self.0 & found.bit() != 0
            || (found == InstanceType::Integer && self.0 & InstanceType::Number.bit() != 0)
    }

    /// Whether the set names the type explicitly
    pub fn contains(&self, ty: InstanceType) -> bool {
        self.0 & ty.bit() != 0
    }

    /// Iterate in canonical order
    pub fn iter(&self) -> impl Iterator<Item = InstanceType> + '_ {
        InstanceType::ALL.into_iter().filter(|ty| self.contains(*ty))
    }

    /// Number of types in the set
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|ty| ty.as_str()).collect();
        match names.as_slice() {
            [single] => f.write_str(single),
            _ => write!(f, "one of [{}]", names.join(", ")),
        }
    }
}

/// A compiled `pattern` keyword
#[derive(Debug, Clone)]
pub struct Pattern {
    pub(crate) source: String,
    pub(crate) regex: Regex,
}

impl Pattern {
    /// The pattern as written in the schema
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Unanchored search, as JSON Schema defines it
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// What `additionalProperties` says about undeclared members
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionalProperties {
    Allowed,
    Forbidden,
    Schema(NodeId),
}

/// The `items` keyword in either of its forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Items {
    /// Every item validates against one schema
    Uniform(NodeId),
    /// Positional schemas; later items fall to `additionalItems`
    Tuple(Vec<NodeId>),
}

/// Numeric bound with its exclusivity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub(crate) limit: f64,
    pub(crate) exclusive: bool,
}

/// Constraints of one object-form schema node
#[derive(Debug, Clone)]
pub struct Constraints {
    pub(crate) reference: Option<NodeId>,
    pub(crate) types: Option<TypeSet>,
    pub(crate) enumeration: Option<Vec<Value>>,
    pub(crate) constant: Option<Value>,

    pub(crate) min_length: Option<u64>,
    pub(crate) max_length: Option<u64>,
    pub(crate) pattern: Option<Pattern>,

    pub(crate) minimum: Option<Bound>,
    pub(crate) maximum: Option<Bound>,
    pub(crate) multiple_of: Option<f64>,

    pub(crate) required: Vec<String>,
    pub(crate) properties: Vec<(String, NodeId)>,
    pub(crate) pattern_properties: Vec<(Pattern, NodeId)>,
    pub(crate) additional_properties: AdditionalProperties,
    pub(crate) min_properties: Option<u64>,
    pub(crate) max_properties: Option<u64>,

    pub(crate) items: Option<Items>,
    pub(crate) additional_items: AdditionalProperties,
    pub(crate) min_items: Option<u64>,
    pub(crate) max_items: Option<u64>,
    pub(crate) unique_items: bool,

    pub(crate) all_of: Vec<NodeId>,
    pub(crate) any_of: Vec<NodeId>,
    pub(crate) one_of: Vec<NodeId>,
    pub(crate) not: Option<NodeId>,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            reference: None,
            types: None,
            enumeration: None,
            constant: None,
            min_length: None,
            max_length: None,
            pattern: None,
            minimum: None,
            maximum: None,
            multiple_of: None,
            required: Vec::new(),
            properties: Vec::new(),
            pattern_properties: Vec::new(),
            additional_properties: AdditionalProperties::Allowed,
            min_properties: None,
            max_properties: None,
            items: None,
            additional_items: AdditionalProperties::Allowed,
            min_items: None,
            max_items: None,
            unique_items: false,
            all_of: Vec::new(),
            any_of: Vec::new(),
            one_of: Vec::new(),
            not: None,
        }
    }
}

impl Constraints {
    /// Nodes evaluated against the same instance as this node
    pub(crate) fn same_instance_edges(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.reference
            .iter()
            .chain(self.all_of.iter())
            .chain(self.any_of.iter())
            .chain(self.one_of.iter())
            .chain(self.not.iter())
            .copied()
    }
}

/// Body of a schema node
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The `true` schema
    Always,
    /// The `false` schema
    Never,
    /// An object schema
    Constraints(Box<Constraints>),
}

/// One compiled schema location
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) location: String,
    pub(crate) kind: NodeKind,
}

impl SchemaNode {
    /// Absolute schema location, e.g. `schema.json#/definitions/Patient`
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The node body
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

/// A resolved, reference-flattened sub-schema for one resource type
#[derive(Debug)]
pub struct CompiledSchema {
    pub(crate) resource_type: String,
    pub(crate) root: NodeId,
    pub(crate) nodes: Vec<SchemaNode>,
}

impl CompiledSchema {
    /// The resource type this schema was compiled for
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Entry node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of distinct schema locations reachable from the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Iterate over every compiled node
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SchemaNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }
}
