//! Reference resolution and compilation of sub-schemas
//!
//! This module handles:
//! - Compilation of schema locations into arena nodes
//! - Same-document and cross-document `$ref` resolution
//! - Recursive definitions (re-entry into an open location is resolved by identity)
//! - Rejection of reference cycles that never reach a constraint
//! - A bound on `$ref` chains that stay on one instance
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::store::compiled::{
    AdditionalProperties, Bound, CompiledSchema, Constraints, InstanceType, Items, NodeId,
    NodeKind, Pattern, SchemaNode, TypeSet,
};
use crate::store::document::{escape_pointer_token, SchemaDocument, SubSchemaHandle};
use crate::store::error::{CompileError, CompileResult};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Source of documents addressed by cross-document references
pub(crate) trait DocumentLoader {
    /// Fetch and parse the document named by `uri`
    fn load(&self, uri: &str) -> CompileResult<Arc<SchemaDocument>>;
}

/// A location whose node id is handed out but whose body is not compiled yet
struct Pending {
    id: NodeId,
    document: Arc<SchemaDocument>,
    pointer: String,
    location: String,
}

/// Context for one compilation
///
/// Locations are compiled off a FIFO worklist: resolving a child only
/// reserves its node id, so schema nesting never deepens the call stack.
pub(crate) struct ReferenceResolver<'l> {
    loader: &'l dyn DocumentLoader,
    max_depth: usize,
    nodes: Vec<Option<SchemaNode>>,
    index: HashMap<String, NodeId>,
    queue: VecDeque<Pending>,
}

impl<'l> ReferenceResolver<'l> {
    /// Create a resolver backed by a document loader
    ///
    /// `max_depth` bounds the number of `$ref` hops taken without descending
    /// into the instance.
    pub(crate) fn new(loader: &'l dyn DocumentLoader, max_depth: usize) -> Self {
        Self {
            loader,
            max_depth,
            nodes: Vec::new(),
            index: HashMap::new(),
            queue: VecDeque::new(),
        }
    }

    /// Compile the sub-schema addressed by a handle
    pub(crate) fn compile(mut self, handle: &SubSchemaHandle) -> CompileResult<CompiledSchema> {
        let root = self.resolve_location(handle.document(), handle.pointer(), &handle.fragment())?;

        while let Some(pending) = self.queue.pop_front() {
            let value = pending.document.pointer(&pending.pointer).ok_or_else(|| {
                CompileError::unresolved(
                    pending.location.clone(),
                    pending.location.clone(),
                    "target does not exist",
                )
            })?;
            let kind = self.compile_value(&pending.document, &pending.pointer, &pending.location, value)?;
            self.nodes[pending.id.0] = Some(SchemaNode {
                location: pending.location,
                kind,
            });
        }

        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (i, slot) in self.nodes.into_iter().enumerate() {
            let node = slot.ok_or_else(|| {
                CompileError::unresolved(
                    handle.fragment(),
                    format!("node {}", i),
                    "reference resolution did not complete",
                )
            })?;
            nodes.push(node);
        }

        check_constraint_reachability(&nodes)?;
        check_reference_chains(&nodes, self.max_depth)?;

        Ok(CompiledSchema {
            resource_type: handle.resource_type().to_string(),
            root,
            nodes,
        })
    }

    /// Reserve (or reuse) the node for `pointer` inside `document`
    fn resolve_location(
        &mut self,
        document: &Arc<SchemaDocument>,
        pointer: &str,
        reference: &str,
    ) -> CompileResult<NodeId> {
        let location = format!("{}#{}", document.name(), pointer);

        // Both compiled and queued locations resolve by identity
        if let Some(id) = self.index.get(&location) {
            return Ok(*id);
        }

        if document.pointer(pointer).is_none() {
            return Err(CompileError::unresolved(reference, location, "target does not exist"));
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(None);
        self.index.insert(location.clone(), id);
        self.queue.push_back(Pending {
            id,
            document: Arc::clone(document),
            pointer: pointer.to_string(),
            location,
        });
        Ok(id)
    }

    fn compile_value(
        &mut self,
        document: &Arc<SchemaDocument>,
        pointer: &str,
        location: &str,
        value: &Value,
    ) -> CompileResult<NodeKind> {
        match value {
            Value::Bool(true) => Ok(NodeKind::Always),
            Value::Bool(false) => Ok(NodeKind::Never),
            Value::Object(obj) => {
                let constraints = self.compile_object(document, pointer, location, obj)?;
                Ok(NodeKind::Constraints(Box::new(constraints)))
            }
            _ => Err(CompileError::parse_failure(
                document.name(),
                format!("schema at '{}' must be an object or a boolean", location),
            )),
        }
    }

    fn compile_object(
        &mut self,
        document: &Arc<SchemaDocument>,
        pointer: &str,
        location: &str,
        obj: &Map<String, Value>,
    ) -> CompileResult<Constraints> {
        let keywords = Keywords {
            document: document.name(),
            location,
            obj,
        };
        let mut c = Constraints::default();

        if let Some(reference) = obj.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| keywords.invalid("$ref", "a string"))?;
            c.reference = Some(self.resolve_reference(document, reference, location)?);
        }

        if let Some(ty) = obj.get("type") {
            c.types = Some(keywords.types(ty)?);
        }
        if let Some(values) = obj.get("enum") {
            c.enumeration = Some(
                values
                    .as_array()
                    .cloned()
                    .ok_or_else(|| keywords.invalid("enum", "an array"))?,
            );
        }
        c.constant = obj.get("const").cloned();

        c.min_length = keywords.count("minLength")?;
        c.max_length = keywords.count("maxLength")?;
        if let Some(pattern) = obj.get("pattern") {
            c.pattern = Some(keywords.pattern("pattern", pattern)?);
        }

        c.minimum = keywords.bound("minimum", "exclusiveMinimum")?;
        c.maximum = keywords.bound("maximum", "exclusiveMaximum")?;
        c.multiple_of = keywords.number("multipleOf")?;
        if c.multiple_of.is_some_and(|m| m <= 0.0) {
            return Err(keywords.invalid("multipleOf", "a number greater than zero"));
        }

        if let Some(required) = obj.get("required") {
            c.required = keywords.strings("required", required)?;
        }
        if let Some(properties) = obj.get("properties") {
            let properties = properties
                .as_object()
                .ok_or_else(|| keywords.invalid("properties", "an object"))?;
            for name in properties.keys() {
                let child = child_pointer(pointer, &["properties", name]);
                let id = self.resolve_location(document, &child, location)?;
                c.properties.push((name.clone(), id));
            }
        }
        if let Some(patterns) = obj.get("patternProperties") {
            let patterns = patterns
                .as_object()
                .ok_or_else(|| keywords.invalid("patternProperties", "an object"))?;
            for source in patterns.keys() {
                let compiled = keywords.pattern("patternProperties", &Value::String(source.clone()))?;
                let child = child_pointer(pointer, &["patternProperties", source]);
                let id = self.resolve_location(document, &child, location)?;
                c.pattern_properties.push((compiled, id));
            }
        }
        c.additional_properties =
            self.additional(document, pointer, location, obj, "additionalProperties")?;
        c.min_properties = keywords.count("minProperties")?;
        c.max_properties = keywords.count("maxProperties")?;

        match obj.get("items") {
            None => {}
            Some(Value::Array(tuple)) => {
                let mut ids = Vec::with_capacity(tuple.len());
                for i in 0..tuple.len() {
                    let child = child_pointer(pointer, &["items", &i.to_string()]);
                    ids.push(self.resolve_location(document, &child, location)?);
                }
                c.items = Some(Items::Tuple(ids));
            }
            Some(_) => {
                let child = child_pointer(pointer, &["items"]);
                c.items = Some(Items::Uniform(self.resolve_location(document, &child, location)?));
            }
        }
        c.additional_items = self.additional(document, pointer, location, obj, "additionalItems")?;
        c.min_items = keywords.count("minItems")?;
        c.max_items = keywords.count("maxItems")?;
        c.unique_items = match obj.get("uniqueItems") {
            None => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err(keywords.invalid("uniqueItems", "a boolean")),
        };

        c.all_of = self.subschema_list(document, pointer, location, obj, "allOf")?;
        c.any_of = self.subschema_list(document, pointer, location, obj, "anyOf")?;
        c.one_of = self.subschema_list(document, pointer, location, obj, "oneOf")?;
        if obj.contains_key("not") {
            let child = child_pointer(pointer, &["not"]);
            c.not = Some(self.resolve_location(document, &child, location)?);
        }

        Ok(c)
    }

    /// Resolve a `$ref` string relative to the document it appears in
    fn resolve_reference(
        &mut self,
        document: &Arc<SchemaDocument>,
        reference: &str,
        location: &str,
    ) -> CompileResult<NodeId> {
        let (uri, fragment) = match reference.split_once('#') {
            Some((uri, fragment)) => (uri, fragment),
            None => (reference, ""),
        };

        if !fragment.is_empty() && !fragment.starts_with('/') {
            return Err(CompileError::unresolved(
                reference,
                location,
                "only JSON pointer fragments are supported",
            ));
        }

        if uri.is_empty() || uri == document.name() {
            return self.resolve_location(document, fragment, reference);
        }

        let target = self.loader.load(uri).map_err(|e| match e {
            CompileError::ParseFailure { .. } => e,
            other => CompileError::unresolved(reference, location, other.to_string()),
        })?;
        self.resolve_location(&target, fragment, reference)
    }

    fn additional(
        &mut self,
        document: &Arc<SchemaDocument>,
        pointer: &str,
        location: &str,
        obj: &Map<String, Value>,
        keyword: &str,
    ) -> CompileResult<AdditionalProperties> {
        match obj.get(keyword) {
            None | Some(Value::Bool(true)) => Ok(AdditionalProperties::Allowed),
            Some(Value::Bool(false)) => Ok(AdditionalProperties::Forbidden),
            Some(Value::Object(_)) => {
                let child = child_pointer(pointer, &[keyword]);
                Ok(AdditionalProperties::Schema(
                    self.resolve_location(document, &child, location)?,
                ))
            }
            Some(_) => Err(CompileError::invalid_keyword(
                document.name(),
                location,
                keyword,
                "a boolean or a schema",
            )),
        }
    }

    fn subschema_list(
        &mut self,
        document: &Arc<SchemaDocument>,
        pointer: &str,
        location: &str,
        obj: &Map<String, Value>,
        keyword: &str,
    ) -> CompileResult<Vec<NodeId>> {
        let Some(value) = obj.get(keyword) else {
            return Ok(Vec::new());
        };
        let list = value.as_array().filter(|list| !list.is_empty()).ok_or_else(|| {
            CompileError::invalid_keyword(document.name(), location, keyword, "a non-empty array")
        })?;

        let mut ids = Vec::with_capacity(list.len());
        for i in 0..list.len() {
            let child = child_pointer(pointer, &[keyword, &i.to_string()]);
            ids.push(self.resolve_location(document, &child, location)?);
        }
        Ok(ids)
    }
}

/// Typed accessors over the keywords of one schema object
struct Keywords<'a> {
    document: &'a str,
    location: &'a str,
    obj: &'a Map<String, Value>,
}

impl Keywords<'_> {
    fn invalid(&self, keyword: &str, expected: &str) -> CompileError {
        CompileError::invalid_keyword(self.document, self.location, keyword, expected)
    }

    fn count(&self, keyword: &str) -> CompileResult<Option<u64>> {
        match self.obj.get(keyword) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .or_else(|| value.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
                .map(Some)
                .ok_or_else(|| self.invalid(keyword, "a non-negative integer")),
        }
    }

    fn number(&self, keyword: &str) -> CompileResult<Option<f64>> {
        match self.obj.get(keyword) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(keyword, "a number")),
        }
    }

    /// `minimum`/`maximum` with either numeric or draft-04 boolean exclusivity
    fn bound(&self, inclusive: &str, exclusive: &str) -> CompileResult<Option<Bound>> {
        let limit = self.number(inclusive)?;
        match (limit, self.obj.get(exclusive)) {
            (limit, None) => Ok(limit.map(|limit| Bound { limit, exclusive: false })),
            (limit, Some(Value::Bool(flag))) => Ok(limit.map(|limit| Bound {
                limit,
                exclusive: *flag,
            })),
            (inclusive_limit, Some(value)) => {
                let exclusive_limit = value
                    .as_f64()
                    .ok_or_else(|| self.invalid(exclusive, "a number or a boolean"))?;
                let exclusive_bound = Bound {
                    limit: exclusive_limit,
                    exclusive: true,
                };
                // Keep whichever bound is tighter
                Ok(Some(match inclusive_limit {
                    Some(limit) if tighter(inclusive, limit, exclusive_limit) => Bound {
                        limit,
                        exclusive: false,
                    },
                    _ => exclusive_bound,
                }))
            }
        }
    }

    fn types(&self, value: &Value) -> CompileResult<TypeSet> {
        let names: Vec<&Value> = match value {
            Value::String(_) => vec![value],
            Value::Array(list) if !list.is_empty() => list.iter().collect(),
            _ => return Err(self.invalid("type", "a type name or a non-empty array of type names")),
        };

        let mut set = TypeSet::default();
        for name in names {
            let ty = name
                .as_str()
                .and_then(InstanceType::from_name)
                .ok_or_else(|| self.invalid("type", "one of the seven JSON type names"))?;
            set.insert(ty);
        }
        Ok(set)
    }

    fn strings(&self, keyword: &str, value: &Value) -> CompileResult<Vec<String>> {
        value
            .as_array()
            .and_then(|list| {
                list.iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| self.invalid(keyword, "an array of strings"))
    }

    fn pattern(&self, keyword: &str, value: &Value) -> CompileResult<Pattern> {
        let source = value
            .as_str()
            .ok_or_else(|| self.invalid(keyword, "a string"))?;
        let regex = Regex::new(source).map_err(|e| {
            CompileError::parse_failure(
                self.document,
                format!("keyword '{}' at '{}' is not a valid pattern: {}", keyword, self.location, e),
            )
        })?;
        Ok(Pattern {
            source: source.to_string(),
            regex,
        })
    }
}

fn tighter(inclusive_keyword: &str, inclusive: f64, exclusive: f64) -> bool {
    if inclusive_keyword == "minimum" {
        inclusive > exclusive
    } else {
        inclusive < exclusive
    }
}

fn child_pointer(pointer: &str, tokens: &[&str]) -> String {
    let mut child = pointer.to_string();
    for token in tokens {
        child.push('/');
        child.push_str(&escape_pointer_token(token));
    }
    child
}

/// Reject cycles that revisit a node without descending into the instance
fn check_constraint_reachability(nodes: &[SchemaNode]) -> CompileResult<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Open,
        Done,
    }

    let edges = |id: usize| -> Vec<usize> {
        match &nodes[id].kind {
            NodeKind::Constraints(c) => c.same_instance_edges().map(|n| n.0).collect(),
            _ => Vec::new(),
        }
    };

    let mut marks = vec![Mark::New; nodes.len()];
    for start in 0..nodes.len() {
        if marks[start] != Mark::New {
            continue;
        }
        // Iterative DFS: (node, remaining successors)
        let mut stack = vec![(start, edges(start))];
        marks[start] = Mark::Open;
        while let Some((node, successors)) = stack.last_mut() {
            match successors.pop() {
                Some(next) => match marks[next] {
                    Mark::Open => {
                        return Err(CompileError::unresolved(
                            nodes[next].location.clone(),
                            nodes[*node].location.clone(),
                            "reference cycle never reaches a constraint",
                        ));
                    }
                    Mark::New => {
                        marks[next] = Mark::Open;
                        stack.push((next, edges(next)));
                    }
                    Mark::Done => {}
                },
                None => {
                    marks[*node] = Mark::Done;
                    stack.pop();
                }
            }
        }
    }
    Ok(())
}

/// Reject `$ref` chains longer than `max_depth` that never descend into the instance
///
/// Runs after [`check_constraint_reachability`], so the same-instance graph is acyclic.
fn check_reference_chains(nodes: &[SchemaNode], max_depth: usize) -> CompileResult<()> {
    // (target, hops): only `$ref` edges count as a hop
    let edges = |id: usize| -> Vec<(usize, usize)> {
        match &nodes[id].kind {
            NodeKind::Constraints(c) => c
                .reference
                .iter()
                .map(|n| (n.0, 1))
                .chain(
                    c.all_of
                        .iter()
                        .chain(&c.any_of)
                        .chain(&c.one_of)
                        .chain(c.not.iter())
                        .map(|n| (n.0, 0)),
                )
                .collect(),
            _ => Vec::new(),
        }
    };

    let mut longest: Vec<Option<usize>> = vec![None; nodes.len()];
    for start in 0..nodes.len() {
        let mut stack = vec![start];
        while let Some(&node) = stack.last() {
            if longest[node].is_some() {
                stack.pop();
                continue;
            }
            let successors = edges(node);
            let open: Vec<usize> = successors
                .iter()
                .filter(|(target, _)| longest[*target].is_none())
                .map(|(target, _)| *target)
                .collect();
            if !open.is_empty() {
                stack.extend(open);
                continue;
            }

            let hops = successors
                .iter()
                .map(|(target, weight)| longest[*target].unwrap_or(0) + weight)
                .max()
                .unwrap_or(0);
            if hops > max_depth {
                return Err(CompileError::unresolved(
                    nodes[node].location.clone(),
                    nodes[node].location.clone(),
                    format!("reference chain exceeds the maximum depth of {}", max_depth),
                ));
            }
            longest[node] = Some(hops);
            stack.pop();
        }
    }
    Ok(())
}
