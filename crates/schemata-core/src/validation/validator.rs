//! Document validation against a compiled sub-schema
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::store::compiled::{
    AdditionalProperties, CompiledSchema, Constraints, InstanceType, Items, NodeId, NodeKind,
};
use crate::store::parser::{Format, SchemaParser};
use crate::validation::error::{SystemError, ValidationOutcome};
use crate::validation::path::{InstancePath, PathSegment};
use crate::validation::report::{preview, ErrorReporter, RawViolation, ViolationKind};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Configuration for validation behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Stop after this many violations; `0` collects every violation
    pub max_errors: usize,
}

/// Validates documents of one resource type
///
/// Holds no per-call state: clones share the compiled schema and any number
/// of threads may validate through the same instance.
#[derive(Debug, Clone)]
pub struct Validator {
    schema: Arc<CompiledSchema>,
    config: ValidationConfig,
}

impl Validator {
    /// Create a validator that reports every violation
    pub fn new(schema: Arc<CompiledSchema>) -> Self {
        Self::with_config(schema, ValidationConfig::default())
    }

    /// Create a validator with custom configuration
    pub fn with_config(schema: Arc<CompiledSchema>, config: ValidationConfig) -> Self {
        Self { schema, config }
    }

    /// The resource type fixed at construction
    pub fn resource_type(&self) -> &str {
        self.schema.resource_type()
    }

    /// The compiled schema
    pub fn schema(&self) -> &Arc<CompiledSchema> {
        &self.schema
    }

    /// The active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a decoded document
    pub fn validate(&self, document: &Value) -> ValidationOutcome {
        let (violations, truncated) = self.walk_document(document);
        ValidationOutcome::from_errors(ErrorReporter::normalize(violations))
            .with_truncation(truncated)
    }

    /// Raw violations in walk order
    pub fn collect_violations(&self, document: &Value) -> Vec<RawViolation> {
        self.walk_document(document).0
    }

    /// Raw violations capped at `max_errors`, and whether any were left out
    fn walk_document(&self, document: &Value) -> (Vec<RawViolation>, bool) {
        let limit = self.config.max_errors;
        // One violation past the limit tells a cut-off walk from an exact fit
        let capacity = if limit == 0 { 0 } else { limit.saturating_add(1) };
        let mut walker = Walker::new(&self.schema, capacity);
        walker.walk(self.schema.root(), document);

        let mut violations = walker.violations;
        let truncated = limit != 0 && violations.len() > limit;
        if truncated {
            violations.truncate(limit);
        }
        (violations, truncated)
    }

    /// Whether the document is valid, stopping at the first violation
    pub fn is_valid(&self, document: &Value) -> bool {
        Walker::matches(&self.schema, self.schema.root(), document)
    }

    /// Validate JSON bytes
    pub fn validate_bytes(&self, bytes: &[u8]) -> Result<ValidationOutcome, SystemError> {
        self.validate_slice(bytes, Format::Json)
    }

    /// Validate JSON text
    pub fn validate_str(&self, text: &str) -> Result<ValidationOutcome, SystemError> {
        self.validate_bytes(text.as_bytes())
    }

    /// Validate bytes in the given format
    pub fn validate_slice(
        &self,
        bytes: &[u8],
        format: Format,
    ) -> Result<ValidationOutcome, SystemError> {
        let document =
            SchemaParser::decode(bytes, format).map_err(|e| SystemError::decode(format, &e))?;
        Ok(self.validate(&document))
    }
}

/// Depth-first walk of one document against the node arena
///
/// `capacity` caps the recorded violations; `0` means no cap.
struct Walker<'s> {
    schema: &'s CompiledSchema,
    path: Vec<PathSegment>,
    violations: Vec<RawViolation>,
    capacity: usize,
}

impl<'s> Walker<'s> {
    fn new(schema: &'s CompiledSchema, capacity: usize) -> Self {
        Self {
            schema,
            path: Vec::new(),
            violations: Vec::new(),
            capacity,
        }
    }

    /// Silent sub-walk used by `anyOf`, `oneOf` and `not`
    fn matches(schema: &CompiledSchema, node: NodeId, value: &Value) -> bool {
        let mut walker = Walker::new(schema, 1);
        walker.walk(node, value);
        walker.violations.is_empty()
    }

    fn full(&self) -> bool {
        self.capacity != 0 && self.violations.len() >= self.capacity
    }

    fn remaining(&self) -> usize {
        if self.capacity == 0 {
            0
        } else {
            self.capacity.saturating_sub(self.violations.len())
        }
    }

    /// Violations of the branch with the fewest, the first one on ties
    ///
    /// Later branches stop as soon as they reach the best count so far.
    fn closest_branch(&self, branches: &[NodeId], value: &Value) -> Vec<RawViolation> {
        let mut best: Option<Vec<RawViolation>> = None;
        for &branch in branches {
            let capacity = match &best {
                Some(violations) => violations.len(),
                None => self.remaining(),
            };
            let mut walker = Walker {
                schema: self.schema,
                path: self.path.clone(),
                violations: Vec::new(),
                capacity,
            };
            walker.walk(branch, value);

            let fewer = match &best {
                Some(violations) => walker.violations.len() < violations.len(),
                None => true,
            };
            if fewer && !walker.violations.is_empty() {
                best = Some(walker.violations);
            }
        }
        best.unwrap_or_default()
    }

    fn report_closest_branch(&mut self, branches: &[NodeId], value: &Value) {
        if self.full() {
            return;
        }
        for violation in self.closest_branch(branches, value) {
            if self.full() {
                return;
            }
            self.violations.push(violation);
        }
    }

    fn report(&mut self, kind: ViolationKind) {
        if self.full() {
            return;
        }
        let path = InstancePath::from_segments(self.path.clone());
        self.violations.push(RawViolation::new(path, kind));
    }

    fn report_member(&mut self, member: &str, kind: ViolationKind) {
        self.path.push(PathSegment::Key(member.to_string()));
        self.report(kind);
        self.path.pop();
    }

    fn walk_member(&mut self, node: NodeId, member: &str, value: &Value) {
        self.path.push(PathSegment::Key(member.to_string()));
        self.walk(node, value);
        self.path.pop();
    }

    fn walk_item(&mut self, node: NodeId, index: usize, value: &Value) {
        self.path.push(PathSegment::Index(index));
        self.walk(node, value);
        self.path.pop();
    }

    fn walk(&mut self, node: NodeId, value: &Value) {
        if self.full() {
            return;
        }
        let schema = self.schema;
        match schema.node(node).kind() {
            NodeKind::Always => {}
            NodeKind::Never => self.report(ViolationKind::FalseSchema),
            NodeKind::Constraints(constraints) => self.walk_constraints(constraints, value),
        }
    }

    fn walk_constraints(&mut self, c: &Constraints, value: &Value) {
        if let Some(target) = c.reference {
            self.walk(target, value);
        }

        let found = InstanceType::of(value);
        let type_ok = match c.types {
            Some(expected) if !expected.accepts(found) => {
                self.report(ViolationKind::Type { expected, found });
                false
            }
            _ => true,
        };

        if let Some(allowed) = &c.enumeration {
            if !allowed.iter().any(|candidate| json_equal(candidate, value)) {
                self.report(ViolationKind::Enum {
                    allowed: allowed.iter().map(preview).collect(),
                    found: preview(value),
                });
            }
        }

        if let Some(expected) = &c.constant {
            if !json_equal(expected, value) {
                self.report(ViolationKind::Const {
                    expected: preview(expected),
                    found: preview(value),
                });
            }
        }

        if type_ok {
            match value {
                Value::String(text) => self.check_string(c, text, value),
                Value::Number(_) => self.check_number(c, value),
                Value::Object(members) => self.check_object(c, members),
                Value::Array(items) => self.check_array(c, items),
                Value::Null | Value::Bool(_) => {}
            }
        }

        for &branch in &c.all_of {
            self.walk(branch, value);
        }

        if !c.any_of.is_empty()
            && !c
                .any_of
                .iter()
                .any(|&branch| Walker::matches(self.schema, branch, value))
        {
            self.report(ViolationKind::AnyOf {
                branches: c.any_of.len(),
            });
            self.report_closest_branch(&c.any_of, value);
        }

        if !c.one_of.is_empty() {
            let matched = c
                .one_of
                .iter()
                .filter(|&&branch| Walker::matches(self.schema, branch, value))
                .count();
            if matched != 1 {
                self.report(ViolationKind::OneOf {
                    branches: c.one_of.len(),
                    matched,
                });
                if matched == 0 {
                    self.report_closest_branch(&c.one_of, value);
                }
            }
        }

        if let Some(negated) = c.not {
            if Walker::matches(self.schema, negated, value) {
                self.report(ViolationKind::Not);
            }
        }
    }

    fn check_string(&mut self, c: &Constraints, text: &str, value: &Value) {
        if c.min_length.is_some() || c.max_length.is_some() {
            let actual = text.chars().count();
            if let Some(limit) = c.min_length {
                if (actual as u64) < limit {
                    self.report(ViolationKind::MinLength { limit, actual });
                }
            }
            if let Some(limit) = c.max_length {
                if (actual as u64) > limit {
                    self.report(ViolationKind::MaxLength { limit, actual });
                }
            }
        }

        if let Some(pattern) = &c.pattern {
            if !pattern.is_match(text) {
                self.report(ViolationKind::Pattern {
                    pattern: pattern.as_str().to_string(),
                    found: preview(value),
                });
            }
        }
    }

    fn check_number(&mut self, c: &Constraints, value: &Value) {
        let Some(number) = value.as_f64() else {
            return;
        };

        if let Some(bound) = c.minimum {
            if bound.exclusive && number <= bound.limit {
                self.report(ViolationKind::ExclusiveMinimum {
                    limit: bound.limit,
                    found: preview(value),
                });
            } else if !bound.exclusive && number < bound.limit {
                self.report(ViolationKind::Minimum {
                    limit: bound.limit,
                    found: preview(value),
                });
            }
        }

        if let Some(bound) = c.maximum {
            if bound.exclusive && number >= bound.limit {
                self.report(ViolationKind::ExclusiveMaximum {
                    limit: bound.limit,
                    found: preview(value),
                });
            } else if !bound.exclusive && number > bound.limit {
                self.report(ViolationKind::Maximum {
                    limit: bound.limit,
                    found: preview(value),
                });
            }
        }

        if let Some(divisor) = c.multiple_of {
            if !is_multiple_of(value, number, divisor) {
                self.report(ViolationKind::MultipleOf {
                    divisor,
                    found: preview(value),
                });
            }
        }
    }

    fn check_object(&mut self, c: &Constraints, members: &Map<String, Value>) {
        for name in &c.required {
            if !members.contains_key(name) {
                self.report_member(name, ViolationKind::Required {
                    member: name.clone(),
                });
            }
        }

        for (name, node) in &c.properties {
            if let Some(member) = members.get(name) {
                self.walk_member(*node, name, member);
            }
        }

        let open = matches!(c.additional_properties, AdditionalProperties::Allowed);
        if !open || !c.pattern_properties.is_empty() {
            for (name, member) in members {
                if self.full() {
                    return;
                }

                let mut matched = false;
                for (pattern, node) in &c.pattern_properties {
                    if pattern.is_match(name) {
                        matched = true;
                        self.walk_member(*node, name, member);
                    }
                }

                let declared = c.properties.iter().any(|(declared, _)| declared == name);
                if declared || matched {
                    continue;
                }
                match c.additional_properties {
                    AdditionalProperties::Allowed => {}
                    AdditionalProperties::Forbidden => {
                        self.report_member(name, ViolationKind::AdditionalProperty {
                            member: name.clone(),
                        });
                    }
                    AdditionalProperties::Schema(node) => self.walk_member(node, name, member),
                }
            }
        }

        let actual = members.len();
        if let Some(limit) = c.min_properties {
            if (actual as u64) < limit {
                self.report(ViolationKind::MinProperties { limit, actual });
            }
        }
        if let Some(limit) = c.max_properties {
            if (actual as u64) > limit {
                self.report(ViolationKind::MaxProperties { limit, actual });
            }
        }
    }

    fn check_array(&mut self, c: &Constraints, items: &[Value]) {
        let actual = items.len();
        if let Some(limit) = c.min_items {
            if (actual as u64) < limit {
                self.report(ViolationKind::MinItems { limit, actual });
            }
        }
        if let Some(limit) = c.max_items {
            if (actual as u64) > limit {
                self.report(ViolationKind::MaxItems { limit, actual });
            }
        }

        if c.unique_items {
            if let Some((first, second)) = first_duplicate(items) {
                self.report(ViolationKind::UniqueItems { first, second });
            }
        }

        match &c.items {
            None => {}
            Some(Items::Uniform(node)) => {
                for (index, item) in items.iter().enumerate() {
                    if self.full() {
                        return;
                    }
                    self.walk_item(*node, index, item);
                }
            }
            Some(Items::Tuple(nodes)) => {
                for (index, item) in items.iter().enumerate() {
                    if self.full() {
                        return;
                    }
                    match nodes.get(index) {
                        Some(node) => self.walk_item(*node, index, item),
                        None => match c.additional_items {
                            AdditionalProperties::Allowed => {}
                            AdditionalProperties::Forbidden => {
                                self.path.push(PathSegment::Index(index));
                                self.report(ViolationKind::AdditionalItem {
                                    index,
                                    positional: nodes.len(),
                                });
                                self.path.pop();
                            }
                            AdditionalProperties::Schema(node) => {
                                self.walk_item(node, index, item)
                            }
                        },
                    }
                }
            }
        }
    }
}

/// JSON equality where `1` and `1.0` are the same number
fn json_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if a == b {
                return true;
            }
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_equal(x, y)))
        }
        _ => left == right,
    }
}

fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for (second, item) in items.iter().enumerate() {
        if let Some(first) = items[..second]
            .iter()
            .position(|earlier| json_equal(earlier, item))
        {
            return Some((first, second));
        }
    }
    None
}

fn is_multiple_of(value: &Value, number: f64, divisor: f64) -> bool {
    if divisor.fract() == 0.0 {
        if let Some(n) = value.as_i64() {
            let d = divisor as i64;
            return d != 0 && n % d == 0;
        }
    }
    let quotient = number / divisor;
    quotient.is_finite() && (quotient - quotient.round()).abs() < 1e-9
}
