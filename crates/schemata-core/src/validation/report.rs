//! Turning raw walk violations into caller-facing errors
//!
//! The walker records a [`RawViolation`] for every failed check, in the order
//! the checks run. [`ErrorReporter::normalize`] renders them into
//! [`ValidationError`]s without reordering, so repeated validations of the
//! same document produce identical error lists.
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use crate::store::compiled::{InstanceType, TypeSet};
use crate::validation::error::ValidationError;
use crate::validation::path::InstancePath;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

const PREVIEW_LIMIT: usize = 64;

/// Constraint keywords that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    FalseSchema,
    Type,
    Enum,
    Const,
    MinLength,
    MaxLength,
    Pattern,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MultipleOf,
    Required,
    AdditionalProperties,
    MinProperties,
    MaxProperties,
    AdditionalItems,
    MinItems,
    MaxItems,
    UniqueItems,
    AnyOf,
    OneOf,
    Not,
}

impl Keyword {
    /// Keyword spelling as it appears in schemas
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::FalseSchema => "false",
            Keyword::Type => "type",
            Keyword::Enum => "enum",
            Keyword::Const => "const",
            Keyword::MinLength => "minLength",
            Keyword::MaxLength => "maxLength",
            Keyword::Pattern => "pattern",
            Keyword::Minimum => "minimum",
            Keyword::Maximum => "maximum",
            Keyword::ExclusiveMinimum => "exclusiveMinimum",
            Keyword::ExclusiveMaximum => "exclusiveMaximum",
            Keyword::MultipleOf => "multipleOf",
            Keyword::Required => "required",
            Keyword::AdditionalProperties => "additionalProperties",
            Keyword::MinProperties => "minProperties",
            Keyword::MaxProperties => "maxProperties",
            Keyword::AdditionalItems => "additionalItems",
            Keyword::MinItems => "minItems",
            Keyword::MaxItems => "maxItems",
            Keyword::UniqueItems => "uniqueItems",
            Keyword::AnyOf => "anyOf",
            Keyword::OneOf => "oneOf",
            Keyword::Not => "not",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a failed check observed
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    FalseSchema,
    Type { expected: TypeSet, found: InstanceType },
    Enum { allowed: Vec<String>, found: String },
    Const { expected: String, found: String },
    MinLength { limit: u64, actual: usize },
    MaxLength { limit: u64, actual: usize },
    Pattern { pattern: String, found: String },
    Minimum { limit: f64, found: String },
    Maximum { limit: f64, found: String },
    ExclusiveMinimum { limit: f64, found: String },
    ExclusiveMaximum { limit: f64, found: String },
    MultipleOf { divisor: f64, found: String },
    Required { member: String },
    AdditionalProperty { member: String },
    MinProperties { limit: u64, actual: usize },
    MaxProperties { limit: u64, actual: usize },
    AdditionalItem { index: usize, positional: usize },
    MinItems { limit: u64, actual: usize },
    MaxItems { limit: u64, actual: usize },
    UniqueItems { first: usize, second: usize },
    AnyOf { branches: usize },
    OneOf { branches: usize, matched: usize },
    Not,
}

impl ViolationKind {
    /// The keyword that failed
    pub fn keyword(&self) -> Keyword {
        match self {
            ViolationKind::FalseSchema => Keyword::FalseSchema,
            ViolationKind::Type { .. } => Keyword::Type,
            ViolationKind::Enum { .. } => Keyword::Enum,
            ViolationKind::Const { .. } => Keyword::Const,
            ViolationKind::MinLength { .. } => Keyword::MinLength,
            ViolationKind::MaxLength { .. } => Keyword::MaxLength,
            ViolationKind::Pattern { .. } => Keyword::Pattern,
            ViolationKind::Minimum { .. } => Keyword::Minimum,
            ViolationKind::Maximum { .. } => Keyword::Maximum,
            ViolationKind::ExclusiveMinimum { .. } => Keyword::ExclusiveMinimum,
            ViolationKind::ExclusiveMaximum { .. } => Keyword::ExclusiveMaximum,
            ViolationKind::MultipleOf { .. } => Keyword::MultipleOf,
            ViolationKind::Required { .. } => Keyword::Required,
            ViolationKind::AdditionalProperty { .. } => Keyword::AdditionalProperties,
            ViolationKind::MinProperties { .. } => Keyword::MinProperties,
            ViolationKind::MaxProperties { .. } => Keyword::MaxProperties,
            ViolationKind::AdditionalItem { .. } => Keyword::AdditionalItems,
            ViolationKind::MinItems { .. } => Keyword::MinItems,
            ViolationKind::MaxItems { .. } => Keyword::MaxItems,
            ViolationKind::UniqueItems { .. } => Keyword::UniqueItems,
            ViolationKind::AnyOf { .. } => Keyword::AnyOf,
            ViolationKind::OneOf { .. } => Keyword::OneOf,
            ViolationKind::Not => Keyword::Not,
        }
    }

    /// Human-readable message
    pub fn message(&self) -> String {
        match self {
            ViolationKind::FalseSchema => "no value is allowed here".to_string(),
            ViolationKind::Type { expected, found } => {
                format!("expected {}, found {}", expected, found)
            }
            ViolationKind::Enum { allowed, found } => {
                format!("value {} is not one of [{}]", found, allowed.join(", "))
            }
            ViolationKind::Const { expected, found } => {
                format!("value {} does not equal {}", found, expected)
            }
            ViolationKind::MinLength { limit, actual } => format!(
                "string has {} character(s), fewer than the minimum of {}",
                actual, limit
            ),
            ViolationKind::MaxLength { limit, actual } => format!(
                "string has {} character(s), more than the maximum of {}",
                actual, limit
            ),
            ViolationKind::Pattern { pattern, found } => {
                format!("string {} does not match pattern '{}'", found, pattern)
            }
            ViolationKind::Minimum { limit, found } => {
                format!("{} is less than the minimum of {}", found, format_number(*limit))
            }
            ViolationKind::Maximum { limit, found } => {
                format!("{} is greater than the maximum of {}", found, format_number(*limit))
            }
            ViolationKind::ExclusiveMinimum { limit, found } => {
                format!("{} is not greater than {}", found, format_number(*limit))
            }
            ViolationKind::ExclusiveMaximum { limit, found } => {
                format!("{} is not less than {}", found, format_number(*limit))
            }
            ViolationKind::MultipleOf { divisor, found } => {
                format!("{} is not a multiple of {}", found, format_number(*divisor))
            }
            ViolationKind::Required { member } => {
                format!("missing required property '{}'", member)
            }
            ViolationKind::AdditionalProperty { member } => {
                format!("property '{}' is not allowed", member)
            }
            ViolationKind::MinProperties { limit, actual } => format!(
                "object has {} property(ies), fewer than the minimum of {}",
                actual, limit
            ),
            ViolationKind::MaxProperties { limit, actual } => format!(
                "object has {} property(ies), more than the maximum of {}",
                actual, limit
            ),
            ViolationKind::AdditionalItem { index, positional } => format!(
                "item {} is not allowed after the {} positional item(s)",
                index, positional
            ),
            ViolationKind::MinItems { limit, actual } => format!(
                "array has {} item(s), fewer than the minimum of {}",
                actual, limit
            ),
            ViolationKind::MaxItems { limit, actual } => format!(
                "array has {} item(s), more than the maximum of {}",
                actual, limit
            ),
            ViolationKind::UniqueItems { first, second } => {
                format!("items {} and {} are equal", first, second)
            }
            ViolationKind::AnyOf { branches } => {
                format!("value does not match any of the {} allowed schemas", branches)
            }
            ViolationKind::OneOf { branches, matched: 0 } => format!(
                "value matches none of the {} schemas, exactly one required",
                branches
            ),
            ViolationKind::OneOf { branches, matched } => format!(
                "value matches {} of the {} schemas, exactly one required",
                matched, branches
            ),
            ViolationKind::Not => "value matches a schema it must not match".to_string(),
        }
    }
}

/// A failed check as recorded during the walk
#[derive(Debug, Clone, PartialEq)]
pub struct RawViolation {
    pub path: InstancePath,
    pub kind: ViolationKind,
}

impl RawViolation {
    pub fn new(path: InstancePath, kind: ViolationKind) -> Self {
        Self { path, kind }
    }
}

/// Renders raw violations into the public error shape
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorReporter;

impl ErrorReporter {
    /// Map violations to errors, keeping walk order
    ///
    /// Exact repeats (the same failure reached through two `allOf` branches,
    /// say) are reported once, at their first position.
    pub fn normalize(violations: Vec<RawViolation>) -> Vec<ValidationError> {
        let mut seen = HashSet::new();
        violations
            .into_iter()
            .map(|violation| {
                ValidationError::new(
                    violation.path.to_string(),
                    violation.kind.message(),
                    violation.kind.keyword().as_str(),
                )
            })
            .filter(|error| seen.insert(error.clone()))
            .collect()
    }
}

/// Compact JSON rendering of a value for messages
pub(crate) fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= PREVIEW_LIMIT {
        return text;
    }
    let mut truncated: String = text.chars().take(PREVIEW_LIMIT).collect();
    truncated.push_str("...");
    truncated
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
