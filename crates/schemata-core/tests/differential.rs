//! Differential tests against the `jsonschema` crate
//!
//! For the supported keyword subset, the verdict of our validator must agree
//! with an independent draft-07 implementation. Only `valid` is compared;
//! messages and ordering are ours alone.

use proptest::prelude::*;
use schemata_core::{SchemaSource, SchemaStore};
use serde_json::{json, Value};

/// Wrap one definition so `jsonschema` validates against it
fn oracle_for(definitions: &Value, resource_type: &str) -> jsonschema::Validator {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "definitions": definitions,
        "$ref": format!("#/definitions/{}", resource_type),
    });
    jsonschema::validator_for(&schema).unwrap()
}

fn assert_agrees(definitions: &Value, resource_type: &str, documents: &[Value]) {
    let source = SchemaSource::json(
        "differential.json",
        json!({ "definitions": definitions }).to_string(),
    );
    let ours = SchemaStore::new().validator(&source, resource_type).unwrap();
    let oracle = oracle_for(definitions, resource_type);

    for document in documents {
        assert_eq!(
            ours.validate(document).is_valid(),
            oracle.is_valid(document),
            "verdicts differ for {} against {}",
            document,
            resource_type
        );
    }
}

fn capability_definitions() -> Value {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/capability.schema.json");
    let text = std::fs::read_to_string(path).unwrap();
    let schema: Value = serde_json::from_str(&text).unwrap();
    schema["definitions"].clone()
}

#[test]
fn test_scalar_keywords() {
    let definitions = json!({
        "S": {"type": "string", "minLength": 2, "maxLength": 5, "pattern": "^[a-z]"},
        "N": {"type": "integer", "minimum": -3, "exclusiveMaximum": 10, "multipleOf": 3},
        "E": {"enum": ["a", 1, null, [1, 2], {"k": "v"}]},
        "C": {"const": {"nested": [true, false]}}
    });

    assert_agrees(
        &definitions,
        "S",
        &[json!("ab"), json!("a"), json!("abcdef"), json!("Ab"), json!(5), json!(null)],
    );
    assert_agrees(
        &definitions,
        "N",
        &[json!(0), json!(9), json!(-3), json!(-6), json!(10), json!(4), json!(3.5), json!("3")],
    );
    assert_agrees(
        &definitions,
        "E",
        &[json!("a"), json!(1), json!(1.0), json!(null), json!([1, 2]), json!([2, 1]), json!({"k": "v"}), json!("b")],
    );
    assert_agrees(
        &definitions,
        "C",
        &[json!({"nested": [true, false]}), json!({"nested": [false, true]}), json!({})],
    );
}

#[test]
fn test_structural_keywords() {
    let definitions = json!({
        "O": {
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "string"}},
            "patternProperties": {"^x-": {"type": "number"}},
            "additionalProperties": {"type": "boolean"},
            "minProperties": 1,
            "maxProperties": 3
        },
        "A": {
            "type": "array",
            "items": [{"type": "string"}, {"type": "number"}],
            "additionalItems": false,
            "minItems": 1,
            "uniqueItems": true
        },
        "U": {"type": "array", "items": {"$ref": "#/definitions/O"}, "maxItems": 2}
    });

    assert_agrees(
        &definitions,
        "O",
        &[
            json!({"id": "a"}),
            json!({"id": "a", "x-rate": 1.5, "flag": true}),
            json!({"id": "a", "x-rate": "fast"}),
            json!({"id": "a", "flag": "yes"}),
            json!({"id": "a", "b": true, "c": true, "d": true}),
            json!({}),
        ],
    );
    assert_agrees(
        &definitions,
        "A",
        &[json!(["a", 1]), json!(["a"]), json!([]), json!(["a", 1, 2]), json!([1, "a"])],
    );
    assert_agrees(
        &definitions,
        "U",
        &[json!([{"id": "a"}]), json!([{"id": "a"}, {}]), json!([{"id": "a"}, {"id": "b"}, {"id": "c"}])],
    );
}

#[test]
fn test_combinators() {
    let definitions = json!({
        "X": {
            "anyOf": [{"type": "string"}, {"type": "integer", "minimum": 0}],
            "not": {"enum": ["forbidden", 13]}
        },
        "Y": {"oneOf": [{"type": "integer"}, {"type": "number", "minimum": 10}]},
        "Z": {"allOf": [{"required": ["a"]}, {"required": ["b"]}], "properties": {"a": false}}
    });

    assert_agrees(
        &definitions,
        "X",
        &[json!("ok"), json!("forbidden"), json!(13), json!(-1), json!(2), json!(null)],
    );
    assert_agrees(
        &definitions,
        "Y",
        &[json!(1), json!(12), json!(10.5), json!(2.5), json!("1")],
    );
    assert_agrees(
        &definitions,
        "Z",
        &[json!({"a": 1, "b": 2}), json!({"b": 2}), json!({}), json!([])],
    );
}

#[test]
fn test_recursive_definitions() {
    let definitions = json!({
        "Tree": {
            "type": "object",
            "required": ["value"],
            "properties": {
                "value": {"type": "integer"},
                "children": {"type": "array", "items": {"$ref": "#/definitions/Tree"}}
            }
        }
    });

    assert_agrees(
        &definitions,
        "Tree",
        &[
            json!({"value": 1}),
            json!({"value": 1, "children": [{"value": 2, "children": [{"value": 3}]}]}),
            json!({"value": 1, "children": [{"value": 2, "children": [{}]}]}),
            json!({"value": 1, "children": [{"value": "two"}]}),
        ],
    );
}

fn document_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-100i64..100).prop_map(|n| json!(n)),
        prop_oneof![
            Just("CapabilityStatement".to_string()),
            Just("active".to_string()),
            Just("instance".to_string()),
            Just("2025-01-01".to_string()),
            "[a-z ]{0,10}",
        ]
        .prop_map(Value::String),
    ];

    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::btree_map(
                proptest::sample::select(vec![
                    "resourceType", "status", "date", "kind", "fhirVersion", "format",
                    "contained", "extension", "url", "valueString", "mode", "rest", "other",
                ]),
                inner,
                0..7,
            )
            .prop_map(|m| {
                Value::Object(m.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
            }),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_capability_verdicts_agree(document in document_strategy()) {
        let definitions = capability_definitions();
        let source = SchemaSource::json(
            "capability.json",
            json!({ "definitions": definitions }).to_string(),
        );
        let ours = SchemaStore::new().validator(&source, "CapabilityStatement").unwrap();
        let oracle = oracle_for(&definitions, "CapabilityStatement");
        prop_assert_eq!(ours.validate(&document).is_valid(), oracle.is_valid(&document));
    }
}
