//! Property-based tests for document validation
//!
//! These tests verify that the validator behaves consistently across a wide
//! range of generated documents.

use proptest::prelude::*;
use schemata_core::vocabulary::{CapabilityStatementKind, PublicationStatus};
use schemata_core::{SchemaSource, SchemaStore, Validator};
use serde_json::{json, Value};
use std::sync::OnceLock;

const REQUIRED: [&str; 6] = ["resourceType", "status", "date", "kind", "fhirVersion", "format"];

fn validator() -> &'static Validator {
    static VALIDATOR: OnceLock<Validator> = OnceLock::new();
    VALIDATOR.get_or_init(|| {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/capability.schema.json");
        let source = SchemaSource::from_path(&path).unwrap();
        SchemaStore::new()
            .validator(&source, "CapabilityStatement")
            .unwrap()
    })
}

/// Strategy for generating random JSON values with controlled complexity
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,50}".prop_map(Value::String),
    ];

    leaf.prop_recursive(
        4,  // max depth
        24, // max size
        5,  // items per collection
        |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                proptest::collection::hash_map(
                    prop_oneof![
                        Just("status".to_string()),
                        Just("contained".to_string()),
                        Just("format".to_string()),
                        "[a-zA-Z_][a-zA-Z0-9_]{0,20}",
                    ],
                    inner,
                    0..5
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

/// Strategy for generating conforming capability statements
fn capability_strategy() -> impl Strategy<Value = Value> {
    (
        proptest::sample::select(PublicationStatus::ALL),
        proptest::sample::select(CapabilityStatementKind::ALL),
        "[0-9]{4}(-0[1-9](-[12][0-9])?)?",
        proptest::collection::vec("[a-z+/]{1,12}", 1..4),
        proptest::option::of("[A-Za-z0-9.-]{1,64}"),
    )
        .prop_map(|(status, kind, date, format, id)| {
            let mut document = json!({
                "resourceType": "CapabilityStatement",
                "status": status.as_str(),
                "date": date,
                "kind": kind.as_str(),
                "fhirVersion": "4.0.1",
                "format": format,
            });
            if let Some(id) = id {
                document["id"] = json!(id);
            }
            document
        })
}

proptest! {
    #[test]
    fn test_validation_never_panics(document in json_value_strategy()) {
        let _ = validator().validate(&document);
    }

    #[test]
    fn test_valid_iff_no_errors(document in json_value_strategy()) {
        let outcome = validator().validate(&document);
        prop_assert_eq!(outcome.is_valid(), outcome.errors().is_empty());
        prop_assert_eq!(outcome.is_valid(), validator().is_valid(&document));
        for error in outcome.errors() {
            prop_assert!(!error.path.is_empty());
            prop_assert!(!error.message.is_empty());
            prop_assert!(!error.keyword.is_empty());
        }
    }

    #[test]
    fn test_validation_is_deterministic(document in json_value_strategy()) {
        let first = validator().validate(&document);
        let second = validator().validate(&document);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_bytes_and_tree_agree(document in json_value_strategy()) {
        let bytes = serde_json::to_vec(&document).unwrap();
        let from_bytes = validator().validate_bytes(&bytes).unwrap();
        prop_assert_eq!(from_bytes, validator().validate(&document));
    }

    #[test]
    fn test_conforming_documents_are_valid(document in capability_strategy()) {
        let outcome = validator().validate(&document);
        prop_assert!(outcome.is_valid(), "{}", outcome);
    }

    #[test]
    fn test_each_missing_field_is_one_error(
        document in capability_strategy(),
        missing in proptest::sample::subsequence(REQUIRED.to_vec(), 1..=REQUIRED.len()),
    ) {
        let mut document = document;
        let members = document.as_object_mut().unwrap();
        for name in &missing {
            members.remove(*name);
        }

        let outcome = validator().validate(&document);
        let reported: Vec<&str> = outcome.errors().iter().map(|e| e.path.as_str()).collect();
        prop_assert_eq!(reported, missing.clone());
        prop_assert!(outcome.errors().iter().all(|e| e.keyword == "required"));
    }

    #[test]
    fn test_nested_violation_path(index in 0usize..4, status in "[a-z]{1,8}") {
        prop_assume!(status.parse::<PublicationStatus>().is_err());

        let member = json!({
            "resourceType": "CapabilityStatement",
            "status": "draft",
            "date": "2025",
            "kind": "instance",
            "fhirVersion": "4.0.1",
            "format": ["json"]
        });
        let mut contained = vec![member.clone(); index + 1];
        contained[index]["status"] = json!(status);
        let mut document = member;
        document["contained"] = Value::Array(contained);

        let outcome = validator().validate(&document);
        prop_assert_eq!(outcome.errors().len(), 1);
        prop_assert_eq!(&outcome.errors()[0].path, &format!("contained[{}].status", index));
        prop_assert_eq!(&outcome.errors()[0].keyword, "enum");
    }
}
