//! Unit tests for the schema store
//!
//! These tests load the capability statement asset from disk and cover
//! resource type lookup, compilation caching, compile error kinds and
//! concurrent first use of the store.

use schemata_core::store::{CompileErrorKind, NodeKind};
use schemata_core::vocabulary::{PublicationStatus, TypeRestfulInteraction};
use schemata_core::{SchemaSource, SchemaStore, StoreConfig};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn capability_schema() -> SchemaSource {
    SchemaSource::from_path(&fixture("capability.schema.json")).unwrap()
}

#[cfg(test)]
mod resource_types {
    use super::*;

    #[test]
    fn test_lists_types_in_declared_order() {
        let store = SchemaStore::new();
        let document = store.document(&capability_schema()).unwrap();
        let types = document.resource_types();
        assert_eq!(types[0], "CapabilityStatement");
        assert_eq!(types[1], "CapabilityStatement_Rest");
        assert!(types.contains(&"Extension"));
        assert!(document.has_type("dateTime"));
    }

    #[test]
    fn test_unknown_type() {
        let store = SchemaStore::new();
        let err = store.compile(&capability_schema(), "Patient").unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::UnknownType);
        assert!(err.to_string().contains("Patient"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_warm_up_compiles_every_type() {
        let store = SchemaStore::new();
        let failures = store.warm_up(&capability_schema()).unwrap();
        assert!(failures.is_empty(), "unexpected failures: {:?}", failures);

        let document = store.document(&capability_schema()).unwrap();
        assert_eq!(store.stats().compiled, document.resource_types().len());
    }

    #[test]
    fn test_schema_enums_match_vocabulary() {
        let store = SchemaStore::new();
        let document = store.document(&capability_schema()).unwrap();

        let status = document
            .pointer("/definitions/CapabilityStatement/properties/status/enum")
            .and_then(Value::as_array)
            .unwrap();
        let values: Vec<&str> = status.iter().filter_map(Value::as_str).collect();
        let mut expected: Vec<&str> = PublicationStatus::values().collect();
        let mut sorted = values.clone();
        expected.sort_unstable();
        sorted.sort_unstable();
        assert_eq!(sorted, expected);

        let codes = document
            .pointer("/definitions/CapabilityStatement_Interaction/properties/code/enum")
            .and_then(Value::as_array)
            .unwrap();
        for code in codes.iter().filter_map(Value::as_str) {
            assert!(code.parse::<TypeRestfulInteraction>().is_ok(), "{}", code);
        }
    }
}

#[cfg(test)]
mod compilation {
    use super::*;

    #[test]
    fn test_recursive_type_compiles_to_finite_arena() {
        let store = SchemaStore::new();
        let compiled = store
            .compile(&capability_schema(), "CapabilityStatement")
            .unwrap();
        assert_eq!(compiled.resource_type(), "CapabilityStatement");

        let root = compiled.node(compiled.root());
        assert!(root.location().ends_with("#/definitions/CapabilityStatement"));
        assert!(matches!(root.kind(), NodeKind::Constraints(_)));

        let roots = compiled
            .nodes()
            .filter(|(_, node)| node.location().ends_with("#/definitions/CapabilityStatement"))
            .count();
        assert_eq!(roots, 1);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let store = SchemaStore::with_config(StoreConfig {
            cache_compiled: false,
            ..StoreConfig::default()
        });
        let first = store
            .compile(&capability_schema(), "CapabilityStatement")
            .unwrap();
        let second = store
            .compile(&capability_schema(), "CapabilityStatement")
            .unwrap();

        let locations = |schema: &schemata_core::CompiledSchema| {
            schema
                .nodes()
                .map(|(_, node)| node.location().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(locations(&first), locations(&second));
        assert_eq!(first.root(), second.root());
    }

    #[test]
    fn test_identical_content_shares_document() {
        let store = SchemaStore::new();
        let text = std::fs::read_to_string(fixture("capability.schema.json")).unwrap();
        let a = SchemaSource::json("a.json", text.clone());
        let b = SchemaSource::json("a.json", text);
        assert_eq!(a.digest(), b.digest());

        let first = store.compile(&a, "Extension").unwrap();
        let second = store.compile(&b, "Extension").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.stats().documents, 1);
    }

    #[test]
    fn test_yaml_asset() {
        let store = SchemaStore::new();
        let source = SchemaSource::from_path(&fixture("capability.schema.yaml")).unwrap();
        let validator = store.validator(&source, "CapabilityStatement").unwrap();
        let outcome = validator.validate(&serde_json::json!({
            "resourceType": "CapabilityStatement",
            "status": "active",
            "date": "2025",
            "kind": "instance",
            "fhirVersion": "4.0.1",
            "format": ["json"],
            "contained": [{"resourceType": "CapabilityStatement"}]
        }));
        assert!(!outcome.is_valid());
        assert!(outcome
            .errors()
            .iter()
            .all(|e| e.path.starts_with("contained[0].") && e.keyword == "required"));
        assert_eq!(outcome.errors().len(), 5);
    }
}

#[cfg(test)]
mod compile_errors {
    use super::*;

    #[test]
    fn test_undecodable_asset() {
        let store = SchemaStore::new();
        let source = SchemaSource::json("broken.json", "{\"definitions\": {");
        let err = store.compile(&source, "Anything").unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::ParseFailure);
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_non_object_asset() {
        let store = SchemaStore::new();
        let source = SchemaSource::json("list.json", "[1, 2, 3]");
        assert_eq!(
            store.compile(&source, "Anything").unwrap_err().kind(),
            CompileErrorKind::ParseFailure
        );
    }

    #[test]
    fn test_dangling_reference() {
        let store = SchemaStore::new();
        let source = SchemaSource::json(
            "dangling.json",
            r##"{"definitions": {"A": {"properties": {"b": {"$ref": "#/definitions/Missing"}}}}}"##,
        );
        let err = store.compile(&source, "A").unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::UnresolvedReference);
        assert!(err.to_string().contains("#/definitions/Missing"));
    }

    #[test]
    fn test_failure_is_atomic_and_cached() {
        let store = SchemaStore::new();
        let source = SchemaSource::json(
            "cycle.json",
            r##"{"definitions": {"A": {"$ref": "#/definitions/B"}, "B": {"$ref": "#/definitions/A"}}}"##,
        );
        let first = store.compile(&source, "A").unwrap_err();
        let second = store.compile(&source, "A").unwrap_err();
        assert_eq!(first, second);
        assert_eq!(first.kind(), CompileErrorKind::UnresolvedReference);
        assert!(store.validator(&source, "A").is_err());
    }
}

#[cfg(test)]
mod large_assets {
    use super::*;
    use serde_json::{json, Map};

    /// `D0.next -> D1.next -> ... -> D{n-1}`, each hop through a property
    fn property_chain(length: usize) -> SchemaSource {
        let mut definitions = Map::new();
        for i in 0..length {
            let definition = if i + 1 < length {
                json!({
                    "type": "object",
                    "properties": {
                        "label": {"type": "string"},
                        "next": {"$ref": format!("#/definitions/D{}", i + 1)}
                    }
                })
            } else {
                json!({"type": "string"})
            };
            definitions.insert(format!("D{}", i), definition);
        }
        SchemaSource::json("chain.json", json!({ "definitions": definitions }).to_string())
    }

    /// `R0 -> $ref R1 -> ... -> R{n-1}`, all on the same instance
    fn reference_chain(length: usize) -> SchemaSource {
        let mut definitions = Map::new();
        for i in 0..length {
            let definition = if i + 1 < length {
                json!({"$ref": format!("#/definitions/R{}", i + 1)})
            } else {
                json!({"type": "string"})
            };
            definitions.insert(format!("R{}", i), definition);
        }
        SchemaSource::json("refs.json", json!({ "definitions": definitions }).to_string())
    }

    #[test]
    fn test_long_property_chain_compiles() {
        let store = SchemaStore::new();
        let source = property_chain(800);

        let validator = store.validator(&source, "D0").unwrap();
        let outcome = validator.validate(&json!({"next": {"next": {"label": 7}}}));
        assert_eq!(outcome.errors().len(), 1);
        assert_eq!(outcome.errors()[0].path, "next.next.label");

        assert!(store.warm_up(&source).unwrap().is_empty());
    }

    #[test]
    fn test_reference_chain_limit_counts_hops() {
        let store = SchemaStore::new();
        assert!(store.compile(&reference_chain(200), "R0").is_ok());

        let err = store.compile(&reference_chain(300), "R0").unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::UnresolvedReference);
        assert!(err.to_string().contains("maximum depth of 256"));

        let relaxed = SchemaStore::with_config(StoreConfig {
            max_reference_depth: 512,
            ..StoreConfig::default()
        });
        let validator = relaxed.validator(&reference_chain(300), "R0").unwrap();
        assert!(validator.validate(&json!("leaf")).is_valid());
        assert!(!validator.validate(&json!(1)).is_valid());
    }
}

#[cfg(test)]
mod concurrency {
    use super::*;

    #[test]
    fn test_concurrent_first_use_compiles_once() {
        let store = SchemaStore::new();
        let source = capability_schema();

        let compiled: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| store.compile(&source, "CapabilityStatement").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for schema in &compiled[1..] {
            assert!(Arc::ptr_eq(&compiled[0], schema));
        }
        assert_eq!(store.stats().compiled, 1);
    }

    #[test]
    fn test_concurrent_distinct_types() {
        let store = SchemaStore::new();
        let source = capability_schema();
        let types = ["CapabilityStatement", "Extension", "CapabilityStatement_Rest", "code"];

        std::thread::scope(|scope| {
            for resource_type in types {
                let store = &store;
                let source = &source;
                scope.spawn(move || {
                    let compiled = store.compile(source, resource_type).unwrap();
                    assert_eq!(compiled.resource_type(), resource_type);
                });
            }
        });
        assert_eq!(store.stats().compiled, types.len());
    }
}
