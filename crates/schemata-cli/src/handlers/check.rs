//! Check command handler

use super::{build_store, load_schema, resolve_schema_path};
use crate::cli::{OutputFormat, SchemaArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde::Serialize;
use tracing::{error, info, instrument};

/// Summary of a `check` run
#[derive(Debug, Serialize)]
struct CheckReport {
    schema: String,
    resource_types: usize,
    failures: Vec<CheckFailure>,
}

#[derive(Debug, Serialize)]
struct CheckFailure {
    resource_type: String,
    reason: &'static str,
    message: String,
}

/// Compile every resource type of a schema asset and report the ones that fail
#[instrument(skip(config, output))]
pub fn handle_check(args: SchemaArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::new("check_command");

    let schema_path = resolve_schema_path(args.schema.as_deref(), config)?;
    let source = load_schema(&schema_path)?;
    let store = build_store(&schema_path, config);

    let total = store.document(&source)?.resource_types().len();
    let failures: Vec<CheckFailure> = store
        .warm_up(&source)?
        .into_iter()
        .map(|(resource_type, e)| {
            error!(resource_type = %resource_type, reason = e.reason(), "Resource type does not compile");
            CheckFailure {
                resource_type,
                reason: e.reason(),
                message: e.to_string(),
            }
        })
        .collect();
    info!(total, failed = failures.len(), stats = ?store.stats(), "Schema asset checked");

    let failed = failures.len();
    if output.format() == OutputFormat::Human {
        for failure in &failures {
            output.error(&format!("✗ {}: {}", failure.resource_type, failure.message))?;
        }
        if failed == 0 {
            output.success(&format!(
                "✓ All {} resource type(s) in {} compile",
                total,
                schema_path.display()
            ))?;
        }
    } else {
        output.data(&CheckReport {
            schema: schema_path.display().to_string(),
            resource_types: total,
            failures,
        })?;
    }

    if failed > 0 {
        return Err(Error::CheckFailed { failed, total });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn check(schema_text: &str) -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("asset.json");
        std::fs::write(&schema, schema_text).unwrap();

        let mut output = OutputWriter::with_writer(
            OutputFormat::Human,
            false,
            true,
            Box::new(std::io::sink()),
        );
        handle_check(
            SchemaArgs {
                schema: Some(schema),
            },
            &Config::default(),
            &mut output,
        )
    }

    #[test]
    fn test_clean_asset() {
        let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../schemata-core/tests/fixtures/capability.schema.json");
        let text = std::fs::read_to_string(fixture).unwrap();
        assert!(check(&text).is_ok());
    }

    #[test]
    fn test_broken_reference_is_reported() {
        let result = check(
            r##"{"definitions": {
                "Good": {"type": "string"},
                "Bad": {"properties": {"x": {"$ref": "#/definitions/Missing"}}}
            }}"##,
        );
        assert!(matches!(result, Err(Error::CheckFailed { failed: 1, total: 2 })));
    }

    #[test]
    fn test_unparseable_asset() {
        let result = check("{\"definitions\": ");
        assert!(matches!(result, Err(Error::Compile(_))));
    }
}
