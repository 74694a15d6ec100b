//! Validation command handler

use super::{build_store, load_schema, resolve_schema_path};
use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{DocumentReport, OutputWriter};
use schemata_core::{Format, ValidationConfig, Validator};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Handle the validate command
#[instrument(skip(config, output), fields(resource_type = %args.resource_type, documents = args.documents.len()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("validate_command", &args.resource_type);

    let schema_path = resolve_schema_path(args.schema.as_deref(), config)?;
    let source = load_schema(&schema_path)?;
    let store = build_store(&schema_path, config);

    let compiled = {
        let _compile_timer = Timer::with_details("schema_compile", &args.resource_type);
        store.compile(&source, &args.resource_type)?
    };
    let max_errors = args.max_errors.unwrap_or(config.validation.max_errors);
    let validator = Validator::with_config(compiled, ValidationConfig { max_errors });
    info!(schema = %schema_path.display(), max_errors, "Validator ready");
    output.info(&format!(
        "Validating {} document(s) against {}",
        args.documents.len(),
        args.resource_type
    ))?;

    let mut reports = Vec::with_capacity(args.documents.len());
    for path in &args.documents {
        let format = document_format(path, args.format.map(Into::into));
        let bytes = read_document(path)?;
        debug!(document = %path.display(), %format, bytes = bytes.len(), "Validating document");

        let outcome = match validator.validate_slice(&bytes, format) {
            Ok(outcome) => outcome,
            Err(source) => {
                // Keep what was already validated visible before aborting
                output.reports(&reports)?;
                return Err(Error::Undecodable {
                    path: path.clone(),
                    source,
                });
            }
        };

        if !outcome.is_valid() {
            warn!(document = %path.display(), errors = outcome.error_count(), "Document is invalid");
        }
        if outcome.is_truncated() {
            output.warning(&format!(
                "{}: stopped after {} error(s)",
                path.display(),
                max_errors
            ))?;
        }
        reports.push(DocumentReport {
            document: path.display().to_string(),
            resource_type: args.resource_type.clone(),
            outcome,
        });
    }

    output.reports(&reports)?;

    let total = reports.len();
    let failed = reports.iter().filter(|r| !r.outcome.is_valid()).count();
    if failed > 0 {
        return Err(Error::ValidationFailed { failed, total });
    }

    output.success(&format!("✓ All {} document(s) are valid", total))?;
    Ok(())
}

/// An explicit `--format` wins; otherwise the extension decides, falling back to JSON
fn document_format(path: &Path, explicit: Option<Format>) -> Format {
    explicit
        .or_else(|| Format::from_path(path).ok())
        .unwrap_or(Format::Json)
}

/// Read a document from disk, or from stdin for `-`
fn read_document(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        return Ok(bytes);
    }

    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read(path)?)
}
