//! Types command handler

use super::{build_store, load_schema, resolve_schema_path};
use crate::cli::{OutputFormat, SchemaArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use tracing::instrument;

/// List the resource types a schema asset defines, in document order
#[instrument(skip(config, output))]
pub fn handle_types(args: SchemaArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let schema_path = resolve_schema_path(args.schema.as_deref(), config)?;
    let source = load_schema(&schema_path)?;
    let document = build_store(&schema_path, config).document(&source)?;
    let resource_types = document.resource_types();

    if output.format() == OutputFormat::Human {
        output.section(&format!("Resource types in {}", schema_path.display()))?;
        for resource_type in &resource_types {
            output.writeln(resource_type)?;
        }
        Ok(())
    } else {
        output.data(&resource_types)
    }
}
