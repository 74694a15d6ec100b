//! Command handlers for CLI subcommands
//!
//! Each subcommand lives in its own module; this module holds what they share:
//! locating and loading the schema asset and building the store around it.

mod check;
mod types;
mod validate;

pub use check::handle_check;
pub use types::handle_types;
pub use validate::handle_validate;

use crate::config::Config;
use crate::error::{Error, Result};
use schemata_core::{DirectoryRetriever, Retrieve, RetrieveError, SchemaSource, SchemaStore};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pick the schema asset: the command-line flag wins over the config file
pub fn resolve_schema_path(arg: Option<&Path>, config: &Config) -> Result<PathBuf> {
    arg.map(Path::to_path_buf)
        .or_else(|| config.schema.clone())
        .ok_or_else(|| {
            Error::invalid_args("no schema asset given; pass --schema or set `schema` in the config")
        })
}

/// Read the schema asset from disk
pub fn load_schema(path: &Path) -> Result<SchemaSource> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let source = SchemaSource::from_path(path)?;
    debug!(
        schema = %path.display(),
        format = %source.format(),
        digest = %source.digest(),
        "Loaded schema asset"
    );
    Ok(source)
}

/// Build a store whose external references resolve next to the asset, then in `schema_dirs`
pub fn build_store(schema_path: &Path, config: &Config) -> SchemaStore {
    let mut dirs = Vec::with_capacity(config.schema_dirs.len() + 1);
    let asset_dir = schema_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    dirs.push(asset_dir);
    dirs.extend(config.schema_dirs.iter().cloned());

    SchemaStore::new().with_retriever(SearchPathRetriever::new(dirs))
}

/// Tries a list of directories in order for each referenced document
#[derive(Debug, Clone)]
pub struct SearchPathRetriever {
    directories: Vec<DirectoryRetriever>,
}

impl SearchPathRetriever {
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            directories: dirs.into_iter().map(DirectoryRetriever::new).collect(),
        }
    }
}

impl Retrieve for SearchPathRetriever {
    fn retrieve(&self, uri: &str) -> std::result::Result<SchemaSource, RetrieveError> {
        for directory in &self.directories {
            match directory.retrieve(uri) {
                Ok(source) => {
                    debug!(uri, dir = %directory.base_dir().display(), "Retrieved referenced document");
                    return Ok(source);
                }
                Err(RetrieveError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(RetrieveError::not_found(uri))
    }
}
