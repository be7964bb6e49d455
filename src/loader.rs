//! Schema Loader: documents on disk → untyped YAML trees.
//!
//! A source is either a single file or a flat directory of files. JSON files
//! go through `serde_json` (key order preserved) and are converted, so every
//! later stage only ever sees `serde_yaml::Value`.
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_yaml::Value;
use tracing::debug;

use crate::error::{GenError, Result};

const SCHEMA_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// One parsed document and where it came from.
#[derive(Debug, Clone)]
pub struct RawSchema {
    pub path: PathBuf,
    pub tree: Value,
}

pub fn load_file(path: &Path) -> Result<RawSchema> {
    let source = match std::fs::read_to_string(path) {
        Ok(x) => x,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(GenError::SchemaNotFound { path: path.to_path_buf() });
        }
        Err(error) => {
            return Err(GenError::SchemaRead { path: path.to_path_buf(), source: error });
        }
    };
    let tree = if is_json(path) {
        let json = serde_json::from_str::<serde_json::Value>(&source)
            .map_err(|error| GenError::parse(path, error.to_string()))?;
        serde_yaml::to_value(json).map_err(|error| GenError::parse(path, error.to_string()))?
    } else {
        serde_yaml::from_str::<Value>(&source).map_err(|error| GenError::parse(path, error.to_string()))?
    };
    if tree.is_null() {
        return Err(GenError::parse(path, "document is empty"));
    }
    debug!(path = %path.display(), "loaded schema document");
    Ok(RawSchema { path: path.to_path_buf(), tree })
}

/// Schema files directly inside `dir`, sorted by file name.
pub fn list_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|error| GenError::SchemaRead {
        path: dir.to_path_buf(),
        source: error,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| GenError::SchemaRead { path: dir.to_path_buf(), source: error })?;
        let path = entry.path();
        if path.is_file() && has_schema_extension(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Single-file mode yields one tree; directory mode one tree per file.
/// Files are read in parallel, results keep listing order.
pub fn load_source(path: &Path) -> Result<Vec<RawSchema>> {
    if !path.exists() {
        return Err(GenError::SchemaNotFound { path: path.to_path_buf() });
    }
    if path.is_dir() {
        let files = list_directory(path)?;
        debug!(dir = %path.display(), files = files.len(), "listing schema directory");
        files.par_iter().map(|file| load_file(file)).collect()
    } else {
        Ok(vec![load_file(path)?])
    }
}

pub fn load_sources(paths: &[PathBuf]) -> Result<Vec<RawSchema>> {
    let mut out = Vec::new();
    for path in paths {
        out.extend(load_source(path)?);
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|x| x.to_str()) == Some("json")
}

fn has_schema_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|x| x.to_str())
        .map(|ext| SCHEMA_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
