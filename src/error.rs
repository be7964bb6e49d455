//! Error taxonomy for a generation run. Every variant is fatal.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    /// Input path does not exist.
    #[error("schema not found: {}", path.display())]
    SchemaNotFound { path: PathBuf },

    /// Path exists but could not be read (permissions, not a file, ...).
    #[error("failed to read schema '{}': {source}", path.display())]
    SchemaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not well-formed (or has the wrong shape for its position).
    #[error("failed to parse schema '{}': {message}", path.display())]
    SchemaParse { path: PathBuf, message: String },

    /// Dangling or malformed base-group reference.
    #[error("bad base reference '{role}' of '{key}' in '{}': {reason}", path.display())]
    BaseReference {
        path: PathBuf,
        key: String,
        role: String,
        reason: String,
    },

    /// Definition is missing something it cannot do without.
    #[error("malformed definition '{key}' in '{}': {reason}", path.display())]
    MalformedDefinition {
        path: PathBuf,
        key: String,
        reason: String,
    },

    #[error(
        "duplicate method name '{method}': defined in '{}' and again in '{}'",
        first.display(),
        second.display()
    )]
    DuplicateMethodName {
        method: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Only raised under `DuplicatePolicy::Reject`.
    #[error(
        "duplicate parameter '{param}' in '{key}' ('{}'): declared by {first} and again by {second}",
        path.display()
    )]
    DuplicateParameter {
        path: PathBuf,
        key: String,
        param: String,
        first: String,
        second: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An existing artifact could not be read, so it could not be restored
    /// if the write failed halfway. Nothing was replaced.
    #[error("cannot back up existing '{}' before replacing it: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The second artifact failed and the first could not be put back.
    #[error(
        "failed to write '{}' ({cause}); restoring '{}' also failed: {source}",
        failed.display(),
        path.display()
    )]
    Rollback {
        path: PathBuf,
        failed: PathBuf,
        cause: std::io::Error,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = GenError> = std::result::Result<T, E>;

impl GenError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, key: impl Into<String>, reason: impl Into<String>) -> Self {
        GenError::MalformedDefinition {
            path: path.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        GenError::SchemaParse {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_file_and_key() {
        let err = GenError::malformed("schemas/order.yml", "trackOrderPlaced", "missing `supported_platforms`");
        let msg = err.to_string();
        assert!(msg.contains("schemas/order.yml"));
        assert!(msg.contains("trackOrderPlaced"));
        assert!(msg.contains("supported_platforms"));
    }

    #[test]
    fn duplicate_method_names_both_locations() {
        let err = GenError::DuplicateMethodName {
            method: "trackLogin".into(),
            first: "a.yml".into(),
            second: "b.yml".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a.yml") && msg.contains("b.yml"));
    }

    #[test]
    fn rollback_failure_names_both_files() {
        use std::io::{Error, ErrorKind};
        let err = GenError::Rollback {
            path: "out/Api.kt".into(),
            failed: "out/ApiImpl.kt".into(),
            cause: Error::new(ErrorKind::Other, "disk full"),
            source: Error::new(ErrorKind::PermissionDenied, "read-only"),
        };
        let msg = err.to_string();
        assert!(msg.contains("out/Api.kt") && msg.contains("out/ApiImpl.kt"));
        assert!(msg.contains("disk full") && msg.contains("read-only"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
