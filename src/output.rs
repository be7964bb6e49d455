//! Writing the artifact pair.
//!
//! Both files are staged as temp files next to their targets, then renamed
//! into place. If the second rename fails the first target is put back the
//! way it was, so the pair on disk is always either old or new, never mixed.
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GenError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Relative to the target directory.
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub api: Artifact,
    pub implementation: Artifact,
}

impl Artifacts {
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        [&self.api, &self.implementation].into_iter()
    }
}

/// Returns the absolute-or-joined paths that were written.
pub fn write_pair(target_dir: &Path, artifacts: &Artifacts) -> Result<Vec<PathBuf>> {
    let targets = artifacts.iter().map(|a| target_dir.join(&a.path)).collect::<Vec<_>>();
    for target in &targets {
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|error| write_error(parent, error))?;
            }
        }
    }

    // 1) stage
    let temps = targets.iter().map(|t| temp_path(t)).collect::<Vec<_>>();
    for (temp, artifact) in temps.iter().zip(artifacts.iter()) {
        if let Err(error) = fs::write(temp, &artifact.contents) {
            discard(&temps);
            return Err(write_error(temp, error));
        }
    }

    // 2) remember what the first target looked like, for rollback
    let backup = match fs::read(&targets[0]) {
        Ok(bytes) => Some(bytes),
        Err(error) if error.kind() == io::ErrorKind::NotFound => None,
        Err(error) => {
            discard(&temps);
            return Err(GenError::Backup { path: targets[0].clone(), source: error });
        }
    };

    // 3) swap in
    if let Err(error) = fs::rename(&temps[0], &targets[0]) {
        discard(&temps);
        return Err(write_error(&targets[0], error));
    }
    if let Err(error) = fs::rename(&temps[1], &targets[1]) {
        discard(&temps[1..]);
        let restored = match &backup {
            Some(bytes) => fs::write(&targets[0], bytes),
            None => fs::remove_file(&targets[0]),
        };
        if let Err(rollback) = restored {
            return Err(GenError::Rollback {
                path: targets[0].clone(),
                failed: targets[1].clone(),
                cause: error,
                source: rollback,
            });
        }
        return Err(write_error(&targets[1], error));
    }

    for target in &targets {
        debug!(path = %target.display(), "wrote artifact");
    }
    Ok(targets)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

fn discard(temps: &[PathBuf]) {
    for temp in temps {
        let _ = fs::remove_file(temp);
    }
}

fn write_error(path: &Path, source: std::io::Error) -> GenError {
    GenError::Write { path: path.to_path_buf(), source }
}
