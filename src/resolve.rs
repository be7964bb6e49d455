//! Base-Reference Resolver.
//!
//! Follows each base reference of a unit exactly one hop: the referenced
//! file's own references (if any) are never looked at.
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::{base_group_params, BaseRef, BaseTarget, EventUnit, ParamMap};
use crate::error::{GenError, Result};
use crate::loader;

/// A resolved base reference, in declaration order.
#[derive(Debug, Clone)]
pub struct BaseGroup {
    pub role: String,
    /// Human-readable origin, used in diagnostics.
    pub source: String,
    pub params: ParamMap,
}

pub fn resolve_bases(unit: &EventUnit) -> Result<Vec<BaseGroup>> {
    unit.bases.iter().map(|base| resolve_one(unit, base)).collect()
}

/// Where a relative reference points, seen from the referencing document.
pub fn base_path(origin: &Path, relative: &Path) -> PathBuf {
    origin.parent().unwrap_or_else(|| Path::new("")).join(relative)
}

fn resolve_one(unit: &EventUnit, base: &BaseRef) -> Result<BaseGroup> {
    let relative = match &base.target {
        BaseTarget::Component { name, params } => {
            return Ok(BaseGroup {
                role: base.role.clone(),
                source: format!("component `{name}`"),
                params: params.clone(),
            });
        }
        BaseTarget::File(relative) => relative,
    };
    let path = base_path(&unit.origin, relative);
    let raw = match loader::load_file(&path) {
        Ok(raw) => raw,
        Err(GenError::SchemaNotFound { path }) => {
            return Err(reference_error(unit, base, format!("`{}` does not exist", path.display())));
        }
        Err(error) => return Err(error),
    };
    let params = base_group_params(&raw)
        .map_err(|reason| reference_error(unit, base, format!("`{}`: {reason}", path.display())))?;
    debug!(
        method = %unit.method_name,
        role = %base.role,
        path = %path.display(),
        params = params.len(),
        "resolved base group"
    );
    Ok(BaseGroup {
        role: base.role.clone(),
        source: format!("base `{}` ({})", base.role, relative.display()),
        params,
    })
}

fn reference_error(unit: &EventUnit, base: &BaseRef, reason: String) -> GenError {
    GenError::BaseReference {
        path: unit.origin.clone(),
        key: unit.method_name.clone(),
        role: base.role.clone(),
        reason,
    }
}
