//! load → resolve → merge → build → emit, once per run.
//!
//! Everything that can fail on the inputs fails before the first byte is
//! written.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codegen;
use crate::config::GeneratorConfig;
use crate::definition::{build_definitions, EventDefinition};
use crate::document::parse_units;
use crate::error::Result;
use crate::loader::load_sources;
use crate::lower::lower_to_ir;
use crate::merge::DuplicatePolicy;
use crate::output::{write_pair, Artifact, Artifacts};

pub fn load_definitions(inputs: &[PathBuf], policy: DuplicatePolicy) -> Result<Vec<EventDefinition>> {
    let documents = load_sources(inputs)?;
    let mut units = Vec::new();
    for document in &documents {
        units.extend(parse_units(document)?);
    }
    let definitions = build_definitions(&units, policy)?;
    if definitions.is_empty() {
        warn!(inputs = inputs.len(), "no event definitions found");
    }
    info!(documents = documents.len(), definitions = definitions.len(), "resolved event definitions");
    Ok(definitions)
}

/// Render both artifacts in memory.
pub fn render(definitions: &[EventDefinition], config: &GeneratorConfig) -> Result<Artifacts> {
    let api = lower_to_ir(definitions, config)?;
    let dir = config.namespace_dir();
    Ok(Artifacts {
        api: Artifact {
            path: dir.join(format!("{}.kt", api.api_class)),
            contents: codegen::render_api(&api),
        },
        implementation: Artifact {
            path: dir.join(format!("{}.kt", api.impl_class)),
            contents: codegen::render_impl(&api),
        },
    })
}

/// Resolve and render without touching the target directory.
pub fn prepare(inputs: &[PathBuf], config: &GeneratorConfig) -> Result<Artifacts> {
    config.validate()?;
    let definitions = load_definitions(inputs, config.duplicate_parameters)?;
    render(&definitions, config)
}

pub fn generate(inputs: &[PathBuf], target_dir: &Path, config: &GeneratorConfig) -> Result<Artifacts> {
    let artifacts = prepare(inputs, config)?;
    let written = write_pair(target_dir, &artifacts)?;
    info!(target = %target_dir.display(), files = written.len(), "generated tracking bindings");
    Ok(artifacts)
}
