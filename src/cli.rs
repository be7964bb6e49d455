//! Minimal CLI: schemas → (resolved definitions | tracking bindings)
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

use crate::config::{GeneratorConfig, TargetPlatform};
use crate::merge::DuplicatePolicy;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// resolve analytics event schemas and emit strongly-typed tracking bindings
#[derive(Parser, Debug)]
#[command(name = "trackgen", version)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG works too
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve schemas and write the abstract API + dispatch implementation
    Generate(GenerateOut),
    /// resolve schemas and print the merged event definitions as JSON
    Resolve(ResolveOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more schema files or directories. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// what to do when a parameter name is declared twice (local vs. base)
    #[arg(long, value_enum)]
    duplicates: Option<DuplicatePolicy>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// target source directory; package directories are created below it
    #[arg(short, long, required_unless_present = "dry_run")]
    out: Option<PathBuf>,

    /// package of the generated classes
    #[arg(long)]
    namespace: Option<String>,

    /// package providing EventTracker and TrackingEvent
    #[arg(long)]
    runtime_namespace: Option<String>,

    #[arg(long, value_enum)]
    platform: Option<TargetPlatform>,

    /// YAML file with generator settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// print the artifacts instead of writing them
    #[arg(long)]
    dry_run: bool,
}

#[derive(clap::Parser, Debug)]
struct ResolveOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn paths(&self) -> anyhow::Result<Vec<PathBuf>> {
        resolve_file_path_patterns(&self.input).context("failed to resolve input paths")
    }
}

impl GenerateOut {
    fn config(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_file(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(runtime_namespace) = &self.runtime_namespace {
            config.runtime_namespace = runtime_namespace.clone();
        }
        if let Some(platform) = self.platform {
            config.platform = platform;
        }
        if let Some(duplicates) = self.input_settings.duplicates {
            config.duplicate_parameters = duplicates;
        }
        Ok(config)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                let inputs = target.input_settings.paths()?;
                let config = target.config()?;
                if target.dry_run {
                    let artifacts = crate::pipeline::prepare(&inputs, &config)?;
                    for artifact in artifacts.iter() {
                        println!("// --- {} ---", artifact.path.display());
                        println!("{}", artifact.contents);
                    }
                    return Ok(());
                }
                let Some(out) = target.out.as_ref() else {
                    bail!("--out is required unless --dry-run is given");
                };
                crate::pipeline::generate(&inputs, out, &config)
                    .with_context(|| format!("generation into '{}' failed", out.display()))?;
            }
            Command::Resolve(target) => {
                let inputs = target.input_settings.paths()?;
                let policy = target.input_settings.duplicates.unwrap_or_default();
                let definitions = crate::pipeline::load_definitions(&inputs, policy)?;
                let json = serde_json::to_string_pretty(&definitions)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("cannot create '{}'", parent.display()))?;
                    }
                    std::fs::write(out, &json).with_context(|| format!("cannot write '{}'", out.display()))?;
                } else {
                    println!("{json}");
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // sorted so that discovery order does not depend on the filesystem
            let mut matched = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.extend(matched);
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["schemas/a.yml", "schemas"]).unwrap();
        assert_eq!(paths, [PathBuf::from("schemas/a.yml"), PathBuf::from("schemas")]);
    }

    #[test]
    fn globs_expand_sorted_and_must_match() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.yml"), "").unwrap();
        std::fs::write(dir.path().join("a.yml"), "").unwrap();
        let pattern = format!("{}/*.yml", dir.path().display());
        let paths = resolve_file_path_patterns([pattern.as_str()]).unwrap();
        assert_eq!(paths, [dir.path().join("a.yml"), dir.path().join("b.yml")]);

        let none = format!("{}/*.json", dir.path().display());
        assert!(resolve_file_path_patterns([none.as_str()]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("trackgen.yml");
        std::fs::write(&file, "namespace: from.file\nplatform: native\n").unwrap();
        let cli = CommandLineInterface::parse_from([
            "trackgen",
            "generate",
            "-i",
            "schemas",
            "--out",
            "build",
            "--config",
            file.to_str().unwrap(),
            "--platform",
            "js",
            "--duplicates",
            "reject",
        ]);
        let Command::Generate(target) = &cli.cmd else { panic!("expected generate") };
        let config = target.config().unwrap();
        assert_eq!(config.namespace, "from.file");
        assert_eq!(config.platform, TargetPlatform::Js);
        assert_eq!(config.duplicate_parameters, DuplicatePolicy::Reject);
    }

    #[test]
    fn out_is_required_without_dry_run() {
        assert!(CommandLineInterface::try_parse_from(["trackgen", "generate", "-i", "x"]).is_err());
        assert!(CommandLineInterface::try_parse_from(["trackgen", "generate", "-i", "x", "--dry-run"]).is_ok());
    }
}
