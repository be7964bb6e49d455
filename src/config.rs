//! Generator configuration. Loaded from an optional YAML file, then
//! overridden by command line flags.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codegen::is_identifier;
use crate::error::{GenError, Result};
use crate::merge::DuplicatePolicy;
use crate::path_de::from_str_with_path;

/// Where `EventTracker` and `TrackingEvent` live in the consuming project.
pub const DEFAULT_RUNTIME_NAMESPACE: &str = "com.deliveryhero.litics";
pub const DEFAULT_API_CLASS: &str = "GeneratedEventsAnalytics";
pub const DEFAULT_IMPL_CLASS: &str = "GeneratedEventsAnalyticsImpl";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    #[default]
    Jvm,
    /// Adds `@JsExport` to the generated classes.
    Js,
    Native,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Package of the generated classes. Empty means the default package.
    pub namespace: String,
    pub runtime_namespace: String,
    pub api_class: String,
    pub impl_class: String,
    pub platform: TargetPlatform,
    pub duplicate_parameters: DuplicatePolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            runtime_namespace: DEFAULT_RUNTIME_NAMESPACE.to_string(),
            api_class: DEFAULT_API_CLASS.to_string(),
            impl_class: DEFAULT_IMPL_CLASS.to_string(),
            platform: TargetPlatform::default(),
            duplicate_parameters: DuplicatePolicy::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|error| GenError::Config(format!("cannot read '{}': {error}", path.display())))?;
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        from_str_with_path::<Self>(&source).map_err(|message| GenError::Config(format!("'{}' {message}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.namespace.is_empty() && !is_dotted_identifier(&self.namespace) {
            return Err(GenError::Config(format!("namespace `{}` is not a dotted identifier", self.namespace)));
        }
        if !is_dotted_identifier(&self.runtime_namespace) {
            return Err(GenError::Config(format!(
                "runtime namespace `{}` is not a dotted identifier",
                self.runtime_namespace
            )));
        }
        for class in [&self.api_class, &self.impl_class] {
            if !is_identifier(class) {
                return Err(GenError::Config(format!("class name `{class}` is not an identifier")));
            }
        }
        if self.api_class == self.impl_class {
            return Err(GenError::Config("api and impl class names must differ".into()));
        }
        Ok(())
    }

    /// `com.example.analytics` → `com/example/analytics`
    pub fn namespace_dir(&self) -> PathBuf {
        self.namespace.split('.').filter(|x| !x.is_empty()).collect()
    }
}

fn is_dotted_identifier(s: &str) -> bool {
    s.split('.').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_validate() {
        GeneratorConfig::default().validate().unwrap();
    }

    #[test]
    fn file_values_and_defaults_mix() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("trackgen.yml");
        std::fs::write(&file, "namespace: com.example.analytics\nplatform: js\nduplicate_parameters: reject\n").unwrap();
        let config = GeneratorConfig::from_file(&file).unwrap();
        assert_eq!(config.namespace, "com.example.analytics");
        assert_eq!(config.platform, TargetPlatform::Js);
        assert_eq!(config.duplicate_parameters, DuplicatePolicy::Reject);
        assert_eq!(config.api_class, DEFAULT_API_CLASS);
    }

    #[test]
    fn bad_field_type_names_the_key() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("trackgen.yml");
        std::fs::write(&file, "platform: [js]\n").unwrap();
        let err = GeneratorConfig::from_file(&file).unwrap_err();
        assert!(err.to_string().contains("platform"), "{err}");
    }

    #[test]
    fn rejects_bad_names() {
        let mut config = GeneratorConfig { namespace: "com.1bad".into(), ..GeneratorConfig::default() };
        assert!(config.validate().is_err());
        config.namespace = "com.good".into();
        config.impl_class = config.api_class.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn namespace_maps_to_directories() {
        let config = GeneratorConfig { namespace: "com.example.analytics".into(), ..GeneratorConfig::default() };
        assert_eq!(config.namespace_dir(), PathBuf::from("com/example/analytics"));
        assert_eq!(GeneratorConfig::default().namespace_dir(), PathBuf::new());
    }
}
