//! Configuration loading, validation, and management for stanblocks.
//!
//! Loads configuration from `./stanblocks.toml` (or an explicit path) with
//! environment variable overrides. Every setting has a default, so a missing
//! file is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use stanblocks_core::AssemblerOptions;
use stanblocks_core::assembler::{
    DEFAULT_FRAGMENT_EXTENSION, DEFAULT_OUTPUT_EXTENSION, DEFAULT_SENSITIVITY_SUFFIX,
};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE: &str = "stanblocks.toml";

pub const ENV_FRAGMENT_EXTENSION: &str = "STANBLOCKS_FRAGMENT_EXTENSION";
pub const ENV_OUTPUT_EXTENSION: &str = "STANBLOCKS_OUTPUT_EXTENSION";
pub const ENV_SENSITIVITY_SUFFIX: &str = "STANBLOCKS_SENSITIVITY_SUFFIX";

/// The root configuration structure.
///
/// Maps directly to `stanblocks.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Extension of fragment files (`{model}_data_block.<ext>`)
    #[serde(default = "default_fragment_extension")]
    pub fragment_extension: String,

    /// Extension of the generated programs
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Suffix that distinguishes the sensitivity program from the baseline
    #[serde(default = "default_sensitivity_suffix")]
    pub sensitivity_suffix: String,
}

fn default_fragment_extension() -> String {
    DEFAULT_FRAGMENT_EXTENSION.into()
}
fn default_output_extension() -> String {
    DEFAULT_OUTPUT_EXTENSION.into()
}
fn default_sensitivity_suffix() -> String {
    DEFAULT_SENSITIVITY_SUFFIX.into()
}

impl GeneratorConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `./stanblocks.toml` is used
    /// when present and defaults otherwise. Environment variables override
    /// file values:
    /// - `STANBLOCKS_FRAGMENT_EXTENSION`
    /// - `STANBLOCKS_OUTPUT_EXTENSION`
    /// - `STANBLOCKS_SENSITIVITY_SUFFIX`
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::load_from(path)?
            }
            None => Self::load_from(&Self::default_path())?,
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.normalize();
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// `./stanblocks.toml`
    pub fn default_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ext) = lookup(ENV_FRAGMENT_EXTENSION) {
            self.fragment_extension = ext;
        }
        if let Some(ext) = lookup(ENV_OUTPUT_EXTENSION) {
            self.output_extension = ext;
        }
        if let Some(suffix) = lookup(ENV_SENSITIVITY_SUFFIX) {
            self.sensitivity_suffix = suffix;
        }
    }

    /// Accept `.stan` as well as `stan`.
    fn normalize(&mut self) {
        for ext in [&mut self.fragment_extension, &mut self.output_extension] {
            let trimmed = ext.trim().trim_start_matches('.').to_string();
            if trimmed != *ext {
                *ext = trimmed;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, ext) in [
            ("fragment_extension", &self.fragment_extension),
            ("output_extension", &self.output_extension),
        ] {
            if ext.is_empty() {
                return Err(ConfigError::ValidationError(format!("{field} must not be empty")));
            }
            if ext.contains(['/', '\\']) {
                return Err(ConfigError::ValidationError(format!(
                    "{field} must not contain path separators: {ext:?}"
                )));
            }
        }

        // An empty suffix would make both programs the same file.
        if self.sensitivity_suffix.is_empty() {
            return Err(ConfigError::ValidationError(
                "sensitivity_suffix must not be empty".into(),
            ));
        }
        if self.sensitivity_suffix.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(format!(
                "sensitivity_suffix must not contain path separators: {:?}",
                self.sensitivity_suffix
            )));
        }

        for warning in self.warnings() {
            tracing::warn!(extension = %self.output_extension, "{warning}");
        }

        Ok(())
    }

    /// Settings that are accepted but probably not intended.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.fragment_extension == self.output_extension {
            warnings.push("Fragment and output files share an extension");
        }
        warnings
    }

    /// Options for the core assembler.
    pub fn assembler_options(&self) -> AssemblerOptions {
        AssemblerOptions {
            fragment_extension: self.fragment_extension.clone(),
            output_extension: self.output_extension.clone(),
            sensitivity_suffix: self.sensitivity_suffix.clone(),
        }
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            fragment_extension: default_fragment_extension(),
            output_extension: default_output_extension(),
            sensitivity_suffix: default_sensitivity_suffix(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file at {}: {reason}", .path.display())]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {}: {reason}", .path.display())]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = GeneratorConfig::default();
        assert_eq!(config.fragment_extension, "stanblock");
        assert_eq!(config.output_extension, "stan");
        assert_eq!(config.sensitivity_suffix, "_sensitivity");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = GeneratorConfig {
            fragment_extension: "txt".into(),
            ..GeneratorConfig::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: GeneratorConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = GeneratorConfig::load_from(Path::new("/nonexistent/stanblocks.toml"));
        assert_eq!(result.unwrap(), GeneratorConfig::default());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = GeneratorConfig::load(Some(Path::new("/nonexistent/stanblocks.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stanblocks.toml");
        std::fs::write(&path, "fragment_extension = \".block\"\n").unwrap();

        let config = GeneratorConfig::load_from(&path).unwrap();
        assert_eq!(config.fragment_extension, "block");
        assert_eq!(config.output_extension, "stan");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stanblocks.toml");
        std::fs::write(&path, "fragment_extension = [").unwrap();

        let err = GeneratorConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("stanblocks.toml"));
    }

    #[test]
    fn empty_suffix_rejected() {
        let config = GeneratorConfig {
            sensitivity_suffix: String::new(),
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn separator_in_extension_rejected() {
        let config = GeneratorConfig {
            output_extension: "stan/x".into(),
            ..GeneratorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output_extension"));
    }

    #[test]
    fn shared_extension_is_a_warning_not_an_error() {
        let config = GeneratorConfig {
            output_extension: "stanblock".into(),
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.warnings(), vec!["Fragment and output files share an extension"]);
        assert!(GeneratorConfig::default().warnings().is_empty());
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_FRAGMENT_EXTENSION, "frag"),
            (ENV_SENSITIVITY_SUFFIX, "_sens"),
        ]);
        let mut config = GeneratorConfig {
            fragment_extension: "txt".into(),
            ..GeneratorConfig::default()
        };
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.fragment_extension, "frag");
        assert_eq!(config.output_extension, "stan");
        assert_eq!(config.sensitivity_suffix, "_sens");
    }

    #[test]
    fn assembler_options_mirror_config() {
        let options = GeneratorConfig::default().assembler_options();
        assert_eq!(options, AssemblerOptions::default());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = GeneratorConfig::default_toml();
        assert!(toml_str.contains("fragment_extension = \"stanblock\""));
        assert!(toml_str.contains("_sensitivity"));
    }
}
