//! Configuration management for proto-compat
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (proto-compat.toml)
//! - Environment variables (PROTO_COMPAT__*)
//!
//! Command line flags override whatever is loaded here.
//!
//! ## Example config file (proto-compat.toml):
//! ```toml
//! [compare]
//! mode = "by-number"
//!
//! [report]
//! format = "text"
//! show_notes = true
//! indent = 2
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::matcher::MatchMode;
use crate::render::TextOptions;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatConfig {
    /// Comparison settings
    #[serde(default)]
    pub compare: CompareConfig,

    /// Report settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Comparison configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareConfig {
    /// How fields and enum values are paired
    #[serde(default)]
    pub mode: MatchMode,
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Print "required by" notes in text output
    #[serde(default)]
    pub show_notes: bool,

    /// Spaces per nesting level in text output
    #[serde(default = "default_indent")]
    pub indent: usize,
}

/// Output format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

fn default_indent() -> usize {
    2
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            show_notes: false,
            indent: default_indent(),
        }
    }
}

impl ReportConfig {
    pub fn text_options(&self) -> TextOptions {
        TextOptions {
            indent: self.indent,
            show_notes: self.show_notes,
        }
    }
}

impl CompatConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "proto-compat.toml",
            ".proto-compat.toml",
            "config/proto-compat.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(xdg_config) = Self::user_config_path() {
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("PROTO_COMPAT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Per-user config file under the XDG config directory
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "familiar", "proto-compat")
            .map(|dirs| dirs.config_dir().join("proto-compat.toml"))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompatConfig::default();
        assert_eq!(config.compare.mode, MatchMode::ByName);
        assert_eq!(config.report.format, OutputFormat::Text);
        assert_eq!(config.report.indent, 2);
        assert!(!config.report.show_notes);
    }

    #[test]
    fn test_serialize_config() {
        let config = CompatConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[compare]"));
        assert!(toml_str.contains("mode = \"by-name\""));
        assert!(toml_str.contains("[report]"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: CompatConfig = toml::from_str("[report]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.indent, 2);
        assert_eq!(config.compare.mode, MatchMode::ByName);
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let path = path.to_str().unwrap();

        let mut config = CompatConfig::default();
        config.compare.mode = MatchMode::ByNumber;
        config.report.show_notes = true;
        config.save(path).unwrap();

        let loaded = CompatConfig::load_from(Some(path)).unwrap();
        assert_eq!(loaded.compare.mode, MatchMode::ByNumber);
        assert!(loaded.report.show_notes);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(CompatConfig::load_from(path.to_str()).is_err());
    }
}
