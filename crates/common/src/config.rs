//! Tooling configuration, loaded from an optional YAML file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Marker line after which towncrier inserts new release notes.
pub const DEFAULT_START_MARKER: &str = "<!-- towncrier release notes start -->";

/// Project name used in release headings.
pub const DEFAULT_PROJECT: &str = "Port_Ocean";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub changelog: ChangelogSettings,
    pub blueprints: BlueprintSettings,
}

/// Changelog conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogSettings {
    /// Project name written in new release headings
    #[serde(default = "default_project")]
    pub project: String,
    /// Insertion point for new entries
    #[serde(default = "default_start_marker")]
    pub start_marker: String,
    /// Known category labels, in rendering order
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

fn default_project() -> String {
    DEFAULT_PROJECT.to_string()
}

fn default_start_marker() -> String {
    DEFAULT_START_MARKER.to_string()
}

fn default_categories() -> Vec<String> {
    [
        "Breaking Changes",
        "Features",
        "Improvements",
        "Bug Fixes",
        "Deprecations",
        "Removals",
        "Improved Documentation",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

impl Default for ChangelogSettings {
    fn default() -> Self {
        Self {
            project: default_project(),
            start_marker: default_start_marker(),
            categories: default_categories(),
        }
    }
}

impl ChangelogSettings {
    /// Check whether a category label is one of the configured ones.
    pub fn is_known_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// Blueprint validation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueprintSettings {
    /// Enum colors accepted in addition to the catalog palette
    pub extra_enum_colors: Vec<String>,
}

impl CatalogConfig {
    /// Load configuration from a YAML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let content = crate::error::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: CatalogConfig = serde_yaml::from_str(content)?;
        if config.changelog.start_marker.trim().is_empty() {
            return Err(Error::Config(
                "changelog.start_marker must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::load(None).unwrap();
        assert_eq!(config.changelog.project, "Port_Ocean");
        assert_eq!(config.changelog.start_marker, DEFAULT_START_MARKER);
        assert!(config.changelog.is_known_category("Improvements"));
        assert!(config.blueprints.extra_enum_colors.is_empty());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = CatalogConfig::from_yaml("changelog:\n  project: ArgoCD\n").unwrap();
        assert_eq!(config.changelog.project, "ArgoCD");
        assert_eq!(config.changelog.start_marker, DEFAULT_START_MARKER);
        assert_eq!(config.changelog.categories.len(), 7);
    }

    #[test]
    fn test_empty_marker_rejected() {
        let err = CatalogConfig::from_yaml("changelog:\n  start_marker: \"\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "blueprints:\n  extra_enum_colors: [magenta]").unwrap();

        let config = CatalogConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.blueprints.extra_enum_colors, vec!["magenta"]);
    }
}
