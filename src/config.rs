//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treestate/treestate.toml`
//! 3. Explicit config file passed by the caller (`--config`)
//! 4. Environment variables: `TREESTATE_*` prefix, `__` between sections

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::SelectionMode;

/// Fallback glyphs reported in visible rows for nodes without an icon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IconSettings {
    pub collapsed: String,
    pub expanded: String,
    pub leaf: String,
    /// Shown while lazy children are being fetched
    pub loading: String,
}

impl Default for IconSettings {
    fn default() -> Self {
        Self {
            collapsed: "▸".into(),
            expanded: "▾".into(),
            leaf: "•".into(),
            loading: "…".into(),
        }
    }
}

/// Raw icon config for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawIconSettings {
    pub collapsed: Option<String>,
    pub expanded: Option<String>,
    pub leaf: Option<String>,
    pub loading: Option<String>,
}

impl IconSettings {
    /// Overlay wins where it specifies a value.
    pub fn merge(&self, overlay: &RawIconSettings) -> Self {
        Self {
            collapsed: overlay.collapsed.clone().unwrap_or_else(|| self.collapsed.clone()),
            expanded: overlay.expanded.clone().unwrap_or_else(|| self.expanded.clone()),
            leaf: overlay.leaf.clone().unwrap_or_else(|| self.leaf.clone()),
            loading: overlay.loading.clone().unwrap_or_else(|| self.loading.clone()),
        }
    }
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub selection_mode: Option<SelectionMode>,
    pub icons: RawIconSettings,
}

/// Unified configuration for treestate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// `single` (default) or `multiple`
    pub selection_mode: SelectionMode,
    pub icons: IconSettings,
}

/// Get the XDG config directory for treestate.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treestate").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treestate.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    parse_raw_settings(&content, &path.display().to_string())
}

fn parse_raw_settings(content: &str, origin: &str) -> Result<RawSettings, ApplicationError> {
    toml::from_str(content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", origin, e),
    })
}

impl Settings {
    /// Overlay wins for every value it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            selection_mode: overlay.selection_mode.unwrap_or(self.selection_mode),
            icons: self.icons.merge(&overlay.icons),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Optional config file; unlike the global file it must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(path) = explicit {
            debug!("loading config {}", path.display());
            current = current.merge_with(&load_raw_settings(path)?);
        }

        Self::apply_env_overrides(current)
    }

    /// Defaults overlaid with a TOML document, no files or environment involved.
    pub fn from_toml_str(content: &str) -> Result<Self, ApplicationError> {
        Ok(Self::default().merge_with(&parse_raw_settings(content, "<string>")?))
    }

    /// Apply TREESTATE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("TREESTATE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("selection_mode") {
            settings.selection_mode = parse_selection_mode(&val)?;
        }
        if let Ok(val) = config.get_string("icons.collapsed") {
            settings.icons.collapsed = val;
        }
        if let Ok(val) = config.get_string("icons.expanded") {
            settings.icons.expanded = val;
        }
        if let Ok(val) = config.get_string("icons.leaf") {
            settings.icons.leaf = val;
        }
        if let Ok(val) = config.get_string("icons.loading") {
            settings.icons.loading = val;
        }

        Ok(settings)
    }

    /// Serialize settings to TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize: {}", e),
        })
    }

    /// Commented template for a new config file.
    pub fn template() -> String {
        r#"# treestate configuration
# Global: $XDG_CONFIG_HOME/treestate/treestate.toml
# Env overrides: TREESTATE_SELECTION_MODE, TREESTATE_ICONS__LEAF, ...

# "single" replaces the selection, "multiple" toggles membership
selection_mode = "single"

[icons]
collapsed = "▸"
expanded = "▾"
leaf = "•"
loading = "…"
"#
        .to_string()
    }
}

fn parse_selection_mode(value: &str) -> Result<SelectionMode, ApplicationError> {
    match value.to_ascii_lowercase().as_str() {
        "single" => Ok(SelectionMode::Single),
        "multiple" => Ok(SelectionMode::Multiple),
        other => Err(ApplicationError::Config {
            message: format!("invalid selection_mode: {}", other),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
