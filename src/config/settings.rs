//! Tool settings and environment templates.
//!
//! Configuration values may reference site directories through template
//! variables, for example `findings_file = "$MOSAIC_DATA_DIR/findings.json"`.
//! The directories come from a settings file and the environment:
//!
//! 1. `MOSAIC_DATA_DIR`, `MOSAIC_PRIVATE_DIR`, `MOSAIC_TEST_DIR` if set
//! 2. the settings file at `$MOSAIC_CONFIG`, or `~/.mosaic/config.toml`
//!
//! Only those three variables are substituted. Any other `$NAME` in a value
//! is left untouched.

use crate::config::parse_config;
use crate::constants::{ENV_CONFIG, ENV_DATA_DIR, ENV_PRIVATE_DIR, ENV_TEST_DIR};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_dir: Option<PathBuf>,
}

impl Settings {
    /// Load the settings file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let settings = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        Ok(settings.with_env_overrides())
    }

    /// Parse a settings file without consulting the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading settings from {}", path.display());
        parse_config(path)
    }

    fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|home| home.join(".mosaic").join("config.toml"))
    }

    /// Environment variables take precedence over file values.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        let from_env = |name: &str| std::env::var_os(name).map(PathBuf::from);
        if let Some(dir) = from_env(ENV_DATA_DIR) {
            self.data_dir = Some(dir);
        }
        if let Some(dir) = from_env(ENV_PRIVATE_DIR) {
            self.private_dir = Some(dir);
        }
        if let Some(dir) = from_env(ENV_TEST_DIR) {
            self.test_dir = Some(dir);
        }
        self
    }

    /// The value of a template variable, if it is one of ours and is set.
    pub fn template_value(&self, name: &str) -> Option<String> {
        let dir = match name {
            ENV_DATA_DIR => self.data_dir.as_ref(),
            ENV_PRIVATE_DIR => self.private_dir.as_ref(),
            ENV_TEST_DIR => self.test_dir.as_ref(),
            _ => None,
        };
        dir.map(|d| d.display().to_string())
    }

    /// Substitute `$VAR` / `${VAR}` template variables in `value`.
    pub fn expand<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if !value.contains('$') {
            return Cow::Borrowed(value);
        }
        shellexpand::env_with_context_no_errors(value, |name| self.template_value(name))
    }
}
