//! Load the app settings file and layer it under the process environment
//!
//! The settings file is optional. It can change the override prefix and hold
//! override patterns, keyed exactly like the environment variables they
//! stand in for:
//!
//! ```yaml
//! prefix: CGO
//! overrides:
//!   CGO_CFLAGS_ALLOW: "-fplugin=.*"
//!   CGO_LDFLAGS_DISALLOW: "-Wl,--wrap=.*"
//! ```

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use flagfirm_core::{override_key, Check, Environment, OverrideKind, DEFAULT_PREFIX};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const DEFAULT_SETTING_FILE_NAME: &str = "settings.yaml";

/// Environment variable that points at a settings file.
pub const CONFIG_PATH_ENV: &str = "FLAGFIRM_CONFIG";

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

/// Describe the configuration yaml
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prefix of the override keys, `<prefix>_<CHECK>_ALLOW`.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Override patterns by key name.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            overrides: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Convert a settings yaml file to struct.
    ///
    /// # Errors
    ///
    /// Will return `Err` when the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content)?;
        if settings.prefix.is_empty() {
            return Err(Error::Config(format!(
                "{}: prefix must not be empty",
                path.display()
            )));
        }
        debug!(path = %path.display(), settings = ?settings, "settings file loaded");
        for key in settings.unknown_keys() {
            warn!(path = %path.display(), key, "override key does not belong to any check");
        }
        Ok(settings)
    }

    /// Find and load the settings for this run.
    ///
    /// An explicit path (flag or [`CONFIG_PATH_ENV`]) must exist. Without
    /// one, `<config dir>/flagfirm/settings.yaml` is used when present and
    /// defaults otherwise.
    ///
    /// # Errors
    ///
    /// Will return `Err` when the chosen file cannot be loaded
    pub fn discover(explicit: Option<&Path>, env: &dyn Environment) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = env.var(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Self::load(Path::new(&path));
        }
        match default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                debug!("settings file not found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Override keys that no check reads with the configured prefix.
    #[must_use]
    pub fn unknown_keys(&self) -> Vec<&str> {
        let known: Vec<String> = Check::iter()
            .flat_map(|check| {
                [OverrideKind::Allow, OverrideKind::Disallow]
                    .into_iter()
                    .map(move |kind| override_key(&self.prefix, check, kind))
            })
            .collect();
        self.overrides
            .keys()
            .filter(|key| !known.contains(key))
            .map(String::as_str)
            .collect()
    }
}

/// Default settings file location.
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join(env!("CARGO_PKG_NAME"))
            .join(DEFAULT_SETTING_FILE_NAME)
    })
}

/// Reads the process environment first and falls back to the settings file.
///
/// An empty process value counts as unset, so the file value still applies.
pub struct LayeredEnvironment<'a> {
    settings: &'a Settings,
    base: &'a dyn Environment,
}

impl<'a> LayeredEnvironment<'a> {
    #[must_use]
    pub fn new(settings: &'a Settings, base: &'a dyn Environment) -> Self {
        Self { settings, base }
    }
}

impl Environment for LayeredEnvironment<'_> {
    fn var(&self, key: &str) -> Option<String> {
        self.base
            .var(key)
            .filter(|value| !value.is_empty())
            .or_else(|| self.settings.overrides.get(key).cloned())
    }
}
