//! # Profile Store
//!
//! Named endpoint profiles persisted as JSON at `~/.shunt/config.json`.
//!
//! All writes are atomic (write `config.json.tmp`, then `rename()`), and the
//! previous config is copied into `~/.shunt/backups/` with a UTC timestamp
//! before each overwrite. Backups are pruned to the newest [`MAX_BACKUPS`].
//! A missing config file is not an error; it reads as an empty store.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Timestamped config backups kept in `~/.shunt/backups/`.
pub const MAX_BACKUPS: usize = 10;

/// One named endpoint environment: the variables injected into the child.
///
/// `env` is a `BTreeMap` so serialized output and launch-time injection
/// order are stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuntConfig {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    /// Launched without asking when set. Cleared if its profile is removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Argv launched when the user passes no command of their own.
    #[serde(default)]
    pub default_command: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
    UnknownProfile(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::UnknownProfile(name) => write!(f, "unknown profile '{name}'"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::UnknownProfile(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl ShuntConfig {
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Add a profile, replacing any existing one with the same name.
    pub fn upsert_profile(&mut self, profile: Profile) {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(slot) => *slot = profile,
            None => self.profiles.push(profile),
        }
    }

    pub fn remove_profile(&mut self, name: &str) -> Result<(), ConfigError> {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.name != name);
        if self.profiles.len() == before {
            return Err(ConfigError::UnknownProfile(name.to_string()));
        }
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        Ok(())
    }

    pub fn set_default(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.profile(name).is_none() {
            return Err(ConfigError::UnknownProfile(name.to_string()));
        }
        self.default_profile = Some(name.to_string());
        Ok(())
    }

    /// The default profile, if set and still present. A dangling default is
    /// ignored with a warning, never an error.
    pub fn resolved_default(&self) -> Option<&Profile> {
        let name = self.default_profile.as_deref()?;
        let found = self.profile(name);
        if found.is_none() {
            warn!("default profile '{name}' does not exist, ignoring");
        }
        found
    }
}

/// Returns `~/.shunt`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".shunt"))
}

/// Returns the path to `~/.shunt/config.json`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.json"))
}

/// Load the config from `~/.shunt/config.json`.
pub fn load() -> Result<ShuntConfig, ConfigError> {
    match config_path() {
        Some(path) => load_from(&path),
        None => {
            warn!("could not determine home directory, using empty config");
            Ok(ShuntConfig::default())
        }
    }
}

pub fn load_from(path: &Path) -> Result<ShuntConfig, ConfigError> {
    if !path.exists() {
        info!("no config at {}, starting empty", path.display());
        return Ok(ShuntConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let config: ShuntConfig = serde_json::from_str(&contents).map_err(ConfigError::Parse)?;
    debug!(
        "loaded {} profile(s) from {}",
        config.profiles.len(),
        path.display()
    );
    Ok(config)
}

/// Save the config to `~/.shunt/config.json`.
pub fn save(config: &ShuntConfig) -> Result<(), ConfigError> {
    let path = config_path().ok_or_else(|| {
        ConfigError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "no home directory",
        ))
    })?;
    save_to(config, &path)
}

/// Atomic save: back up the existing file, write `.tmp`, rename over.
/// A failed backup is a warning; it never blocks the save itself.
pub fn save_to(config: &ShuntConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if path.exists() {
        if let Err(e) = back_up(path) {
            warn!("failed to back up existing config: {e}");
        }
    }

    let json = serde_json::to_string_pretty(config).map_err(ConfigError::Parse)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, format!("{json}\n"))?;
    fs::rename(&tmp, path)?;
    debug!("saved config to {}", path.display());
    Ok(())
}

fn back_up(path: &Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    let dir = parent.join("backups");
    fs::create_dir_all(&dir)?;
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let backup = dir.join(format!("config-{stamp}.json"));
    fs::copy(path, &backup)?;
    debug!("backed up previous config to {}", backup.display());
    prune_backups(&dir)
}

/// Backup names embed the timestamp, so lexicographic order is
/// chronological order.
fn prune_backups(dir: &Path) -> io::Result<()> {
    let mut backups: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("config-") && name.ends_with(".json"))
        })
        .collect();
    backups.sort();
    while backups.len() > MAX_BACKUPS {
        let oldest = backups.remove(0);
        if let Err(e) = fs::remove_file(&oldest) {
            warn!("failed to prune backup {}: {e}", oldest.display());
        }
    }
    Ok(())
}
