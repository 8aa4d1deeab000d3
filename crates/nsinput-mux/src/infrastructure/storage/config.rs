//! TOML configuration for the multiplexer daemon.
//!
//! Read from `$XDG_CONFIG_HOME/nsinput/config.toml`, falling back to
//! `~/.config/nsinput/config.toml`, unless a path is given on the command
//! line:
//!
//! ```toml
//! [mux]
//! queue_capacity = 64
//! log_level = "info"
//!
//! [[namespaces]]
//! id = 1
//! name = "host"
//!
//! [[namespaces]]
//! id = 2
//! name = "guest"
//!
//! [[devices]]
//! name = "keyboard"
//! ```
//!
//! Every field has a serde default, so a missing file or a partial file both
//! load.  The first listed namespace starts in the foreground.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use nsinput_core::NamespaceId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file parsed but describes an unusable setup.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub mux: MuxConfig,
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<NamespaceEntry>,
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MuxConfig {
    /// Events buffered per client before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamespaceEntry {
    pub id: NamespaceId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceEntry {
    pub name: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_queue_capacity() -> usize {
    crate::application::multiplexer::DEFAULT_QUEUE_CAPACITY
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_namespaces() -> Vec<NamespaceEntry> {
    vec![NamespaceEntry {
        id: NamespaceId(1),
        name: "host".to_string(),
    }]
}
fn default_devices() -> Vec<DeviceEntry> {
    vec![DeviceEntry {
        name: "keyboard".to_string(),
    }]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mux: MuxConfig::default(),
            namespaces: default_namespaces(),
            devices: default_devices(),
        }
    }
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Checks what serde cannot: at least one namespace, unique namespace
    /// ids, and a non-zero queue.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespaces.is_empty() {
            return Err(ConfigError::Invalid("at least one namespace is required".into()));
        }
        if self.mux.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be at least 1".into()));
        }
        let mut seen = HashSet::new();
        for entry in &self.namespaces {
            if !seen.insert(entry.id) {
                return Err(ConfigError::Invalid(format!(
                    "namespace {} is listed more than once",
                    entry.id
                )));
            }
        }
        Ok(())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// The default config file location.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither
/// `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .ok_or(ConfigError::NoPlatformConfigDir)?;
    Ok(base.join("nsinput").join("config.toml"))
}

/// Loads and validates the config at `path`, returning the defaults when the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] for malformed TOML, and [`ConfigError::Invalid`]
/// when validation fails.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    config.validate()?;
    Ok(config)
}

/// Loads the config from the default location.
///
/// # Errors
///
/// See [`config_file_path`] and [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nsinput_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config_has_one_active_namespace_and_a_device() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.namespaces.len(), 1);
        assert_eq!(cfg.namespaces[0].id, NamespaceId(1));
        assert_eq!(cfg.devices[0].name, "keyboard");
        assert_eq!(cfg.mux.queue_capacity, 64);
        assert_eq!(cfg.mux.log_level, "info");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_mux_section_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[mux]
queue_capacity = 8

[[namespaces]]
id = 10
name = "a"

[[namespaces]]
id = 20
name = "b"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.mux.queue_capacity, 8);
        assert_eq!(cfg.mux.log_level, "info");
        assert_eq!(cfg.namespaces[1].id, NamespaceId(20));
        assert_eq!(cfg.devices, default_devices());
    }

    #[test]
    fn test_validate_rejects_duplicate_namespace_ids() {
        let mut cfg = AppConfig::default();
        cfg.namespaces.push(NamespaceEntry {
            id: NamespaceId(1),
            name: "copy".to_string(),
        });
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_queue_and_no_namespaces() {
        let mut cfg = AppConfig::default();
        cfg.mux.queue_capacity = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = AppConfig::default();
        cfg.namespaces.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");
        let cfg = load_config_from(&path).expect("missing file is not an error");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_invalid_toml_returns_parse_error() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        // Act
        let result = load_config_from(&path);

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_then_load_round_trip() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.mux.log_level = "debug".to_string();
        cfg.namespaces.push(NamespaceEntry {
            id: NamespaceId(2),
            name: "guest".to_string(),
        });

        // Act
        save_config_to(&cfg, &path).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_nsinput_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("nsinput/config.toml"), "got {path:?}");
        }
    }
}
