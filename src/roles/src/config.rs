//! Role manager configuration loading and validation

use crate::manager::STANDARD_ROLE_MANAGER_NAME;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RolesConfig {
    #[serde(default)]
    pub manager: ManagerSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManagerSection {
    /// Implementation name, short or qualified
    #[serde(default = "default_manager_name")]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sled,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSection {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Data directory, required by the sled backend
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub with_target: bool,
}

fn default_manager_name() -> String {
    STANDARD_ROLE_MANAGER_NAME.to_string()
}

fn default_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ManagerSection {
    fn default() -> Self {
        Self {
            name: default_manager_name(),
        }
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: false,
        }
    }
}

impl RolesConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: RolesConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.manager.name.trim().is_empty() {
            bail!("manager.name must not be empty");
        }

        if self.store.backend == StoreBackend::Sled && self.store.path.is_none() {
            bail!("store.path is required for the sled backend");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = RolesConfig::from_toml_str("").unwrap();

        assert_eq!(config.manager.name, STANDARD_ROLE_MANAGER_NAME);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_config() {
        let config = RolesConfig::from_toml_str(
            r#"
            [manager]
            name = "CassandraRoleManager"

            [store]
            backend = "sled"
            path = "/var/lib/roles"

            [logging]
            level = "debug"
            with_target = true
            "#,
        )
        .unwrap();

        assert_eq!(config.manager.name, "CassandraRoleManager");
        assert_eq!(config.store.backend, StoreBackend::Sled);
        assert_eq!(config.store.path, Some(PathBuf::from("/var/lib/roles")));
        assert!(config.logging.with_target);
    }

    #[test]
    fn test_sled_requires_path() {
        let err = RolesConfig::from_toml_str("[store]\nbackend = \"sled\"\n").unwrap_err();
        assert!(err.to_string().contains("store.path"));
    }

    #[test]
    fn test_empty_manager_name_rejected() {
        assert!(RolesConfig::from_toml_str("[manager]\nname = \"\"\n").is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(RolesConfig::from_toml_str("[store]\nbackend = \"postgres\"\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.toml");
        std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();

        let config = RolesConfig::from_file(&path).unwrap();
        assert_eq!(config.logging.level, "warn");

        assert!(RolesConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
