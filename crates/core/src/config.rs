use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pager::{DEFAULT_LIMIT, FIRST_PAGE};

pub const DEFAULT_DSN: &str = "sail:password@/agc";
pub const DSN_ENV_VAR: &str = "DBPEEK_DSN";
pub const CONFIG_DIR_ENV_VAR: &str = "DBPEEK_CONFIG_DIR";

/// Startup values for the input panels. Nothing is written back; every run
/// starts from these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BrowserConfig {
    pub dsn: String,
    pub limit: u64,
    pub page: u64,
    pub log_file: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            dsn: DEFAULT_DSN.to_string(),
            limit: DEFAULT_LIMIT,
            page: FIRST_PAGE,
            log_file: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config directory is unavailable for this platform")]
    ConfigDirUnavailable,
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config file at {path} sets page to 0; pages start at 1")]
    InvalidPage { path: PathBuf },
}

impl BrowserConfig {
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_dir()?.join("config.toml");
        Ok(Self::load_from_path(path)?.with_env_overrides(|key| env::var(key).ok()))
    }

    pub fn load_from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        if config.page < FIRST_PAGE {
            return Err(ConfigError::InvalidPage { path });
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dsn) = lookup(DSN_ENV_VAR).filter(|dsn| !dsn.trim().is_empty()) {
            self.dsn = dsn;
        }
        self
    }

    pub fn log_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(default_config_dir()?.join("dbpeek.log")),
        }
    }
}

pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    if let Some(custom) = env::var_os(CONFIG_DIR_ENV_VAR) {
        return Ok(PathBuf::from(custom));
    }

    let base_dir = if cfg!(target_os = "windows") {
        env::var_os("APPDATA")
            .map(PathBuf::from)
            .ok_or(ConfigError::ConfigDirUnavailable)?
    } else if let Some(xdg_config_home) = env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config_home)
    } else {
        let home = env::var_os("HOME").ok_or(ConfigError::ConfigDirUnavailable)?;
        PathBuf::from(home).join(".config")
    };

    Ok(base_dir.join("dbpeek"))
}
