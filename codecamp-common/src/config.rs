//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from three places, highest priority first:
//! 1. Command-line arguments / environment variables
//! 2. TOML config file
//! 3. Compiled defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "CODECAMP_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DEFAULT_DATABASE_FILE: &str = "codecamp.db";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; anything missing falls back to the compiled
/// default. Changes take effect on restart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the database (and anything else the service writes)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database file; overrides `<root_folder>/codecamp.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Insert the sample camp, speakers and talks into an empty database
    #[serde(default)]
    pub seed_sample_data: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
        })?;
        Self::parse(&content)
    }
}

/// Load the TOML configuration
///
/// An explicitly named file must exist and parse. Without one, the per-user
/// config file is used when present; otherwise defaults apply.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return TomlConfig::from_file(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => TomlConfig::from_file(&path),
        _ => Ok(TomlConfig::default()),
    }
}

/// Per-user config file location (`<config_dir>/codecamp/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("codecamp").join("config.toml"))
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `CODECAMP_ROOT_FOLDER` environment variable
/// 3. TOML `root_folder`
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("codecamp"))
        .unwrap_or_else(|| PathBuf::from("./codecamp_data"))
}

/// Values supplied on the command line (or their environment fallbacks)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root_folder: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub seed_sample_data: bool,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub seed_sample_data: bool,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge command-line overrides over the TOML file over defaults
    pub fn resolve(overrides: Overrides, toml_config: TomlConfig) -> Self {
        let root_folder = resolve_root_folder(overrides.root_folder.as_deref(), &toml_config);

        let database_path = toml_config
            .database_path
            .clone()
            .unwrap_or_else(|| root_folder.join(DEFAULT_DATABASE_FILE));

        Self {
            database_path,
            host: overrides
                .host
                .or(toml_config.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            seed_sample_data: overrides.seed_sample_data || toml_config.seed_sample_data,
            log_level: toml_config.logging.level,
            root_folder,
        }
    }

    /// `host:port` string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
