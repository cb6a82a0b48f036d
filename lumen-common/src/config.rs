//! Configuration loading and root folder resolution
//!
//! Configuration is two-tier:
//! 1. **TOML bootstrap**: root folder, database path, catalog path, logging
//! 2. **Database runtime**: settings table (difficulty, debug override),
//!    seeded by [`crate::db::init_database`]

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Database file name inside the root folder
pub const DEFAULT_DATABASE_FILE: &str = "lumen.db";

/// Catalog file name inside the root folder
pub const DEFAULT_CATALOG_FILE: &str = "catalog.toml";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and catalog
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Path to SQLite database file (defaults to `<root>/lumen.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Path to the content catalog (defaults to `<root>/catalog.toml`)
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Logging configuration (optional)
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
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Database path, resolved against the root folder when not set
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| root_folder.join(DEFAULT_DATABASE_FILE))
    }

    /// Catalog path, resolved against the root folder when not set
    pub fn catalog_path(&self, root_folder: &Path) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| root_folder.join(DEFAULT_CATALOG_FILE))
    }
}

/// Root folder resolution, priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: Option<&TomlConfig>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root_folder) = config.and_then(|c| c.root_folder.clone()) {
        return root_folder;
    }

    // Priority 4: OS-dependent compiled default
    get_default_root_folder()
}

/// Locate the user's config file, if one exists
///
/// Checks `<config dir>/lumen/config.toml`, then `/etc/lumen/config.toml` on Linux.
pub fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("lumen").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/lumen/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/lumen
        dirs::data_local_dir()
            .map(|d| d.join("lumen"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/lumen"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/lumen
        dirs::data_dir()
            .map(|d| d.join("lumen"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/lumen"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\lumen
        dirs::data_local_dir()
            .map(|d| d.join("lumen"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\lumen"))
    } else {
        PathBuf::from("./lumen_data")
    }
}
