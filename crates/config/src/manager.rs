//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::PathBuf;

const CONFIG_FILE: &str = "config.toml";

/// Main configuration manager
///
/// Owns the config directory and hands out validated, atomically persisted configs.
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the platform config directory
    ///
    /// - Linux: `~/.config/perpus/`
    /// - macOS: `~/Library/Application Support/perpus/`
    /// - Windows: `%APPDATA%\perpus\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let persistence = ConfigPersistence::new(config_dir.join(CONFIG_FILE));

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "perpus")
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the config directory path
    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    /// Returns the full config file path
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Loads the configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and atomically saves the configuration
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, applies `update_fn`, and saves the result
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if one doesn't exist
    ///
    /// Returns Ok(true) if a new file was created, Ok(false) if one already exists.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    /// Overwrites the config file with default values
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Returns all validation problems of the stored config as messages
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config and applies environment variable overrides
    ///
    /// Variables follow the pattern `PERPUS_SECTION_FIELD`, for example
    /// `PERPUS_LIBRARY_CATALOG_PATH=/srv/books.json`. Unparseable values are
    /// ignored with a warning.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value
    pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("PERPUS_LIBRARY_CATALOG_PATH") {
            config.library.catalog_path = PathBuf::from(path);
        }

        if let Some(dir) = lookup("PERPUS_LIBRARY_BOOKS_DIR") {
            config.library.books_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup("PERPUS_LIBRARY_COVERS_DIR") {
            config.library.covers_dir = PathBuf::from(dir);
        }

        if let Some(limit) = lookup("PERPUS_LIBRARY_POPULAR_LIMIT") {
            match limit.parse::<usize>() {
                Ok(n) => config.library.popular_limit = n,
                Err(_) => log::warn!("Ignoring PERPUS_LIBRARY_POPULAR_LIMIT={}", limit),
            }
        }

        if let Some(level) = lookup("PERPUS_APP_LOG_LEVEL") {
            match level.parse::<LogLevel>() {
                Ok(l) => config.app.log_level = l,
                Err(e) => log::warn!("Ignoring PERPUS_APP_LOG_LEVEL: {}", e),
            }
        }

        if let Some(password) = lookup("PERPUS_APP_ADMIN_PASSWORD") {
            config.app.admin_password = Some(password);
        }
    }
}
