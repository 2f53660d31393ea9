//! Perpus Configuration System
//!
//! Loads and saves the TOML settings that tell the catalog where its JSON file
//! and media directories live, and how the command-line front-end behaves.
//!
//! # Architecture
//!
//! - **Trait-based**: Each section implements `ConfigSection` (validate / merge)
//! - **Graceful degradation**: `load_or_default` falls back to defaults with a warning
//! - **Atomic writes**: Config files are never left half-written
//!
//! # Example
//!
//! ```rust,no_run
//! use perpus_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load().unwrap_or_else(|e| {
//!     eprintln!("Config error: {}, using defaults", e);
//!     Config::default()
//! });
//!
//! println!("Catalog: {}", config.library.catalog_path.display());
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
pub mod app_config;
mod library_config;

pub use error::{ConfigError, ConfigResult};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, ValidationError, Validator};

// Re-export config sections
pub use app_config::{AppConfig, LogLevel};
pub use library_config::{CorruptCatalogPolicy, LibraryConfig};

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Catalog location and listing settings
    pub library: LibraryConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.library.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    ///
    /// This is used for override chains: defaults < file < env vars < CLI args
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.library.merge(other.library);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            library: LibraryConfig::default(),
        }
    }
}
