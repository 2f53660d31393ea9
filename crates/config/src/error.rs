//! Failures reported while locating, reading or saving the config file

use crate::validation::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Present but blank, which is what a torn write leaves behind
    #[error("{} is empty", path.display())]
    Empty { path: PathBuf },

    #[error("{} is not valid TOML: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Save refused; nothing was written
    #[error("refusing to save invalid config: {}", describe(.0))]
    Invalid(Vec<ValidationError>),

    #[error("cannot encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    /// Directory creation, backup copy or the atomic replace failed
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no user config directory on this system; pass an explicit path")]
    NoConfigDir,
}

fn describe(problems: &[ValidationError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_lists_every_problem() {
        let err = ConfigError::Invalid(vec![
            ValidationError::new("library.catalog_path", "must not be empty"),
            ValidationError::with_value("library.popular_limit", "must be between 1 and 100", 0),
        ]);
        assert_eq!(
            err.to_string(),
            "refusing to save invalid config: library.catalog_path must not be empty; \
             library.popular_limit must be between 1 and 100 (got 0)"
        );
    }

    #[test]
    fn test_empty_names_the_file() {
        let err = ConfigError::Empty {
            path: PathBuf::from("/etc/perpus/config.toml"),
        };
        assert_eq!(err.to_string(), "/etc/perpus/config.toml is empty");
    }
}
