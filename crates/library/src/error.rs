// FILE: crates/library/src/error.rs

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Book not found: {0}")]
    NotFound(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog at {} is not valid JSON: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Resource already exists: {}", .0.display())]
    DuplicateResource(PathBuf),

    #[error("Deleting {0} requires explicit confirmation")]
    ConfirmationRequired(String),

    #[error("Failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// A media cleanup step that failed without undoing the catalog change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl CleanupWarning {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = CatalogError::validation("title", "must not be empty");
        assert_eq!(err.to_string(), "Invalid title: must not be empty");
    }

    #[test]
    fn test_io_message_includes_path() {
        let err = CatalogError::io(
            "/srv/books.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/srv/books.json"));
    }

    #[test]
    fn test_cleanup_warning_display() {
        let warning = CleanupWarning::new("books/dune.pdf", "already absent");
        assert_eq!(warning.to_string(), "books/dune.pdf: already absent");
    }
}
