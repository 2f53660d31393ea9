//! Catalog location and listing configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use perpus_core::{CATEGORIES, DEFAULT_CATEGORY, DEFAULT_POPULAR_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What loading does when the catalog file exists but is not valid JSON
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CorruptCatalogPolicy {
    /// Keep a uniquely named `.corrupt-*` copy of the bytes and continue with an empty catalog
    TreatAsEmpty,
    /// Refuse to load
    Reject,
}

impl std::fmt::Display for CorruptCatalogPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorruptCatalogPolicy::TreatAsEmpty => write!(f, "treat-as-empty"),
            CorruptCatalogPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Catalog storage and listing settings
///
/// Relative paths are resolved against the library root chosen by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    /// JSON catalog file
    pub catalog_path: PathBuf,

    /// Directory holding book PDFs
    pub books_dir: PathBuf,

    /// Directory holding cover images
    pub covers_dir: PathBuf,

    /// Entries in the most-popular listing
    pub popular_limit: usize,

    /// Categories offered when adding or editing books
    pub categories: Vec<String>,

    /// Handling of an unparseable catalog file
    pub on_corrupt: CorruptCatalogPolicy,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("books.json"),
            books_dir: PathBuf::from("books"),
            covers_dir: PathBuf::from("covers"),
            popular_limit: DEFAULT_POPULAR_LIMIT,
            categories: CATEGORIES.iter().map(|c| c.to_string()).collect(),
            on_corrupt: CorruptCatalogPolicy::TreatAsEmpty,
        }
    }
}

impl LibraryConfig {
    /// Catalog file location under `root`
    pub fn catalog_path_in(&self, root: &Path) -> PathBuf {
        root.join(&self.catalog_path)
    }

    /// PDF directory under `root`
    pub fn books_dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.books_dir)
    }

    /// Cover directory under `root`
    pub fn covers_dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.covers_dir)
    }

    /// Returns true if `category` is part of the configured vocabulary
    pub fn is_known_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

impl ConfigSection for LibraryConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![Validator::in_range(
            self.popular_limit,
            1,
            100,
            "library.popular_limit",
        )];

        for (field, path) in [
            ("library.catalog_path", &self.catalog_path),
            ("library.books_dir", &self.books_dir),
            ("library.covers_dir", &self.covers_dir),
        ] {
            if path.as_os_str().is_empty() {
                results.push(Err(ValidationError::new(field, "must not be empty")));
            }
        }

        if self.books_dir == self.covers_dir {
            results.push(Err(ValidationError::with_value(
                "library.covers_dir",
                "must differ from library.books_dir",
                self.covers_dir.display(),
            )));
        }

        for (i, category) in self.categories.iter().enumerate() {
            results.push(Validator::not_empty(
                category,
                &format!("library.categories[{}]", i),
            ));
        }

        if !self.is_known_category(DEFAULT_CATEGORY) {
            results.push(Err(ValidationError::new(
                "library.categories",
                format!("must contain '{}'", DEFAULT_CATEGORY),
            )));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.catalog_path = other.catalog_path;
        self.books_dir = other.books_dir;
        self.covers_dir = other.covers_dir;
        self.popular_limit = other.popular_limit;
        self.categories = other.categories;
        self.on_corrupt = other.on_corrupt;
    }

    fn section_name(&self) -> &'static str {
        "library"
    }
}
