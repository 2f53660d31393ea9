//! Book domain model and identity types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category assigned to books that do not carry one
pub const DEFAULT_CATEGORY: &str = "Lainnya";

/// Category vocabulary offered by the admin forms
pub const CATEGORIES: [&str; 8] = [
    "Fiksi",
    "Non-Fiksi",
    "Sains",
    "Teknologi",
    "Biografi",
    "Sejarah",
    "Religi",
    DEFAULT_CATEGORY,
];

/// One catalog entry
///
/// Field order matches the persisted JSON object, so serializing an unmodified
/// record reproduces the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    /// PDF filename relative to the books directory
    #[serde(default)]
    pub file: String,
    /// Cover image filename relative to the covers directory
    #[serde(default)]
    pub cover: String,
    /// Absent categories stay absent on disk; see [`Book::category`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Absent until the first read; see [`Book::views`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
}

impl Book {
    /// Creates a new book with no media and the default category
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            file: String::new(),
            cover: String::new(),
            category: Some(DEFAULT_CATEGORY.to_string()),
            view_count: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_media(mut self, file: impl Into<String>, cover: impl Into<String>) -> Self {
        self.file = file.into();
        self.cover = cover.into();
        self
    }

    pub fn with_views(mut self, view_count: u64) -> Self {
        self.view_count = Some(view_count);
        self
    }

    /// Returns the category, treating a missing one as [`DEFAULT_CATEGORY`]
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    /// Returns the view count, treating a missing one as zero
    pub fn views(&self) -> u64 {
        self.view_count.unwrap_or(0)
    }

    /// Returns the identity key of this record
    pub fn key(&self) -> BookKey {
        BookKey::new(self.title.clone(), self.author.clone())
    }

    /// Returns true if title and author both match exactly
    pub fn matches_key(&self, title: &str, author: &str) -> bool {
        self.title == title && self.author == author
    }

    /// Records one more read of this book
    pub fn mark_viewed(&mut self) {
        self.view_count = Some(self.views().saturating_add(1));
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.author)
    }
}

/// The `(title, author)` pair used to locate a record
///
/// Catalogs carry no generated ids, so this pair is the only identity a record has.
/// Duplicates are possible; lookups resolve to the first match in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookKey {
    pub title: String,
    pub author: String,
}

impl BookKey {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }
}

impl fmt::Display for BookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' by {}", self.title, self.author)
    }
}

/// Addresses a record either by catalog position or by identity key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookRef {
    Index(usize),
    Key(BookKey),
}

impl BookRef {
    /// Resolves the reference to a position in `catalog`
    pub fn position(&self, catalog: &[Book]) -> Option<usize> {
        match self {
            Self::Index(index) => (*index < catalog.len()).then_some(*index),
            Self::Key(key) => catalog
                .iter()
                .position(|b| b.matches_key(&key.title, &key.author)),
        }
    }
}

impl From<BookKey> for BookRef {
    fn from(key: BookKey) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for BookRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for BookRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{}", index),
            Self::Key(key) => write!(f, "{}", key),
        }
    }
}
