//! Listing criteria: filters and sort modes

use crate::types::Book;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of entries shown in the most-popular listing when unconfigured
pub const DEFAULT_POPULAR_LIMIT: usize = 5;

/// Filter applied before sorting
///
/// Both criteria are ANDed. A blank keyword disables keyword matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Exact match against [`Book::category`]
    pub category: Option<String>,
    /// Case-insensitive substring of title or author
    pub keyword: Option<String>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Returns true if no criterion would exclude anything
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.normalized_keyword().is_none()
    }

    fn normalized_keyword(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase)
    }

    /// Returns true if `book` passes every criterion
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(category) = &self.category {
            if book.category() != category {
                return false;
            }
        }

        match self.normalized_keyword() {
            Some(keyword) => {
                book.title.to_lowercase().contains(&keyword)
                    || book.author.to_lowercase().contains(&keyword)
            }
            None => true,
        }
    }
}

/// Ordering applied to a listing
///
/// Every mode is stable: records comparing equal keep their catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    TitleAsc,
    TitleDesc,
    AuthorAsc,
    ViewCountDesc,
    CategoryAsc,
}

impl SortMode {
    pub const ALL: [SortMode; 5] = [
        SortMode::TitleAsc,
        SortMode::TitleDesc,
        SortMode::AuthorAsc,
        SortMode::ViewCountDesc,
        SortMode::CategoryAsc,
    ];

    /// Short name accepted by [`FromStr`]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TitleAsc => "title",
            Self::TitleDesc => "title-desc",
            Self::AuthorAsc => "author",
            Self::ViewCountDesc => "popular",
            Self::CategoryAsc => "category",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort mode '{0}' (expected one of: title, title-desc, author, popular, category)")]
pub struct ParseSortModeError(pub String);

impl FromStr for SortMode {
    type Err = ParseSortModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" | "title-asc" => Ok(Self::TitleAsc),
            "title-desc" => Ok(Self::TitleDesc),
            "author" | "author-asc" => Ok(Self::AuthorAsc),
            "popular" | "views" | "view-count-desc" => Ok(Self::ViewCountDesc),
            "category" | "category-asc" => Ok(Self::CategoryAsc),
            _ => Err(ParseSortModeError(s.to_string())),
        }
    }
}
