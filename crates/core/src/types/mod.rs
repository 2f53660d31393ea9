//! Domain types for Perpus
//!
//! This module contains all domain models organized by responsibility:
//! - `book`: Book records, identity keys and the category vocabulary
//! - `query`: Filter and sort criteria for catalog listings
//! - `stats`: Catalog statistics

mod book;
mod query;
mod stats;

// Re-export all public types
pub use book::{Book, BookKey, BookRef, CATEGORIES, DEFAULT_CATEGORY};
pub use query::{CatalogFilter, ParseSortModeError, SortMode, DEFAULT_POPULAR_LIMIT};
pub use stats::{CatalogStats, CategoryCount};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _key = BookKey::new("Dune", "Herbert");
        let _filter = CatalogFilter::default();
        let _stats = CatalogStats::empty();
        assert_eq!(SortMode::ALL.len(), 5);
    }

    #[test]
    fn test_default_category_is_in_vocabulary() {
        assert!(CATEGORIES.contains(&DEFAULT_CATEGORY));
    }
}
