pub mod types;

// Re-export commonly used types
pub use types::{
    Book, BookKey, BookRef, CatalogFilter, CatalogStats, CategoryCount, ParseSortModeError,
    SortMode, CATEGORIES, DEFAULT_CATEGORY, DEFAULT_POPULAR_LIMIT,
};
