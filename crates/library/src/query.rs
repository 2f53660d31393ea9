// FILE: crates/library/src/query.rs

//! Pure catalog queries: listing, popularity, categories and statistics
//!
//! Nothing here touches the filesystem. Every ordering is a stable sort, so
//! records that compare equal keep their catalog order.

use perpus_core::{Book, BookRef, CatalogFilter, CatalogStats, CategoryCount, SortMode};
use std::cmp::Reverse;
use std::collections::HashSet;

/// Filters, then sorts, a copy of `catalog`
///
/// With an empty filter and no sort mode the catalog comes back unchanged.
pub fn list(catalog: &[Book], filter: &CatalogFilter, sort: Option<SortMode>) -> Vec<Book> {
    let mut books: Vec<Book> = catalog
        .iter()
        .filter(|b| filter.matches(b))
        .cloned()
        .collect();

    if let Some(mode) = sort {
        sort_books(&mut books, mode);
    }

    books
}

/// Sorts `books` in place
pub fn sort_books(books: &mut [Book], mode: SortMode) {
    match mode {
        SortMode::TitleAsc => books.sort_by_cached_key(|b| b.title.to_lowercase()),
        SortMode::TitleDesc => books.sort_by_cached_key(|b| Reverse(b.title.to_lowercase())),
        SortMode::AuthorAsc => books.sort_by_cached_key(|b| b.author.to_lowercase()),
        SortMode::ViewCountDesc => books.sort_by_key(|b| Reverse(b.views())),
        // Missing categories sort as "", ahead of every named category
        SortMode::CategoryAsc => books.sort_by_cached_key(|b| {
            b.category.as_deref().unwrap_or_default().to_lowercase()
        }),
    }
}

/// The `n` most-viewed books, ties in catalog order
pub fn most_popular(catalog: &[Book], n: usize) -> Vec<Book> {
    let mut books = list(catalog, &CatalogFilter::default(), Some(SortMode::ViewCountDesc));
    books.truncate(n);
    books
}

/// Distinct categories in use, sorted
pub fn categories(catalog: &[Book]) -> Vec<String> {
    let mut seen: Vec<String> = catalog
        .iter()
        .map(|b| b.category().to_string())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    seen.sort();
    seen
}

/// Book counts per category in order of first appearance, plus totals
pub fn stats(catalog: &[Book]) -> CatalogStats {
    let mut categories: Vec<CategoryCount> = Vec::new();
    for book in catalog {
        match categories.iter_mut().find(|c| c.category == book.category()) {
            Some(entry) => entry.count += 1,
            None => categories.push(CategoryCount {
                category: book.category().to_string(),
                count: 1,
            }),
        }
    }

    let unique_authors = catalog
        .iter()
        .map(|b| b.author.as_str())
        .collect::<HashSet<_>>()
        .len();

    CatalogStats {
        total_books: catalog.len(),
        total_views: catalog.iter().map(|b| b.views()).sum(),
        unique_authors,
        categories,
    }
}

/// Adds one view to the first record matching `title` and `author` exactly
///
/// Returns false, leaving the catalog untouched, if nothing matches.
pub fn increment_view(catalog: &mut [Book], title: &str, author: &str) -> bool {
    match catalog.iter_mut().find(|b| b.matches_key(title, author)) {
        Some(book) => {
            book.mark_viewed();
            true
        }
        None => false,
    }
}

/// Resolves `reference` to a record
pub fn find<'a>(catalog: &'a [Book], reference: &BookRef) -> Option<&'a Book> {
    reference.position(catalog).map(|i| &catalog[i])
}
