//! Catalog statistics

use serde::{Deserialize, Serialize};

/// Number of books filed under one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Catalog-wide statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_books: usize,
    pub total_views: u64,
    pub unique_authors: usize,
    /// Per-category counts in order of first appearance
    pub categories: Vec<CategoryCount>,
}

impl CatalogStats {
    /// Creates empty statistics
    pub fn empty() -> Self {
        Self {
            total_books: 0,
            total_views: 0,
            unique_authors: 0,
            categories: Vec::new(),
        }
    }

    /// Returns the average number of views per book
    pub fn average_views(&self) -> f64 {
        if self.total_books == 0 {
            return 0.0;
        }
        self.total_views as f64 / self.total_books as f64
    }

    /// Returns the count for `category`, zero if absent
    pub fn count_for(&self, category: &str) -> usize {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Returns the share of books in `category` as a percentage
    pub fn category_percentage(&self, category: &str) -> f64 {
        if self.total_books == 0 {
            return 0.0;
        }
        (self.count_for(category) as f64 / self.total_books as f64) * 100.0
    }
}

impl Default for CatalogStats {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CatalogStats {
        CatalogStats {
            total_books: 4,
            total_views: 10,
            unique_authors: 3,
            categories: vec![
                CategoryCount {
                    category: "Fiksi".to_string(),
                    count: 3,
                },
                CategoryCount {
                    category: "Sains".to_string(),
                    count: 1,
                },
            ],
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = CatalogStats::empty();
        assert_eq!(stats.average_views(), 0.0);
        assert_eq!(stats.category_percentage("Fiksi"), 0.0);
    }

    #[test]
    fn test_average_views() {
        assert_eq!(sample().average_views(), 2.5);
    }

    #[test]
    fn test_category_percentage() {
        let stats = sample();
        assert_eq!(stats.count_for("Fiksi"), 3);
        assert_eq!(stats.count_for("Religi"), 0);
        assert_eq!(stats.category_percentage("Sains"), 25.0);
    }
}
