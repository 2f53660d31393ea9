// FILE: crates/library/tests/query_tests.rs
//! Property checks for catalog queries over a fixed, messy fixture

use perpus_core::{Book, CatalogFilter, SortMode};
use perpus_library::query;

fn fixture() -> Vec<Book> {
    let mut untagged = Book::new("zaman", "Anon").with_views(2);
    untagged.category = None;

    vec![
        Book::new("Laskar Pelangi", "Andrea Hirata").with_category("Fiksi").with_views(12),
        Book::new("Sapiens", "Yuval Noah Harari").with_category("Sejarah").with_views(7),
        Book::new("atomic habits", "James Clear").with_category("Pengembangan Diri").with_views(7),
        untagged,
        Book::new("Bumi Manusia", "Pramoedya").with_category("Fiksi").with_views(0),
        Book::new("Sapiens", "Yuval Noah Harari").with_category("Sejarah").with_views(1),
        Book::new("Kosmos", "Carl Sagan").with_category("Sains").with_views(12),
    ]
}

fn titles(books: &[Book]) -> Vec<&str> {
    books.iter().map(|b| b.title.as_str()).collect()
}

fn same_multiset(a: &[Book], b: &[Book]) -> bool {
    let key = |book: &Book| format!("{:?}", book);
    let mut left: Vec<_> = a.iter().map(key).collect();
    let mut right: Vec<_> = b.iter().map(key).collect();
    left.sort();
    right.sort();
    left == right
}

#[test]
fn property_sort_is_a_permutation() {
    let catalog = fixture();
    for mode in SortMode::ALL {
        let sorted = query::list(&catalog, &CatalogFilter::default(), Some(mode));
        assert!(same_multiset(&sorted, &catalog), "{} lost records", mode);
    }
}

#[test]
fn property_sort_is_idempotent() {
    let catalog = fixture();
    for mode in SortMode::ALL {
        let once = query::list(&catalog, &CatalogFilter::default(), Some(mode));
        let twice = query::list(&once, &CatalogFilter::default(), Some(mode));
        assert_eq!(once, twice, "{} is not idempotent", mode);
    }
}

#[test]
fn property_title_desc_reverses_title_asc_without_ties() {
    let catalog: Vec<Book> = fixture()
        .into_iter()
        .filter(|b| b.title != "Sapiens")
        .collect();

    let asc = query::list(&catalog, &CatalogFilter::default(), Some(SortMode::TitleAsc));
    let mut desc = query::list(&catalog, &CatalogFilter::default(), Some(SortMode::TitleDesc));
    desc.reverse();

    assert_eq!(asc, desc);
}

#[test]
fn property_empty_filter_without_sort_is_identity() {
    let catalog = fixture();
    assert_eq!(query::list(&catalog, &CatalogFilter::default(), None), catalog);
}

#[test]
fn property_filter_result_satisfies_filter() {
    let catalog = fixture();
    let filter = CatalogFilter::new().with_category("Fiksi").with_keyword("MANUSIA");
    let found = query::list(&catalog, &filter, None);

    assert_eq!(titles(&found), ["Bumi Manusia"]);
    assert!(found.iter().all(|b| filter.matches(b)));
}

#[test]
fn test_title_sort_is_case_insensitive() {
    let sorted = query::list(&fixture(), &CatalogFilter::default(), Some(SortMode::TitleAsc));
    assert_eq!(
        titles(&sorted),
        ["atomic habits", "Bumi Manusia", "Kosmos", "Laskar Pelangi", "Sapiens", "Sapiens", "zaman"]
    );
}

#[test]
fn test_view_count_ties_keep_catalog_order() {
    let sorted = query::list(&fixture(), &CatalogFilter::default(), Some(SortMode::ViewCountDesc));
    assert_eq!(
        titles(&sorted),
        ["Laskar Pelangi", "Kosmos", "Sapiens", "atomic habits", "zaman", "Sapiens", "Bumi Manusia"]
    );
}

#[test]
fn test_keyword_matches_author() {
    let found = query::list(&fixture(), &CatalogFilter::new().with_keyword("harari"), None);
    assert_eq!(found.len(), 2);
}

#[test]
fn test_empty_keyword_is_ignored() {
    let found = query::list(&fixture(), &CatalogFilter::new().with_keyword(""), None);
    assert_eq!(found.len(), fixture().len());
}

#[test]
fn test_default_category_filter_matches_untagged() {
    let found = query::list(&fixture(), &CatalogFilter::new().with_category("Lainnya"), None);
    assert_eq!(titles(&found), ["zaman"]);
}

#[test]
fn test_most_popular_limits() {
    let catalog = fixture();
    assert_eq!(query::most_popular(&catalog, 0).len(), 0);
    assert_eq!(query::most_popular(&catalog, 100).len(), catalog.len());
    assert_eq!(titles(&query::most_popular(&catalog, 2)), ["Laskar Pelangi", "Kosmos"]);
}

#[test]
fn test_increment_view_duplicate_keys() {
    let mut catalog = fixture();
    assert!(query::increment_view(&mut catalog, "Sapiens", "Yuval Noah Harari"));
    assert_eq!(catalog[1].views(), 8);
    assert_eq!(catalog[5].views(), 1);

    assert!(!query::increment_view(&mut catalog, "sapiens", "Yuval Noah Harari"));
}

#[test]
fn property_increment_view_touches_only_first_match() {
    let before = fixture();
    let mut catalog = before.clone();

    assert!(query::increment_view(&mut catalog, "Sapiens", "Yuval Noah Harari"));

    let mut expected = before.clone();
    expected[1] = expected[1].clone().with_views(8);
    assert_eq!(catalog, expected);
}

#[test]
fn property_increment_view_unknown_pair_changes_nothing() {
    let before = fixture();
    let mut catalog = before.clone();

    for (title, author) in [
        ("Sapiens", "Andrea Hirata"),
        ("Dune", "Yuval Noah Harari"),
        ("Sapiens ", "Yuval Noah Harari"),
        ("", ""),
    ] {
        assert!(!query::increment_view(&mut catalog, title, author));
        assert_eq!(catalog, before, "({:?}, {:?}) modified the catalog", title, author);
    }
}

#[test]
fn test_stats_totals() {
    let stats = query::stats(&fixture());
    assert_eq!(stats.total_books, 7);
    assert_eq!(stats.total_views, 41);
    assert_eq!(stats.unique_authors, 6);
    assert_eq!(stats.count_for("Fiksi"), 2);
    assert_eq!(stats.count_for("Lainnya"), 1);
}
