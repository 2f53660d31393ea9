use super::*;
use crate::auth::SharedSecret;
use crate::build_cli;
use perpus_library::CatalogError;
use std::fs;
use tempfile::TempDir;

fn setup_context(password: Option<&str>) -> (TempDir, AppContext) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.app.admin_password = Some("rahasia".to_string());

    let ctx = AppContext {
        manager: LibraryManager::from_config(&config.library, temp_dir.path()),
        authorizer: Box::new(SharedSecret::new(config.app.admin_password.clone())),
        password: password.map(str::to_string),
        config,
    };
    (temp_dir, ctx)
}

fn sub_matches(args: &[&str]) -> ArgMatches {
    let matches = build_cli()
        .try_get_matches_from(std::iter::once("perpus").chain(args.iter().copied()))
        .expect("Failed to parse arguments");
    let (_, sub) = matches.subcommand().expect("Missing subcommand");
    sub.clone()
}

fn write_uploads(dir: &std::path::Path) -> (String, String) {
    let pdf = dir.join("upload.pdf");
    let cover = dir.join("upload.png");
    fs::write(&pdf, b"%PDF-1.7").unwrap();
    fs::write(&cover, b"\x89PNG").unwrap();
    (pdf.display().to_string(), cover.display().to_string())
}

#[test]
fn test_parse_book_ref() {
    assert_eq!(
        parse_book_ref("Dune", Some("Herbert")).unwrap(),
        BookRef::Key(BookKey::new("Dune", "Herbert"))
    );
    assert_eq!(parse_book_ref("#3", None).unwrap(), BookRef::Index(3));
    assert!(parse_book_ref("#x", None).is_err());
    assert!(parse_book_ref("Dune", None).is_err());
}

#[test]
fn test_books_to_csv_always_has_category() {
    let mut untagged = Book::new("Misc", "Anon");
    untagged.category = None;
    let books = vec![
        Book::new("Dune", "Herbert").with_category("Fiksi").with_media("dune.pdf", "dune.jpg"),
        untagged,
    ];

    let csv = books_to_csv(&books).unwrap();
    assert_eq!(
        csv,
        "title,author,category,file,cover,view_count\n\
         Dune,Herbert,Fiksi,dune.pdf,dune.jpg,0\n\
         Misc,Anon,Lainnya,,,0\n"
    );
}

#[test]
fn test_books_to_json_matches_catalog_shape() {
    let books = vec![Book::new("Dune", "Herbert").with_views(2)];
    let json = books_to_json(&books).unwrap();
    let parsed: Vec<Book> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, books);
}

#[test]
fn test_format_size() {
    assert_eq!(format_size(512), "512 bytes");
    assert_eq!(format_size(1024), "1.00 KB");
    assert_eq!(format_size(1_048_576), "1.00 MB");
    assert_eq!(format_size(1_073_741_824), "1.00 GB");
}

#[test]
fn test_truncate_respects_char_boundaries() {
    assert_eq!(truncate("12345678", 8), "12345678");
    assert_eq!(truncate("123456789", 8), "12345678...");
    assert_eq!(truncate("ééééé", 2), "éé...");
}

#[test]
fn test_add_requires_password() {
    let (temp_dir, ctx) = setup_context(None);
    let (pdf, cover) = write_uploads(temp_dir.path());
    let matches = sub_matches(&["add", "-t", "Dune", "-a", "Herbert", "--pdf", &pdf, "--cover", &cover]);

    assert!(add_book(&ctx, &matches).is_err());
    assert!(ctx.manager.load().unwrap().is_empty());
}

#[test]
fn test_add_with_password() {
    let (temp_dir, ctx) = setup_context(Some("rahasia"));
    let (pdf, cover) = write_uploads(temp_dir.path());
    let matches = sub_matches(&[
        "add", "-t", "Dune", "-a", "Herbert", "-c", "Fiksi", "--pdf", &pdf, "--cover", &cover,
    ]);

    add_book(&ctx, &matches).unwrap();

    let books = ctx.manager.load().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].category(), "Fiksi");
    assert!(temp_dir.path().join("books").join("dune.pdf").exists());
}

#[test]
fn test_add_rejects_unknown_category() {
    let (temp_dir, ctx) = setup_context(Some("rahasia"));
    let (pdf, cover) = write_uploads(temp_dir.path());
    let matches = sub_matches(&[
        "add", "-t", "Dune", "-a", "Herbert", "-c", "Puisi", "--pdf", &pdf, "--cover", &cover,
    ]);

    assert!(add_book(&ctx, &matches).is_err());
}

#[test]
fn test_read_counts_view() {
    let (temp_dir, ctx) = setup_context(Some("rahasia"));
    let (pdf, cover) = write_uploads(temp_dir.path());
    add_book(&ctx, &sub_matches(&["add", "-t", "Dune", "-a", "Herbert", "--pdf", &pdf, "--cover", &cover])).unwrap();

    read_book(&ctx, &sub_matches(&["read", "Dune", "-a", "Herbert"])).unwrap();
    read_book(&ctx, &sub_matches(&["read", "#0"])).unwrap();

    assert_eq!(ctx.manager.get(&BookRef::Index(0)).unwrap().views(), 2);
}

#[test]
fn test_read_missing_pdf_does_not_count() {
    let (temp_dir, ctx) = setup_context(Some("rahasia"));
    let (pdf, cover) = write_uploads(temp_dir.path());
    add_book(&ctx, &sub_matches(&["add", "-t", "Dune", "-a", "Herbert", "--pdf", &pdf, "--cover", &cover])).unwrap();
    fs::remove_file(temp_dir.path().join("books").join("dune.pdf")).unwrap();

    assert!(read_book(&ctx, &sub_matches(&["read", "#0"])).is_err());
    assert_eq!(ctx.manager.get(&BookRef::Index(0)).unwrap().views(), 0);
}

#[test]
fn test_edit_changes_only_given_fields() {
    let (temp_dir, ctx) = setup_context(Some("rahasia"));
    let (pdf, cover) = write_uploads(temp_dir.path());
    add_book(&ctx, &sub_matches(&["add", "-t", "Dune", "-a", "Herbert", "--pdf", &pdf, "--cover", &cover])).unwrap();

    edit_book(&ctx, &sub_matches(&["edit", "#0", "-c", "Fiksi"])).unwrap();

    let book = ctx.manager.get(&BookRef::Index(0)).unwrap();
    assert_eq!(book.title, "Dune");
    assert_eq!(book.author, "Herbert");
    assert_eq!(book.category(), "Fiksi");
    assert_eq!(book.file, "dune.pdf");
}

#[test]
fn test_delete_with_yes() {
    let (temp_dir, ctx) = setup_context(Some("rahasia"));
    let (pdf, cover) = write_uploads(temp_dir.path());
    add_book(&ctx, &sub_matches(&["add", "-t", "Dune", "-a", "Herbert", "--pdf", &pdf, "--cover", &cover])).unwrap();

    delete_book(&ctx, &sub_matches(&["delete", "Dune", "-a", "Herbert", "--yes"])).unwrap();

    assert!(ctx.manager.load().unwrap().is_empty());
    assert!(!temp_dir.path().join("covers").join("dune.jpg").exists());
}

#[test]
fn test_delete_unknown_book() {
    let (_temp_dir, ctx) = setup_context(Some("rahasia"));
    let err = delete_book(&ctx, &sub_matches(&["delete", "#4", "--yes"])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CatalogError>(),
        Some(CatalogError::NotFound(_))
    ));
}

#[test]
fn test_export_csv_to_file() {
    let (temp_dir, ctx) = setup_context(Some("rahasia"));
    let (pdf, cover) = write_uploads(temp_dir.path());
    add_book(&ctx, &sub_matches(&["add", "-t", "Dune", "-a", "Herbert", "--pdf", &pdf, "--cover", &cover])).unwrap();

    let output = temp_dir.path().join("out.csv");
    let output_arg = output.display().to_string();
    export_library(&ctx, &sub_matches(&["export", "-f", "csv", "-o", &output_arg])).unwrap();

    let contents = fs::read_to_string(output).unwrap();
    assert!(contents.starts_with("title,author,category"));
    assert!(contents.contains("Dune,Herbert,Lainnya,dune.pdf,dune.jpg,0"));
}

#[test]
fn test_invalid_sort_mode() {
    let (_temp_dir, ctx) = setup_context(None);
    assert!(list_books(&ctx, &sub_matches(&["list", "--sort", "random"])).is_err());
}
