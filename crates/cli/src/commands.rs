// FILE: crates/cli/src/commands.rs

use crate::auth::Authorizer;
use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use console::style;
use perpus_config::{Config, ConfigManager};
use perpus_core::{Book, BookKey, BookRef, CatalogFilter, SortMode};
use perpus_library::{BookPatch, LibraryManager, MediaSource, MediaStatus, NewBook, ReadingSession};
use serde::Serialize;
use std::path::PathBuf;

#[cfg(test)]
mod tests;

/// Everything a command needs, built once per invocation
pub struct AppContext {
    pub manager: LibraryManager,
    pub config: Config,
    pub authorizer: Box<dyn Authorizer>,
    /// Admin password supplied on the command line or through the environment
    pub password: Option<String>,
}

impl AppContext {
    fn require_admin(&self) -> Result<()> {
        self.authorizer.authorize(self.password.as_deref())
    }
}

/// List books, optionally filtered by category and sorted
pub fn list_books(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let filter = filter_from(matches);
    let sort = sort_from(matches)?;
    let books = ctx
        .manager
        .list(&filter, sort)
        .context("Failed to list books")?;

    if books.is_empty() {
        if filter.is_empty() {
            println!("No books in library. Use the 'add' command to upload one.");
        } else {
            println!("No books match the given filter.");
        }
        return Ok(());
    }

    println!("\n{} Books in Library", style(books.len()).bold().cyan());
    println!("{}", "=".repeat(80));

    for book in &books {
        print_book_summary(book);
    }

    Ok(())
}

/// Search titles and authors by keyword
pub fn search_books(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let keyword = matches
        .get_one::<String>("keyword")
        .ok_or_else(|| anyhow!("Search keyword is required"))?;

    let filter = filter_from(matches).with_keyword(keyword.as_str());
    let results = ctx
        .manager
        .list(&filter, sort_from(matches)?)
        .context("Failed to search books")?;

    if results.is_empty() {
        println!("No books found matching '{}'", keyword);
        return Ok(());
    }

    println!(
        "\n{} Search Results for '{}'",
        style(results.len()).bold().cyan(),
        keyword
    );
    println!("{}", "=".repeat(80));

    for book in &results {
        print_book_summary(book);
    }

    Ok(())
}

/// Show the most-viewed books
pub fn show_popular(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let limit = matches.get_one::<usize>("limit").copied();
    let books = ctx
        .manager
        .most_popular(limit)
        .context("Failed to rank books")?;

    println!("\n{}", style("Most Popular").bold().cyan());
    println!("{}", "=".repeat(80));

    for (rank, book) in books.iter().enumerate() {
        println!(
            "{:>3}. {} by {} ({} views)",
            rank + 1,
            style(&book.title).bold(),
            book.author,
            book.views()
        );
    }

    Ok(())
}

/// List the categories in use
pub fn list_categories(ctx: &AppContext) -> Result<()> {
    let in_use = ctx
        .manager
        .categories()
        .context("Failed to read categories")?;

    println!("\n{}", style("Categories").bold().cyan());
    println!("{}", "=".repeat(80));

    for category in &ctx.config.library.categories {
        let marker = if in_use.contains(category) { "●" } else { "○" };
        println!("  {} {}", marker, category);
    }
    for category in in_use.iter().filter(|c| !ctx.config.library.is_known_category(c)) {
        println!("  ● {} {}", category, style("(not in vocabulary)").dim());
    }

    Ok(())
}

/// Show library statistics
pub fn show_stats(ctx: &AppContext) -> Result<()> {
    let stats = ctx.manager.stats().context("Failed to compute statistics")?;

    println!("\n{}", style("Library Statistics").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Total Books: {}", style(stats.total_books).bold());
    println!("Authors: {}", style(stats.unique_authors).bold());
    println!("Total Views: {}", style(stats.total_views).bold());
    println!("Average Views: {:.1}", stats.average_views());

    if !stats.categories.is_empty() {
        println!("\nBy Category:");
        for entry in &stats.categories {
            println!(
                "  {:<20} {:>4}  ({:.0}%)",
                entry.category,
                entry.count,
                stats.category_percentage(&entry.category)
            );
        }
    }

    Ok(())
}

/// Show detailed information about a book
pub fn show_book_info(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let reference = book_ref_from(matches)?;
    let book = ctx.manager.get(&reference).context("Failed to get book")?;
    let media = ctx.manager.resolve_media(&book);

    println!("\n{}", style("Book Information").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Title: {}", style(&book.title).bold());
    println!("Author: {}", book.author);
    println!("Category: {}", book.category());
    println!("Views: {}", book.views());

    println!("\nMedia:");
    println!("  PDF:   {}", describe_media(&media.pdf));
    println!("  Cover: {}", describe_media(&media.cover));

    Ok(())
}

/// Open a book for reading: resolve its PDF and count the view
pub fn read_book(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let reference = book_ref_from(matches)?;
    let book = ctx.manager.get(&reference).context("Failed to get book")?;
    let media = ctx.manager.resolve_media(&book);

    let MediaStatus::Present(pdf) = &media.pdf else {
        bail!("The PDF for {} is {}", book.key(), describe_media(&media.pdf));
    };

    let mut session = ReadingSession::open(&book);
    if !session
        .record_view(&ctx.manager)
        .context("Failed to record view")?
    {
        log::warn!("View of {} was not counted", session.key());
    }

    println!("{} {}", style("▶").green().bold(), style(&book.title).bold());
    println!("by {}", book.author);
    println!("{}", pdf.display());

    Ok(())
}

/// Upload a new book
pub fn add_book(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    ctx.require_admin()?;

    let title = required_arg(matches, "title")?;
    let author = required_arg(matches, "author")?;
    let pdf = required_path(matches, "pdf")?;
    let cover = required_path(matches, "cover")?;

    let mut new = NewBook::new(title, author, MediaSource::File(pdf), MediaSource::File(cover));
    if let Some(category) = matches.get_one::<String>("category") {
        ensure_known_category(&ctx.config, category)?;
        new = new.with_category(category.as_str());
    }

    let book = ctx.manager.add_book(new).context("Failed to add book")?;

    println!("{} Book added successfully!", style("✓").green().bold());
    println!("  Title: {}", book.title);
    println!("  Author: {}", book.author);
    println!("  Category: {}", book.category());
    println!("  PDF: {}", book.file);
    println!("  Cover: {}", book.cover);

    Ok(())
}

/// Edit an existing book's metadata or media
pub fn edit_book(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    ctx.require_admin()?;

    let reference = book_ref_from(matches)?;
    let current = ctx.manager.get(&reference).context("Failed to get book")?;

    let mut patch = BookPatch::from_book(&current);
    if let Some(title) = matches.get_one::<String>("set-title") {
        patch.title = title.clone();
    }
    if let Some(author) = matches.get_one::<String>("set-author") {
        patch.author = author.clone();
    }
    if let Some(category) = matches.get_one::<String>("category") {
        ensure_known_category(&ctx.config, category)?;
        patch.category = category.clone();
    }
    patch.pdf = matches.get_one::<PathBuf>("pdf").cloned().map(MediaSource::File);
    patch.cover = matches.get_one::<PathBuf>("cover").cloned().map(MediaSource::File);

    let updated = ctx
        .manager
        .update_book(&reference, patch)
        .context("Failed to update book")?;

    println!("{} Book updated: {}", style("✓").green().bold(), updated);

    Ok(())
}

/// Delete a book and its media
pub fn delete_book(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    ctx.require_admin()?;

    let reference = book_ref_from(matches)?;
    let book = ctx.manager.get(&reference).context("Failed to get book")?;

    let confirmed = matches.get_flag("yes") || {
        println!("Are you sure you want to delete {}? (y/N)", book.key());
        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;
        input.trim().eq_ignore_ascii_case("y")
    };

    if !confirmed {
        println!("Deletion cancelled.");
        return Ok(());
    }

    let outcome = ctx
        .manager
        .delete_book(&reference, true)
        .context("Failed to delete book")?;

    println!("{} Book deleted: {}", style("✓").green().bold(), outcome.removed.title);
    for warning in &outcome.warnings {
        println!("  {} {}", style("!").yellow().bold(), warning);
    }

    Ok(())
}

/// Export the catalog as JSON or CSV
pub fn export_library(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let format = matches
        .get_one::<String>("format")
        .map(|s| s.as_str())
        .unwrap_or("json");

    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(format!("perpus_export.{}", format)));

    let books = ctx
        .manager
        .list(&filter_from(matches), sort_from(matches)?)
        .context("Failed to list books")?;

    let contents = match format {
        "json" => books_to_json(&books)?,
        "csv" => books_to_csv(&books)?,
        _ => bail!("Unsupported format: {}", format),
    };

    std::fs::write(&output, contents).context("Failed to write export file")?;

    println!(
        "{} Exported {} books to {}",
        style("✓").green().bold(),
        books.len(),
        output.display()
    );

    Ok(())
}

/// Write a default config file if none exists
pub fn init_config(config_manager: &ConfigManager) -> Result<()> {
    let created = config_manager
        .initialize()
        .context("Failed to initialize config")?;

    if created {
        println!(
            "{} Created config at {}",
            style("✓").green().bold(),
            config_manager.config_path().display()
        );
    } else {
        println!(
            "Config already exists at {}",
            config_manager.config_path().display()
        );
    }

    Ok(())
}

#[derive(Serialize)]
struct ExportRow<'a> {
    title: &'a str,
    author: &'a str,
    category: &'a str,
    file: &'a str,
    cover: &'a str,
    view_count: u64,
}

impl<'a> From<&'a Book> for ExportRow<'a> {
    fn from(book: &'a Book) -> Self {
        Self {
            title: &book.title,
            author: &book.author,
            category: book.category(),
            file: &book.file,
            cover: &book.cover,
            view_count: book.views(),
        }
    }
}

fn books_to_csv(books: &[Book]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for book in books {
        wtr.serialize(ExportRow::from(book))
            .context("Failed to write CSV row")?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("Failed to finish CSV: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn books_to_json(books: &[Book]) -> Result<String> {
    serde_json::to_string_pretty(books).context("Failed to serialize to JSON")
}

/// Parses `BOOK` as `#N` for a catalog position, or as a title paired with `--author`
fn parse_book_ref(book: &str, author: Option<&str>) -> Result<BookRef> {
    if let Some(author) = author {
        return Ok(BookRef::Key(BookKey::new(book, author)));
    }

    match book.strip_prefix('#').map(str::parse::<usize>) {
        Some(Ok(index)) => Ok(BookRef::Index(index)),
        Some(Err(_)) => bail!("Invalid catalog position: {}", book),
        None => bail!("Identify '{}' with --author, or use #N for a catalog position", book),
    }
}

fn book_ref_from(matches: &ArgMatches) -> Result<BookRef> {
    let book = matches
        .get_one::<String>("book")
        .ok_or_else(|| anyhow!("Book is required"))?;
    parse_book_ref(book, matches.get_one::<String>("author").map(|s| s.as_str()))
}

fn filter_from(matches: &ArgMatches) -> CatalogFilter {
    let mut filter = CatalogFilter::new();
    if let Some(category) = matches.get_one::<String>("category") {
        filter = filter.with_category(category.as_str());
    }
    filter
}

fn sort_from(matches: &ArgMatches) -> Result<Option<SortMode>> {
    matches
        .get_one::<String>("sort")
        .map(|s| s.parse::<SortMode>())
        .transpose()
        .context("Invalid --sort value")
}

fn required_arg<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("--{} is required", name))
}

fn required_path(matches: &ArgMatches, name: &str) -> Result<PathBuf> {
    let path = matches
        .get_one::<PathBuf>(name)
        .cloned()
        .ok_or_else(|| anyhow!("--{} is required", name))?;
    if !path.is_file() {
        bail!("File not found: {}", path.display());
    }
    Ok(path)
}

fn ensure_known_category(config: &Config, category: &str) -> Result<()> {
    if !config.library.is_known_category(category) {
        bail!(
            "Unknown category '{}'. Known categories: {}",
            category,
            config.library.categories.join(", ")
        );
    }
    Ok(())
}

fn describe_media(status: &MediaStatus) -> String {
    match status {
        MediaStatus::Present(path) => match std::fs::metadata(path) {
            Ok(meta) => format!("{} ({})", path.display(), format_size(meta.len())),
            Err(_) => path.display().to_string(),
        },
        MediaStatus::Missing(path) => format!("{} {}", path.display(), style("(missing)").red()),
        MediaStatus::Unavailable => "not recorded".to_string(),
    }
}

fn print_book_summary(book: &Book) {
    println!("\n{}", style(truncate(&book.title, 60)).bold());
    println!("  by {}", book.author);
    print!("  {} | {} views", book.category(), book.views());
    if book.file.is_empty() {
        print!("  {}", style("no PDF").yellow());
    }
    println!();
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}
