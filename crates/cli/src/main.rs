// FILE: crates/cli/src/main.rs

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use perpus_config::ConfigManager;
use perpus_library::LibraryManager;
use std::path::PathBuf;

mod auth;
mod commands;

use auth::SharedSecret;
use commands::AppContext;

fn book_arg() -> Arg {
    Arg::new("book")
        .required(true)
        .value_name("BOOK")
        .help("Book title (with --author) or #N for a catalog position")
}

fn author_arg() -> Arg {
    Arg::new("author")
        .short('a')
        .long("author")
        .value_name("AUTHOR")
        .help("Author of the book named by BOOK")
}

fn category_arg() -> Arg {
    Arg::new("category")
        .short('c')
        .long("category")
        .value_name("CATEGORY")
        .help("Only books in this category")
}

fn sort_arg() -> Arg {
    Arg::new("sort")
        .short('s')
        .long("sort")
        .value_name("MODE")
        .help("Sort order: title, title-desc, author, popular, category")
}

fn build_cli() -> Command {
    Command::new("perpus")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Perpus Contributors")
        .about("Digital library catalog for PDF books")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the platform config dir)")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("DIR")
                .help("Library root that relative catalog and media paths resolve against")
                .value_parser(value_parser!(PathBuf))
                .default_value(".")
                .global(true),
        )
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .value_name("PASSWORD")
                .help("Admin password for add, edit and delete")
                .env("PERPUS_ADMIN_PASSWORD")
                .hide_env_values(true)
                .global(true),
        )
        .subcommand(
            Command::new("list")
                .about("List books in the library")
                .arg(category_arg())
                .arg(sort_arg()),
        )
        .subcommand(
            Command::new("search")
                .about("Search titles and authors")
                .arg(Arg::new("keyword").required(true).value_name("KEYWORD").help("Case-insensitive keyword"))
                .arg(category_arg())
                .arg(sort_arg()),
        )
        .subcommand(
            Command::new("popular")
                .about("Show the most-viewed books")
                .arg(
                    Arg::new("limit")
                        .short('n')
                        .long("limit")
                        .value_name("N")
                        .help("Number of books (defaults to library.popular_limit)")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(Command::new("categories").about("List categories"))
        .subcommand(Command::new("stats").about("Show library statistics"))
        .subcommand(
            Command::new("info")
                .about("Show detailed information about a book")
                .arg(book_arg())
                .arg(author_arg()),
        )
        .subcommand(
            Command::new("read")
                .about("Open a book: print its PDF path and count the view")
                .arg(book_arg())
                .arg(author_arg()),
        )
        .subcommand(
            Command::new("add")
                .about("Upload a new book (admin)")
                .arg(Arg::new("title").short('t').long("title").required(true).value_name("TITLE").help("Book title"))
                .arg(Arg::new("author").short('a').long("author").required(true).value_name("AUTHOR").help("Book author"))
                .arg(Arg::new("category").short('c').long("category").value_name("CATEGORY").help("Category (defaults to Lainnya)"))
                .arg(Arg::new("pdf").long("pdf").required(true).value_name("FILE").help("PDF to upload").value_parser(value_parser!(PathBuf)))
                .arg(Arg::new("cover").long("cover").required(true).value_name("FILE").help("Cover image to upload").value_parser(value_parser!(PathBuf))),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit a book (admin)")
                .arg(book_arg())
                .arg(author_arg())
                .arg(Arg::new("set-title").long("set-title").value_name("TITLE").help("New title"))
                .arg(Arg::new("set-author").long("set-author").value_name("AUTHOR").help("New author"))
                .arg(Arg::new("category").short('c').long("category").value_name("CATEGORY").help("New category"))
                .arg(Arg::new("pdf").long("pdf").value_name("FILE").help("Replacement PDF").value_parser(value_parser!(PathBuf)))
                .arg(Arg::new("cover").long("cover").value_name("FILE").help("Replacement cover image").value_parser(value_parser!(PathBuf))),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a book and its files (admin)")
                .arg(book_arg())
                .arg(author_arg())
                .arg(Arg::new("yes").short('y').long("yes").help("Skip confirmation prompt").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("export")
                .about("Export the catalog")
                .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Output file path").value_parser(value_parser!(PathBuf)))
                .arg(Arg::new("format").short('f').long("format").value_name("FORMAT").help("Export format").value_parser(["json", "csv"]).default_value("json"))
                .arg(category_arg())
                .arg(sort_arg()),
        )
        .subcommand(Command::new("init-config").about("Write a default config file"))
}

fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    match matches.get_one::<PathBuf>("config") {
        Some(dir) => ConfigManager::with_directory(dir.clone()),
        None => ConfigManager::new(),
    }
    .context("Failed to locate config directory")
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let config_manager = config_manager(&matches)?;
    let config = config_manager
        .load_with_env_overrides()
        .context("Failed to load config")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.as_filter()),
    )
    .init();
    log::debug!("Using config at {}", config_manager.config_path().display());

    if let Some(("init-config", _)) = matches.subcommand() {
        return commands::init_config(&config_manager);
    }

    if let Err(errors) = config.validate() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        bail!("Invalid config: {}", messages.join("; "));
    }

    let root = matches
        .get_one::<PathBuf>("root")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let root = std::path::absolute(&root)
        .with_context(|| format!("Failed to resolve library root {}", root.display()))?;

    let ctx = AppContext {
        manager: LibraryManager::from_config(&config.library, &root),
        authorizer: Box::new(SharedSecret::new(config.app.admin_password.clone())),
        password: matches.get_one::<String>("password").cloned(),
        config,
    };

    match matches.subcommand() {
        Some(("list", sub_matches)) => commands::list_books(&ctx, sub_matches),
        Some(("search", sub_matches)) => commands::search_books(&ctx, sub_matches),
        Some(("popular", sub_matches)) => commands::show_popular(&ctx, sub_matches),
        Some(("categories", _)) => commands::list_categories(&ctx),
        Some(("stats", _)) => commands::show_stats(&ctx),
        Some(("info", sub_matches)) => commands::show_book_info(&ctx, sub_matches),
        Some(("read", sub_matches)) => commands::read_book(&ctx, sub_matches),
        Some(("add", sub_matches)) => commands::add_book(&ctx, sub_matches),
        Some(("edit", sub_matches)) => commands::edit_book(&ctx, sub_matches),
        Some(("delete", sub_matches)) => commands::delete_book(&ctx, sub_matches),
        Some(("export", sub_matches)) => commands::export_library(&ctx, sub_matches),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
