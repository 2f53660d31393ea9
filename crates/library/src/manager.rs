// FILE: crates/library/src/manager.rs

use crate::error::{CatalogError, CleanupWarning, Result};
use crate::media::{filename_base, MediaKind, MediaSource, MediaStore, MediaTransaction, ResolvedMedia, StagedFile};
use crate::query;
use crate::store::CatalogStore;
use log::{debug, info, warn};
use perpus_config::LibraryConfig;
use perpus_core::{Book, BookRef, CatalogFilter, CatalogStats, SortMode, DEFAULT_CATEGORY, DEFAULT_POPULAR_LIMIT};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A book to add, with both uploads
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    /// `None` files the book under the default category
    pub category: Option<String>,
    pub pdf: MediaSource,
    pub cover: MediaSource,
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        pdf: MediaSource,
        cover: MediaSource,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            category: None,
            pdf,
            cover,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Replacement values for an existing book
///
/// Title, author and category always overwrite. Media is replaced only when
/// a new upload is supplied.
#[derive(Debug, Clone)]
pub struct BookPatch {
    pub title: String,
    pub author: String,
    pub category: String,
    pub pdf: Option<MediaSource>,
    pub cover: Option<MediaSource>,
}

impl BookPatch {
    /// A patch that leaves `book` as it is
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category().to_string(),
            pdf: None,
            cover: None,
        }
    }
}

/// Result of a confirmed deletion
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub removed: Book,
    /// Media cleanup steps that failed; the record is gone regardless
    pub warnings: Vec<CleanupWarning>,
}

/// Catalog operations over one library root
///
/// Every mutation is a load, modify, save cycle under an exclusive lock, so
/// concurrent callers in one process never lose each other's updates.
pub struct LibraryManager {
    store: CatalogStore,
    media: MediaStore,
    popular_limit: usize,
    lock: RwLock<()>,
}

impl LibraryManager {
    pub fn new(store: CatalogStore, media: MediaStore) -> Self {
        Self {
            store,
            media,
            popular_limit: DEFAULT_POPULAR_LIMIT,
            lock: RwLock::new(()),
        }
    }

    /// Creates a manager from library settings, resolving relative paths against `root`
    pub fn from_config(config: &LibraryConfig, root: &Path) -> Self {
        info!("Opening library at {}", root.display());
        Self::new(
            CatalogStore::from_config(config, root),
            MediaStore::from_config(config, root),
        )
        .with_popular_limit(config.popular_limit)
    }

    pub fn with_popular_limit(mut self, limit: usize) -> Self {
        self.popular_limit = limit;
        self
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    pub fn popular_limit(&self) -> usize {
        self.popular_limit
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads the whole catalog in stored order
    pub fn load(&self) -> Result<Vec<Book>> {
        let _guard = self.read_lock();
        self.store.load()
    }

    /// Filtered and optionally sorted view of the catalog
    pub fn list(&self, filter: &CatalogFilter, sort: Option<SortMode>) -> Result<Vec<Book>> {
        Ok(query::list(&self.load()?, filter, sort))
    }

    /// Most-viewed books; `None` uses the configured limit
    pub fn most_popular(&self, n: Option<usize>) -> Result<Vec<Book>> {
        Ok(query::most_popular(&self.load()?, n.unwrap_or(self.popular_limit)))
    }

    pub fn categories(&self) -> Result<Vec<String>> {
        Ok(query::categories(&self.load()?))
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        Ok(query::stats(&self.load()?))
    }

    pub fn get(&self, reference: &BookRef) -> Result<Book> {
        let catalog = self.load()?;
        query::find(&catalog, reference)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(reference.to_string()))
    }

    pub fn resolve_media(&self, book: &Book) -> ResolvedMedia {
        self.media.resolve(book)
    }

    /// Counts one view of the first book matching `title` and `author`
    ///
    /// Returns false without writing anything if no book matches.
    pub fn increment_view(&self, title: &str, author: &str) -> Result<bool> {
        let _guard = self.write_lock();
        let mut catalog = self.store.load()?;

        if !query::increment_view(&mut catalog, title, author) {
            debug!("No book '{}' by {} to count a view for", title, author);
            return Ok(false);
        }

        self.store.save(&catalog)?;
        Ok(true)
    }

    /// Stores both uploads and appends the new record
    ///
    /// Either the record and both files all land, or none of them do.
    pub fn add_book(&self, new: NewBook) -> Result<Book> {
        let title = required("title", &new.title)?;
        let author = required("author", &new.author)?;
        let category = match &new.category {
            Some(category) => required("category", category)?,
            None => DEFAULT_CATEGORY.to_string(),
        };
        let base = filename_base(&title)?;

        let _guard = self.write_lock();
        let mut catalog = self.store.load()?;

        let pdf_name = MediaKind::Pdf.file_name(&base);
        let cover_name = MediaKind::Cover.file_name(&base);
        self.ensure_unreferenced(&catalog, None, MediaKind::Pdf, &pdf_name)?;
        self.ensure_unreferenced(&catalog, None, MediaKind::Cover, &cover_name)?;

        let staged_pdf = self.media.stage(MediaKind::Pdf, &base, &new.pdf)?;
        let staged_cover = self.media.stage(MediaKind::Cover, &base, &new.cover)?;

        let mut tx = MediaTransaction::new();
        tx.place(staged_pdf, false)?;
        tx.place(staged_cover, false)?;

        let book = Book::new(title, author)
            .with_category(category)
            .with_media(pdf_name, cover_name);
        catalog.push(book.clone());
        self.store.save(&catalog)?;
        tx.commit();

        info!("Added {}", book);
        Ok(book)
    }

    /// Overwrites the metadata of an existing book, replacing media that was re-uploaded
    ///
    /// The view count is kept. Superseded media is removed best-effort after
    /// the catalog is saved.
    pub fn update_book(&self, reference: &BookRef, patch: BookPatch) -> Result<Book> {
        let title = required("title", &patch.title)?;
        let author = required("author", &patch.author)?;
        let category = required("category", &patch.category)?;

        let _guard = self.write_lock();
        let mut catalog = self.store.load()?;
        let index = reference
            .position(&catalog)
            .ok_or_else(|| CatalogError::NotFound(reference.to_string()))?;
        let current = catalog[index].clone();

        let mut updated = current.clone();
        updated.title = title;
        updated.author = author;
        updated.category = Some(category);

        let mut staged: Vec<(StagedFile, bool)> = Vec::new();
        let mut superseded: Vec<(MediaKind, String)> = Vec::new();

        if patch.pdf.is_some() || patch.cover.is_some() {
            let base = filename_base(&updated.title)?;
            let uploads = [(MediaKind::Pdf, &patch.pdf), (MediaKind::Cover, &patch.cover)];

            for (kind, source) in uploads {
                let Some(source) = source else { continue };
                let new_name = kind.file_name(&base);
                let old_name = match kind {
                    MediaKind::Pdf => &mut updated.file,
                    MediaKind::Cover => &mut updated.cover,
                };

                self.ensure_unreferenced(&catalog, Some(index), kind, &new_name)?;
                let may_replace = *old_name == new_name;
                staged.push((self.media.stage(kind, &base, source)?, may_replace));

                if !may_replace && !old_name.is_empty() {
                    superseded.push((kind, old_name.clone()));
                }
                *old_name = new_name;
            }
        }

        let mut tx = MediaTransaction::new();
        for (file, may_replace) in staged {
            tx.place(file, may_replace)?;
        }

        catalog[index] = updated.clone();
        self.store.save(&catalog)?;
        tx.commit();
        info!("Updated {} (was {})", updated, current.key());

        for (kind, name) in superseded {
            if is_referenced(&catalog, None, kind, &name) {
                debug!("Keeping {} {}, still referenced", kind, name);
                continue;
            }
            if let Some(warning) = self.media.remove(kind, &name) {
                warn!("Could not remove superseded {}: {}", kind, warning);
            }
        }

        Ok(updated)
    }

    /// Removes a book and then its media
    ///
    /// Refuses to act unless `confirmed` is set. Media that cannot be removed
    /// is reported in the outcome, not as an error.
    pub fn delete_book(&self, reference: &BookRef, confirmed: bool) -> Result<DeleteOutcome> {
        if !confirmed {
            return Err(CatalogError::ConfirmationRequired(reference.to_string()));
        }

        let _guard = self.write_lock();
        let mut catalog = self.store.load()?;
        let index = reference
            .position(&catalog)
            .ok_or_else(|| CatalogError::NotFound(reference.to_string()))?;

        let removed = catalog.remove(index);
        self.store.save(&catalog)?;
        info!("Deleted {}", removed);

        let mut warnings = Vec::new();
        for (kind, name) in [(MediaKind::Pdf, &removed.file), (MediaKind::Cover, &removed.cover)] {
            if is_referenced(&catalog, None, kind, name) {
                debug!("Keeping {} {}, still referenced", kind, name);
                continue;
            }
            if let Some(warning) = self.media.remove(kind, name) {
                warn!("{}", warning);
                warnings.push(warning);
            }
        }

        Ok(DeleteOutcome { removed, warnings })
    }

    fn ensure_unreferenced(
        &self,
        catalog: &[Book],
        skip: Option<usize>,
        kind: MediaKind,
        name: &str,
    ) -> Result<()> {
        if is_referenced(catalog, skip, kind, name) {
            return Err(CatalogError::DuplicateResource(self.media.dir(kind).join(name)));
        }
        Ok(())
    }
}

fn is_referenced(catalog: &[Book], skip: Option<usize>, kind: MediaKind, name: &str) -> bool {
    !name.is_empty()
        && catalog
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .any(|(_, b)| match kind {
                MediaKind::Pdf => b.file == name,
                MediaKind::Cover => b.cover == name,
            })
}

fn required(field: &str, value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(CatalogError::validation(field, "must not be empty"));
    }
    Ok(value.to_string())
}
