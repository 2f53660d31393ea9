// FILE: crates/library/src/media.rs

//! PDF and cover storage
//!
//! Uploads are staged into temp files inside their destination directory and
//! only then moved into place, under a [`MediaTransaction`] that undoes every
//! placement unless it is committed.

use crate::error::{CatalogError, CleanupWarning, Result};
use log::{debug, info, warn};
use perpus_config::LibraryConfig;
use perpus_core::Book;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::{Builder, NamedTempFile, TempPath};

/// The two kinds of media a record references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Pdf,
    Cover,
}

impl MediaKind {
    /// Fixed extension used for stored files, whatever the upload format
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Pdf => "pdf",
            MediaKind::Cover => "jpg",
        }
    }

    /// Stored filename for a given base
    pub fn file_name(&self, base: &str) -> String {
        format!("{}.{}", base, self.extension())
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Pdf => write!(f, "PDF"),
            MediaKind::Cover => write!(f, "cover"),
        }
    }
}

/// An upload handed over by the front-end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Upload already held in memory
    Bytes(Vec<u8>),
    /// Upload staged on disk; the file is copied, never moved
    File(PathBuf),
}

impl MediaSource {
    fn copy_into(&self, dest: &mut impl Write) -> Result<()> {
        match self {
            MediaSource::Bytes(bytes) => dest
                .write_all(bytes)
                .map_err(|e| CatalogError::io("<upload>", e)),
            MediaSource::File(path) => {
                let mut file = File::open(path).map_err(|e| CatalogError::io(path, e))?;
                io::copy(&mut file, dest)
                    .map(|_| ())
                    .map_err(|e| CatalogError::io(path, e))
            }
        }
    }
}

/// Derives the stored filename base from a title
///
/// Lower-cases the title and replaces each whitespace character with `_`.
/// Titles that would produce an empty base or escape the media directory are
/// rejected.
pub fn filename_base(title: &str) -> Result<String> {
    let base: String = title
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>()
        .to_lowercase();

    if base.trim_matches('_').is_empty() {
        return Err(CatalogError::validation(
            "title",
            "must contain at least one non-whitespace character",
        ));
    }

    if base == "." || base == ".." || base.contains(['/', '\\', '\0']) {
        return Err(CatalogError::validation(
            "title",
            format!("'{}' cannot be used as a file name", title),
        ));
    }

    Ok(base)
}

/// Where a record's media file stands on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaStatus {
    Present(PathBuf),
    Missing(PathBuf),
    /// No filename recorded, or one that points outside the media directory
    Unavailable,
}

impl MediaStatus {
    pub fn path(&self) -> Option<&Path> {
        match self {
            MediaStatus::Present(path) | MediaStatus::Missing(path) => Some(path),
            MediaStatus::Unavailable => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, MediaStatus::Present(_))
    }
}

/// Resolved media of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub pdf: MediaStatus,
    pub cover: MediaStatus,
}

/// A staged upload waiting to be moved into place
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    dest: PathBuf,
}

/// The books and covers directories
#[derive(Debug, Clone)]
pub struct MediaStore {
    books_dir: PathBuf,
    covers_dir: PathBuf,
}

impl MediaStore {
    pub fn new(books_dir: impl Into<PathBuf>, covers_dir: impl Into<PathBuf>) -> Self {
        Self {
            books_dir: books_dir.into(),
            covers_dir: covers_dir.into(),
        }
    }

    /// Creates a store from library settings, resolving relative paths against `root`
    pub fn from_config(config: &LibraryConfig, root: &Path) -> Self {
        Self::new(config.books_dir_in(root), config.covers_dir_in(root))
    }

    pub fn dir(&self, kind: MediaKind) -> &Path {
        match kind {
            MediaKind::Pdf => &self.books_dir,
            MediaKind::Cover => &self.covers_dir,
        }
    }

    /// Full path of a stored file, or None if `name` is not a plain file name
    pub fn path_for(&self, kind: MediaKind, name: &str) -> Option<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Some(self.dir(kind).join(name)),
            _ => None,
        }
    }

    fn status(&self, kind: MediaKind, name: &str) -> MediaStatus {
        match self.path_for(kind, name) {
            Some(path) if path.is_file() => MediaStatus::Present(path),
            Some(path) => MediaStatus::Missing(path),
            None => MediaStatus::Unavailable,
        }
    }

    /// Looks up the PDF and cover of `book`; absence is reported, not an error
    pub fn resolve(&self, book: &Book) -> ResolvedMedia {
        ResolvedMedia {
            pdf: self.status(MediaKind::Pdf, &book.file),
            cover: self.status(MediaKind::Cover, &book.cover),
        }
    }

    /// Copies `source` into a temp file next to its final destination
    pub fn stage(&self, kind: MediaKind, base: &str, source: &MediaSource) -> Result<StagedFile> {
        let dir = self.dir(kind);
        fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;

        let dest = dir.join(kind.file_name(base));
        let mut temp = Builder::new()
            .prefix(".upload-")
            .tempfile_in(dir)
            .map_err(|e| CatalogError::io(dir, e))?;

        source.copy_into(&mut temp)?;
        temp.flush()
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| CatalogError::io(temp.path(), e))?;

        debug!("Staged {} upload for {}", kind, dest.display());
        Ok(StagedFile { temp, dest })
    }

    /// Removes a stored file, reporting any failure as a warning
    ///
    /// An empty name means nothing was recorded and is not reported.
    pub fn remove(&self, kind: MediaKind, name: &str) -> Option<CleanupWarning> {
        if name.is_empty() {
            return None;
        }

        let Some(path) = self.path_for(kind, name) else {
            return Some(CleanupWarning::new(
                name,
                format!("{} name points outside {}", kind, self.dir(kind).display()),
            ));
        };

        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed {} {}", kind, path.display());
                None
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Some(CleanupWarning::new(path, format!("{} was already absent", kind)))
            }
            Err(e) => {
                warn!("Failed to remove {}: {}", path.display(), e);
                Some(CleanupWarning::new(path, e.to_string()))
            }
        }
    }
}

struct PlacedFile {
    path: PathBuf,
    displaced: Option<TempPath>,
}

/// Moves staged uploads into place and undoes them unless committed
///
/// Dropping an uncommitted transaction removes every placed file and puts back
/// any file it displaced, newest first.
#[derive(Default)]
pub struct MediaTransaction {
    placed: Vec<PlacedFile>,
    committed: bool,
}

impl MediaTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `staged` to its destination
    ///
    /// An existing destination is an error unless `may_replace` is set, in
    /// which case it is set aside until commit.
    pub fn place(&mut self, staged: StagedFile, may_replace: bool) -> Result<PathBuf> {
        let StagedFile { temp, dest } = staged;

        let displaced = if may_replace && dest.exists() {
            let dir = dest.parent().unwrap_or(Path::new("."));
            let backup = Builder::new()
                .prefix(".displaced-")
                .tempfile_in(dir)
                .map_err(|e| CatalogError::io(dir, e))?
                .into_temp_path();
            fs::rename(&dest, &backup).map_err(|e| CatalogError::io(&dest, e))?;
            debug!("Set aside {} during replacement", dest.display());
            Some(backup)
        } else {
            None
        };

        let persisted = if displaced.is_some() {
            temp.persist(&dest)
        } else {
            temp.persist_noclobber(&dest)
        };

        if let Err(e) = persisted {
            if let Some(backup) = displaced {
                if let Err(restore) = fs::rename(&backup, &dest) {
                    warn!("Failed to restore {}: {}", dest.display(), restore);
                }
            }
            return Err(if e.error.kind() == io::ErrorKind::AlreadyExists {
                CatalogError::DuplicateResource(dest)
            } else {
                CatalogError::io(&dest, e.error)
            });
        }

        self.placed.push(PlacedFile {
            path: dest.clone(),
            displaced,
        });
        Ok(dest)
    }

    /// Keeps every placed file and discards the displaced originals
    pub fn commit(mut self) {
        self.committed = true;
        self.placed.clear();
    }

    fn rollback(&mut self) {
        for placed in self.placed.drain(..).rev() {
            if let Err(e) = fs::remove_file(&placed.path) {
                warn!("Rollback could not remove {}: {}", placed.path.display(), e);
            }
            if let Some(backup) = placed.displaced {
                if let Err(e) = fs::rename(&backup, &placed.path) {
                    warn!("Rollback could not restore {}: {}", placed.path.display(), e);
                }
            }
            debug!("Rolled back {}", placed.path.display());
        }
    }
}

impl Drop for MediaTransaction {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_media() -> (TempDir, MediaStore) {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let media = MediaStore::new(temp.path().join("books"), temp.path().join("covers"));
        (temp, media)
    }

    #[test]
    fn test_filename_base() {
        assert_eq!(filename_base("Laskar Pelangi").unwrap(), "laskar_pelangi");
        assert_eq!(filename_base("Bumi\tManusia").unwrap(), "bumi_manusia");
        assert_eq!(filename_base("Dune ").unwrap(), "dune_");
    }

    #[test]
    fn test_filename_base_rejects_unusable_titles() {
        assert!(filename_base("   ").is_err());
        assert!(filename_base("..").is_err());
        assert!(filename_base("a/b").is_err());
        assert!(filename_base("a\\b").is_err());
    }

    #[test]
    fn test_path_for_rejects_traversal() {
        let media = MediaStore::new("/lib/books", "/lib/covers");
        assert_eq!(
            media.path_for(MediaKind::Pdf, "dune.pdf"),
            Some(PathBuf::from("/lib/books/dune.pdf"))
        );
        assert!(media.path_for(MediaKind::Pdf, "../secret.pdf").is_none());
        assert!(media.path_for(MediaKind::Cover, "/etc/passwd").is_none());
        assert!(media.path_for(MediaKind::Cover, "").is_none());
    }

    #[test]
    fn test_stage_and_place() {
        let (_temp, media) = setup_media();
        let staged = media
            .stage(MediaKind::Pdf, "dune", &MediaSource::Bytes(b"%PDF".to_vec()))
            .unwrap();

        let mut tx = MediaTransaction::new();
        let path = tx.place(staged, false).unwrap();
        tx.commit();

        assert_eq!(fs::read(path).unwrap(), b"%PDF");
    }

    #[test]
    fn test_uncommitted_transaction_rolls_back() {
        let (_temp, media) = setup_media();
        let staged = media
            .stage(MediaKind::Cover, "dune", &MediaSource::Bytes(vec![1, 2, 3]))
            .unwrap();

        let path = {
            let mut tx = MediaTransaction::new();
            tx.place(staged, false).unwrap()
        };

        assert!(!path.exists());
    }

    #[test]
    fn test_rollback_restores_displaced_file() {
        let (_temp, media) = setup_media();
        fs::create_dir_all(media.dir(MediaKind::Pdf)).unwrap();
        let dest = media.dir(MediaKind::Pdf).join("dune.pdf");
        fs::write(&dest, b"old").unwrap();

        let staged = media
            .stage(MediaKind::Pdf, "dune", &MediaSource::Bytes(b"new".to_vec()))
            .unwrap();
        {
            let mut tx = MediaTransaction::new();
            tx.place(staged, true).unwrap();
            assert_eq!(fs::read(&dest).unwrap(), b"new");
        }

        assert_eq!(fs::read(&dest).unwrap(), b"old");
    }

    #[test]
    fn test_place_refuses_existing_without_replace() {
        let (_temp, media) = setup_media();
        fs::create_dir_all(media.dir(MediaKind::Pdf)).unwrap();
        fs::write(media.dir(MediaKind::Pdf).join("dune.pdf"), b"old").unwrap();

        let staged = media
            .stage(MediaKind::Pdf, "dune", &MediaSource::Bytes(b"new".to_vec()))
            .unwrap();
        let mut tx = MediaTransaction::new();
        let result = tx.place(staged, false);

        assert!(matches!(result, Err(CatalogError::DuplicateResource(_))));
    }

    #[test]
    fn test_stage_missing_source_file() {
        let (temp, media) = setup_media();
        let source = MediaSource::File(temp.path().join("nope.pdf"));
        assert!(matches!(
            media.stage(MediaKind::Pdf, "x", &source),
            Err(CatalogError::Io { .. })
        ));
    }

    #[test]
    fn test_remove_reports_absent_file() {
        let (_temp, media) = setup_media();
        let warning = media.remove(MediaKind::Pdf, "ghost.pdf").unwrap();
        assert!(warning.reason.contains("already absent"));
        assert!(media.remove(MediaKind::Pdf, "").is_none());
    }
}
