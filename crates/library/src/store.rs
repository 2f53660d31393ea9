// FILE: crates/library/src/store.rs

//! Whole-file JSON persistence for the catalog
//!
//! The catalog is read and written as a unit. Writes go through a temp file in
//! the same directory followed by a rename, so readers only ever see the old or
//! the new catalog, never a partial one.
//!
//! The on-disk layout is four-space indented JSON with every non-ASCII
//! character written as a `\uXXXX` escape, the format existing catalogs use.

use crate::error::{CatalogError, Result};
use log::{debug, info, warn};
use perpus_config::{CorruptCatalogPolicy, LibraryConfig};
use perpus_core::Book;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// Four-space pretty printer that escapes everything outside printable ASCII
struct CatalogFormatter {
    pretty: PrettyFormatter<'static>,
}

impl CatalogFormatter {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"    "),
        }
    }
}

impl Formatter for CatalogFormatter {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c <= '~' {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serializes `books` in the catalog's on-disk format
pub fn to_catalog_json(books: &[Book]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, CatalogFormatter::new());
    books.serialize(&mut ser)?;
    Ok(buf)
}

/// Reads and writes the catalog file
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
    on_corrupt: CorruptCatalogPolicy,
}

impl CatalogStore {
    /// Creates a store for `path` using the default corrupt-file policy
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            on_corrupt: CorruptCatalogPolicy::TreatAsEmpty,
        }
    }

    /// Creates a store from library settings, resolving relative paths against `root`
    pub fn from_config(config: &LibraryConfig, root: &Path) -> Self {
        Self::new(config.catalog_path_in(root)).with_policy(config.on_corrupt)
    }

    pub fn with_policy(mut self, policy: CorruptCatalogPolicy) -> Self {
        self.on_corrupt = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> CorruptCatalogPolicy {
        self.on_corrupt
    }

    /// File name prefix shared by every preserved copy of an unparseable catalog
    pub fn quarantine_prefix(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catalog".to_string());
        format!("{}.corrupt-", name)
    }

    /// Preserves `bytes` next to the catalog without touching earlier copies
    ///
    /// Loading the same corrupt file twice reuses the copy already made.
    fn quarantine(&self, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.parent_dir();
        let prefix = self.quarantine_prefix();

        let entries = fs::read_dir(&dir).map_err(|e| CatalogError::io(&dir, e))?;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_copy = entry.file_name().to_string_lossy().starts_with(&prefix);
            if is_copy && fs::read(&path).map(|existing| existing == bytes).unwrap_or(false) {
                debug!("Corrupt catalog already preserved at {}", path.display());
                return Ok(path);
            }
        }

        let mut copy = Builder::new()
            .prefix(&prefix)
            .tempfile_in(&dir)
            .map_err(|e| CatalogError::io(&dir, e))?;
        copy.write_all(bytes)
            .and_then(|_| copy.as_file().sync_all())
            .map_err(|e| CatalogError::io(copy.path(), e))?;
        let (_, path) = copy
            .keep()
            .map_err(|e| CatalogError::io(e.file.path(), e.error))?;
        Ok(path)
    }

    /// Loads the catalog in file order
    ///
    /// A missing or blank file is an empty catalog. Unparseable content follows
    /// the configured [`CorruptCatalogPolicy`].
    pub fn load(&self) -> Result<Vec<Book>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "Catalog not found at {}, starting empty",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(CatalogError::io(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!("Catalog at {} is blank", self.path.display());
            return Ok(Vec::new());
        }

        match serde_json::from_slice::<Vec<Book>>(&bytes) {
            Ok(books) => {
                debug!("Loaded {} books from {}", books.len(), self.path.display());
                Ok(books)
            }
            Err(source) => match self.on_corrupt {
                CorruptCatalogPolicy::Reject => Err(CatalogError::Corrupt {
                    path: self.path.clone(),
                    source,
                }),
                CorruptCatalogPolicy::TreatAsEmpty => {
                    let quarantine = self.quarantine(&bytes)?;
                    warn!(
                        "Catalog at {} is not valid JSON ({}); treating it as empty, original kept at {}",
                        self.path.display(),
                        source,
                        quarantine.display()
                    );
                    Ok(Vec::new())
                }
            },
        }
    }

    /// Replaces the catalog file with `books`
    pub fn save(&self, books: &[Book]) -> Result<()> {
        let json = to_catalog_json(books)?;

        let dir = self.parent_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| CatalogError::io(&dir, e))?;
            info!("Created catalog directory: {}", dir.display());
        }

        let mut temp_file = NamedTempFile::new_in(&dir).map_err(|e| CatalogError::io(&dir, e))?;
        temp_file
            .write_all(&json)
            .and_then(|_| temp_file.flush())
            .and_then(|_| temp_file.as_file().sync_all())
            .map_err(|e| CatalogError::io(temp_file.path(), e))?;

        temp_file
            .persist(&self.path)
            .map_err(|e| CatalogError::io(&self.path, e.error))?;

        info!("Saved {} books to {}", books.len(), self.path.display());
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
