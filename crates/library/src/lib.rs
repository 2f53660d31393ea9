//! Perpus Library Management
//!
//! Catalog persistence, queries and media storage for a folder-backed PDF
//! library. All operations are synchronous and work on the whole catalog.

pub mod error;
pub mod manager;
pub mod media;
pub mod query;
pub mod session;
pub mod store;

pub use error::{CatalogError, CatalogResult, CleanupWarning};
pub use manager::{BookPatch, DeleteOutcome, LibraryManager, NewBook};
pub use media::{filename_base, MediaKind, MediaSource, MediaStatus, MediaStore, MediaTransaction, ResolvedMedia};
pub use session::ReadingSession;
pub use store::CatalogStore;
