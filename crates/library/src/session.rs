// FILE: crates/library/src/session.rs

use crate::error::Result;
use crate::manager::LibraryManager;
use log::debug;
use perpus_core::{Book, BookKey};

/// One reader opening one book
///
/// A session counts at most one view no matter how often the reader view is
/// refreshed.
#[derive(Debug, Clone)]
pub struct ReadingSession {
    key: BookKey,
    counted: bool,
}

impl ReadingSession {
    pub fn open(book: &Book) -> Self {
        Self {
            key: book.key(),
            counted: false,
        }
    }

    pub fn key(&self) -> &BookKey {
        &self.key
    }

    pub fn is_counted(&self) -> bool {
        self.counted
    }

    /// Counts the view if this session has not already done so
    ///
    /// Returns true only for the call that actually incremented the count.
    pub fn record_view(&mut self, manager: &LibraryManager) -> Result<bool> {
        if self.counted {
            debug!("View of {} already counted", self.key);
            return Ok(false);
        }

        self.counted = manager.increment_view(&self.key.title, &self.key.author)?;
        Ok(self.counted)
    }
}
