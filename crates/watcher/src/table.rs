//! Watch table: kernel watch descriptor -> registered path
//!
//! The table has two phases. During setup entries are appended in whatever
//! order registration produces them; [`WatchTable::freeze`] then sorts them
//! once by descriptor, after which only lookups are allowed.

use crate::error::WatchError;
use crate::kernel::WatchId;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Entries are allocated in blocks of this many slots
pub const WATCH_STRIDE: usize = 256;

/// One registered watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    pub id: WatchId,
    pub path: PathBuf,
}

/// Append-only table of watches with a sorted lookup phase
#[derive(Debug, Default)]
pub struct WatchTable {
    entries: Vec<WatchEntry>,
    frozen: bool,
}

impl WatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make room for one more entry, growing by a whole block when full
    pub fn reserve_slot(&mut self) -> Result<(), WatchError> {
        if self.entries.len() < self.entries.capacity() {
            return Ok(());
        }

        let requested = self.entries.len() + WATCH_STRIDE;
        self.entries
            .try_reserve_exact(WATCH_STRIDE)
            .map_err(|source| WatchError::Alloc { requested, source })?;
        debug!(capacity = self.entries.capacity(), "watch table grown");
        Ok(())
    }

    /// Append a watch
    ///
    /// # Panics
    /// If the table has already been frozen.
    pub fn insert(&mut self, id: WatchId, path: PathBuf) -> Result<(), WatchError> {
        assert!(!self.frozen, "watch table is frozen; insert must precede freeze");
        self.reserve_slot()?;
        self.entries.push(WatchEntry { id, path });
        Ok(())
    }

    /// Sort by descriptor and switch to the lookup phase
    ///
    /// The kernel hands out the same descriptor when one inode is watched
    /// through two paths; only the first registration is kept.
    ///
    /// # Panics
    /// If called twice.
    pub fn freeze(&mut self) {
        assert!(!self.frozen, "watch table frozen twice");
        self.entries.sort_by_key(|entry| entry.id);

        let before = self.entries.len();
        self.entries.dedup_by_key(|entry| entry.id);
        if self.entries.len() != before {
            debug!(dropped = before - self.entries.len(), "merged watches sharing a descriptor");
        }

        self.frozen = true;
    }

    /// Path registered for `id`, or `None` for unknown descriptors
    pub fn lookup(&self, id: WatchId) -> Option<&Path> {
        debug_assert!(self.frozen, "lookup before freeze");
        self.entries
            .binary_search_by_key(&id, |entry| entry.id)
            .ok()
            .map(|index| self.entries[index].path.as_path())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Allocated slots (always a whole number of blocks)
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchEntry> {
        self.entries.iter()
    }
}
