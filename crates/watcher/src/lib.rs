//! File system watching engine for inwatch
//!
//! This crate provides the inotify-facing core:
//! - Watch table mapping kernel watch descriptors back to paths
//! - Path registration (single paths, directory trees, symlink pairs)
//! - Decoding of the raw inotify record stream into events
//! - A reporter for non-fatal failures

pub mod context;
pub mod decoder;
pub mod error;
pub mod event;
pub mod kernel;
pub mod mask;
pub mod registrar;
pub mod report;
pub mod table;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-exports
pub use context::NotifyContext;
pub use decoder::{DecodeBuffer, DEFAULT_BUFFER_SIZE, HEADER_SIZE, MIN_BUFFER_SIZE};
pub use error::WatchError;
pub use event::{kind_names, Event};
pub use kernel::{Inotify, NotifyBackend, WatchId};
pub use mask::{CaptureMask, EventMask};
pub use report::Reporter;
pub use table::{WatchEntry, WatchTable, WATCH_STRIDE};
