//! Notification context: kernel handle, watch table and read buffer
//!
//! Lifecycle is build, freeze, decode:
//! 1. [`NotifyContext::open`] the kernel facility
//! 2. register paths with [`NotifyContext::add_watch`]
//! 3. [`NotifyContext::freeze`] the watch table
//! 4. drain events with [`NotifyContext::next_event`]
//!
//! Dropping the context closes the kernel descriptor.

use crate::decoder::DecodeBuffer;
use crate::error::WatchError;
use crate::kernel::{Inotify, NotifyBackend};
use crate::report::Reporter;
use crate::table::WatchTable;
use tracing::info;

/// Everything the engine owns for the lifetime of the process
#[derive(Debug)]
pub struct NotifyContext<B = Inotify> {
    pub(crate) backend: B,
    pub(crate) table: WatchTable,
    pub(crate) buffer: DecodeBuffer,
    pub(crate) reporter: Reporter,
}

impl NotifyContext<Inotify> {
    /// Open an inotify instance
    ///
    /// Failure here means no watching is possible at all; callers treat it
    /// as fatal.
    pub fn open(reporter: Reporter, buffer_size: usize) -> Result<Self, WatchError> {
        let backend = Inotify::init().map_err(WatchError::Init)?;
        info!(buffer_size, "inotify instance opened");
        Ok(Self::with_backend(backend, reporter, buffer_size))
    }
}

impl<B: NotifyBackend> NotifyContext<B> {
    /// Context over an arbitrary backend
    pub fn with_backend(backend: B, reporter: Reporter, buffer_size: usize) -> Self {
        Self {
            backend,
            table: WatchTable::new(),
            buffer: DecodeBuffer::with_capacity(buffer_size),
            reporter,
        }
    }

    /// End the registration phase; lookups are valid from here on
    pub fn freeze(&mut self) {
        self.table.freeze();
        info!(watches = self.table.len(), "watch table frozen");
    }

    pub fn watch_count(&self) -> usize {
        self.table.len()
    }

    pub fn table(&self) -> &WatchTable {
        &self.table
    }

    pub fn buffer(&self) -> &DecodeBuffer {
        &self.buffer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }
}
