//! Kernel change-notification boundary
//!
//! [`NotifyBackend`] is the seam between the engine and the kernel: adding a
//! watch and reading raw records. [`Inotify`] is the real implementation.

use crate::mask::EventMask;
use nix::errno::Errno;
use nix::libc;
use nix::NixPath;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::path::Path;

/// Watch descriptor handed out by the kernel
pub type WatchId = i32;

/// Source of watch descriptors and raw event bytes
pub trait NotifyBackend {
    /// Register `path` for `events`, returning its watch descriptor
    fn add_watch(&mut self, path: &Path, events: EventMask) -> nix::Result<WatchId>;

    /// Blocking read of raw event records into `buf`
    fn read(&mut self, buf: &mut [u8]) -> nix::Result<usize>;
}

/// inotify instance; the descriptor is closed on drop
#[derive(Debug)]
pub struct Inotify {
    fd: OwnedFd,
}

impl Inotify {
    /// Open a new inotify instance
    pub fn init() -> nix::Result<Self> {
        let raw = Errno::result(unsafe { libc::inotify_init1(libc::IN_CLOEXEC) })?;
        // SAFETY: inotify_init1 succeeded, so `raw` is a fresh descriptor owned by nobody else
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        Ok(Self { fd })
    }
}

impl AsRawFd for Inotify {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl NotifyBackend for Inotify {
    fn add_watch(&mut self, path: &Path, events: EventMask) -> nix::Result<WatchId> {
        let fd = self.fd.as_raw_fd();
        let wd = path.with_nix_path(|cstr| unsafe {
            libc::inotify_add_watch(fd, cstr.as_ptr(), events.bits())
        })?;
        Errno::result(wd)
    }

    fn read(&mut self, buf: &mut [u8]) -> nix::Result<usize> {
        nix::unistd::read(self.fd.as_raw_fd(), buf)
    }
}
