//! Error types for watch registration and event decoding

use nix::errno::Errno;
use std::collections::TryReserveError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures raised by the engine
///
/// Only [`WatchError::Init`] is fatal; every other variant is reported and
/// recovered from where it happens.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to open inotify instance: {0}")]
    Init(#[source] Errno),

    #[error("failed to stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open directory {}: {source}", .path.display())]
    OpenDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list directory entries: {source}")]
    ReadDir {
        #[source]
        source: io::Error,
    },

    #[error("failed to watch {}: {source}", .path.display())]
    AddWatch {
        path: PathBuf,
        #[source]
        source: Errno,
    },

    #[error("failed to grow watch table to {requested} entries")]
    Alloc {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("failed to read events: {0}")]
    Read(#[source] Errno),

    #[error("truncated event record ({available} bytes left in buffer)")]
    Truncated { available: usize },
}

impl WatchError {
    /// Build from a directory walk failure
    ///
    /// walkdir attaches a path when a directory could not be opened and
    /// none when reading entries from an open directory failed.
    pub(crate) fn from_walk(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf);
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop detected"));
        match path {
            Some(path) => WatchError::OpenDir { path, source },
            None => WatchError::ReadDir { source },
        }
    }

    /// Name of the failing operation, as printed on the error channel
    pub fn operation(&self) -> &'static str {
        match self {
            WatchError::Init(_) => "inotify_init",
            WatchError::Stat { .. } => "lstat",
            WatchError::OpenDir { .. } => "opendir",
            WatchError::ReadDir { .. } => "readdir",
            WatchError::AddWatch { .. } => "inotify_add_watch",
            WatchError::Alloc { .. } => "malloc",
            WatchError::Read(_) | WatchError::Truncated { .. } => "read",
        }
    }

    /// System error text (strerror-style) for the error channel
    pub fn system_text(&self) -> String {
        match self {
            WatchError::Init(errno) | WatchError::Read(errno) => errno.desc().to_string(),
            WatchError::AddWatch { source, .. } => source.desc().to_string(),
            WatchError::Stat { source, .. }
            | WatchError::OpenDir { source, .. }
            | WatchError::ReadDir { source } => io_text(source),
            WatchError::Alloc { .. } => Errno::ENOMEM.desc().to_string(),
            WatchError::Truncated { .. } => "truncated event record".to_string(),
        }
    }

    /// Path the failure relates to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            WatchError::Stat { path, .. }
            | WatchError::OpenDir { path, .. }
            | WatchError::AddWatch { path, .. } => Some(path),
            _ => None,
        }
    }

    /// True for a read cut short by a signal
    pub fn is_interrupted(&self) -> bool {
        matches!(self, WatchError::Read(Errno::EINTR))
    }
}

fn io_text(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => Errno::from_i32(code).desc().to_string(),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        let stat = WatchError::Stat {
            path: PathBuf::from("/missing"),
            source: io::Error::from_raw_os_error(Errno::ENOENT as i32),
        };
        assert_eq!(stat.operation(), "lstat");
        assert_eq!(stat.system_text(), Errno::ENOENT.desc());
        assert_eq!(stat.path(), Some(Path::new("/missing")));

        let add = WatchError::AddWatch {
            path: PathBuf::from("/root"),
            source: Errno::EACCES,
        };
        assert_eq!(add.operation(), "inotify_add_watch");
        assert_eq!(add.system_text(), Errno::EACCES.desc());

        assert_eq!(WatchError::Read(Errno::EIO).operation(), "read");
        assert_eq!(WatchError::Truncated { available: 3 }.operation(), "read");
    }

    #[test]
    fn test_walk_open_failure_is_opendir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let walk_err = walkdir::WalkDir::new(&missing)
            .into_iter()
            .next()
            .unwrap()
            .unwrap_err();
        let err = WatchError::from_walk(walk_err);

        assert_eq!(err.operation(), "opendir");
        assert_eq!(err.system_text(), Errno::ENOENT.desc());
        assert_eq!(err.path(), Some(missing.as_path()));
    }

    #[test]
    fn test_is_interrupted() {
        assert!(WatchError::Read(Errno::EINTR).is_interrupted());
        assert!(!WatchError::Read(Errno::EIO).is_interrupted());
        assert!(!WatchError::Init(Errno::EINTR).is_interrupted());
    }
}
