//! Decoded file system events

use crate::mask::EventMask;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One decoded change record
///
/// Borrows the watch table and the read buffer, so it must be consumed
/// before the next decode call.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Wall-clock time at decode (inotify records carry no timestamp)
    pub timestamp: SystemTime,
    /// Kind of change
    pub kind: EventMask,
    /// Links the two halves of a rename
    pub cookie: u32,
    /// Watched path, `None` when the descriptor is not in the table
    pub path: Option<&'a Path>,
    /// Changed child inside a watched directory
    pub name: Option<&'a OsStr>,
}

impl Event<'_> {
    /// Watched path joined with the child name, when both are known
    pub fn full_path(&self) -> Option<PathBuf> {
        let path = self.path?;
        Some(match self.name {
            Some(name) => path.join(name),
            None => path.to_path_buf(),
        })
    }
}

const KIND_NAMES: &[(EventMask, &str)] = &[
    (EventMask::IN_ACCESS, "ACCESS"),
    (EventMask::IN_MODIFY, "MODIFY"),
    (EventMask::IN_ATTRIB, "ATTRIB"),
    (EventMask::IN_CLOSE_WRITE, "CLOSE_WRITE"),
    (EventMask::IN_CLOSE_NOWRITE, "CLOSE_NOWRITE"),
    (EventMask::IN_OPEN, "OPEN"),
    (EventMask::IN_MOVED_FROM, "MOVED_FROM"),
    (EventMask::IN_MOVED_TO, "MOVED_TO"),
    (EventMask::IN_CREATE, "CREATE"),
    (EventMask::IN_DELETE, "DELETE"),
    (EventMask::IN_DELETE_SELF, "DELETE_SELF"),
    (EventMask::IN_MOVE_SELF, "MOVE_SELF"),
    (EventMask::IN_UNMOUNT, "UNMOUNT"),
    (EventMask::IN_Q_OVERFLOW, "Q_OVERFLOW"),
    (EventMask::IN_IGNORED, "IGNORED"),
    (EventMask::IN_ISDIR, "ISDIR"),
];

/// Names of the kind bits set in `kind`, in kernel bit order
pub fn kind_names(kind: EventMask) -> Vec<&'static str> {
    KIND_NAMES
        .iter()
        .filter(|(flag, _)| kind.contains(*flag))
        .map(|(_, name)| *name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event<'a>(kind: EventMask, path: Option<&'a Path>, name: Option<&'a OsStr>) -> Event<'a> {
        Event {
            timestamp: SystemTime::now(),
            kind,
            cookie: 0,
            path,
            name,
        }
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(kind_names(EventMask::IN_CREATE), vec!["CREATE"]);
        assert_eq!(
            kind_names(EventMask::IN_CREATE | EventMask::IN_ISDIR),
            vec!["CREATE", "ISDIR"]
        );
        assert_eq!(kind_names(EventMask::IN_CLOSE), vec!["CLOSE_WRITE", "CLOSE_NOWRITE"]);
        assert!(kind_names(EventMask::empty()).is_empty());
    }

    #[test]
    fn test_full_path() {
        let dir = Path::new("/tmp/watchdir");
        let child = OsStr::new("foo.txt");

        let with_child = event(EventMask::IN_CREATE, Some(dir), Some(child));
        assert_eq!(with_child.full_path(), Some(PathBuf::from("/tmp/watchdir/foo.txt")));

        let itself = event(EventMask::IN_DELETE_SELF, Some(dir), None);
        assert_eq!(itself.full_path(), Some(PathBuf::from("/tmp/watchdir")));

        let unknown = event(EventMask::IN_CREATE, None, Some(child));
        assert_eq!(unknown.full_path(), None);
    }
}
