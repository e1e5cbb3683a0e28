//! Path registration: single paths, directory trees and symlink pairs
//!
//! Every failure here is reported and skipped. The return value of
//! [`NotifyContext::add_watch`] is the number of watches that made it into
//! the table; 0 means nothing was watched for that argument.

use crate::context::NotifyContext;
use crate::error::WatchError;
use crate::kernel::NotifyBackend;
use crate::mask::{CaptureMask, EventMask};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

impl<B: NotifyBackend> NotifyContext<B> {
    /// Add watches for `path` as selected by `mask`
    ///
    /// An empty path means the filesystem root. A directory with
    /// `recursive` set is registered along with every directory below it; a
    /// symlink with `watch_and_follow` set is registered through its target
    /// and then as the link itself. Anything else gets a single watch.
    pub fn add_watch(&mut self, path: &Path, mask: &CaptureMask) -> usize {
        let path = if path.as_os_str().is_empty() {
            Path::new("/")
        } else {
            path
        };

        let file_type = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata.file_type(),
            Err(source) => {
                self.reporter.report_error(&WatchError::Stat {
                    path: path.to_path_buf(),
                    source,
                });
                return 0;
            }
        };

        if file_type.is_dir() && mask.recursive {
            self.add_recursive(path, mask.events)
        } else if file_type.is_symlink() && mask.watch_and_follow {
            self.add_link_and_target(path, mask)
        } else {
            self.add_single(path, mask.events)
        }
    }

    /// Watch the link's target, then the link itself
    ///
    /// 2 when both succeed, 1 when only the target does, 0 when the target
    /// fails (the link is not attempted).
    fn add_link_and_target(&mut self, path: &Path, mask: &CaptureMask) -> usize {
        if self.add_single(path, mask.events) == 0 {
            return 0;
        }
        1 + self.add_single(path, mask.link_itself().events)
    }

    /// Depth-first registration of `root` and every directory beneath it
    ///
    /// Listing and per-entry metadata failures are reported and the walk
    /// carries on with the remaining siblings. Symlinks are never followed.
    fn add_recursive(&mut self, root: &Path, events: EventMask) -> usize {
        let mut count = 0;
        let mut walker = WalkDir::new(root).follow_links(false).into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.reporter.report_error(&WatchError::from_walk(err));
                    continue;
                }
            };

            // The root was already inspected by add_watch
            if entry.depth() > 0 {
                match entry.metadata() {
                    Ok(metadata) if metadata.is_dir() => {}
                    Ok(_) => continue,
                    Err(err) => {
                        if entry.file_type().is_dir() {
                            walker.skip_current_dir();
                        }
                        self.reporter.report_error(&WatchError::Stat {
                            path: entry.path().to_path_buf(),
                            source: err.into_io_error().unwrap_or_else(|| {
                                std::io::Error::new(std::io::ErrorKind::Other, "metadata unavailable")
                            }),
                        });
                        continue;
                    }
                }
            }

            count += self.add_single(entry.path(), events);
        }

        debug!(root = %root.display(), count, "recursive registration finished");
        count
    }

    /// Register exactly one path with the kernel and record it
    fn add_single(&mut self, path: &Path, events: EventMask) -> usize {
        // Grow before asking the kernel so a failed allocation leaves no
        // untracked watch behind
        if let Err(err) = self.table.reserve_slot() {
            self.reporter.report_error(&err);
            return 0;
        }

        let id = match self.backend.add_watch(path, events) {
            Ok(id) => id,
            Err(source) => {
                self.reporter.report_error(&WatchError::AddWatch {
                    path: path.to_path_buf(),
                    source,
                });
                return 0;
            }
        };

        if let Err(err) = self.table.insert(id, path.to_path_buf()) {
            self.reporter.report_error(&err);
            return 0;
        }

        debug!(id, path = %path.display(), "watch added");
        1
    }
}
