//! Capture masks: which changes a watch reports, plus structural flags

/// inotify event bits (`IN_CREATE`, `IN_DELETE`, ...)
pub use nix::sys::inotify::AddWatchFlags as EventMask;

/// Selection of events to capture for one path argument
///
/// A plain value: every path gets its own copy, so adjusting a mask for one
/// registration never leaks into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureMask {
    /// Recurse into subdirectories
    pub recursive: bool,
    /// Watch a symlink's target and also the link itself
    pub watch_and_follow: bool,
    /// Event bits handed to the kernel
    pub events: EventMask,
}

impl CaptureMask {
    /// Mask capturing `events`, with no structural flags
    pub fn new(events: EventMask) -> Self {
        Self {
            recursive: false,
            watch_and_follow: false,
            events,
        }
    }

    pub fn with_recursion(mut self) -> Self {
        self.recursive = true;
        self
    }

    pub fn with_follow(mut self) -> Self {
        self.watch_and_follow = true;
        self
    }

    /// True when no event bits are selected
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Copy of this mask that watches a symlink itself instead of its target
    pub fn link_itself(&self) -> Self {
        let mut mask = *self;
        mask.events |= EventMask::IN_DONT_FOLLOW;
        mask
    }
}

impl Default for CaptureMask {
    fn default() -> Self {
        Self::new(EventMask::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let mask = CaptureMask::default();
        assert!(mask.is_empty());
        assert!(!mask.recursive);
        assert!(!mask.watch_and_follow);
    }

    #[test]
    fn test_link_itself_leaves_caller_mask_untouched() {
        let mask = CaptureMask::new(EventMask::IN_CREATE).with_follow();
        let link = mask.link_itself();

        assert!(link.events.contains(EventMask::IN_DONT_FOLLOW));
        assert!(link.events.contains(EventMask::IN_CREATE));
        assert!(!mask.events.contains(EventMask::IN_DONT_FOLLOW));
        assert_eq!(mask, CaptureMask::new(EventMask::IN_CREATE).with_follow());
    }

    #[test]
    fn test_copies_are_independent() {
        let global = CaptureMask::new(EventMask::IN_DELETE);
        let mut running = global;
        running.events |= EventMask::IN_OPEN;
        running.recursive = true;

        assert_eq!(global.events, EventMask::IN_DELETE);
        assert!(!global.recursive);
    }
}
