//! Capture options and the watch argument grammar
//!
//! `inwatch [OPTIONS] [PATH] ... [GLOBAL OPTIONS]`
//!
//! Options directly before a path apply to that path only. Options after
//! the last path are global and apply to every path. Short options can be
//! bundled (`-rC`); unknown options are reported and ignored.

use std::path::PathBuf;
use watcher::{CaptureMask, EventMask, Reporter};

/// One entry of the capture option table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOption {
    AllEvents,
    Access,
    Create,
    Close,
    Delete,
    Metadata,
    Kernel,
    WatchLink,
    WatchAndFollow,
    Move,
    Open,
    Recur,
    Single,
}

impl CaptureOption {
    /// Table order, as listed in `--help`
    pub const ALL: [CaptureOption; 13] = [
        CaptureOption::AllEvents,
        CaptureOption::Access,
        CaptureOption::Create,
        CaptureOption::Close,
        CaptureOption::Delete,
        CaptureOption::Metadata,
        CaptureOption::Kernel,
        CaptureOption::WatchLink,
        CaptureOption::WatchAndFollow,
        CaptureOption::Move,
        CaptureOption::Open,
        CaptureOption::Recur,
        CaptureOption::Single,
    ];

    pub fn short(self) -> char {
        match self {
            CaptureOption::AllEvents => 'A',
            CaptureOption::Access => 'a',
            CaptureOption::Create => 'C',
            CaptureOption::Close => 'c',
            CaptureOption::Delete => 'D',
            CaptureOption::Metadata => 'd',
            CaptureOption::Kernel => 'k',
            CaptureOption::WatchLink => 'l',
            CaptureOption::WatchAndFollow => 'L',
            CaptureOption::Move => 'm',
            CaptureOption::Open => 'o',
            CaptureOption::Recur => 'r',
            CaptureOption::Single => 's',
        }
    }

    pub fn long(self) -> &'static str {
        match self {
            CaptureOption::AllEvents => "all-events",
            CaptureOption::Access => "access",
            CaptureOption::Create => "create",
            CaptureOption::Close => "close",
            CaptureOption::Delete => "delete",
            CaptureOption::Metadata => "metadata",
            CaptureOption::Kernel => "kernel",
            CaptureOption::WatchLink => "watch-link",
            CaptureOption::WatchAndFollow => "watch-and-follow",
            CaptureOption::Move => "move",
            CaptureOption::Open => "open",
            CaptureOption::Recur => "recur",
            CaptureOption::Single => "single",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CaptureOption::AllEvents => "Catch all possible filesystem events",
            CaptureOption::Access => "Catch filesystem access events",
            CaptureOption::Create => "Catch file creation events",
            CaptureOption::Close => "Catch filesystem close events",
            CaptureOption::Delete => "Catch file deletion events",
            CaptureOption::Metadata => "Catch changes to a file's metadata",
            CaptureOption::Kernel => "Catch kernel filesystem events",
            CaptureOption::WatchLink => "Don't follow symlinks - watch the link itself",
            CaptureOption::WatchAndFollow => "Follow symlinks, but also watch the link itself",
            CaptureOption::Move => "Catch file movement events to/from a given path",
            CaptureOption::Open => "Catch file open events",
            CaptureOption::Recur => "Recursively watch child directories",
            CaptureOption::Single => "Only watch for a single event",
        }
    }

    /// Kernel bits selected by this option (empty for structural flags)
    pub fn events(self) -> EventMask {
        let kernel = EventMask::IN_UNMOUNT | EventMask::IN_Q_OVERFLOW | EventMask::IN_IGNORED;
        match self {
            CaptureOption::AllEvents => EventMask::IN_ALL_EVENTS | kernel,
            CaptureOption::Access => EventMask::IN_ACCESS,
            CaptureOption::Create => EventMask::IN_CREATE,
            CaptureOption::Close => EventMask::IN_CLOSE,
            CaptureOption::Delete => EventMask::IN_DELETE | EventMask::IN_DELETE_SELF,
            CaptureOption::Metadata => EventMask::IN_ATTRIB,
            CaptureOption::Kernel => kernel,
            CaptureOption::WatchLink => EventMask::IN_DONT_FOLLOW,
            CaptureOption::Move => EventMask::IN_MOVE,
            CaptureOption::Open => EventMask::IN_OPEN,
            CaptureOption::Single => EventMask::IN_ONESHOT,
            CaptureOption::WatchAndFollow | CaptureOption::Recur => EventMask::empty(),
        }
    }

    pub fn apply(self, mask: &mut CaptureMask) {
        match self {
            CaptureOption::Recur => mask.recursive = true,
            CaptureOption::WatchAndFollow => mask.watch_and_follow = true,
            other => mask.events |= other.events(),
        }
    }

    pub fn from_short(short: char) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.short() == short)
    }

    pub fn from_long(long: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.long() == long)
    }
}

/// A path argument with the mask it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub mask: CaptureMask,
}

pub fn is_option(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-')
}

/// Apply one `-xyz` or `--name` argument to `mask`
pub fn apply_option(arg: &str, mask: &mut CaptureMask, reporter: &Reporter) {
    if let Some(long) = arg.strip_prefix("--") {
        match CaptureOption::from_long(long) {
            Some(option) => option.apply(mask),
            None => reporter.report(&["option", &format!("unrecognized option '--{long}'")]),
        }
        return;
    }

    for short in arg.chars().skip(1) {
        match CaptureOption::from_short(short) {
            Some(option) => option.apply(mask),
            None => reporter.report(&["option", &format!("unrecognized option '-{short}'")]),
        }
    }
}

/// Resolve the raw argument list into watch targets
pub fn parse_arguments(args: &[String], reporter: &Reporter) -> Vec<WatchTarget> {
    // Trailing options form the global mask
    let mut end = args.len();
    let mut global = CaptureMask::default();
    while end > 0 && is_option(&args[end - 1]) {
        end -= 1;
        apply_option(&args[end], &mut global, reporter);
    }

    let mut targets = Vec::new();
    let mut mask = global;
    for arg in &args[..end] {
        if is_option(arg) {
            apply_option(arg, &mut mask, reporter);
        } else {
            targets.push(WatchTarget {
                path: PathBuf::from(strip_trailing_slashes(arg)),
                mask: with_default_events(mask),
            });
            mask = global;
        }
    }

    targets
}

/// `dir///` becomes `dir`; `/` stays `/`
fn strip_trailing_slashes(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && !path.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Bits that only an event-selecting option sets
fn selectable_events() -> EventMask {
    EventMask::IN_ALL_EVENTS | EventMask::IN_UNMOUNT | EventMask::IN_Q_OVERFLOW | EventMask::IN_IGNORED
}

/// No event-selecting option given for a path: watch everything
fn with_default_events(mut mask: CaptureMask) -> CaptureMask {
    if !mask.events.intersects(selectable_events()) {
        mask.events |= EventMask::IN_ALL_EVENTS;
    }
    mask
}

/// Option table for `--help`
pub fn usage_table() -> String {
    let mut table = String::from(
        "Capture options (before a path: that path only; after the last path: every path):\n",
    );
    for option in CaptureOption::ALL {
        table.push_str(&format!(
            "  -{}, --{:<22}{}\n",
            option.short(),
            option.long(),
            option.description()
        ));
    }
    table
}
