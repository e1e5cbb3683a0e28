//! Event line formatting

use crate::config::Config;
use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;
use std::time::SystemTime;
use watcher::{kind_names, Event};

/// Renders events as `<timestamp> <KIND,...> <path>[/<name>]`
#[derive(Debug, Clone)]
pub struct EventFormatter {
    time_format: String,
    utc: bool,
    color: bool,
    unknown_path: String,
}

impl EventFormatter {
    pub fn new(config: &Config) -> Self {
        Self {
            time_format: config.time_format.clone(),
            utc: config.utc,
            color: config.color,
            unknown_path: config.unknown_path.clone(),
        }
    }

    pub fn format(&self, event: &Event<'_>) -> String {
        let timestamp = self.timestamp(event.timestamp);

        let names = kind_names(event.kind);
        let kinds = if names.is_empty() {
            format!("{:#x}", event.kind.bits())
        } else {
            names.join(",")
        };
        let kinds = if self.color {
            kinds.cyan().to_string()
        } else {
            kinds
        };

        let path = match (event.full_path(), event.name) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(name)) => format!("{}/{}", self.unknown_path, name.to_string_lossy()),
            (None, None) => self.unknown_path.clone(),
        };

        let mut line = format!("{timestamp} {kinds} {path}");
        if event.cookie != 0 {
            line.push_str(&format!(" (cookie {})", event.cookie));
        }
        line
    }

    fn timestamp(&self, at: SystemTime) -> String {
        if self.utc {
            DateTime::<Utc>::from(at).format(&self.time_format).to_string()
        } else {
            DateTime::<Local>::from(at).format(&self.time_format).to_string()
        }
    }
}
