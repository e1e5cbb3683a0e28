//! inwatch - print file system events for a set of paths
//!
//! The binary is a thin clap front end over [`run::run`]:
//! - [`options`]: capture option table and per-path argument grammar
//! - [`config`]: optional TOML configuration
//! - [`format`]: one line per event
//! - [`signals`]: shutdown on SIGINT, SIGTERM and SIGHUP

pub mod config;
pub mod format;
pub mod options;
pub mod run;
pub mod signals;

pub use config::Config;
pub use options::{parse_arguments, usage_table, CaptureOption, WatchTarget};
pub use run::{run, Invocation};
