//! inwatch - watch paths and print file system events

use clap::{ArgAction, Parser};
use cli_lib::{run, usage_table, Invocation};
use std::path::PathBuf;
use std::process::ExitCode;

/// Print a line for every file system event on the given paths
#[derive(Parser, Debug)]
#[command(name = "inwatch")]
#[command(author, version, about, long_about = None)]
#[command(override_usage = "inwatch [OPTIONS] [CAPTURE OPTIONS] PATH ... [GLOBAL CAPTURE OPTIONS]")]
#[command(after_help = usage_table())]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/inwatch/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More logging on stderr (once: info, twice: debug)
    #[arg(long, action = ArgAction::Count)]
    verbose: u8,

    /// Paths to watch, each preceded by its own capture options
    #[arg(
        value_name = "ARGS",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run(Invocation {
        config: cli.config,
        verbose: cli.verbose,
        args: cli.args,
    })
}
