//! Process lifecycle: configure, register, freeze, print events

use crate::config::Config;
use crate::format::EventFormatter;
use crate::options::parse_arguments;
use crate::signals;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use watcher::{NotifyBackend, NotifyContext, Reporter};

/// Exit status for a command line that names nothing to watch
pub const USAGE_EXIT: u8 = 2;

/// Parsed command line
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub config: Option<PathBuf>,
    pub verbose: u8,
    pub args: Vec<String>,
}

pub fn run(invocation: Invocation) -> ExitCode {
    let reporter = Reporter::stderr(program_name());

    let config = match Config::load(invocation.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            reporter.report(&["config", &format!("{err:#}")]);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config, invocation.verbose);

    let targets = parse_arguments(&invocation.args, &reporter);
    if targets.is_empty() {
        reporter.report(&["usage", "no paths to watch"]);
        return ExitCode::from(USAGE_EXIT);
    }

    if let Err(errno) = signals::install_handlers() {
        reporter.report(&["sigaction", errno.desc()]);
        return ExitCode::FAILURE;
    }

    let mut context = match NotifyContext::open(reporter.clone(), config.buffer_size) {
        Ok(context) => context,
        Err(err) => {
            reporter.report_error(&err);
            return ExitCode::FAILURE;
        }
    };

    let mut watches = 0;
    for target in &targets {
        let added = context.add_watch(&target.path, &target.mask);
        debug!(path = %target.path.display(), added, "registered");
        watches += added;
    }
    if watches == 0 {
        reporter.report(&["watch", "no paths could be watched"]);
        return ExitCode::FAILURE;
    }
    info!(watches, paths = targets.len(), "watching");
    context.freeze();

    let formatter = EventFormatter::new(&config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match event_loop(&mut context, &formatter, &mut out, signals::keep_running) {
        Ok(printed) => {
            info!(printed, "shutting down");
            ExitCode::SUCCESS
        }
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(err) => {
            reporter.report(&["write", &err.to_string()]);
            ExitCode::FAILURE
        }
    }
}

/// Print events until `keep_running` turns false or the stream ends
///
/// Every line is flushed as soon as it is written. Returns the number of
/// lines printed.
pub fn event_loop<B: NotifyBackend, W: Write>(
    context: &mut NotifyContext<B>,
    formatter: &EventFormatter,
    out: &mut W,
    keep_running: impl Fn() -> bool,
) -> io::Result<u64> {
    let mut printed = 0;
    while keep_running() {
        match context.next_event() {
            Ok(Some(event)) => {
                writeln!(out, "{}", formatter.format(&event))?;
                out.flush()?;
                printed += 1;
            }
            Ok(None) => {
                debug!("event stream ended");
                break;
            }
            Err(err) if err.is_interrupted() => debug!("read interrupted"),
            // Already reported by the context
            Err(err) => debug!(error = %err, "decode failed"),
        }
    }
    Ok(printed)
}

fn init_logging(config: &Config, verbose: u8) {
    let configured = config.log_filter().unwrap_or(LevelFilter::WARN);
    let level = match verbose {
        0 => configured,
        1 => configured.max(LevelFilter::INFO),
        _ => configured.max(LevelFilter::DEBUG),
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// File name of argv[0], used to prefix error lines
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "inwatch".to_string())
}
