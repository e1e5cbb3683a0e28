//! Error channel for non-fatal failures
//!
//! Lines have the form `program: operation: system error text`.

use crate::error::WatchError;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::debug;

/// Writes diagnostic lines prefixed with the program name
///
/// Clones share the same sink.
#[derive(Clone)]
pub struct Reporter {
    program: String,
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Reporter {
    /// Reporter writing to stderr
    pub fn stderr(program: impl Into<String>) -> Self {
        Self::with_writer(program, io::stderr())
    }

    pub fn with_writer(program: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            program: program.into(),
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Write `parts` after the program name, joined by `": "`, then a newline
    pub fn report(&self, parts: &[&str]) {
        let mut line = self.program.clone();
        for part in parts {
            line.push_str(": ");
            line.push_str(part);
        }
        line.push('\n');

        let mut sink = self.sink.lock();
        // Nowhere left to report a failing error channel
        let _ = sink.write_all(line.as_bytes()).and_then(|()| sink.flush());
    }

    /// Report an engine failure as `program: operation: system text`
    pub fn report_error(&self, err: &WatchError) {
        debug!(error = %err, path = ?err.path(), "reporting failure");
        self.report(&[err.operation(), &err.system_text()]);
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}
