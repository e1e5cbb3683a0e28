//! Test support: a scripted kernel backend and a captured reporter
//!
//! Enabled for this crate's own tests and, through the `test-util`
//! feature, for downstream test suites.

use crate::decoder::HEADER_SIZE;
use crate::kernel::{NotifyBackend, WatchId};
use crate::mask::EventMask;
use crate::report::Reporter;
use nix::errno::Errno;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One successful `add_watch` call seen by [`ScriptedBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub path: PathBuf,
    pub events: EventMask,
    pub id: WatchId,
}

type RejectFn = Box<dyn Fn(&Path, EventMask) -> bool>;
type AddHook = Box<dyn FnMut(&Path)>;

/// Backend that hands out sequential descriptors and serves queued reads
pub struct ScriptedBackend {
    next_id: WatchId,
    added: Vec<Registration>,
    reject: Option<RejectFn>,
    on_add: Option<AddHook>,
    reads: VecDeque<nix::Result<Vec<u8>>>,
    read_calls: usize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            added: Vec::new(),
            reject: None,
            on_add: None,
            reads: VecDeque::new(),
            read_calls: 0,
        }
    }

    /// Fail `add_watch` with `ENOENT` whenever `reject` returns true
    pub fn rejecting(mut self, reject: impl Fn(&Path, EventMask) -> bool + 'static) -> Self {
        self.reject = Some(Box::new(reject));
        self
    }

    /// Run `hook` at the start of every `add_watch` call
    ///
    /// Lets a test change the filesystem while a recursive walk is in
    /// progress.
    pub fn on_add_watch(mut self, hook: impl FnMut(&Path) + 'static) -> Self {
        self.on_add = Some(Box::new(hook));
        self
    }

    /// Queue bytes for one future `read`
    pub fn push_chunk(&mut self, bytes: Vec<u8>) {
        self.reads.push_back(Ok(bytes));
    }

    /// Queue a failing `read`
    pub fn push_error(&mut self, errno: Errno) {
        self.reads.push_back(Err(errno));
    }

    pub fn added(&self) -> &[Registration] {
        &self.added
    }

    /// Number of `read` calls so far
    pub fn reads(&self) -> usize {
        self.read_calls
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedBackend")
            .field("added", &self.added)
            .field("pending_reads", &self.reads.len())
            .field("read_calls", &self.read_calls)
            .finish()
    }
}

impl NotifyBackend for ScriptedBackend {
    fn add_watch(&mut self, path: &Path, events: EventMask) -> nix::Result<WatchId> {
        if let Some(hook) = &mut self.on_add {
            hook(path);
        }
        if let Some(reject) = &self.reject {
            if reject(path, events) {
                return Err(Errno::ENOENT);
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.added.push(Registration {
            path: path.to_path_buf(),
            events,
            id,
        });
        Ok(id)
    }

    fn read(&mut self, buf: &mut [u8]) -> nix::Result<usize> {
        self.read_calls += 1;
        match self.reads.pop_front() {
            None => Ok(0),
            Some(Err(errno)) => Err(errno),
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
        }
    }
}

/// Lay out one record as the kernel does: header, then the name padded
/// with NULs to a multiple of the header size
pub fn encode_record(wd: WatchId, mask: EventMask, cookie: u32, name: Option<&str>) -> Vec<u8> {
    let name_len = name.map_or(0, |name| (name.len() / HEADER_SIZE + 1) * HEADER_SIZE);

    let mut bytes = Vec::with_capacity(HEADER_SIZE + name_len);
    bytes.extend_from_slice(&wd.to_ne_bytes());
    bytes.extend_from_slice(&mask.bits().to_ne_bytes());
    bytes.extend_from_slice(&cookie.to_ne_bytes());
    bytes.extend_from_slice(&(name_len as u32).to_ne_bytes());
    if let Some(name) = name {
        bytes.extend_from_slice(name.as_bytes());
        bytes.resize(HEADER_SIZE + name_len, 0);
    }
    bytes
}

/// Shared in-memory sink for a [`Reporter`]
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reporter whose lines land in the returned buffer
pub fn captured_reporter(program: &str) -> (Reporter, CapturedOutput) {
    let output = CapturedOutput::default();
    (Reporter::with_writer(program, output.clone()), output)
}
