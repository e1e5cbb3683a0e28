//! Decoding of the raw inotify record stream
//!
//! Each record is a fixed 16-byte header (`wd`, `mask`, `cookie`, `len`, all
//! native-endian 32-bit) followed by `len` bytes of NUL-padded child name.
//! The buffer is refilled only once every byte of the previous read has
//! been consumed.

use crate::context::NotifyContext;
use crate::error::WatchError;
use crate::event::Event;
use crate::kernel::{NotifyBackend, WatchId};
use crate::mask::EventMask;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::time::SystemTime;
use tracing::{debug, trace};

/// Size of the fixed record header
pub const HEADER_SIZE: usize = 16;

/// Default read buffer size
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Smallest buffer that always fits one record with a maximal name
pub const MIN_BUFFER_SIZE: usize = HEADER_SIZE + NAME_MAX + 1;

const NAME_MAX: usize = 255;

/// Fixed-size read buffer with a cursor into the valid region
///
/// Invariant: `cursor <= valid <= storage.len()`.
#[derive(Debug)]
pub struct DecodeBuffer {
    storage: Box<[u8]>,
    cursor: usize,
    valid: usize,
}

impl DecodeBuffer {
    /// Buffer of `capacity` bytes, raised to [`MIN_BUFFER_SIZE`] if smaller
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity.max(MIN_BUFFER_SIZE)].into_boxed_slice(),
            cursor: 0,
            valid: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn valid_len(&self) -> usize {
        self.valid
    }

    /// True when every byte from the last read has been decoded
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.valid
    }

    /// One read from `backend`; on failure the buffer is left empty
    fn refill<B: NotifyBackend>(&mut self, backend: &mut B) -> nix::Result<usize> {
        self.cursor = 0;
        match backend.read(&mut self.storage) {
            Ok(read) => {
                self.valid = read;
                Ok(read)
            }
            Err(errno) => {
                self.valid = 0;
                Err(errno)
            }
        }
    }

    /// Decode the record at the cursor and step past it
    fn take_record(&mut self) -> Result<RawRecord<'_>, WatchError> {
        let start = self.cursor;
        let available = self.valid - start;

        let header = match RecordHeader::parse(&self.storage[start..self.valid]) {
            Some(header) => header,
            None => return Err(self.discard(available)),
        };

        let record_len = HEADER_SIZE + header.len as usize;
        if record_len > available {
            return Err(self.discard(available));
        }

        self.cursor = start + record_len;
        let name = trim_name(&self.storage[start + HEADER_SIZE..self.cursor]);
        Ok(RawRecord { header, name })
    }

    /// Drop a partial record; the next call refills
    fn discard(&mut self, available: usize) -> WatchError {
        self.cursor = 0;
        self.valid = 0;
        WatchError::Truncated { available }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordHeader {
    wd: WatchId,
    mask: u32,
    cookie: u32,
    len: u32,
}

impl RecordHeader {
    fn parse(bytes: &[u8]) -> Option<Self> {
        let header = bytes.get(..HEADER_SIZE)?;
        let word = |at: usize| [header[at], header[at + 1], header[at + 2], header[at + 3]];

        Some(Self {
            wd: i32::from_ne_bytes(word(0)),
            mask: u32::from_ne_bytes(word(4)),
            cookie: u32::from_ne_bytes(word(8)),
            len: u32::from_ne_bytes(word(12)),
        })
    }
}

struct RawRecord<'a> {
    header: RecordHeader,
    name: Option<&'a OsStr>,
}

/// Name up to the first NUL; `None` for an absent or all-padding field
fn trim_name(field: &[u8]) -> Option<&OsStr> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    if end == 0 {
        None
    } else {
        Some(OsStr::from_bytes(&field[..end]))
    }
}

impl<B: NotifyBackend> NotifyContext<B> {
    /// Decode the next event, reading from the kernel when the buffer is spent
    ///
    /// Returns `Ok(None)` when a read produced no bytes. Failures are
    /// reported on the error channel before being returned, except for a
    /// read interrupted by a signal, which is how shutdown wakes the loop.
    pub fn next_event(&mut self) -> Result<Option<Event<'_>>, WatchError> {
        if self.buffer.is_exhausted() {
            match self.buffer.refill(&mut self.backend) {
                Ok(0) => return Ok(None),
                Ok(read) => trace!(bytes = read, "event buffer refilled"),
                Err(errno) => {
                    let err = WatchError::Read(errno);
                    if !err.is_interrupted() {
                        self.reporter.report_error(&err);
                    }
                    return Err(err);
                }
            }
        }

        let record = match self.buffer.take_record() {
            Ok(record) => record,
            Err(err) => {
                debug!(error = %err, "discarding partial record");
                self.reporter.report_error(&err);
                return Err(err);
            }
        };

        let header = record.header;
        Ok(Some(Event {
            timestamp: SystemTime::now(),
            kind: EventMask::from_bits_truncate(header.mask),
            cookie: header.cookie,
            path: self.table.lookup(header.wd),
            name: record.name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{captured_reporter, encode_record, ScriptedBackend};
    use std::path::{Path, PathBuf};

    fn context_with_table(
        entries: &[(WatchId, &str)],
    ) -> (NotifyContext<ScriptedBackend>, crate::testing::CapturedOutput) {
        let (reporter, output) = captured_reporter("inwatch");
        let mut context =
            NotifyContext::with_backend(ScriptedBackend::new(), reporter, DEFAULT_BUFFER_SIZE);
        for (id, path) in entries {
            context.table.insert(*id, PathBuf::from(path)).unwrap();
        }
        context.freeze();
        (context, output)
    }

    #[test]
    fn test_header_parse() {
        let bytes = encode_record(3, EventMask::IN_MODIFY, 9, Some("a"));
        let header = RecordHeader::parse(&bytes).unwrap();

        assert_eq!(header.wd, 3);
        assert_eq!(header.mask, EventMask::IN_MODIFY.bits());
        assert_eq!(header.cookie, 9);
        assert_eq!(header.len as usize, bytes.len() - HEADER_SIZE);
        assert!(RecordHeader::parse(&bytes[..HEADER_SIZE - 1]).is_none());
    }

    #[test]
    fn test_trim_name() {
        assert_eq!(trim_name(b"foo.txt\0\0\0\0\0\0\0\0\0"), Some(OsStr::new("foo.txt")));
        assert_eq!(trim_name(b"\0\0\0\0"), None);
        assert_eq!(trim_name(b""), None);
        assert_eq!(trim_name(b"exact"), Some(OsStr::new("exact")));
    }

    #[test]
    fn test_two_records_in_one_read() {
        let (mut context, _) = context_with_table(&[(1, "/tmp/watchdir"), (2, "/tmp/file")]);

        let mut chunk = encode_record(1, EventMask::IN_CREATE, 0, Some("foo.txt"));
        chunk.extend(encode_record(2, EventMask::IN_MODIFY, 0, None));
        let total = chunk.len();
        context.backend.push_chunk(chunk);

        {
            let event = context.next_event().unwrap().unwrap();
            assert_eq!(event.kind, EventMask::IN_CREATE);
            assert_eq!(event.path, Some(Path::new("/tmp/watchdir")));
            assert_eq!(event.name, Some(OsStr::new("foo.txt")));
        }
        {
            let event = context.next_event().unwrap().unwrap();
            assert_eq!(event.kind, EventMask::IN_MODIFY);
            assert_eq!(event.path, Some(Path::new("/tmp/file")));
            assert_eq!(event.name, None);
        }

        assert_eq!(context.buffer().valid_len(), total);
        assert_eq!(context.buffer().cursor(), total);
        assert!(context.buffer().is_exhausted());
        assert_eq!(context.backend().reads(), 1);
    }

    #[test]
    fn test_refill_only_when_exhausted() {
        let (mut context, _) = context_with_table(&[(1, "/a")]);

        let mut first = encode_record(1, EventMask::IN_OPEN, 0, None);
        first.extend(encode_record(1, EventMask::IN_ACCESS, 0, None));
        context.backend.push_chunk(first);
        context
            .backend
            .push_chunk(encode_record(1, EventMask::IN_CLOSE_NOWRITE, 0, None));

        assert!(context.buffer().is_exhausted());
        context.next_event().unwrap().unwrap();
        assert_eq!(context.backend().reads(), 1);

        // Data left: no read
        assert!(!context.buffer().is_exhausted());
        context.next_event().unwrap().unwrap();
        assert_eq!(context.backend().reads(), 1);

        // Spent: exactly one read
        assert!(context.buffer().is_exhausted());
        let kind = context.next_event().unwrap().unwrap().kind;
        assert_eq!(kind, EventMask::IN_CLOSE_NOWRITE);
        assert_eq!(context.backend().reads(), 2);
    }

    #[test]
    fn test_unknown_descriptor_has_no_path() {
        let (mut context, output) = context_with_table(&[(1, "/known")]);
        context
            .backend
            .push_chunk(encode_record(99, EventMask::IN_IGNORED, 0, None));

        let event = context.next_event().unwrap().unwrap();
        assert_eq!(event.path, None);
        assert_eq!(event.kind, EventMask::IN_IGNORED);
        assert!(output.contents().is_empty());
    }

    #[test]
    fn test_read_error_is_reported_and_retried() {
        let (mut context, output) = context_with_table(&[(1, "/a")]);
        context.backend.push_error(nix::errno::Errno::EIO);
        context.backend.push_chunk(encode_record(1, EventMask::IN_CREATE, 0, Some("x")));

        let err = context.next_event().unwrap_err();
        assert!(matches!(err, WatchError::Read(nix::errno::Errno::EIO)));
        assert_eq!(context.buffer().valid_len(), 0);
        assert_eq!(
            output.contents(),
            format!("inwatch: read: {}\n", nix::errno::Errno::EIO.desc())
        );

        let event = context.next_event().unwrap().unwrap();
        assert_eq!(event.name, Some(OsStr::new("x")));
        assert_eq!(context.backend().reads(), 2);
    }

    #[test]
    fn test_interrupted_read_is_not_reported() {
        let (mut context, output) = context_with_table(&[]);
        context.backend.push_error(nix::errno::Errno::EINTR);

        let err = context.next_event().unwrap_err();
        assert!(err.is_interrupted());
        assert!(output.contents().is_empty());
    }

    #[test]
    fn test_empty_read_yields_no_event() {
        let (mut context, _) = context_with_table(&[]);
        assert!(context.next_event().unwrap().is_none());
        assert_eq!(context.backend().reads(), 1);
    }

    #[test]
    fn test_truncated_record_is_discarded() {
        let (mut context, output) = context_with_table(&[(1, "/a")]);

        let mut chunk = encode_record(1, EventMask::IN_CREATE, 0, None);
        let partial = encode_record(1, EventMask::IN_DELETE, 0, Some("cut"));
        chunk.extend_from_slice(&partial[..HEADER_SIZE + 2]);
        context.backend.push_chunk(chunk);
        context.backend.push_chunk(encode_record(1, EventMask::IN_MODIFY, 0, None));

        assert_eq!(context.next_event().unwrap().unwrap().kind, EventMask::IN_CREATE);

        let err = context.next_event().unwrap_err();
        assert!(matches!(err, WatchError::Truncated { available } if available == HEADER_SIZE + 2));
        assert!(context.buffer().is_exhausted());
        assert!(output.contents().contains("read: truncated event record"));

        assert_eq!(context.next_event().unwrap().unwrap().kind, EventMask::IN_MODIFY);
    }

    #[test]
    fn test_buffer_minimum_capacity() {
        assert_eq!(DecodeBuffer::with_capacity(16).capacity(), MIN_BUFFER_SIZE);
        assert_eq!(DecodeBuffer::with_capacity(8192).capacity(), 8192);
    }
}
