//! Capture replay transport.
//!
//! Feeds a recorded byte stream through the [`Transport`] trait in
//! fixed-size chunks, as a serial driver would deliver it, and records
//! everything written back.

use super::traits::{ErrorCallback, ErrorReporter, Transport};
use crate::error::{Result, TransportError};
use crate::io::read_capture;
use std::path::Path;

/// In-memory transport replaying a capture.
#[derive(Debug)]
pub struct ReplayTransport {
    data: Vec<u8>,
    position: usize,
    chunk_size: usize,
    written: Vec<u8>,
    name: String,
    closed: bool,
    errors: ErrorReporter,
}

impl ReplayTransport {
    /// Replays `data` in chunks of at most `chunk_size` bytes.
    #[must_use]
    pub fn new(data: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            data,
            position: 0,
            chunk_size: chunk_size.max(1),
            written: Vec::new(),
            name: "replay".to_string(),
            closed: false,
            errors: ErrorReporter::default(),
        }
    }

    /// Loads a capture file for replay.
    pub fn from_file<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let mut transport = Self::new(read_capture(path)?, chunk_size);
        transport.name = path.display().to_string();
        Ok(transport)
    }

    /// Bytes written so far.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Closes the transport; writes fail afterwards.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Transport for ReplayTransport {
    fn write(&mut self, bytes: &[u8]) -> std::result::Result<usize, TransportError> {
        if self.closed {
            self.errors.report(&TransportError::NotOpen);
            return Err(TransportError::NotOpen);
        }
        self.written.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn poll_available(&mut self) -> usize {
        if self.closed { 0 } else { self.remaining() }
    }

    fn read_chunk(&mut self) -> Vec<u8> {
        if self.closed {
            return Vec::new();
        }
        let end = (self.position + self.chunk_size).min(self.data.len());
        let chunk = self.data[self.position..end].to_vec();
        self.position = end;
        chunk
    }

    fn on_error(&mut self, callback: ErrorCallback) {
        self.errors.set(callback);
    }

    /// Open until closed or fully consumed.
    fn is_open(&self) -> bool {
        !self.closed && self.position < self.data.len()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_chunks_until_exhausted() {
        let mut transport = ReplayTransport::new(b"abcdefg".to_vec(), 3);
        assert!(transport.is_open());
        assert_eq!(transport.read_chunk(), b"abc");
        assert_eq!(transport.read_chunk(), b"def");
        assert_eq!(transport.poll_available(), 1);
        assert_eq!(transport.read_chunk(), b"g");
        assert_eq!(transport.poll_available(), 0);
        assert!(transport.read_chunk().is_empty());
        assert!(!transport.is_open());
    }

    #[test]
    fn test_records_writes() {
        let mut transport = ReplayTransport::new(Vec::new(), 16);
        assert_eq!(transport.write(b"version\r\n"), Ok(9));
        assert_eq!(transport.written(), b"version\r\n");
    }

    #[test]
    fn test_closed_rejects_write() {
        let mut transport = ReplayTransport::new(b"data".to_vec(), 16);
        transport.close();
        assert_eq!(transport.write(b"x"), Err(TransportError::NotOpen));
        assert_eq!(transport.poll_available(), 0);
    }

    #[test]
    fn test_zero_chunk_size_clamped() {
        let mut transport = ReplayTransport::new(b"ab".to_vec(), 0);
        assert_eq!(transport.read_chunk(), b"a");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<inf> hello\r\n").unwrap();
        let transport = ReplayTransport::from_file(file.path(), 4).unwrap();
        assert_eq!(transport.remaining(), 13);
        assert!(transport.name().ends_with(&*file.path().file_name().unwrap().to_string_lossy()));
    }
}
