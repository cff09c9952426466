//! Transport trait definition.
//!
//! The reconstruction core sees the device only through this abstract
//! duplex channel, so a serial port, a capture replay and a test double are
//! interchangeable.

use crate::error::TransportError;

/// Callback receiving human-readable transport error messages.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Abstract duplex byte channel.
///
/// Reads are non-blocking: [`poll_available`](Transport::poll_available)
/// reports how much is waiting and a zero result is a no-op, not an error.
/// Failures are returned from [`write`](Transport::write) and also reported
/// to the registered error callback. Nothing is retried internally.
///
/// # Examples
///
/// ```
/// use shell_sift::transport::{ReplayTransport, Transport};
///
/// let mut transport = ReplayTransport::new(b"<inf> ready\r\n".to_vec(), 4);
/// assert_eq!(transport.poll_available(), 13);
/// assert_eq!(transport.read_chunk(), b"<inf".to_vec());
/// assert_eq!(transport.write(b"help\r\n").unwrap(), 6);
/// ```
pub trait Transport {
    /// Writes `bytes`, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError>;

    /// Bytes ready to read right now (0 if none).
    fn poll_available(&mut self) -> usize;

    /// Reads one chunk. May return fewer bytes than are available.
    fn read_chunk(&mut self) -> Vec<u8>;

    /// Registers the error callback, replacing any previous one.
    fn on_error(&mut self, callback: ErrorCallback);

    /// Whether the channel can still produce or accept data.
    fn is_open(&self) -> bool;

    /// Human-readable channel name.
    fn name(&self) -> &str;
}

/// Holds an optional [`ErrorCallback`] and reports through it.
#[derive(Default)]
pub struct ErrorReporter {
    callback: Option<ErrorCallback>,
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("registered", &self.callback.is_some())
            .finish()
    }
}

impl ErrorReporter {
    /// Replaces the callback.
    pub fn set(&mut self, callback: ErrorCallback) {
        self.callback = Some(callback);
    }

    /// Logs `error` and forwards its message to the callback.
    pub fn report(&mut self, error: &TransportError) {
        tracing::warn!(%error, "transport error");
        if let Some(callback) = self.callback.as_mut() {
            callback(&error.to_string());
        }
    }
}
