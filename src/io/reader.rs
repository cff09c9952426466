//! Capture file reading.
//!
//! Captures are raw byte dumps of a serial session, replayed through the
//! pipeline by [`crate::transport::ReplayTransport`].

use crate::error::{IoError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Largest capture accepted (64MB).
const MAX_CAPTURE_SIZE: u64 = 64 * 1024 * 1024;

/// Reads a capture file into memory.
///
/// # Arguments
///
/// * `path` - Path to the capture.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, or larger than
/// the capture limit.
///
/// # Examples
///
/// ```no_run
/// use shell_sift::io::read_capture;
///
/// let bytes = read_capture("session.bin").unwrap();
/// ```
pub fn read_capture<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path_ref = path.as_ref();
    let path_str = path_ref.to_string_lossy().to_string();

    if !path_ref.exists() {
        return Err(IoError::FileNotFound { path: path_str }.into());
    }

    let mut file = File::open(path_ref).map_err(|e| IoError::ReadFailed {
        path: path_str.clone(),
        reason: e.to_string(),
    })?;

    let size = file
        .metadata()
        .map_err(|e| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?
        .len();

    if size > MAX_CAPTURE_SIZE {
        return Err(IoError::ReadFailed {
            path: path_str,
            reason: format!("capture too large: {size} bytes (max: {MAX_CAPTURE_SIZE} bytes)"),
        }
        .into());
    }

    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)
        .map_err(|e| IoError::ReadFailed {
            path: path_str,
            reason: e.to_string(),
        })?;
    Ok(buffer)
}
