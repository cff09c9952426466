//! Error types for shell-sift operations.
//!
//! The reconstruction core (stripping, line reconstruction, classification,
//! dispatch) is total and never fails. Errors only arise at the edges:
//! the serial transport, configuration loading, file I/O and CLI commands.

use thiserror::Error;

/// Result type alias for shell-sift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport errors (serial port or replay source).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors raised by a [`crate::transport::Transport`].
///
/// These are surfaced to the caller and never retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Operation attempted on a closed channel.
    #[error("port is not open")]
    NotOpen,

    /// The port could not be opened or configured.
    #[error("failed to open {port}: {reason}")]
    OpenFailed {
        /// Port name.
        port: String,
        /// Reason reported by the OS.
        reason: String,
    },

    /// A write failed outright.
    #[error("write failed: {reason}")]
    WriteFailed {
        /// Reason reported by the OS.
        reason: String,
    },

    /// Fewer bytes were written than requested.
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite {
        /// Bytes actually written.
        written: usize,
        /// Bytes requested.
        expected: usize,
    },

    /// A read or status query failed.
    #[error("read failed: {reason}")]
    ReadFailed {
        /// Reason reported by the OS.
        reason: String,
    },

    /// Port enumeration failed.
    #[error("failed to enumerate ports: {0}")]
    Enumerate(String),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field holds an out-of-range value.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The configuration document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A vocabulary pattern failed to compile.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read {path}: {reason}")]
    Read {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    /// Output format error.
    #[error("output format error: {0}")]
    OutputFormat(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<serialport::Error> for TransportError {
    fn from(err: serialport::Error) -> Self {
        Self::ReadFailed {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<regex::Error> for ConfigError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: String::new(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::ShortWrite {
            written: 3,
            expected: 9,
        };
        assert_eq!(err.to_string(), "short write: 3 of 9 bytes");

        let err = TransportError::OpenFailed {
            port: "/dev/ttyACM0".to_string(),
            reason: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "failed to open /dev/ttyACM0: busy");

        assert_eq!(TransportError::NotOpen.to_string(), "port is not open");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            field: "retain_fraction",
            reason: "must be in (0, 1]".to_string(),
        };
        assert!(err.to_string().contains("retain_fraction"));

        let err = ConfigError::InvalidPattern {
            pattern: "[".to_string(),
            reason: "unclosed".to_string(),
        };
        assert!(err.to_string().contains("unclosed"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(IoError::Generic(_))));
    }

    #[test]
    fn test_error_from_transport() {
        let err: Error = TransportError::NotOpen.into();
        assert!(matches!(err, Error::Transport(TransportError::NotOpen)));
        assert_eq!(err.to_string(), "transport error: port is not open");
    }

    #[test]
    fn test_from_serde_json_error_to_config_error() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    #[allow(clippy::invalid_regex)]
    fn test_from_regex_error_to_config_error() {
        let regex_err = regex::Regex::new("[invalid").unwrap_err();
        let err: ConfigError = regex_err.into();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_command_error_variants() {
        let err = CommandError::InvalidArgument("--baud".to_string());
        assert!(err.to_string().contains("invalid argument"));

        let err = CommandError::ExecutionFailed("timeout".to_string());
        assert!(err.to_string().contains("execution failed"));

        let err = CommandError::OutputFormat("json error".to_string());
        assert!(err.to_string().contains("output format"));
    }
}
