//! # shell-sift
//!
//! Serial terminal core that separates an embedded device's diagnostic log
//! output from its interactive shell responses.
//!
//! Raw bytes arrive at arbitrary read boundaries. shell-sift decodes them,
//! strips terminal control sequences and shell prompts, reassembles logical
//! lines (force-flushing after a short timeout when a terminator never
//! arrives), splits runaway lines, classifies each line and dispatches it to
//! a log sink or a command-response sink.
//!
//! ## Features
//!
//! - **Reconstruction**: bounded buffer with an explicit flush deadline
//! - **Classification**: ordered rule list plus a corrupted-log second pass
//! - **Configurable vocabulary**: tags, prompts and keywords loaded from JSON
//! - **Transports**: host serial ports and capture replay behind one trait

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod classify;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod io;
pub mod reconstruct;
pub mod terminal;
pub mod transport;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{Classification, LineOrigin, LogicalLine};

// Re-export pipeline types
pub use classify::{Classifier, EchoHistory, Rule, Verdict};
pub use config::{CompiledVocabulary, Config, PipelineConfig, Vocabulary};
pub use dispatch::{CollectingSink, DispatchBatch, LineSink};
pub use filter::{normalize_line_breaks, strip, strip_prompts};
pub use reconstruct::{AccumulationBuffer, FragmentSplitter, ReconstructionSession, SessionStats};
pub use terminal::Terminal;

// Re-export transport types
pub use transport::{ReplayTransport, SerialTransport, Transport, list_ports};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
