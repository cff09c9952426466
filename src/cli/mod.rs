//! CLI layer for shell-sift.
//!
//! Provides the command-line interface using clap, with commands for
//! listing ports, running a live session, replaying captures and
//! inspecting the stripping and classification stages.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::{ConsoleSink, OutputFormat, TranscriptSink};
pub use parser::{Cli, Commands, View};
