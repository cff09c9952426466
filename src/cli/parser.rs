//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::config::{CONFIG_ENV, Config};
use crate::core::Classification;
use crate::error::Result;
use crate::transport::DEFAULT_BAUD_RATE;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// shell-sift: serial terminal that separates device logs from shell output.
///
/// Reads an embedded device's serial console, reassembles lines split
/// across reads, strips terminal control sequences and routes each line to
/// a log stream or a command-response stream.
#[derive(Parser, Debug)]
#[command(name = "shell-sift")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a JSON configuration file.
    #[arg(short, long, env = CONFIG_ENV, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Milliseconds to wait for a line terminator before force-flushing.
    #[arg(long, global = true)]
    pub flush_timeout_ms: Option<u64>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Which streams the live terminal prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum View {
    /// Log lines only.
    Log,
    /// Command responses only.
    Command,
    /// Both streams.
    #[default]
    Both,
}

impl View {
    /// Whether lines of `classification` are shown.
    #[must_use]
    pub const fn shows(self, classification: Classification) -> bool {
        matches!(
            (self, classification),
            (Self::Both, _)
                | (Self::Log, Classification::Log)
                | (Self::Command, Classification::CommandResponse)
        )
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List serial ports.
    Ports,

    /// Open a serial port and run an interactive session.
    ///
    /// Lines typed on stdin are sent as commands; end of input closes the
    /// session.
    Connect {
        /// Serial port, e.g. /dev/ttyACM0 or COM3.
        port: String,

        /// Baud rate (9600, 19200, 38400, 57600, 115200).
        #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
        baud: u32,

        /// Streams to print.
        #[arg(long, value_enum, default_value_t = View::Both)]
        view: View,

        /// Largest read per poll, in bytes.
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Run a captured byte stream through the pipeline.
    Replay {
        /// Capture file with raw serial bytes.
        file: PathBuf,

        /// Bytes delivered per simulated read.
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Classify a single line and show which rule fired.
    Classify {
        /// Line to classify.
        line: String,
    },

    /// Strip control sequences and prompts from text.
    Strip {
        /// Text to strip (reads from stdin if not provided).
        text: Option<String>,
    },

    /// Print the effective configuration as JSON.
    Config,
}

impl Cli {
    /// Loads the configuration file, if any, and applies flag overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(ms) = self.flush_timeout_ms {
            config.pipeline.flush_timeout_ms = ms;
        }
        match &self.command {
            Commands::Connect {
                chunk_size: Some(size),
                ..
            }
            | Commands::Replay {
                chunk_size: Some(size),
                ..
            } => config.pipeline.read_chunk_size = *size,
            _ => {}
        }
        config.validate()?;
        Ok(config)
    }
}
