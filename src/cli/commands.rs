//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::classify::{Classifier, EchoHistory};
use crate::cli::output::{
    ConsoleSink, OutputFormat, ReplayReport, TranscriptSink, format_config, format_ports,
    format_replay, format_stats, format_stripped, format_verdict,
};
use crate::cli::parser::{Cli, Commands, View};
use crate::config::Config;
use crate::error::{CommandError, Result};
use crate::filter::{strip, strip_prompts};
use crate::reconstruct::ReconstructionSession;
use crate::terminal::Terminal;
use crate::transport::{ReplayTransport, SerialTransport, Transport, list_ports};
use std::io::{self, BufRead, Read};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the command fails.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let config = cli.load_config()?;

    match &cli.command {
        Commands::Ports => cmd_ports(format),
        Commands::Connect {
            port, baud, view, ..
        } => cmd_connect(&config, port, *baud, *view, format),
        Commands::Replay { file, .. } => cmd_replay(&config, file, format),
        Commands::Classify { line } => cmd_classify(&config, line, format),
        Commands::Strip { text } => cmd_strip(&config, text.as_deref(), format),
        Commands::Config => Ok(format_config(&config)),
    }
}

fn cmd_ports(format: OutputFormat) -> Result<String> {
    let ports = list_ports()?;
    Ok(format_ports(&ports, format))
}

fn cmd_connect(
    config: &Config,
    port: &str,
    baud: u32,
    view: View,
    format: OutputFormat,
) -> Result<String> {
    let vocabulary = config.compile_vocabulary()?;
    let mut transport = SerialTransport::open(port, baud, config.pipeline.read_chunk_size)?;

    let failure: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&failure);
    transport.on_error(Box::new(move |message| {
        if let Ok(mut slot) = slot.lock() {
            *slot = Some(message.to_string());
        }
    }));

    let sink = ConsoleSink::new(io::stdout(), view, format);
    let session = ReconstructionSession::new(&config.pipeline, vocabulary);
    let mut terminal = Terminal::new(transport, sink, session, &config.pipeline);
    terminal
        .sink_mut()
        .notice(&format!("Connected to {port} at {baud} baud"));

    let commands = spawn_stdin_reader();
    loop {
        terminal.pump(Instant::now());

        match commands.try_recv() {
            Ok(line) if line.trim().is_empty() => {}
            Ok(line) => match terminal.send_command(&line) {
                Ok(_) => terminal.sink_mut().sent(line.trim()),
                Err(e) => terminal.sink_mut().notice(&format!("Send failed: {e}")),
            },
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        if output_closed(terminal.sink())? || !terminal.transport().is_open() {
            break;
        }
        thread::sleep(terminal.poll_interval());
    }

    terminal.finish();
    terminal.sink_mut().notice(&format!("Disconnected from {port}"));
    let stats = *terminal.stats();
    drop(terminal);

    let reason = failure.lock().ok().and_then(|mut slot| slot.take());
    if let Some(reason) = reason {
        return Err(CommandError::ExecutionFailed(reason).into());
    }
    Ok(format_stats(&stats, format))
}

/// Whether the console reader has gone away. Other write errors are fatal.
fn output_closed<W: io::Write>(sink: &ConsoleSink<W>) -> Result<bool> {
    match sink.write_error() {
        None => Ok(false),
        Some(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(true),
        Some(e) => Err(CommandError::ExecutionFailed(format!("failed to write output: {e}")).into()),
    }
}

/// Forwards stdin lines to a channel until end of input.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn cmd_replay(config: &Config, file: &Path, format: OutputFormat) -> Result<String> {
    let vocabulary = config.compile_vocabulary()?;
    let transport = ReplayTransport::from_file(file, config.pipeline.read_chunk_size)?;
    let source = transport.name().to_string();
    let session = ReconstructionSession::new(&config.pipeline, vocabulary);
    let mut terminal = Terminal::new(
        transport,
        TranscriptSink::default(),
        session,
        &config.pipeline,
    );

    terminal.drain(Instant::now(), config.pipeline.poll_interval());
    let stats = *terminal.stats();
    let (_, sink) = terminal.into_parts();

    let report = ReplayReport {
        source,
        lines: sink.into_entries(),
        stats,
    };
    Ok(format_replay(&report, format))
}

fn cmd_classify(config: &Config, line: &str, format: OutputFormat) -> Result<String> {
    let classifier = Classifier::new(config.compile_vocabulary()?);
    let verdict = classifier.classify_with_recovery(line.trim(), &EchoHistory::default());
    Ok(format_verdict(line.trim(), &verdict, format))
}

fn cmd_strip(config: &Config, text: Option<&str>, format: OutputFormat) -> Result<String> {
    let vocabulary = config.compile_vocabulary()?;

    // Read text from stdin if not provided
    let text = if let Some(t) = text {
        t.to_string()
    } else {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer).map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to read from stdin: {e}"))
        })?;
        String::from_utf8_lossy(&buffer).into_owned()
    };

    let cleaned = strip_prompts(&strip(&text), &vocabulary);
    Ok(format_stripped(&cleaned, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cli(command: Commands, format: &str) -> Cli {
        Cli {
            config: None,
            verbose: 0,
            format: format.to_string(),
            flush_timeout_ms: None,
            command,
        }
    }

    struct FailingWriter(io::ErrorKind);

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(self.0.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_output_closed_on_broken_pipe() {
        let mut sink = ConsoleSink::new(Vec::new(), View::Both, OutputFormat::Text);
        sink.notice("connected");
        assert!(!output_closed(&sink).unwrap());

        let mut sink = ConsoleSink::new(
            FailingWriter(io::ErrorKind::BrokenPipe),
            View::Both,
            OutputFormat::Text,
        );
        sink.notice("connected");
        assert!(output_closed(&sink).unwrap());
    }

    #[test]
    fn test_output_error_other_than_broken_pipe_fails() {
        let mut sink = ConsoleSink::new(
            FailingWriter(io::ErrorKind::PermissionDenied),
            View::Both,
            OutputFormat::Text,
        );
        sink.notice("connected");
        assert!(output_closed(&sink).is_err());
    }

    #[test]
    fn test_classify_command() {
        let output = execute(&cli(
            Commands::Classify {
                line: "[12:03:44] MQTT publish ok".to_string(),
            },
            "text",
        ))
        .unwrap();
        assert!(output.contains("Stream:   log"));
        assert!(output.contains("Rule:     bracketed_timestamp"));
    }

    #[test]
    fn test_strip_command() {
        let output = execute(&cli(
            Commands::Strip {
                text: Some("\x1b[1;32muart:~$ \x1b[0mversion\r\n".to_string()),
            },
            "text",
        ))
        .unwrap();
        assert_eq!(output, "version\r\n");
    }

    #[test]
    fn test_config_command_is_json() {
        let output = execute(&cli(Commands::Config, "text")).unwrap();
        let config: Config = serde_json::from_str(&output).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_replay_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("capture.bin");
        std::fs::write(&path, b"\x1b[1;33m<inf> boot done\x1b[0m\r\nuart:~$ Zephyr version 3.5.0\r\n")
            .unwrap();

        let output = execute(&cli(
            Commands::Replay {
                file: path,
                chunk_size: None,
            },
            "text",
        ))
        .unwrap();
        assert!(output.contains("[log] <inf> boot done"));
        assert!(output.contains("[command] Zephyr version 3.5.0"));
        assert!(output.contains("Chunks:          1"));
    }

    #[test]
    fn test_replay_missing_file() {
        let result = execute(&cli(
            Commands::Replay {
                file: PathBuf::from("/nonexistent/capture.bin"),
                chunk_size: None,
            },
            "text",
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_connect_missing_port() {
        let result = execute(&cli(
            Commands::Connect {
                port: "/dev/shell-sift-no-such-port".to_string(),
                baud: 115_200,
                view: View::Both,
                chunk_size: None,
            },
            "text",
        ));
        assert!(matches!(result, Err(crate::Error::Transport(_))));
    }
}
