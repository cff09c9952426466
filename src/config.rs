//! Pipeline tunables and classification vocabulary.
//!
//! Every constant the reconstruction pipeline relies on lives here so it
//! can be overridden from a JSON document. The keyword and pattern lists
//! in [`Vocabulary`] are tuned to Zephyr-style shells and are expected to
//! need adjustment for other firmware.

use crate::error::{ConfigError, IoError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Maximum number of characters held in the accumulation buffer.
pub const MAX_ACCUMULATED_SIZE: usize = 65_536;

/// Lines longer than this are handed to the fragment splitter.
pub const MAX_LINE_LENGTH: usize = 8_192;

/// Milliseconds to wait for a terminator before force-flushing.
pub const FLUSH_TIMEOUT_MS: u64 = 100;

/// Fraction of `MAX_ACCUMULATED_SIZE` retained after an overflow.
pub const RETAIN_FRACTION: f64 = 0.5;

/// Minimum length of a trailing accumulated fragment.
pub const MIN_FRAGMENT_LENGTH: usize = 5;

/// Parts longer than this are considered self-contained messages.
pub const MIN_SELF_CONTAINED_LENGTH: usize = 10;

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "SHELL_SIFT_CONFIG";

/// Numeric tunables for the reconstruction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on buffered characters.
    pub max_accumulated_size: usize,
    /// Threshold above which a line is split into fragments.
    pub max_line_length: usize,
    /// Flush deadline after the last incomplete chunk.
    pub flush_timeout_ms: u64,
    /// Share of `max_accumulated_size` kept when the buffer overflows.
    pub retain_fraction: f64,
    /// Minimum length for the trailing running fragment.
    pub min_fragment_length: usize,
    /// Parts longer than this are emitted on their own.
    pub min_self_contained_length: usize,
    /// Length at which the running fragment buffer is emitted.
    pub fragment_emit_length: usize,
    /// Parts of this length or shorter are discarded as noise.
    pub min_part_length: usize,
    /// Poll cadence of the terminal loop.
    pub poll_interval_ms: u64,
    /// Largest read requested from the transport in one call.
    pub read_chunk_size: usize,
    /// Terminator appended to outgoing commands.
    pub line_ending: String,
    /// How many sent commands are remembered for echo detection.
    pub echo_history: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_accumulated_size: MAX_ACCUMULATED_SIZE,
            max_line_length: MAX_LINE_LENGTH,
            flush_timeout_ms: FLUSH_TIMEOUT_MS,
            retain_fraction: RETAIN_FRACTION,
            min_fragment_length: MIN_FRAGMENT_LENGTH,
            min_self_contained_length: MIN_SELF_CONTAINED_LENGTH,
            fragment_emit_length: 20,
            min_part_length: 2,
            poll_interval_ms: 2,
            read_chunk_size: 1024,
            line_ending: "\r\n".to_string(),
            echo_history: 8,
        }
    }
}

impl PipelineConfig {
    /// Flush deadline as a [`Duration`].
    #[must_use]
    pub const fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    /// Poll cadence as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Number of characters kept after an overflow.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn retain_size(&self) -> usize {
        let retained = (self.max_accumulated_size as f64 * self.retain_fraction).floor() as usize;
        retained.min(self.max_accumulated_size)
    }

    /// Checks that the tunables are mutually consistent.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_accumulated_size == 0 {
            return Err(ConfigError::Invalid {
                field: "max_accumulated_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.max_line_length == 0 {
            return Err(ConfigError::Invalid {
                field: "max_line_length",
                reason: "must be > 0".to_string(),
            });
        }
        if self.max_line_length > self.max_accumulated_size {
            return Err(ConfigError::Invalid {
                field: "max_line_length",
                reason: format!(
                    "{} exceeds max_accumulated_size {}",
                    self.max_line_length, self.max_accumulated_size
                ),
            });
        }
        if !(self.retain_fraction > 0.0 && self.retain_fraction <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "retain_fraction",
                reason: format!("{} is outside (0, 1]", self.retain_fraction),
            });
        }
        if self.read_chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "read_chunk_size",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Word lists and patterns driving prompt stripping and classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Log-level tags that mark a line as log output.
    pub log_tags: Vec<String>,
    /// Characters that flag a very short line as a truncated tag remnant.
    pub fragment_indicators: String,
    /// Prefixes left behind when a log tag is cut in half.
    pub fragment_prefixes: Vec<String>,
    /// Shell prompt markers that identify command responses.
    pub prompt_markers: Vec<String>,
    /// Regexes removed from incoming text before line splitting.
    pub prompt_patterns: Vec<String>,
    /// Subsystem words that betray a log line which lost its tag.
    pub subsystem_keywords: Vec<String>,
    /// Command words whose short echoes are never treated as log noise.
    pub echo_exemptions: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            log_tags: to_strings(&[
                "<inf>", "<wrn>", "<dbg>", "<err>", "<nfo>", "<warn>", "<debug>", "<error>",
            ]),
            fragment_indicators: "wd:nf> x".to_string(),
            fragment_prefixes: to_strings(&["w ", "d ", ": ", "nf> ", "n ", "f> "]),
            prompt_markers: to_strings(&["login>", "dev>", "uart:~$", "$ "]),
            prompt_patterns: to_strings(&[
                r"[\w.-]+:~\$ ",
                r"[\w.-]+:~\$",
                r"\b(?:dev|login)> ?",
                r"(?m)^[\w.-]+:~?\$? ",
            ]),
            subsystem_keywords: to_strings(&[
                "wifi", "wlan", "net", "mqtt", "tcp", "udp", "ipv4", "ipv6", "dhcp", "dns", "sntp",
                "ble", "bt", "lte", "modem", "radio", "rssi", "thread", "mutex", "sem", "workq",
                "isr",
            ]),
            echo_exemptions: to_strings(&["help"]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// A [`Vocabulary`] with its patterns compiled and lists normalised.
#[derive(Debug, Clone)]
pub struct CompiledVocabulary {
    /// Lowercased log tags.
    pub log_tags: Vec<String>,
    /// Fragment indicator characters.
    pub fragment_indicators: Vec<char>,
    /// Fragment prefixes, verbatim.
    pub fragment_prefixes: Vec<String>,
    /// Prompt markers, verbatim.
    pub prompt_markers: Vec<String>,
    /// Compiled prompt patterns, applied in order.
    pub prompt_patterns: Vec<Regex>,
    /// Whole-word, case-insensitive subsystem keyword matcher.
    pub keywords: Option<Regex>,
    /// Lowercased echo exemption words.
    pub echo_exemptions: Vec<String>,
}

impl CompiledVocabulary {
    /// Compiles a vocabulary, rejecting invalid patterns.
    pub fn compile(vocabulary: &Vocabulary) -> std::result::Result<Self, ConfigError> {
        let prompt_patterns = vocabulary
            .prompt_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let keywords = if vocabulary.subsystem_keywords.is_empty() {
            None
        } else {
            let alternation = vocabulary
                .subsystem_keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\b(?:{alternation})\b");
            Some(
                Regex::new(&pattern).map_err(|e| ConfigError::InvalidPattern {
                    pattern,
                    reason: e.to_string(),
                })?,
            )
        };

        Ok(Self {
            log_tags: vocabulary
                .log_tags
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            fragment_indicators: vocabulary.fragment_indicators.chars().collect(),
            fragment_prefixes: vocabulary.fragment_prefixes.clone(),
            prompt_markers: vocabulary.prompt_markers.clone(),
            prompt_patterns,
            keywords,
            echo_exemptions: vocabulary
                .echo_exemptions
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
        })
    }
}

impl Default for CompiledVocabulary {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::compile(&Vocabulary::default()).expect("default vocabulary compiles")
    }
}

/// Complete configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Numeric tunables.
    pub pipeline: PipelineConfig,
    /// Classification vocabulary.
    pub vocabulary: Vocabulary,
}

impl Config {
    /// Parses a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// Validates tunables and compiles the vocabulary once.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.pipeline.validate()?;
        CompiledVocabulary::compile(&self.vocabulary).map(|_| ())
    }

    /// Compiles the vocabulary.
    pub fn compile_vocabulary(&self) -> std::result::Result<CompiledVocabulary, ConfigError> {
        CompiledVocabulary::compile(&self.vocabulary)
    }
}
