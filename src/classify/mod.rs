//! Line classification.
//!
//! - **rules**: the ordered first-match rule list
//! - **corrupted**: the second pass that rescues log lines missing their tag
//!
//! [`Classifier::classify`] is the pure first pass; the reconstruction
//! session calls [`Classifier::classify_with_recovery`] so that sent-command
//! echoes are taken into account.

pub mod corrupted;
pub mod rules;

pub use corrupted::{EchoHistory, MIN_RESPONSE_LENGTH, Verdict, is_likely_corrupted_log};
pub use rules::{Classifier, DEFAULT_RULES, Rule};
