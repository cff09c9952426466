//! Core domain models for shell-sift.
//!
//! Logical lines and classification verdicts. These are pure values with
//! no I/O dependencies.

pub mod classification;
pub mod line;

pub use classification::Classification;
pub use line::{LineOrigin, LogicalLine};
