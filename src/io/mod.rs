//! I/O utilities for shell-sift.
//!
//! Provides chunk decoding, capture file reading and the character
//! boundary helpers shared by the reconstruction stages.

pub mod decode;
pub mod reader;
pub mod unicode;

pub use decode::{TextDecoding, decode_chunk};
pub use reader::read_capture;
pub use unicode::{split_at_char_limit, tail_start};
