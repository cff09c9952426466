//! Line reconstruction from a chunked byte stream.
//!
//! - **buffer**: bounded accumulation of not-yet-terminated text
//! - **splitter**: heuristic splitting of oversized lines
//! - **session**: the Idle/Awaiting state machine tying it all together

pub mod buffer;
pub mod session;
pub mod splitter;

pub use buffer::AccumulationBuffer;
pub use session::{FlushState, PendingFlush, ReconstructionSession, SessionStats};
pub use splitter::FragmentSplitter;
