//! Byte transports feeding the reconstruction pipeline.
//!
//! - **traits**: the abstract [`Transport`] channel
//! - **serial**: a host serial port via the `serialport` crate
//! - **replay**: a recorded capture delivered in fixed-size chunks

pub mod replay;
pub mod serial;
pub mod traits;

pub use replay::ReplayTransport;
pub use serial::{BAUD_RATES, DEFAULT_BAUD_RATE, PortInfo, SerialTransport, list_ports};
pub use traits::{ErrorCallback, ErrorReporter, Transport};
