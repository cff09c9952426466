//! Serial port transport.
//!
//! Wraps the `serialport` crate: 8 data bits, no parity, one stop bit, no
//! flow control, and a short read timeout so a poll never stalls the loop.

use super::traits::{ErrorCallback, ErrorReporter, Transport};
use crate::error::TransportError;
use serde::Serialize;
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::info;

/// Baud rates offered by the CLI.
pub const BAUD_RATES: [u32; 5] = [9_600, 19_200, 38_400, 57_600, 115_200];

/// Default baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Description of an available serial port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    /// OS device name, e.g. `/dev/ttyACM0` or `COM3`.
    pub name: String,
    /// `USB`, `Bluetooth`, `PCI` or `Unknown`.
    pub port_type: String,
    /// USB manufacturer string.
    pub manufacturer: Option<String>,
    /// USB product string.
    pub product: Option<String>,
    /// USB serial number.
    pub serial_number: Option<String>,
    /// USB vendor id.
    pub vid: Option<u16>,
    /// USB product id.
    pub pid: Option<u16>,
}

/// Enumerates serial ports on this host.
///
/// On macOS only the `/dev/cu.*` devices are listed; their `/dev/tty.*`
/// twins block on open waiting for carrier detect.
pub fn list_ports() -> Result<Vec<PortInfo>, TransportError> {
    let ports =
        serialport::available_ports().map_err(|e| TransportError::Enumerate(e.to_string()))?;

    Ok(ports
        .into_iter()
        .filter(|p| !cfg!(target_os = "macos") || !p.port_name.starts_with("/dev/tty."))
        .map(|p| {
            let (port_type, manufacturer, product, serial_number, vid, pid) = match p.port_type {
                SerialPortType::UsbPort(usb) => (
                    "USB",
                    usb.manufacturer,
                    usb.product,
                    usb.serial_number,
                    Some(usb.vid),
                    Some(usb.pid),
                ),
                SerialPortType::BluetoothPort => ("Bluetooth", None, None, None, None, None),
                SerialPortType::PciPort => ("PCI", None, None, None, None, None),
                SerialPortType::Unknown => ("Unknown", None, None, None, None, None),
            };
            PortInfo {
                name: p.port_name,
                port_type: port_type.to_string(),
                manufacturer,
                product,
                serial_number,
                vid,
                pid,
            }
        })
        .collect())
}

/// A host serial port opened 8N1.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    name: String,
    read_chunk_size: usize,
    errors: ErrorReporter,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .field("read_chunk_size", &self.read_chunk_size)
            .finish_non_exhaustive()
    }
}

impl SerialTransport {
    /// Opens `port` at `baud_rate`.
    ///
    /// Each [`read_chunk`](Transport::read_chunk) returns at most
    /// `read_chunk_size` bytes.
    pub fn open(port: &str, baud_rate: u32, read_chunk_size: usize) -> Result<Self, TransportError> {
        let handle = serialport::new(port, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| TransportError::OpenFailed {
                port: port.to_string(),
                reason: e.to_string(),
            })?;
        info!(port, baud_rate, "serial port opened");

        Ok(Self {
            port: Some(handle),
            name: port.to_string(),
            read_chunk_size: read_chunk_size.max(1),
            errors: ErrorReporter::default(),
        })
    }

    /// Closes the port. Further writes fail with [`TransportError::NotOpen`].
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            info!(port = %self.name, "serial port closed");
        }
    }

    /// Configured baud rate, if the port is open.
    #[must_use]
    pub fn baud_rate(&self) -> Option<u32> {
        self.port.as_ref().and_then(|p| p.baud_rate().ok())
    }

    fn fail(&mut self, error: &TransportError) {
        self.errors.report(error);
        self.close();
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        let Some(port) = self.port.as_mut() else {
            self.errors.report(&TransportError::NotOpen);
            return Err(TransportError::NotOpen);
        };
        let result = port.write(bytes).and_then(|n| port.flush().map(|()| n));
        result.map_err(|e| {
            let error = TransportError::WriteFailed {
                reason: e.to_string(),
            };
            self.errors.report(&error);
            error
        })
    }

    fn poll_available(&mut self) -> usize {
        let Some(port) = self.port.as_ref() else {
            return 0;
        };
        match port.bytes_to_read() {
            Ok(n) => usize::try_from(n).unwrap_or(usize::MAX),
            Err(e) => {
                self.fail(&TransportError::from(e));
                0
            }
        }
    }

    fn read_chunk(&mut self) -> Vec<u8> {
        let Some(port) = self.port.as_mut() else {
            return Vec::new();
        };
        let mut buf = vec![0u8; self.read_chunk_size];
        match port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                buf
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Vec::new(),
            Err(e) => {
                self.fail(&TransportError::ReadFailed {
                    reason: e.to_string(),
                });
                Vec::new()
            }
        }
    }

    fn on_error(&mut self, callback: ErrorCallback) {
        self.errors.set(callback);
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baud_rates() {
        assert!(BAUD_RATES.contains(&DEFAULT_BAUD_RATE));
        assert!(BAUD_RATES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_open_missing_port_fails() {
        let result = SerialTransport::open("/dev/shell-sift-no-such-port", DEFAULT_BAUD_RATE, 1024);
        assert!(matches!(result, Err(TransportError::OpenFailed { .. })));
    }

    #[test]
    fn test_port_info_serializes() {
        let info = PortInfo {
            name: "/dev/ttyACM0".to_string(),
            port_type: "USB".to_string(),
            manufacturer: Some("SEGGER".to_string()),
            product: None,
            serial_number: None,
            vid: Some(0x1366),
            pid: Some(0x1051),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["vid"], 0x1366);
        assert_eq!(json["port_type"], "USB");
    }
}
