//! Enum wrappers for hardware backend dispatch.
//!
//! Native `async fn` in traits (Edition 2024 RPITIT) is not object-safe, so a
//! `Box<dyn SerialTransport>` is not possible. When the backend is chosen at
//! runtime, for example by a CLI flag that switches between a real port and a
//! simulated scanner, these enums give a single concrete type to hand to the
//! driver.
//!
//! # Examples
//!
//! ```
//! use mdc200_hardware::devices::{AnyOutputLine, AnySerialTransport};
//! use mdc200_hardware::mock::{MockOutputLine, MockSerial};
//!
//! let (serial, _serial_handle) = MockSerial::new();
//! let (trigger, _trigger_handle) = MockOutputLine::new("trigger");
//!
//! let serial = AnySerialTransport::Mock(serial);
//! let trigger = AnyOutputLine::Mock(trigger);
//! ```

use bytes::Bytes;

use crate::Result;
use crate::mock::{MockOutputLine, MockSerial};
use crate::traits::{OutputLine, SerialTransport};
use crate::types::LineLevel;

#[cfg(feature = "hardware-serial")]
use crate::serial::{ModemControlLine, TokioSerialTransport};

/// Enum wrapper for serial transport dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnySerialTransport {
    /// Mock link for development and testing.
    Mock(MockSerial),

    /// Serial port through `tokio-serial`.
    #[cfg(feature = "hardware-serial")]
    Serial(TokioSerialTransport),
}

impl SerialTransport for AnySerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Self::Mock(device) => device.write(bytes),
            #[cfg(feature = "hardware-serial")]
            Self::Serial(device) => device.write(bytes),
        }
    }

    async fn read_line(&mut self) -> Result<Bytes> {
        match self {
            Self::Mock(device) => device.read_line().await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(device) => device.read_line().await,
        }
    }

    fn drain_nonblocking(&mut self, scratch: &mut [u8]) -> Result<usize> {
        match self {
            Self::Mock(device) => device.drain_nonblocking(scratch),
            #[cfg(feature = "hardware-serial")]
            Self::Serial(device) => device.drain_nonblocking(scratch),
        }
    }
}

/// Enum wrapper for output line dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyOutputLine {
    /// Mock line for development and testing.
    Mock(MockOutputLine),

    /// RTS or DTR signal of a serial port.
    #[cfg(feature = "hardware-serial")]
    Modem(ModemControlLine),
}

impl OutputLine for AnyOutputLine {
    fn set_level(&mut self, level: LineLevel) -> Result<()> {
        match self {
            Self::Mock(line) => line.set_level(level),
            #[cfg(feature = "hardware-serial")]
            Self::Modem(line) => line.set_level(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_serial_transport_mock() {
        let (serial, handle) = MockSerial::new();
        let mut any_serial = AnySerialTransport::Mock(serial);

        any_serial.write(b"ping").unwrap();
        handle.inject(b"pong\n").unwrap();

        let line = any_serial.read_line().await.unwrap();
        assert_eq!(&line[..], b"pong\n");
        assert_eq!(&handle.written()[0][..], b"ping");

        let mut scratch = [0u8; 8];
        assert_eq!(any_serial.drain_nonblocking(&mut scratch).unwrap(), 0);
    }

    #[test]
    fn test_any_output_line_mock() {
        let (line, handle) = MockOutputLine::new("trigger");
        let mut any_line = AnyOutputLine::Mock(line);

        any_line.set_level(LineLevel::Active).unwrap();
        assert_eq!(handle.level(), Some(LineLevel::Active));
    }
}
