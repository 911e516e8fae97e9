//! Serial port backends.
//!
//! [`TokioSerialTransport`] carries the scanner's data link over a
//! `tokio-serial` stream. [`ModemControlLine`] turns the RTS or DTR signal of
//! a serial port into a digital output, which is how a USB-serial adapter can
//! drive the scanner's trigger and wake inputs without GPIO hardware.
//!
//! Requires the `hardware-serial` feature.

use bytes::Bytes;
use std::fmt;
use std::io::ErrorKind;
use std::time::Duration;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, trace};

use mdc200_core::constants::DEFAULT_BAUD_RATE;

use crate::{
    HardwareError, Result,
    io::{LineBuffer, WRITE_TIMEOUT, write_all_within},
    traits::{OutputLine, SerialTransport},
    types::{LineLevel, ModemSignal},
};

/// Serial link to the scanner over `tokio-serial`.
///
/// Received bytes are collected in an internal [`LineBuffer`]. `read_line`
/// only awaits on `read_buf`, which is cancel-safe, so a read dropped by a
/// timeout leaves any partial line in that buffer. Writes give up after
/// [`WRITE_TIMEOUT`] if the port stops accepting bytes. `drain_nonblocking` empties the
/// line buffer first and then reads no more than the OS reports as pending,
/// so it never waits.
///
/// # Examples
///
/// ```no_run
/// use mdc200_hardware::serial::TokioSerialTransport;
/// use mdc200_hardware::traits::SerialTransport;
///
/// # async fn example() -> mdc200_hardware::Result<()> {
/// let mut serial = TokioSerialTransport::open("/dev/ttyUSB0", 9600).await?;
/// let line = serial.read_line().await?;
/// # Ok(())
/// # }
/// ```
pub struct TokioSerialTransport {
    /// Port stream
    stream: SerialStream,

    /// Received bytes not yet returned as a line
    line_buf: LineBuffer,

    /// Port path, for logs and errors
    path: String,
}

impl TokioSerialTransport {
    /// Open a port at 8N1 without flow control.
    ///
    /// The port is opened on the blocking pool so the runtime is not stalled
    /// while the OS configures it.
    ///
    /// # Errors
    ///
    /// Returns an error if the port does not exist or cannot be configured.
    pub async fn open(path: &str, baud_rate: u32) -> Result<Self> {
        info!(port = path, baud_rate, "Opening scanner serial port");

        let path_owned = path.to_string();
        let stream = tokio::task::spawn_blocking(move || {
            tokio_serial::new(&path_owned, baud_rate)
                .data_bits(tokio_serial::DataBits::Eight)
                .parity(tokio_serial::Parity::None)
                .stop_bits(tokio_serial::StopBits::One)
                .flow_control(tokio_serial::FlowControl::None)
                .open_native_async()
        })
        .await
        .map_err(|e| HardwareError::other(format!("serial open task failed: {}", e)))??;

        Ok(Self::from_stream(stream, path))
    }

    /// Wrap an already opened stream.
    pub fn from_stream(stream: SerialStream, path: impl Into<String>) -> Self {
        Self {
            stream,
            line_buf: LineBuffer::new(),
            path: path.into(),
        }
    }

    /// Port path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Use one of this port's own modem signals as an output line.
    ///
    /// For adapters where the scanner's trigger or wake input is wired to
    /// the same port that carries the data.
    ///
    /// # Errors
    ///
    /// Returns an error if the port handle cannot be cloned.
    pub fn modem_line(&self, signal: ModemSignal) -> Result<ModemControlLine> {
        let port = tokio_serial::SerialPort::try_clone(&self.stream)?;
        Ok(ModemControlLine::from_port(
            port,
            signal,
            format!("{}:{}", self.path, signal),
        ))
    }
}

impl fmt::Debug for TokioSerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioSerialTransport")
            .field("path", &self.path)
            .field("buffered", &self.line_buf.len())
            .finish()
    }
}

impl SerialTransport for TokioSerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        trace!(port = %self.path, len = bytes.len(), "Writing to serial port");
        write_all_within(&mut self.stream, bytes, WRITE_TIMEOUT, &self.path)
    }

    async fn read_line(&mut self) -> Result<Bytes> {
        loop {
            if let Some(line) = self.line_buf.take_line() {
                trace!(port = %self.path, len = line.len(), "Line received");
                return Ok(line);
            }

            let count = self.line_buf.read_from(&mut self.stream).await?;
            if count == 0 {
                return Err(HardwareError::disconnected(self.path.clone()));
            }
        }
    }

    fn drain_nonblocking(&mut self, scratch: &mut [u8]) -> Result<usize> {
        if !self.line_buf.is_empty() {
            return Ok(self.line_buf.drain_into(scratch));
        }

        let pending = tokio_serial::SerialPort::bytes_to_read(&self.stream)? as usize;
        if pending == 0 {
            return Ok(0);
        }

        let len = pending.min(scratch.len());
        match std::io::Read::read(&mut self.stream, &mut scratch[..len]) {
            Ok(count) => Ok(count),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

/// Digital output driven by a serial port's RTS or DTR signal.
///
/// Asserting a modem signal pulls the adapter's TTL pin low, which matches
/// the scanner's active-low inputs: [`LineLevel::Active`] asserts the signal
/// and [`LineLevel::Idle`] releases it.
///
/// # Examples
///
/// ```no_run
/// use mdc200_hardware::serial::ModemControlLine;
/// use mdc200_hardware::traits::OutputLine;
/// use mdc200_hardware::types::{LineLevel, ModemSignal};
///
/// let mut trigger = ModemControlLine::open("/dev/ttyUSB1", ModemSignal::Rts)?;
/// trigger.set_level(LineLevel::Idle)?;
/// # Ok::<(), mdc200_hardware::HardwareError>(())
/// ```
pub struct ModemControlLine {
    /// Port owning the signal
    port: Box<dyn serialport::SerialPort>,

    /// Which signal is the output
    signal: ModemSignal,

    /// Line name, for logs and errors
    name: String,
}

impl ModemControlLine {
    /// Open a port and use one of its modem signals as an output.
    ///
    /// The port's data lines are left unused; the baud rate only matters to
    /// drivers that refuse to open without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be opened.
    pub fn open(path: &str, signal: ModemSignal) -> Result<Self> {
        debug!(port = path, %signal, "Opening modem control line");

        let port = serialport::new(path, DEFAULT_BAUD_RATE)
            .timeout(Duration::from_millis(100))
            .open()?;

        Ok(Self::from_port(port, signal, format!("{}:{}", path, signal)))
    }

    /// Use a signal of an already opened port.
    pub fn from_port(
        port: Box<dyn serialport::SerialPort>,
        signal: ModemSignal,
        name: impl Into<String>,
    ) -> Self {
        Self {
            port,
            signal,
            name: name.into(),
        }
    }

    /// Signal driven by this line.
    pub fn signal(&self) -> ModemSignal {
        self.signal
    }
}

impl fmt::Debug for ModemControlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModemControlLine")
            .field("name", &self.name)
            .field("signal", &self.signal)
            .finish()
    }
}

impl OutputLine for ModemControlLine {
    fn set_level(&mut self, level: LineLevel) -> Result<()> {
        let asserted = level == LineLevel::Active;
        let result = match self.signal {
            ModemSignal::Rts => self.port.write_request_to_send(asserted),
            ModemSignal::Dtr => self.port.write_data_terminal_ready(asserted),
        };

        result.map_err(|e| HardwareError::line(&self.name, e.description))
    }
}
