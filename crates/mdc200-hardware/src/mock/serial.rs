//! Mock serial transport for testing and development.
//!
//! This module provides a simulated serial link that can be fed and inspected
//! programmatically, without a scanner attached.

use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::trace;

use crate::{HardwareError, Result, io::LineBuffer, traits::SerialTransport};

/// State shared between a [`MockSerial`] and its handles.
#[derive(Debug, Default)]
struct MockSerialState {
    /// Every buffer passed to `write`, in order
    written: Vec<Bytes>,

    /// Total bytes removed by `drain_nonblocking`
    drained: usize,

    /// Make `write` fail
    fail_writes: bool,

    /// Make `read_line` and `drain_nonblocking` fail
    fail_reads: bool,
}

fn lock(state: &Mutex<MockSerialState>) -> MutexGuard<'_, MockSerialState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mock serial link for testing and development.
///
/// Incoming bytes are injected through a [`MockSerialHandle`] in chunks of any
/// size; the mock splits them into lines exactly like a UART would deliver
/// them. Writes are recorded so tests can check what was sent.
///
/// `read_line` only awaits on the injection channel and moves received bytes
/// into an internal buffer before checking for a line, so dropping it mid-wait
/// loses nothing.
///
/// # Examples
///
/// ```
/// use mdc200_hardware::mock::MockSerial;
/// use mdc200_hardware::traits::SerialTransport;
///
/// #[tokio::main]
/// async fn main() -> mdc200_hardware::Result<()> {
///     let (mut serial, handle) = MockSerial::new();
///
///     handle.inject(b"\x02HEL")?;
///     handle.inject(b"LO\x03\r\n")?;
///
///     let line = serial.read_line().await?;
///     assert_eq!(&line[..], b"\x02HELLO\x03\r\n");
///
///     serial.write(b"\x1bZZS0ZZ\r")?;
///     assert_eq!(handle.written().len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockSerial {
    /// Channel receiver for injected bytes
    input_rx: mpsc::UnboundedReceiver<Bytes>,

    /// Received bytes not yet returned as a line
    pending: LineBuffer,

    /// State shared with handles
    state: Arc<Mutex<MockSerialState>>,

    /// Device name
    name: String,
}

impl MockSerial {
    /// Create a new mock serial link with the default name.
    ///
    /// Returns a tuple of (MockSerial, MockSerialHandle) where the handle
    /// feeds and inspects the link.
    pub fn new() -> (Self, MockSerialHandle) {
        Self::with_name("Mock Serial".to_string())
    }

    /// Create a new mock serial link with a custom name.
    pub fn with_name(name: String) -> (Self, MockSerialHandle) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(MockSerialState::default()));

        let serial = Self {
            input_rx,
            pending: LineBuffer::new(),
            state: Arc::clone(&state),
            name: name.clone(),
        };

        let handle = MockSerialHandle {
            input_tx,
            state,
            name,
        };

        (serial, handle)
    }

    /// Number of received bytes that have not been read or drained yet.
    ///
    /// Only counts bytes already pulled off the injection channel.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn pull_available(&mut self) {
        while let Ok(chunk) = self.input_rx.try_recv() {
            self.pending.extend_from_slice(&chunk);
        }
    }

    fn check_reads(&self) -> Result<()> {
        if lock(&self.state).fail_reads {
            return Err(HardwareError::communication(format!(
                "{}: simulated read fault",
                self.name
            )));
        }
        Ok(())
    }
}

impl Default for MockSerial {
    fn default() -> Self {
        Self::new().0
    }
}

impl SerialTransport for MockSerial {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(HardwareError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                format!("{}: simulated write fault", self.name),
            )));
        }
        trace!(device = %self.name, len = bytes.len(), "Mock write");
        state.written.push(Bytes::copy_from_slice(bytes));
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Bytes> {
        loop {
            self.check_reads()?;

            if let Some(line) = self.pending.take_line() {
                trace!(device = %self.name, len = line.len(), "Mock line received");
                return Ok(line);
            }

            match self.input_rx.recv().await {
                Some(chunk) => {
                    self.pending.extend_from_slice(&chunk);
                }
                None => return Err(HardwareError::disconnected(self.name.clone())),
            }
        }
    }

    fn drain_nonblocking(&mut self, scratch: &mut [u8]) -> Result<usize> {
        self.check_reads()?;
        self.pull_available();

        let count = self.pending.drain_into(scratch);

        lock(&self.state).drained += count;
        Ok(count)
    }
}

/// Handle for feeding and inspecting a mock serial link.
///
/// The handle can be cloned and shared across tasks. The link reports
/// [`HardwareError::Disconnected`] once every handle has been dropped and all
/// injected bytes have been consumed.
#[derive(Debug, Clone)]
pub struct MockSerialHandle {
    /// Channel sender for injected bytes
    input_tx: mpsc::UnboundedSender<Bytes>,

    /// State shared with the link
    state: Arc<Mutex<MockSerialState>>,

    /// Device name
    name: String,
}

impl MockSerialHandle {
    /// Inject bytes as if the scanner had sent them.
    ///
    /// # Errors
    ///
    /// Returns an error if the link has been dropped.
    pub fn inject(&self, bytes: impl AsRef<[u8]>) -> Result<()> {
        self.input_tx
            .send(Bytes::copy_from_slice(bytes.as_ref()))
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }

    /// Every buffer written to the link so far, in order.
    pub fn written(&self) -> Vec<Bytes> {
        lock(&self.state).written.clone()
    }

    /// Forget recorded writes.
    pub fn clear_written(&self) {
        lock(&self.state).written.clear();
    }

    /// Total bytes discarded through `drain_nonblocking`.
    pub fn drained_bytes(&self) -> usize {
        lock(&self.state).drained
    }

    /// Make subsequent writes fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Make subsequent reads and drains fail with a communication error.
    pub fn set_fail_reads(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdc200_core::constants::MAX_LINE_LEN;
    use std::time::Duration;

    #[tokio::test]
    async fn test_read_line_across_chunks() {
        let (mut serial, handle) = MockSerial::new();

        handle.inject(b"\x02ABC").unwrap();
        handle.inject(b"\x03\r").unwrap();
        handle.inject(b"\n").unwrap();

        let line = serial.read_line().await.unwrap();
        assert_eq!(&line[..], b"\x02ABC\x03\r\n");
    }

    #[tokio::test]
    async fn test_read_line_splits_multiple_lines() {
        let (mut serial, handle) = MockSerial::new();

        handle.inject(b"first\nsecond\ntail").unwrap();

        assert_eq!(&serial.read_line().await.unwrap()[..], b"first\n");
        assert_eq!(&serial.read_line().await.unwrap()[..], b"second\n");
        assert_eq!(serial.pending_len(), 4);
    }

    #[tokio::test]
    async fn test_noise_without_terminator_is_bounded() {
        let (mut serial, handle) = MockSerial::new();
        let noise = vec![0xFFu8; 1024];

        for _ in 0..16 {
            handle.inject(&noise).unwrap();
        }
        let mut scratch = [0u8; 0];
        serial.drain_nonblocking(&mut scratch).unwrap();
        assert_eq!(serial.pending_len(), MAX_LINE_LEN);

        handle.inject(b"\n\x02A23457098\x03\r\n").unwrap();
        assert_eq!(serial.read_line().await.unwrap().len(), MAX_LINE_LEN + 1);
        assert_eq!(&serial.read_line().await.unwrap()[..], b"\x02A23457098\x03\r\n");
    }

    #[tokio::test]
    async fn test_read_line_waits_for_injection() {
        let (mut serial, handle) = MockSerial::new();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.inject(b"late\n").unwrap();
            // Keep the link open until the line has been read
            tokio::time::sleep(Duration::from_millis(100)).await;
        });

        let line = serial.read_line().await.unwrap();
        assert_eq!(&line[..], b"late\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_line_is_cancel_safe() {
        let (mut serial, handle) = MockSerial::new();

        handle.inject(b"\x02PART").unwrap();
        let result = tokio::time::timeout(Duration::from_millis(50), serial.read_line()).await;
        assert!(result.is_err());

        handle.inject(b"IAL\x03\r\n").unwrap();
        let line = serial.read_line().await.unwrap();
        assert_eq!(&line[..], b"\x02PARTIAL\x03\r\n");
    }

    #[tokio::test]
    async fn test_drain_moves_everything_pending() {
        let (mut serial, handle) = MockSerial::new();
        let mut scratch = [0u8; 4];

        handle.inject(b"stale bytes").unwrap();

        let mut total = 0;
        loop {
            let count = serial.drain_nonblocking(&mut scratch).unwrap();
            if count == 0 {
                break;
            }
            total += count;
        }

        assert_eq!(total, 11);
        assert_eq!(handle.drained_bytes(), 11);
        assert_eq!(serial.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_drain_empty_returns_zero() {
        let (mut serial, _handle) = MockSerial::new();
        let mut scratch = [0u8; 16];

        assert_eq!(serial.drain_nonblocking(&mut scratch).unwrap(), 0);
    }

    #[test]
    fn test_write_records_in_order() {
        let (mut serial, handle) = MockSerial::new();

        serial.write(b"one").unwrap();
        serial.write(b"two").unwrap();

        let written = handle.written();
        assert_eq!(written.len(), 2);
        assert_eq!(&written[0][..], b"one");
        assert_eq!(&written[1][..], b"two");

        handle.clear_written();
        assert!(handle.written().is_empty());
    }

    #[test]
    fn test_write_failure() {
        let (mut serial, handle) = MockSerial::new();
        handle.set_fail_writes(true);

        let result = serial.write(b"cmd");
        assert!(matches!(result, Err(HardwareError::Io(_))));
        assert!(handle.written().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure() {
        let (mut serial, handle) = MockSerial::new();
        handle.set_fail_reads(true);

        let result = serial.read_line().await;
        assert!(matches!(result, Err(HardwareError::CommunicationError { .. })));

        let mut scratch = [0u8; 16];
        assert!(serial.drain_nonblocking(&mut scratch).is_err());
    }

    #[tokio::test]
    async fn test_closed_link() {
        let (mut serial, handle) = MockSerial::new();

        handle.inject(b"no terminator").unwrap();
        drop(handle);

        let result = serial.read_line().await;
        assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
    }

    #[test]
    fn test_inject_after_drop() {
        let (serial, handle) = MockSerial::with_name("Bench UART".to_string());
        drop(serial);

        assert!(handle.inject(b"x").is_err());
        assert_eq!(handle.name(), "Bench UART");
    }
}
