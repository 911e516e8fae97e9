//! Byte plumbing shared by the serial transports.
//!
//! [`LineBuffer`] collects received bytes until a line terminator arrives and
//! keeps at most [`MAX_LINE_LEN`] bytes of an unterminated line.
//! [`write_all_within`] pushes a command through a non-blocking writer
//! without spinning forever on a stalled port.

use bytes::{Buf, Bytes, BytesMut};
use std::io::{ErrorKind, Write};
use std::time::{Duration, Instant};
use tracing::warn;

use mdc200_core::constants::{LINE_TERMINATOR, MAX_LINE_LEN, WRITE_TIMEOUT_MS};

use crate::{HardwareError, Result};

/// Default deadline for [`write_all_within`].
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(WRITE_TIMEOUT_MS);

/// Pause between retries while the writer reports `WouldBlock`.
const WRITE_RETRY_DELAY: Duration = Duration::from_millis(1);

/// Receive buffer that splits bytes into terminated lines.
///
/// When no terminator is buffered and the content grows past the limit, the
/// oldest bytes are discarded.
///
/// # Examples
///
/// ```
/// use mdc200_hardware::io::LineBuffer;
///
/// let mut buffer = LineBuffer::with_limit(8);
///
/// buffer.extend_from_slice(b"0123456789");
/// assert_eq!(buffer.len(), 8);
///
/// buffer.extend_from_slice(b"\n");
/// assert_eq!(&buffer.take_line().unwrap()[..], b"23456789\n");
/// ```
#[derive(Debug)]
pub struct LineBuffer {
    /// Bytes not yet returned as a line
    buf: BytesMut,

    /// Most bytes kept without a terminator
    limit: usize,
}

impl LineBuffer {
    /// Create a buffer capped at [`MAX_LINE_LEN`].
    pub fn new() -> Self {
        Self::with_limit(MAX_LINE_LEN)
    }

    /// Create a buffer capped at `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(limit.min(256)),
            limit,
        }
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append received bytes.
    ///
    /// Returns the number of old bytes discarded to stay within the limit.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> usize {
        self.buf.extend_from_slice(bytes);
        self.trim()
    }

    /// Read whatever `reader` has into the buffer.
    ///
    /// Only awaits on `read_buf`, so it is cancel-safe. Returns the number of
    /// bytes read; zero means end of stream.
    pub async fn read_from<R>(&mut self, reader: &mut R) -> std::io::Result<usize>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        use tokio::io::AsyncReadExt;

        let count = reader.read_buf(&mut self.buf).await?;
        self.trim();
        Ok(count)
    }

    /// Remove and return the first complete line, terminator included.
    pub fn take_line(&mut self) -> Option<Bytes> {
        let end = self.buf.iter().position(|b| *b == LINE_TERMINATOR)?;
        Some(self.buf.split_to(end + 1).freeze())
    }

    /// Move up to `scratch.len()` buffered bytes into `scratch`.
    pub fn drain_into(&mut self, scratch: &mut [u8]) -> usize {
        let count = self.buf.len().min(scratch.len());
        scratch[..count].copy_from_slice(&self.buf[..count]);
        self.buf.advance(count);
        count
    }

    fn trim(&mut self) -> usize {
        if self.buf.len() <= self.limit || self.buf.contains(&LINE_TERMINATOR) {
            return 0;
        }

        let dropped = self.buf.len() - self.limit;
        self.buf.advance(dropped);
        warn!(
            dropped,
            limit = self.limit,
            "No line terminator received, discarding oldest bytes"
        );
        dropped
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Write all of `bytes` to a non-blocking `writer`.
///
/// A full TX buffer shows up as `WouldBlock`; the write is retried until
/// `deadline` has passed since the call started.
///
/// # Errors
///
/// Returns [`HardwareError::CommunicationError`] if the deadline passes with
/// bytes left over, or the writer's own error otherwise.
pub fn write_all_within<W: Write>(
    writer: &mut W,
    mut bytes: &[u8],
    deadline: Duration,
    device: &str,
) -> Result<()> {
    let started = Instant::now();

    while !bytes.is_empty() {
        match writer.write(bytes) {
            Ok(0) => {
                return Err(HardwareError::Io(std::io::Error::new(
                    ErrorKind::WriteZero,
                    format!("{}: port accepted no bytes", device),
                )));
            }
            Ok(count) => bytes = &bytes[count..],
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if started.elapsed() >= deadline {
                    return Err(HardwareError::communication(format!(
                        "{}: write stalled for {} ms with {} bytes left",
                        device,
                        deadline.as_millis(),
                        bytes.len()
                    )));
                }
                std::thread::sleep(WRITE_RETRY_DELAY);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
