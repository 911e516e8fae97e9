//! Hardware capability trait definitions.
//!
//! These traits are the contract between the scanner driver and the hardware
//! it talks to: a byte-serial link and digital output lines. Real backends and
//! the software doubles in [`mock`](crate::mock) both implement them, so the
//! driver never needs to know which one it holds.
//!
//! `read_line` uses native `async fn` (Edition 2024 RPITIT), so the traits are
//! not object-safe. Use generics, or the enum wrappers in
//! [`devices`](crate::devices) when the backend is picked at runtime.

#![allow(async_fn_in_trait)]

use bytes::Bytes;

use crate::error::Result;
use crate::types::LineLevel;

/// Byte-serial link to the scanner.
///
/// # Cancellation
///
/// The driver bounds [`read_line`](Self::read_line) with a timeout and drops
/// the future when it expires. Implementations must therefore keep any bytes
/// of an incomplete line in their own buffer, never in the future's state.
/// Those bytes are then either completed by the next `read_line` or removed
/// by [`drain_nonblocking`](Self::drain_nonblocking).
///
/// # Examples
///
/// ```no_run
/// use mdc200_hardware::traits::SerialTransport;
/// use mdc200_hardware::Result;
///
/// async fn echo_line<S: SerialTransport>(serial: &mut S) -> Result<()> {
///     let line = serial.read_line().await?;
///     serial.write(&line)
/// }
/// ```
pub trait SerialTransport: Send {
    /// Write raw bytes to the link.
    ///
    /// # Errors
    ///
    /// Returns an error on any I/O fault. Partial writes are reported as
    /// errors.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Wait for the next line, up to and including the `\n` terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the link fails or is closed while waiting.
    async fn read_line(&mut self) -> Result<Bytes>;

    /// Move bytes that are already buffered into `scratch`, without waiting.
    ///
    /// Returns the number of bytes moved, `0` once nothing is pending. This
    /// includes bytes held back from an incomplete line.
    ///
    /// # Errors
    ///
    /// Returns an error if the link fails.
    fn drain_nonblocking(&mut self, scratch: &mut [u8]) -> Result<usize>;
}

/// Digital output line, such as the scanner's trigger or wake input.
///
/// # Examples
///
/// ```no_run
/// use mdc200_hardware::traits::OutputLine;
/// use mdc200_hardware::types::LineLevel;
/// use mdc200_hardware::Result;
///
/// fn release<L: OutputLine>(line: &mut L) -> Result<()> {
///     line.set_level(LineLevel::Idle)
/// }
/// ```
pub trait OutputLine: Send {
    /// Drive the line to `level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be driven.
    fn set_level(&mut self, level: LineLevel) -> Result<()>;
}
