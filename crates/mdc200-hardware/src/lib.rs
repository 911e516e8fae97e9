//! Hardware abstraction layer for the MDC-200 barcode scanner driver.
//!
//! The scanner needs two kinds of hardware: a byte-serial link for commands
//! and results, and digital outputs for its trigger and wake inputs. This
//! crate defines both as capability traits so the driver can run against real
//! ports or against software doubles without conditional code.
//!
//! # Capability Traits
//!
//! ## Serial Transport
//!
//! [`SerialTransport`] covers raw writes, a line read the caller can bound
//! with a timeout, and a non-blocking drain of whatever is already buffered:
//!
//! ```no_run
//! use mdc200_hardware::traits::SerialTransport;
//! use mdc200_hardware::Result;
//!
//! async fn discard_then_read<S: SerialTransport>(serial: &mut S) -> Result<bytes::Bytes> {
//!     let mut scratch = [0u8; 16];
//!     while serial.drain_nonblocking(&mut scratch)? > 0 {}
//!     serial.read_line().await
//! }
//! ```
//!
//! ## Output Lines
//!
//! [`OutputLine`] is a single settable digital output:
//!
//! ```no_run
//! use mdc200_hardware::traits::OutputLine;
//! use mdc200_hardware::types::LineLevel;
//! use mdc200_hardware::Result;
//!
//! fn assert_line<L: OutputLine>(line: &mut L) -> Result<()> {
//!     line.set_level(LineLevel::Active)
//! }
//! ```
//!
//! # Backends
//!
//! - [`mock`]: [`MockSerial`](mock::MockSerial) and
//!   [`MockOutputLine`](mock::MockOutputLine), always available.
//! - `serial` (feature `hardware-serial`): a `tokio-serial` transport and
//!   RTS/DTR modem signals as output lines.
//! - [`devices`]: enum wrappers for picking a backend at runtime.
//!
//! Both transports buffer received bytes in an [`io::LineBuffer`], which
//! caps an unterminated line at `MAX_LINE_LEN` bytes.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with
//! [`HardwareError`]. A hardware error is always a real fault; the driver
//! escalates it instead of retrying.
//!
//! [`SerialTransport`]: traits::SerialTransport
//! [`OutputLine`]: traits::OutputLine

pub mod devices;
pub mod error;
pub mod io;
pub mod mock;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{OutputLine, SerialTransport};
pub use types::{LevelTransition, LineLevel, ModemSignal};
