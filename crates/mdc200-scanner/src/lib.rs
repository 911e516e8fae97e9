//! Driver for the MDC-200 serial barcode scanner.
//!
//! The scanner is wired to the host through a serial link and two active-low
//! digital inputs: trigger, which starts a scan, and an optional wake input.
//! [`Mdc200`] configures the scanner for single-read Code 128 with STX/ETX
//! framing and reads decoded barcodes back as [`Barcode`] values.
//!
//! # Reading
//!
//! [`Mdc200::read_barcode`] purges stale receive bytes, then makes a bounded
//! number of timed attempts to receive one valid frame:
//!
//! - A timed out attempt or a malformed line moves on to the next attempt.
//! - A valid frame ends the read with `Ok(Some(barcode))`.
//! - Running out of attempts returns `Ok(None)` (NoRead).
//! - A failing serial link returns [`ScannerError::Transport`] immediately.
//!
//! The attempt loop is an explicit [`ReadCycle`](state_machine::ReadCycle);
//! see [`state_machine`] for its phases.
//!
//! # Hardware
//!
//! The driver is generic over [`SerialTransport`] and [`OutputLine`] from
//! `mdc200-hardware`, so it runs unchanged on real ports and on the mocks
//! used in tests.
//!
//! [`SerialTransport`]: mdc200_hardware::SerialTransport
//! [`OutputLine`]: mdc200_hardware::OutputLine

pub mod barcode;
pub mod driver;
pub mod error;
pub mod state_machine;

pub use barcode::Barcode;
pub use driver::{Mdc200, Mdc200Builder, NoWakeLine};
pub use error::{Result, ScannerError};
pub use state_machine::{AttemptOutcome, ReadCycle, ReadPhase};
