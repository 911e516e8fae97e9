//! Core types for the MDC-200 barcode scanner driver.
//!
//! This crate holds everything that does not touch hardware: the wire profile
//! constants, the response frame format and its validation, and the
//! configuration records consumed by the driver and the CLI.
//!
//! # Frame Format
//!
//! Once configured, the scanner answers every successful read with a single
//! line:
//!
//! ```text
//! <STX> payload <ETX> <CR> <LF>
//! ```
//!
//! ```
//! use mdc200_core::FrameFormat;
//!
//! let format = FrameFormat::c128();
//! assert_eq!(format.validate(b"\x02HELLO\x03\r\n").unwrap(), b"HELLO");
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod frame;

pub use config::{ReadOptions, ScannerConfig, ScannerConfigBuilder, TriggerMode};
pub use error::{Error, Result};
pub use frame::{FrameError, FrameFormat};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
