//! Mock device implementations for testing and development.
//!
//! This module provides simulated transports and output lines that can be
//! controlled programmatically without requiring physical hardware.

pub mod line;
pub mod serial;

// Re-export commonly used types
pub use line::{MockOutputLine, MockOutputLineHandle};
pub use serial::{MockSerial, MockSerialHandle};
