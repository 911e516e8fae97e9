//! Error types for hardware operations.
//!
//! This module defines the errors a serial transport or an output line can
//! report. Every one of them is a genuine fault: the driver never retries on a
//! [`HardwareError`], it surfaces it to the caller.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Faults reported by a serial link or an output line.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The link was closed or the port has gone away.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// The link reported a fault while transferring bytes.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Setting a digital output line failed.
    #[error("Output line {line} failed: {message}")]
    LineError { line: String, message: String },

    /// A port or signal could not be set up as requested.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Underlying OS error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else, such as a failed background task.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Link to `device` is closed.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Link fault described by `message`.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Output `line` could not be driven.
    pub fn line(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LineError {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Port or signal setup failed.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Fault that fits no other variant.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

#[cfg(feature = "hardware-serial")]
impl From<serialport::Error> for HardwareError {
    fn from(error: serialport::Error) -> Self {
        match error.kind() {
            serialport::ErrorKind::NoDevice => Self::disconnected(error.description),
            serialport::ErrorKind::InvalidInput => Self::configuration(error.description),
            _ => Self::communication(error.description),
        }
    }
}
