//! Error types for scanner operations.
//!
//! Only faults that need the caller's attention are errors. A read that
//! times out or receives a malformed line is retried inside
//! [`read_barcode`](crate::Mdc200::read_barcode), and a read that runs out of
//! attempts returns `Ok(None)`.

use mdc200_hardware::HardwareError;

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, ScannerError>;

/// Errors surfaced by the scanner driver.
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// The serial link or an output line failed.
    ///
    /// Points at a hardware fault; retrying the same operation is unlikely
    /// to help.
    #[error("Transport error: {0}")]
    Transport(#[from] HardwareError),

    /// The driver was asked for something its configuration cannot do.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A read was requested with a zero timeout or zero attempts.
    #[error("Invalid read options: {message}")]
    InvalidOptions { message: String },
}

impl ScannerError {
    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new invalid options error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Check if this error comes from the hardware.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<mdc200_core::Error> for ScannerError {
    fn from(error: mdc200_core::Error) -> Self {
        match error {
            mdc200_core::Error::InvalidOptions(message) => Self::invalid_options(message),
            mdc200_core::Error::InvalidConfig(message) => Self::Configuration { message },
            other => Self::configuration(other.to_string()),
        }
    }
}
