//! Scanner configuration and read options.
//!
//! [`ScannerConfig`] is fixed when the driver is constructed and describes
//! how the scanner is set up: the framing it has been told to use and the
//! command sequence that tells it so. [`ReadOptions`] is passed per read.
//!
//! Both deserialize from TOML. Byte strings are arrays of integers and
//! durations are milliseconds:
//!
//! ```
//! use mdc200_core::ScannerConfig;
//! use std::time::Duration;
//!
//! let config: ScannerConfig = toml::from_str(r#"
//!     prefix = 2
//!     suffix = [3, 13, 10]
//!     pulse_width_ms = 25
//! "#).unwrap();
//!
//! assert_eq!(config.pulse_width, Duration::from_millis(25));
//! assert_eq!(config.init_sequence.len(), 4); // C-128 default
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::*;
use crate::frame::FrameFormat;
use crate::{Error, Result};

/// Serde helper storing a [`Duration`] as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

fn default_prefix() -> u8 {
    C128_PREFIX
}

fn default_suffix() -> Vec<u8> {
    C128_SUFFIX.to_vec()
}

fn default_init_sequence() -> Vec<Vec<u8>> {
    C128_INIT_SEQUENCE.iter().map(|cmd| cmd.to_vec()).collect()
}

fn default_pulse_width() -> Duration {
    Duration::from_millis(DEFAULT_PULSE_WIDTH_MS)
}

fn default_timeout() -> Duration {
    Duration::from_millis(DEFAULT_READ_TIMEOUT_MS)
}

fn default_max_tries() -> u32 {
    DEFAULT_MAX_TRIES
}

/// Configuration held by the driver for its whole lifetime.
///
/// The default is the C-128 profile: `<STX>` prefix, `<ETX>\r\n` suffix and
/// the four commands in [`C128_INIT_SEQUENCE`].
///
/// # Examples
///
/// ```
/// use mdc200_core::ScannerConfig;
///
/// let config = ScannerConfig::builder()
///     .prefix(b'[')
///     .suffix(b"]\r\n".to_vec())
///     .init_sequence(Vec::new())
///     .build()
///     .unwrap();
///
/// assert_eq!(config.frame_format().unwrap().min_len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Byte the scanner puts in front of every result.
    #[serde(default = "default_prefix")]
    pub prefix: u8,

    /// Bytes the scanner appends to every result.
    #[serde(default = "default_suffix")]
    pub suffix: Vec<u8>,

    /// Commands written to the scanner on construction, in order.
    #[serde(default = "default_init_sequence")]
    pub init_sequence: Vec<Vec<u8>>,

    /// How long the trigger and wake lines are held active.
    #[serde(
        rename = "pulse_width_ms",
        with = "duration_ms",
        default = "default_pulse_width"
    )]
    pub pulse_width: Duration,
}

impl ScannerConfig {
    /// Create a builder starting from the C-128 profile.
    pub fn builder() -> ScannerConfigBuilder {
        ScannerConfigBuilder::default()
    }

    /// Check the configuration can drive a scanner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the prefix and suffix do not form
    /// a valid [`FrameFormat`] or the pulse width is zero.
    pub fn validate(&self) -> Result<()> {
        self.frame_format()?;
        if self.pulse_width.is_zero() {
            return Err(Error::InvalidConfig(
                "pulse width must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Frame format matching the configured prefix and suffix.
    ///
    /// # Errors
    ///
    /// Returns an error if the suffix is empty or does not end with the line
    /// terminator.
    pub fn frame_format(&self) -> Result<FrameFormat> {
        FrameFormat::new(self.prefix, self.suffix.clone())
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            suffix: default_suffix(),
            init_sequence: default_init_sequence(),
            pulse_width: default_pulse_width(),
        }
    }
}

/// Builder for [`ScannerConfig`].
///
/// Every field starts at its C-128 default.
#[derive(Debug, Clone, Default)]
pub struct ScannerConfigBuilder {
    config: ScannerConfig,
}

impl ScannerConfigBuilder {
    /// Set the frame prefix byte.
    pub fn prefix(mut self, prefix: u8) -> Self {
        self.config.prefix = prefix;
        self
    }

    /// Set the frame suffix.
    pub fn suffix(mut self, suffix: impl Into<Vec<u8>>) -> Self {
        self.config.suffix = suffix.into();
        self
    }

    /// Replace the initialization command sequence.
    pub fn init_sequence(mut self, init_sequence: Vec<Vec<u8>>) -> Self {
        self.config.init_sequence = init_sequence;
        self
    }

    /// Append one command to the initialization sequence.
    pub fn init_command(mut self, command: impl Into<Vec<u8>>) -> Self {
        self.config.init_sequence.push(command.into());
        self
    }

    /// Set the trigger and wake pulse width.
    pub fn pulse_width(mut self, pulse_width: Duration) -> Self {
        self.config.pulse_width = pulse_width;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if [`ScannerConfig::validate`] fails.
    pub fn build(self) -> Result<ScannerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// When the driver pulses the trigger line during a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// The caller triggers the scanner; the read only listens.
    #[default]
    Manual,

    /// Pulse the trigger at the start of every attempt, after the purge.
    EachAttempt,
}

/// Options for a single barcode read.
///
/// # Examples
///
/// ```
/// use mdc200_core::{ReadOptions, TriggerMode};
/// use std::time::Duration;
///
/// let options = ReadOptions::default();
/// assert_eq!(options.timeout, Duration::from_secs(1));
/// assert_eq!(options.max_tries, 5);
/// assert_eq!(options.trigger, TriggerMode::Manual);
///
/// let quick = ReadOptions::new(Duration::from_millis(200), 2);
/// assert!(quick.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// How long each attempt waits for a line.
    #[serde(rename = "timeout_ms", with = "duration_ms", default = "default_timeout")]
    pub timeout: Duration,

    /// Number of attempts before giving up.
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,

    /// Whether the read pulses the trigger itself.
    #[serde(default)]
    pub trigger: TriggerMode,
}

impl ReadOptions {
    /// Create read options with manual triggering.
    pub fn new(timeout: Duration, max_tries: u32) -> Self {
        Self {
            timeout,
            max_tries,
            trigger: TriggerMode::Manual,
        }
    }

    /// Set the trigger mode.
    pub fn with_trigger(mut self, trigger: TriggerMode) -> Self {
        self.trigger = trigger;
        self
    }

    /// Upper bound on the time a read spends waiting for lines.
    pub fn max_wait(&self) -> Duration {
        self.timeout.saturating_mul(self.max_tries)
    }

    /// Check the preconditions of a read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if the timeout is zero or
    /// `max_tries` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::InvalidOptions(
                "read timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_tries == 0 {
            return Err(Error::InvalidOptions(
                "max_tries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::new(default_timeout(), default_max_tries())
    }
}

/// Parse a TOML document into a configuration type.
///
/// # Errors
///
/// Returns [`Error::ConfigFile`] if the document is malformed or does not
/// match `T`.
pub fn from_toml_str<T: DeserializeOwned>(source: &str) -> Result<T> {
    Ok(toml::from_str(source)?)
}

/// Read and parse a TOML configuration file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::ConfigFile`] if it cannot be parsed.
pub fn load_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let source = std::fs::read_to_string(path)?;
    from_toml_str(&source)
}
