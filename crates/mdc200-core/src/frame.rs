use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::constants::{C128_PREFIX, C128_SUFFIX, LINE_TERMINATOR};
use crate::{Error, Result};

/// Reason a line read from the scanner is not a valid frame.
///
/// These never leave the driver's read loop; a malformed line is discarded
/// and the next attempt starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The line cannot hold a prefix byte and the full suffix.
    #[error("frame of {len} bytes is shorter than the minimum of {min}")]
    TooShort { len: usize, min: usize },

    /// The first byte is not the configured prefix.
    #[error("expected prefix 0x{expected:02X}, got 0x{actual:02X}")]
    BadPrefix { expected: u8, actual: u8 },

    /// The line does not end with the configured suffix.
    #[error("frame does not end with the configured suffix")]
    BadSuffix,
}

/// Framing the scanner wraps around every decoded barcode.
///
/// A frame on the wire is `prefix ++ payload ++ suffix`: one prefix byte, any
/// number of payload bytes (including none), then the suffix sequence.
///
/// # Wire Format
///
/// With the default C-128 profile:
///
/// ```text
/// 02 48 45 4C 4C 4F 03 0D 0A
/// ^^ ^^^^^^^^^^^^^^ ^^^^^^^^
/// STX  "HELLO"      ETX CR LF
/// ```
///
/// # Examples
///
/// ```
/// use mdc200_core::{FrameError, FrameFormat};
///
/// let format = FrameFormat::c128();
///
/// assert_eq!(format.validate(b"\x02A23457098\x03\r\n").unwrap(), b"A23457098");
/// assert_eq!(format.validate(b"\x02\x03\r\n").unwrap(), b"");
/// assert_eq!(format.validate(b"A23457098\r\n"), Err(FrameError::BadSuffix));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFormat {
    prefix: u8,
    suffix: Bytes,
}

impl FrameFormat {
    /// Create a frame format from a prefix byte and a suffix sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if `suffix` is empty, or if it does not end with the
    /// only [`LINE_TERMINATOR`] of the frame. Lines are split on that byte, so
    /// any other suffix could never be received whole.
    pub fn new(prefix: u8, suffix: impl Into<Bytes>) -> Result<Self> {
        let suffix = suffix.into();
        let Some((&last, rest)) = suffix.split_last() else {
            return Err(Error::InvalidConfig(
                "frame suffix must not be empty".to_string(),
            ));
        };
        if last != LINE_TERMINATOR || rest.contains(&LINE_TERMINATOR) {
            return Err(Error::InvalidConfig(format!(
                "frame suffix must end with the line terminator (0x{:02X}) and contain it only once",
                LINE_TERMINATOR
            )));
        }
        if prefix == LINE_TERMINATOR {
            return Err(Error::InvalidConfig(format!(
                "frame prefix must not be the line terminator (0x{:02X})",
                LINE_TERMINATOR
            )));
        }
        Ok(Self { prefix, suffix })
    }

    /// The `<STX> ... <ETX>\r\n` format of the C-128 profile.
    pub fn c128() -> Self {
        Self {
            prefix: C128_PREFIX,
            suffix: Bytes::from_static(C128_SUFFIX),
        }
    }

    /// Get the prefix byte.
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Get the suffix bytes.
    pub fn suffix(&self) -> &[u8] {
        &self.suffix
    }

    /// Shortest line that can be a frame: the prefix plus the suffix.
    pub fn min_len(&self) -> usize {
        1 + self.suffix.len()
    }

    /// Validate a line and return the payload it carries.
    ///
    /// The payload is everything strictly between the prefix byte and the
    /// suffix. Lines shorter than [`min_len`](Self::min_len) are rejected
    /// before any slicing, so a truncated line can never overlap the prefix
    /// with the suffix.
    ///
    /// # Errors
    ///
    /// Returns the first [`FrameError`] found, checking length, then suffix,
    /// then prefix.
    pub fn validate<'a>(&self, line: &'a [u8]) -> std::result::Result<&'a [u8], FrameError> {
        let min = self.min_len();
        if line.len() < min {
            return Err(FrameError::TooShort {
                len: line.len(),
                min,
            });
        }

        if !line.ends_with(&self.suffix) {
            return Err(FrameError::BadSuffix);
        }

        if line[0] != self.prefix {
            return Err(FrameError::BadPrefix {
                expected: self.prefix,
                actual: line[0],
            });
        }

        Ok(&line[1..line.len() - self.suffix.len()])
    }

    /// Check whether a line is a valid frame.
    pub fn is_valid(&self, line: &[u8]) -> bool {
        self.validate(line).is_ok()
    }

    /// Wrap a payload the way the scanner does.
    ///
    /// Used by the simulated scanner and by tests that feed frames into a
    /// mock transport.
    pub fn encode(&self, payload: &[u8]) -> Bytes {
        let mut buf = BytesMut::with_capacity(payload.len() + self.min_len());
        buf.put_u8(self.prefix);
        buf.put_slice(payload);
        buf.put_slice(&self.suffix);
        buf.freeze()
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self::c128()
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} <payload>", self.prefix)?;
        for byte in self.suffix.iter() {
            write!(f, " {:02X}", byte)?;
        }
        Ok(())
    }
}
