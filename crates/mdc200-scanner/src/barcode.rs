use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;

/// Payload of a successfully read frame.
///
/// Holds the bytes between the prefix and the suffix, which attempt produced
/// them, and when. The driver does not interpret the payload; C-128 results
/// are usually ASCII, so [`as_str`](Self::as_str) is offered as a view.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use mdc200_scanner::Barcode;
///
/// let barcode = Barcode::new(Bytes::from_static(b"A23457098"), 1);
/// assert_eq!(barcode.as_str(), Some("A23457098"));
/// assert_eq!(barcode.to_string(), "A23457098");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    /// Payload bytes
    data: Bytes,

    /// 1-based attempt that returned this frame
    attempt: u32,

    /// When the frame was accepted
    scanned_at: DateTime<Utc>,
}

impl Barcode {
    /// Create a barcode stamped with the current time.
    pub fn new(data: Bytes, attempt: u32) -> Self {
        Self {
            data,
            attempt,
            scanned_at: Utc::now(),
        }
    }

    /// Get the payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the payload bytes.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// View the payload as UTF-8, if it is.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Attempt (starting at 1) on which the frame arrived.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// When the frame was accepted.
    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }
}

impl AsRef<[u8]> for Barcode {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.data))
    }
}
