//! Wire profile and default values for the MDC-200 scanner.
//!
//! The scanner is configured over its serial link with escape-sequence
//! commands of the form `ESC ZZ <command> ZZ CR`. The driver treats these as
//! opaque byte strings; the ones below select the C-128 profile the driver
//! ships with:
//!
//! | Command               | Effect                                    |
//! |-----------------------|-------------------------------------------|
//! | `ESC ZZS0ZZ CR`       | Single read mode (one read per trigger)   |
//! | `ESC ZZA6ZZ CR`       | Enable C-128, disable other symbologies   |
//! | `ESC ZZM91BZZ CR`     | Prefix C-128 results with `<STX>`         |
//! | `ESC ZZO91C1M1JZZ CR` | Suffix C-128 results with `<ETX> CR LF`   |
//!
//! # Examples
//!
//! ```
//! use mdc200_core::constants::*;
//!
//! assert_eq!(C128_PREFIX, STX);
//! assert_eq!(C128_SUFFIX, &[ETX, CR, LF]);
//! assert_eq!(C128_INIT_SEQUENCE.len(), 4);
//! ```

// ============================================================================
// Control Characters
// ============================================================================

/// Start of text.
pub const STX: u8 = 0x02;

/// End of text.
pub const ETX: u8 = 0x03;

/// Escape, leads every configuration command.
pub const ESC: u8 = 0x1B;

/// Carriage return.
pub const CR: u8 = b'\r';

/// Line feed. Terminates every line the scanner sends.
pub const LF: u8 = b'\n';

/// Byte that ends a line read from the transport.
pub const LINE_TERMINATOR: u8 = LF;

// ============================================================================
// C-128 Profile
// ============================================================================

/// Prefix byte the C-128 profile configures.
pub const C128_PREFIX: u8 = STX;

/// Suffix bytes the C-128 profile configures (`<ETX>\r\n`).
pub const C128_SUFFIX: &[u8] = &[ETX, CR, LF];

/// Switch the scanner to single read mode.
pub const CMD_SINGLE_READ_MODE: &[u8] = b"\x1bZZS0ZZ\r";

/// Enable C-128 only; every other symbology is rejected by the scanner.
pub const CMD_ENABLE_C128_ONLY: &[u8] = b"\x1bZZA6ZZ\r";

/// Set the `<STX>` prefix for C-128 results.
pub const CMD_C128_STX_PREFIX: &[u8] = b"\x1bZZM91BZZ\r";

/// Set the `<ETX>\r\n` suffix for C-128 results.
pub const CMD_C128_ETX_CRLF_SUFFIX: &[u8] = b"\x1bZZO91C1M1JZZ\r";

/// Commands written on construction, in order.
pub const C128_INIT_SEQUENCE: [&[u8]; 4] = [
    CMD_SINGLE_READ_MODE,
    CMD_ENABLE_C128_ONLY,
    CMD_C128_STX_PREFIX,
    CMD_C128_ETX_CRLF_SUFFIX,
];

// ============================================================================
// Timing and Retry Defaults
// ============================================================================

/// Width of the trigger and wake pulses in milliseconds.
pub const DEFAULT_PULSE_WIDTH_MS: u64 = 20;

/// Time to wait for a line on each read attempt, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Number of read attempts before reporting no read.
pub const DEFAULT_MAX_TRIES: u32 = 5;

// ============================================================================
// Transport Defaults
// ============================================================================

/// Baud rate the scanner ships with (8N1, no flow control).
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Size of the scratch buffer the driver drains stale bytes into.
pub const PURGE_BUFFER_SIZE: usize = 16;

/// Most bytes a transport keeps while waiting for a line terminator.
///
/// The longest C-128 frame is well under this; anything longer is line noise.
pub const MAX_LINE_LEN: usize = 4096;

/// Longest time a single write may spend waiting for room in the TX buffer.
pub const WRITE_TIMEOUT_MS: u64 = 1000;
