//! Common types shared across transport and output line implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Logical level of a digital output line.
///
/// The scanner's trigger and wake inputs are active low: [`Active`] drives
/// the line low, [`Idle`] releases it high. Implementations map these to
/// whatever their hardware needs.
///
/// [`Active`]: LineLevel::Active
/// [`Idle`]: LineLevel::Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineLevel {
    /// Asserted (electrically low).
    Active,

    /// Released (electrically high).
    Idle,
}

impl LineLevel {
    /// Electrical level of the line: `true` for high.
    pub fn is_high(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for LineLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

/// One recorded level change on an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelTransition {
    /// Level the line was set to.
    pub level: LineLevel,

    /// When it was set.
    pub at: Instant,
}

/// Modem control signal of a serial port usable as a digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModemSignal {
    /// Request To Send.
    Rts,

    /// Data Terminal Ready.
    Dtr,
}

impl fmt::Display for ModemSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rts => write!(f, "RTS"),
            Self::Dtr => write!(f, "DTR"),
        }
    }
}

impl std::str::FromStr for ModemSignal {
    type Err = crate::HardwareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rts" => Ok(Self::Rts),
            "dtr" => Ok(Self::Dtr),
            other => Err(crate::HardwareError::configuration(format!(
                "unknown modem signal '{}', expected rts or dtr",
                other
            ))),
        }
    }
}
