//! Read cycle state machine.
//!
//! One call to [`read_barcode`](crate::Mdc200::read_barcode) walks a
//! [`ReadCycle`] from `Idle` to either `Done` or `Exhausted`. The cycle only
//! tracks phases and attempt counts; the driver performs the I/O for each
//! phase and reports the result back.
//!
//! # Phases
//!
//! - `Idle`: Nothing done yet
//! - `Purging`: Discarding stale receive bytes
//! - `Awaiting`: Waiting, bounded by the timeout, for one line
//! - `Validating`: Checking a received line against the frame format
//! - `Done`: A valid frame was received
//! - `Exhausted`: Every attempt failed (NoRead)
//!
//! # Valid Transitions
//!
//! - Idle → Purging → Awaiting(1)
//! - Awaiting(n) → Validating(n) → Done(n)
//! - Awaiting(n) or Validating(n) → Awaiting(n + 1) while n < max_tries
//! - Awaiting(n) or Validating(n) → Exhausted once n = max_tries
//!
//! # Examples
//!
//! ```
//! use mdc200_scanner::state_machine::{AttemptOutcome, ReadCycle, ReadPhase};
//!
//! let mut cycle = ReadCycle::new(2);
//! cycle.transition_to(ReadPhase::Purging);
//! cycle.transition_to(ReadPhase::Awaiting { attempt: 1 });
//!
//! cycle.fail_attempt(AttemptOutcome::TimedOut);
//! assert_eq!(cycle.phase(), &ReadPhase::Awaiting { attempt: 2 });
//!
//! cycle.fail_attempt(AttemptOutcome::TimedOut);
//! assert_eq!(cycle.phase(), &ReadPhase::Exhausted { attempts: 2 });
//! ```

use bytes::Bytes;
use std::fmt;
use tracing::trace;

use mdc200_core::FrameError;

/// Phase of a single read cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadPhase {
    /// Cycle created, nothing done yet
    Idle,

    /// Discarding bytes received before the read started
    Purging,

    /// Waiting for a line on the given attempt
    Awaiting { attempt: u32 },

    /// Checking the line received on the given attempt
    Validating { attempt: u32, line: Bytes },

    /// Valid frame received; `payload` is stripped of prefix and suffix
    Done { attempt: u32, payload: Bytes },

    /// All attempts failed
    Exhausted { attempts: u32 },
}

impl ReadPhase {
    /// Check if transition to the target phase is valid.
    ///
    /// Attempt numbers must line up: validation and completion keep the
    /// attempt they came from.
    pub fn can_transition_to(&self, target: &ReadPhase) -> bool {
        use ReadPhase::*;

        match (self, target) {
            (Idle, Purging) => true,
            (Purging, Awaiting { attempt }) => *attempt == 1,
            (Awaiting { attempt: from }, Validating { attempt: to, .. }) => from == to,
            (Validating { attempt: from, .. }, Done { attempt: to, .. }) => from == to,
            (Awaiting { attempt: from }, Awaiting { attempt: to })
            | (Validating { attempt: from, .. }, Awaiting { attempt: to }) => *to == from + 1,
            (Awaiting { attempt: from }, Exhausted { attempts })
            | (Validating { attempt: from, .. }, Exhausted { attempts }) => from == attempts,
            _ => false,
        }
    }

    /// Check if the cycle has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Exhausted { .. })
    }

    /// Attempt this phase belongs to, if any.
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::Awaiting { attempt }
            | Self::Validating { attempt, .. }
            | Self::Done { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }
}

impl fmt::Display for ReadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Purging => write!(f, "Purging"),
            Self::Awaiting { attempt } => write!(f, "Awaiting({})", attempt),
            Self::Validating { attempt, .. } => write!(f, "Validating({})", attempt),
            Self::Done { attempt, .. } => write!(f, "Done({})", attempt),
            Self::Exhausted { attempts } => write!(f, "Exhausted({})", attempts),
        }
    }
}

/// Why an attempt did not produce a barcode.
///
/// Attempt failures never leave the read cycle; they only move it on to the
/// next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// No line arrived before the timeout
    TimedOut,

    /// A line arrived but was not a valid frame
    Malformed(FrameError),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => write!(f, "timed out"),
            Self::Malformed(error) => write!(f, "malformed frame: {}", error),
        }
    }
}

/// State of one `read_barcode` call.
///
/// Created fresh for every call and never shared.
#[derive(Debug)]
pub struct ReadCycle {
    /// Current phase
    phase: ReadPhase,

    /// Attempts allowed
    max_tries: u32,

    /// Attempts that timed out
    timeouts: u32,

    /// Attempts that received a malformed line
    malformed: u32,
}

impl ReadCycle {
    /// Create a cycle in `Idle` allowing `max_tries` attempts.
    pub fn new(max_tries: u32) -> Self {
        Self {
            phase: ReadPhase::Idle,
            max_tries,
            timeouts: 0,
            malformed: 0,
        }
    }

    /// Get the current phase.
    pub fn phase(&self) -> &ReadPhase {
        &self.phase
    }

    /// Attempts allowed for this cycle.
    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Number of attempts that timed out so far.
    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    /// Number of attempts that received a malformed line so far.
    pub fn malformed(&self) -> u32 {
        self.malformed
    }

    /// Move to `target`.
    ///
    /// The driver only requests transitions listed in the module docs;
    /// anything else is a bug and trips a debug assertion.
    pub fn transition_to(&mut self, target: ReadPhase) {
        debug_assert!(
            self.phase.can_transition_to(&target),
            "invalid read transition {} -> {}",
            self.phase,
            target
        );

        trace!(from = %self.phase, to = %target, "Read phase transition");
        self.phase = target;
    }

    /// Record a failed attempt and move to the next one, or to `Exhausted`
    /// when none are left.
    pub fn fail_attempt(&mut self, outcome: AttemptOutcome) {
        let attempt = self.phase.attempt();
        debug_assert!(
            attempt.is_some(),
            "attempt failed outside an attempt: {}",
            self.phase
        );
        let Some(attempt) = attempt else {
            return;
        };

        match outcome {
            AttemptOutcome::TimedOut => self.timeouts += 1,
            AttemptOutcome::Malformed(_) => self.malformed += 1,
        }

        let next = if attempt < self.max_tries {
            ReadPhase::Awaiting {
                attempt: attempt + 1,
            }
        } else {
            ReadPhase::Exhausted { attempts: attempt }
        };
        self.transition_to(next);
    }
}
