//! Mock digital output line for testing and development.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::{
    HardwareError, Result,
    traits::OutputLine,
    types::{LevelTransition, LineLevel},
};

/// Callback run after every successful level change.
type LevelHook = Box<dyn FnMut(LineLevel) + Send>;

#[derive(Debug, Default)]
struct MockLineState {
    /// Current level, `None` until first set
    level: Option<LineLevel>,

    /// Every level change with its timestamp
    transitions: Vec<LevelTransition>,

    /// Make `set_level` fail
    fail: bool,
}

fn lock(state: &Mutex<MockLineState>) -> MutexGuard<'_, MockLineState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Mock output line that records every level it is driven to.
///
/// Each call to `set_level` is stored with an [`Instant`], so tests can check
/// pulse widths. An optional hook lets a simulated device react to the line,
/// for example a fake scanner answering its trigger.
///
/// # Examples
///
/// ```
/// use mdc200_hardware::mock::MockOutputLine;
/// use mdc200_hardware::traits::OutputLine;
/// use mdc200_hardware::types::LineLevel;
///
/// let (mut trigger, handle) = MockOutputLine::new("trigger");
///
/// trigger.set_level(LineLevel::Active).unwrap();
/// trigger.set_level(LineLevel::Idle).unwrap();
///
/// assert_eq!(handle.level(), Some(LineLevel::Idle));
/// assert_eq!(handle.pulses().len(), 1);
/// ```
pub struct MockOutputLine {
    /// State shared with handles
    state: Arc<Mutex<MockLineState>>,

    /// Line name
    name: String,

    /// Reaction to level changes
    on_level: Option<LevelHook>,
}

impl MockOutputLine {
    /// Create a new mock line.
    ///
    /// Returns a tuple of (MockOutputLine, MockOutputLineHandle) where the
    /// handle inspects the recorded levels.
    pub fn new(name: impl Into<String>) -> (Self, MockOutputLineHandle) {
        let name = name.into();
        let state = Arc::new(Mutex::new(MockLineState::default()));

        let line = Self {
            state: Arc::clone(&state),
            name: name.clone(),
            on_level: None,
        };

        (line, MockOutputLineHandle { state, name })
    }

    /// Run `hook` after every successful level change.
    pub fn on_level(mut self, hook: impl FnMut(LineLevel) + Send + 'static) -> Self {
        self.on_level = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for MockOutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockOutputLine")
            .field("name", &self.name)
            .field("level", &lock(&self.state).level)
            .field("has_hook", &self.on_level.is_some())
            .finish()
    }
}

impl OutputLine for MockOutputLine {
    fn set_level(&mut self, level: LineLevel) -> Result<()> {
        {
            let mut state = lock(&self.state);
            if state.fail {
                return Err(HardwareError::line(&self.name, "simulated line fault"));
            }
            state.level = Some(level);
            state.transitions.push(LevelTransition {
                level,
                at: Instant::now(),
            });
        }

        if let Some(hook) = self.on_level.as_mut() {
            hook(level);
        }
        Ok(())
    }
}

/// Handle for inspecting a mock output line.
#[derive(Debug, Clone)]
pub struct MockOutputLineHandle {
    /// State shared with the line
    state: Arc<Mutex<MockLineState>>,

    /// Line name
    name: String,
}

impl MockOutputLineHandle {
    /// Current level, `None` if the line was never driven.
    pub fn level(&self) -> Option<LineLevel> {
        lock(&self.state).level
    }

    /// Every recorded level change, oldest first.
    pub fn transitions(&self) -> Vec<LevelTransition> {
        lock(&self.state).transitions.clone()
    }

    /// Forget recorded transitions, keeping the current level.
    pub fn clear_transitions(&self) {
        lock(&self.state).transitions.clear();
    }

    /// Durations of completed pulses: each `Active` up to the next `Idle`.
    pub fn pulses(&self) -> Vec<Duration> {
        let state = lock(&self.state);
        let mut pulses = Vec::new();
        let mut started: Option<Instant> = None;

        for transition in &state.transitions {
            match (transition.level, started) {
                (LineLevel::Active, None) => started = Some(transition.at),
                (LineLevel::Idle, Some(start)) => {
                    pulses.push(transition.at.duration_since(start));
                    started = None;
                }
                _ => {}
            }
        }
        pulses
    }

    /// Make subsequent level changes fail.
    pub fn set_fail(&self, fail: bool) {
        lock(&self.state).fail = fail;
    }

    /// Get the line name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
