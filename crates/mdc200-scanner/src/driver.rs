//! MDC-200 driver.
//!
//! [`Mdc200`] owns the serial link and the output lines wired to the
//! scanner's trigger and wake inputs. It configures the scanner on
//! construction, pulses the lines on request and runs the read protocol.

use std::fmt;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use mdc200_core::constants::PURGE_BUFFER_SIZE;
use mdc200_core::{FrameFormat, ReadOptions, ScannerConfig, TriggerMode};
use mdc200_hardware::{LineLevel, OutputLine, SerialTransport};

use crate::barcode::Barcode;
use crate::error::{Result, ScannerError};
use crate::state_machine::{AttemptOutcome, ReadCycle, ReadPhase};

/// Wake line type for drivers built without one.
///
/// Uninhabited: a value can never exist, so `Option<NoWakeLine>` is always
/// `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoWakeLine {}

impl OutputLine for NoWakeLine {
    fn set_level(&mut self, _level: LineLevel) -> mdc200_hardware::Result<()> {
        match *self {}
    }
}

/// Drive `line` active for `width`, then back to idle.
///
/// Blocks the calling thread for the whole pulse.
fn pulse<L: OutputLine>(line: &mut L, width: Duration) -> mdc200_hardware::Result<()> {
    line.set_level(LineLevel::Active)?;
    std::thread::sleep(width);
    line.set_level(LineLevel::Idle)
}

/// Driver for an MDC-200 barcode scanner.
///
/// Generic over the serial transport `S`, the trigger line `T` and the
/// optional wake line `W`. Reads take `&mut self`, so a driver never runs two
/// read cycles at once.
///
/// # Examples
///
/// ```
/// use mdc200_core::{ReadOptions, TriggerMode};
/// use mdc200_hardware::LineLevel;
/// use mdc200_hardware::mock::{MockOutputLine, MockSerial};
/// use mdc200_scanner::Mdc200;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> mdc200_scanner::Result<()> {
///     let (serial, handle) = MockSerial::new();
///     let written = handle.clone();
///
///     // Simulated scanner: answer every trigger pulse with a frame
///     let (trigger, _trigger) = MockOutputLine::new("trigger");
///     let trigger = trigger.on_level(move |level| {
///         if level == LineLevel::Active {
///             handle.inject(b"\x02A23457098\x03\r\n").ok();
///         }
///     });
///
///     let mut scanner = Mdc200::builder(serial, trigger).build()?;
///     // Four configuration commands were written
///     assert_eq!(written.written().len(), 4);
///
///     let options = ReadOptions::default().with_trigger(TriggerMode::EachAttempt);
///     let barcode = scanner.read_barcode(&options).await?;
///     assert_eq!(barcode.unwrap().as_str(), Some("A23457098"));
///     Ok(())
/// }
/// ```
pub struct Mdc200<S, T, W = NoWakeLine> {
    /// Data link to the scanner
    serial: S,

    /// Output wired to the trigger input
    trigger: T,

    /// Output wired to the wake input, if any
    wake: Option<W>,

    /// Configuration in use
    config: ScannerConfig,

    /// Frame format derived from the configuration
    format: FrameFormat,

    /// Scratch space for purging
    scratch: [u8; PURGE_BUFFER_SIZE],
}

impl<S, T> Mdc200<S, T, NoWakeLine>
where
    S: SerialTransport,
    T: OutputLine,
{
    /// Start building a driver without a wake line and with the C-128 profile.
    pub fn builder(serial: S, trigger: T) -> Mdc200Builder<S, T, NoWakeLine> {
        Mdc200Builder {
            serial,
            trigger,
            wake: None,
            config: ScannerConfig::default(),
        }
    }

    /// Create a driver with the C-128 profile and no wake line.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Transport`] if a line or the serial link
    /// fails during setup.
    pub fn with_defaults(serial: S, trigger: T) -> Result<Self> {
        Self::new(serial, trigger, None, ScannerConfig::default())
    }
}

impl<S, T, W> Mdc200<S, T, W>
where
    S: SerialTransport,
    T: OutputLine,
    W: OutputLine,
{
    /// Create a driver and configure the scanner.
    ///
    /// Validates `config`, sets the wake line (if any) and the trigger line
    /// to idle, then writes every command of the init sequence in order. The
    /// scanner does not acknowledge commands, so nothing is read back.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Configuration`] for an invalid config, before
    /// any hardware is touched. Returns [`ScannerError::Transport`] if a line
    /// cannot be set or a command cannot be written.
    pub fn new(serial: S, trigger: T, wake: Option<W>, config: ScannerConfig) -> Result<Self> {
        config.validate()?;
        let format = config.frame_format()?;

        let mut scanner = Self {
            serial,
            trigger,
            wake,
            config,
            format,
            scratch: [0; PURGE_BUFFER_SIZE],
        };

        if let Some(wake) = scanner.wake.as_mut() {
            wake.set_level(LineLevel::Idle)?;
        }
        scanner.trigger.set_level(LineLevel::Idle)?;
        scanner.write_init_sequence()?;

        info!(
            frame = %scanner.format,
            commands = scanner.config.init_sequence.len(),
            wake_line = scanner.has_wake_line(),
            "MDC-200 initialized"
        );

        Ok(scanner)
    }

    fn write_init_sequence(&mut self) -> Result<()> {
        for (index, command) in self.config.init_sequence.iter().enumerate() {
            debug!(index, len = command.len(), "Writing init command");
            self.serial.write(command)?;
        }
        Ok(())
    }

    /// Write the init sequence again.
    ///
    /// Use after the scanner lost power and forgot its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Transport`] if a command cannot be written.
    pub fn reinitialize(&mut self) -> Result<()> {
        info!(
            commands = self.config.init_sequence.len(),
            "Reinitializing MDC-200"
        );
        self.write_init_sequence()
    }

    /// Pulse the wake line.
    ///
    /// Blocks for the configured pulse width.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Configuration`] if the driver has no wake
    /// line, without touching any line. Returns [`ScannerError::Transport`]
    /// if the line cannot be set.
    pub fn wake(&mut self) -> Result<()> {
        let width = self.config.pulse_width;
        let line = self
            .wake
            .as_mut()
            .ok_or_else(|| ScannerError::configuration("no wake line configured"))?;

        debug!(width_ms = width.as_millis() as u64, "Pulsing wake line");
        pulse(line, width)?;
        Ok(())
    }

    /// Pulse the trigger line, starting a scan.
    ///
    /// Blocks for the configured pulse width.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Transport`] if the line cannot be set.
    pub fn trigger(&mut self) -> Result<()> {
        let width = self.config.pulse_width;

        debug!(width_ms = width.as_millis() as u64, "Pulsing trigger line");
        pulse(&mut self.trigger, width)?;
        Ok(())
    }

    /// Discard everything already received on the serial link.
    ///
    /// Never waits for new bytes. Returns how many bytes were discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::Transport`] if the link fails.
    pub fn purge(&mut self) -> Result<usize> {
        let mut discarded = 0;
        loop {
            let count = self.serial.drain_nonblocking(&mut self.scratch)?;
            if count == 0 {
                break;
            }
            discarded += count;
        }

        if discarded > 0 {
            debug!(bytes = discarded, "Purged stale receive bytes");
        }
        Ok(discarded)
    }

    /// Read one barcode.
    ///
    /// Purges stale bytes, then makes up to `options.max_tries` attempts to
    /// receive a valid frame, each bounded by `options.timeout`. A timed out
    /// attempt or a malformed line moves on to the next attempt. Returns
    /// `Ok(None)` if every attempt failed.
    ///
    /// With [`TriggerMode::EachAttempt`] the trigger is pulsed at the start
    /// of every attempt. With [`TriggerMode::Manual`] the caller triggers the
    /// scanner, or it scans on its own.
    ///
    /// Dropping the returned future is only safe while it waits for a line.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::InvalidOptions`] for a zero timeout or zero
    /// attempts, before any I/O. Returns [`ScannerError::Transport`] as soon
    /// as the link fails; transport faults are not retried.
    pub async fn read_barcode(&mut self, options: &ReadOptions) -> Result<Option<Barcode>> {
        options.validate()?;

        let mut cycle = ReadCycle::new(options.max_tries);
        loop {
            match cycle.phase().clone() {
                ReadPhase::Idle => cycle.transition_to(ReadPhase::Purging),

                ReadPhase::Purging => {
                    self.purge()?;
                    cycle.transition_to(ReadPhase::Awaiting { attempt: 1 });
                }

                ReadPhase::Awaiting { attempt } => {
                    if options.trigger == TriggerMode::EachAttempt {
                        self.trigger()?;
                    }

                    match timeout(options.timeout, self.serial.read_line()).await {
                        Ok(Ok(line)) => {
                            cycle.transition_to(ReadPhase::Validating { attempt, line });
                        }
                        Ok(Err(e)) => {
                            warn!(attempt, error = %e, "Serial link failed during read");
                            return Err(e.into());
                        }
                        Err(_) => {
                            debug!(
                                attempt,
                                max_tries = cycle.max_tries(),
                                timeout_ms = options.timeout.as_millis() as u64,
                                "Read attempt timed out"
                            );
                            cycle.fail_attempt(AttemptOutcome::TimedOut);
                        }
                    }
                }

                ReadPhase::Validating { attempt, line } => match self.format.validate(&line) {
                    Ok(payload) => {
                        let payload = line.slice_ref(payload);
                        cycle.transition_to(ReadPhase::Done { attempt, payload });
                    }
                    Err(e) => {
                        debug!(
                            attempt,
                            max_tries = cycle.max_tries(),
                            len = line.len(),
                            error = %e,
                            "Discarding malformed frame"
                        );
                        cycle.fail_attempt(AttemptOutcome::Malformed(e));
                    }
                },

                ReadPhase::Done { attempt, payload } => {
                    debug!(attempt, len = payload.len(), "Barcode read");
                    return Ok(Some(Barcode::new(payload, attempt)));
                }

                ReadPhase::Exhausted { attempts } => {
                    debug_assert_eq!(attempts, cycle.max_tries());
                    info!(
                        attempts,
                        timeouts = cycle.timeouts(),
                        malformed = cycle.malformed(),
                        "No barcode read"
                    );
                    return Ok(None);
                }
            }
        }
    }

    /// Read one barcode with the default options: 1 s timeout, 5 attempts,
    /// manual trigger.
    ///
    /// # Errors
    ///
    /// Same as [`read_barcode`](Self::read_barcode).
    pub async fn read_barcode_default(&mut self) -> Result<Option<Barcode>> {
        self.read_barcode(&ReadOptions::default()).await
    }

    /// Wake the scanner if a wake line exists, trigger it, then read.
    ///
    /// The purge at the start of the read runs after the trigger pulse. The
    /// scanner takes much longer than a pulse to decode, so its answer is
    /// not purged. With [`TriggerMode::EachAttempt`] the up-front trigger is
    /// skipped since every attempt triggers anyway.
    ///
    /// # Errors
    ///
    /// Same as [`trigger`](Self::trigger) and
    /// [`read_barcode`](Self::read_barcode).
    pub async fn scan(&mut self, options: &ReadOptions) -> Result<Option<Barcode>> {
        options.validate()?;

        if self.wake.is_some() {
            self.wake()?;
        }
        if options.trigger == TriggerMode::Manual {
            self.trigger()?;
        }
        self.read_barcode(options).await
    }

    /// Get the configuration in use.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Get the frame format responses are checked against.
    pub fn frame_format(&self) -> &FrameFormat {
        &self.format
    }

    /// Check if a wake line is attached.
    pub fn has_wake_line(&self) -> bool {
        self.wake.is_some()
    }

    /// Release the serial link and the lines.
    pub fn into_parts(self) -> (S, T, Option<W>) {
        (self.serial, self.trigger, self.wake)
    }
}

impl<S, T, W> fmt::Debug for Mdc200<S, T, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mdc200")
            .field("format", &self.format)
            .field("pulse_width", &self.config.pulse_width)
            .field("wake_line", &self.wake.is_some())
            .finish()
    }
}

/// Builder for [`Mdc200`].
///
/// # Examples
///
/// ```
/// use mdc200_core::ScannerConfig;
/// use mdc200_hardware::mock::{MockOutputLine, MockSerial};
/// use mdc200_scanner::Mdc200;
/// use std::time::Duration;
///
/// let (serial, _serial) = MockSerial::new();
/// let (trigger, _trigger) = MockOutputLine::new("trigger");
/// let (wake, _wake) = MockOutputLine::new("wake");
///
/// let config = ScannerConfig::builder()
///     .pulse_width(Duration::from_millis(30))
///     .build()?;
///
/// let scanner = Mdc200::builder(serial, trigger)
///     .wake_line(wake)
///     .config(config)
///     .build()?;
///
/// assert!(scanner.has_wake_line());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Mdc200Builder<S, T, W> {
    serial: S,
    trigger: T,
    wake: Option<W>,
    config: ScannerConfig,
}

impl<S, T, W> Mdc200Builder<S, T, W>
where
    S: SerialTransport,
    T: OutputLine,
    W: OutputLine,
{
    /// Attach a wake line.
    pub fn wake_line<L: OutputLine>(self, wake: L) -> Mdc200Builder<S, T, L> {
        Mdc200Builder {
            serial: self.serial,
            trigger: self.trigger,
            wake: Some(wake),
            config: self.config,
        }
    }

    /// Use `config` instead of the C-128 profile.
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the driver and configure the scanner.
    ///
    /// # Errors
    ///
    /// Same as [`Mdc200::new`].
    pub fn build(self) -> Result<Mdc200<S, T, W>> {
        Mdc200::new(self.serial, self.trigger, self.wake, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdc200_core::constants::C128_INIT_SEQUENCE;
    use mdc200_hardware::mock::{MockOutputLine, MockOutputLineHandle, MockSerial, MockSerialHandle};

    type MockScanner = Mdc200<MockSerial, MockOutputLine, MockOutputLine>;

    struct Rig {
        scanner: MockScanner,
        serial: MockSerialHandle,
        trigger: MockOutputLineHandle,
        wake: MockOutputLineHandle,
    }

    fn rig() -> Rig {
        let (serial, serial_handle) = MockSerial::new();
        let (trigger, trigger_handle) = MockOutputLine::new("trigger");
        let (wake, wake_handle) = MockOutputLine::new("wake");

        let scanner = Mdc200::builder(serial, trigger)
            .wake_line(wake)
            .build()
            .unwrap();

        Rig {
            scanner,
            serial: serial_handle,
            trigger: trigger_handle,
            wake: wake_handle,
        }
    }

    #[test]
    fn test_construction_idles_lines_and_writes_init_sequence() {
        let rig = rig();

        assert_eq!(rig.trigger.level(), Some(LineLevel::Idle));
        assert_eq!(rig.wake.level(), Some(LineLevel::Idle));

        let written = rig.serial.written();
        assert_eq!(written.len(), C128_INIT_SEQUENCE.len());
        for (sent, expected) in written.iter().zip(C128_INIT_SEQUENCE) {
            assert_eq!(&sent[..], expected);
        }
    }

    #[test]
    fn test_construction_without_wake_line() {
        let (serial, _serial) = MockSerial::new();
        let (trigger, trigger_handle) = MockOutputLine::new("trigger");

        let scanner = Mdc200::with_defaults(serial, trigger).unwrap();

        assert!(!scanner.has_wake_line());
        assert_eq!(trigger_handle.level(), Some(LineLevel::Idle));
    }

    #[test]
    fn test_invalid_config_touches_nothing() {
        let (serial, serial_handle) = MockSerial::new();
        let (trigger, trigger_handle) = MockOutputLine::new("trigger");
        let config = ScannerConfig {
            suffix: Vec::new(),
            ..ScannerConfig::default()
        };

        let result = Mdc200::builder(serial, trigger).config(config).build();

        assert!(matches!(result, Err(ScannerError::Configuration { .. })));
        assert!(serial_handle.written().is_empty());
        assert_eq!(trigger_handle.level(), None);
    }

    #[test]
    fn test_suffix_without_line_terminator_touches_nothing() {
        let (serial, serial_handle) = MockSerial::new();
        let (trigger, trigger_handle) = MockOutputLine::new("trigger");
        let config = ScannerConfig {
            prefix: b'[',
            suffix: b"]".to_vec(),
            ..ScannerConfig::default()
        };

        let result = Mdc200::builder(serial, trigger).config(config).build();

        assert!(matches!(result, Err(ScannerError::Configuration { .. })));
        assert!(serial_handle.written().is_empty());
        assert_eq!(trigger_handle.level(), None);
    }

    #[test]
    fn test_write_failure_fails_construction() {
        let (serial, serial_handle) = MockSerial::new();
        let (trigger, _trigger) = MockOutputLine::new("trigger");
        serial_handle.set_fail_writes(true);

        let result = Mdc200::with_defaults(serial, trigger);

        assert!(matches!(result, Err(ScannerError::Transport(_))));
    }

    #[test]
    fn test_line_failure_fails_construction() {
        let (serial, serial_handle) = MockSerial::new();
        let (trigger, trigger_handle) = MockOutputLine::new("trigger");
        trigger_handle.set_fail(true);

        let result = Mdc200::with_defaults(serial, trigger);

        assert!(matches!(result, Err(ScannerError::Transport(_))));
        assert!(serial_handle.written().is_empty());
    }

    #[test]
    fn test_custom_init_sequence() {
        let (serial, serial_handle) = MockSerial::new();
        let (trigger, _trigger) = MockOutputLine::new("trigger");
        let config = ScannerConfig::builder()
            .init_sequence(Vec::new())
            .init_command(b"\x1bZZS0ZZ\r".to_vec())
            .build()
            .unwrap();

        Mdc200::builder(serial, trigger).config(config).build().unwrap();

        let written = serial_handle.written();
        assert_eq!(written.len(), 1);
        assert_eq!(&written[0][..], b"\x1bZZS0ZZ\r");
    }

    #[test]
    fn test_trigger_pulse_width() {
        let mut rig = rig();
        rig.trigger.clear_transitions();

        rig.scanner.trigger().unwrap();

        let levels: Vec<LineLevel> = rig.trigger.transitions().iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![LineLevel::Active, LineLevel::Idle]);

        let pulses = rig.trigger.pulses();
        assert_eq!(pulses.len(), 1);
        assert!(pulses[0] >= Duration::from_millis(20));
        // Wake line untouched
        assert_eq!(rig.wake.transitions().len(), 1);
    }

    #[test]
    fn test_wake_pulse_width() {
        let mut rig = rig();

        rig.scanner.wake().unwrap();

        let pulses = rig.wake.pulses();
        assert_eq!(pulses.len(), 1);
        assert!(pulses[0] >= Duration::from_millis(20));
        assert_eq!(rig.wake.level(), Some(LineLevel::Idle));
        assert!(rig.trigger.pulses().is_empty());
    }

    #[test]
    fn test_custom_pulse_width() {
        let (serial, _serial) = MockSerial::new();
        let (trigger, trigger_handle) = MockOutputLine::new("trigger");
        let config = ScannerConfig::builder()
            .pulse_width(Duration::from_millis(35))
            .build()
            .unwrap();
        let mut scanner = Mdc200::builder(serial, trigger).config(config).build().unwrap();

        scanner.trigger().unwrap();

        assert!(trigger_handle.pulses()[0] >= Duration::from_millis(35));
    }

    #[test]
    fn test_wake_without_line_is_configuration_error() {
        let (serial, _serial) = MockSerial::new();
        let (trigger, trigger_handle) = MockOutputLine::new("trigger");
        let mut scanner = Mdc200::with_defaults(serial, trigger).unwrap();
        trigger_handle.clear_transitions();

        let result = scanner.wake();

        assert!(matches!(result, Err(ScannerError::Configuration { .. })));
        assert!(trigger_handle.transitions().is_empty());
    }

    #[test]
    fn test_trigger_line_failure() {
        let mut rig = rig();
        rig.trigger.set_fail(true);

        let result = rig.scanner.trigger();

        assert!(matches!(result, Err(ScannerError::Transport(_))));
    }

    #[test]
    fn test_purge_counts_discarded_bytes() {
        let mut rig = rig();
        rig.serial.inject([0xAA; 40]).unwrap();
        rig.serial.inject(b"\x02OLD\x03\r\n").unwrap();

        let discarded = rig.scanner.purge().unwrap();

        assert_eq!(discarded, 47);
        assert_eq!(rig.serial.drained_bytes(), 47);
        assert_eq!(rig.scanner.purge().unwrap(), 0);
    }

    #[test]
    fn test_purge_failure_is_transport_error() {
        let mut rig = rig();
        rig.serial.set_fail_reads(true);

        assert!(matches!(rig.scanner.purge(), Err(ScannerError::Transport(_))));
    }

    #[test]
    fn test_reinitialize_rewrites_init_sequence() {
        let mut rig = rig();
        rig.serial.clear_written();

        rig.scanner.reinitialize().unwrap();

        assert_eq!(rig.serial.written().len(), C128_INIT_SEQUENCE.len());
    }

    #[test]
    fn test_into_parts() {
        let rig = rig();
        let config = rig.scanner.config().clone();

        let (_serial, _trigger, wake) = rig.scanner.into_parts();

        assert!(wake.is_some());
        assert_eq!(config, ScannerConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_options_skip_io() {
        let mut rig = rig();
        rig.serial.inject(b"stale").unwrap();

        let zero_timeout = ReadOptions::new(Duration::ZERO, 3);
        let result = rig.scanner.read_barcode(&zero_timeout).await;
        assert!(matches!(result, Err(ScannerError::InvalidOptions { .. })));

        let zero_tries = ReadOptions::new(Duration::from_secs(1), 0);
        let result = rig.scanner.read_barcode(&zero_tries).await;
        assert!(matches!(result, Err(ScannerError::InvalidOptions { .. })));

        assert_eq!(rig.serial.drained_bytes(), 0);
    }

    #[tokio::test]
    async fn test_frame_already_waiting_is_purged() {
        let mut rig = rig();
        rig.serial.inject(b"\x02OLD\x03\r\n").unwrap();
        let options = ReadOptions::new(Duration::from_millis(10), 1);

        let result = rig.scanner.read_barcode(&options).await.unwrap();

        assert_eq!(result, None);
        assert_eq!(rig.serial.drained_bytes(), 7);
    }

    #[test]
    fn test_debug_hides_handles() {
        let rig = rig();
        let debug = format!("{:?}", rig.scanner);

        assert!(debug.contains("Mdc200"));
        assert!(debug.contains("wake_line: true"));
    }
}
