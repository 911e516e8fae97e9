//! Integration tests for triggered reads.
//!
//! The trigger line's hook plays the scanner: each pulse makes it answer on
//! the serial link, either at once or after a decode delay.

mod common;

use std::time::Duration;

use common::{frame, inject_after, rig, rig_with_trigger_hook};
use mdc200_core::{ReadOptions, TriggerMode};
use mdc200_hardware::LineLevel;
use mdc200_hardware::mock::{MockOutputLine, MockSerial};
use mdc200_scanner::{Mdc200, ScannerError};

const PULSE_WIDTH: Duration = Duration::from_millis(20);

#[tokio::test(start_paused = true)]
async fn test_scan_wakes_triggers_then_reads() {
    let mut rig = rig_with_trigger_hook(|serial, _| {
        // Decoding takes longer than the pulse
        inject_after(serial, Duration::from_millis(80), frame(b"A23457098"));
    });
    rig.wake.clear_transitions();
    rig.trigger.clear_transitions();

    let barcode = rig.scanner.scan(&ReadOptions::default()).await.unwrap().unwrap();

    assert_eq!(barcode.as_bytes(), b"A23457098");

    let wake_pulses = rig.wake.pulses();
    let trigger_pulses = rig.trigger.pulses();
    assert_eq!(wake_pulses.len(), 1);
    assert_eq!(trigger_pulses.len(), 1);
    assert!(wake_pulses[0] >= PULSE_WIDTH);
    assert!(trigger_pulses[0] >= PULSE_WIDTH);

    // Wake is released before the trigger is asserted
    let wake_released = rig.wake.transitions()[1].at;
    let trigger_asserted = rig.trigger.transitions()[0].at;
    assert!(wake_released <= trigger_asserted);
}

#[tokio::test(start_paused = true)]
async fn test_scan_discards_stale_bytes() {
    let mut rig = rig_with_trigger_hook(|serial, _| {
        inject_after(serial, Duration::from_millis(80), frame(b"FRESH"));
    });
    let stale = frame(b"STALE");
    rig.serial.inject(&stale).unwrap();

    let barcode = rig.scanner.scan(&ReadOptions::default()).await.unwrap().unwrap();

    assert_eq!(barcode.as_bytes(), b"FRESH");
    assert_eq!(rig.serial.drained_bytes(), stale.len());
}

#[tokio::test(start_paused = true)]
async fn test_scan_without_wake_line() {
    let (serial, serial_handle) = MockSerial::new();
    let scanner_side = serial_handle.clone();
    let (trigger, trigger_handle) = MockOutputLine::new("trigger");
    let trigger = trigger.on_level(move |level| {
        if level == LineLevel::Active {
            inject_after(&scanner_side, Duration::from_millis(50), frame(b"NOWAKE"));
        }
    });
    let mut scanner = Mdc200::with_defaults(serial, trigger).unwrap();

    let barcode = scanner.scan(&ReadOptions::default()).await.unwrap().unwrap();

    assert_eq!(barcode.as_bytes(), b"NOWAKE");
    assert_eq!(trigger_handle.pulses().len(), 1);
    // Explicit wake still reports the missing line
    assert!(matches!(scanner.wake(), Err(ScannerError::Configuration { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_each_attempt_mode_retriggers() {
    let mut rig = rig_with_trigger_hook(|serial, pulse| {
        // First pulse gets a misread, the second a clean frame
        if pulse == 1 {
            serial.inject(b"\x02GARBLED\r\n").unwrap();
        } else {
            serial.inject(frame(b"RETRIED")).unwrap();
        }
    });
    rig.trigger.clear_transitions();
    let options = ReadOptions::new(Duration::from_millis(500), 5).with_trigger(TriggerMode::EachAttempt);

    let barcode = rig.scanner.read_barcode(&options).await.unwrap().unwrap();

    assert_eq!(barcode.as_bytes(), b"RETRIED");
    assert_eq!(barcode.attempt(), 2);
    assert_eq!(rig.trigger.pulses().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_each_attempt_mode_pulses_every_attempt_on_no_read() {
    let mut rig = rig();
    rig.trigger.clear_transitions();
    let options = ReadOptions::new(Duration::from_millis(100), 3).with_trigger(TriggerMode::EachAttempt);

    let result = rig.scanner.scan(&options).await.unwrap();

    assert_eq!(result, None);
    // scan does not add its own pulse in this mode
    assert_eq!(rig.trigger.pulses().len(), 3);
    assert_eq!(rig.wake.pulses().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_manual_mode_never_triggers() {
    let mut rig = rig();
    rig.trigger.clear_transitions();

    let result = rig.scanner.read_barcode(&ReadOptions::new(Duration::from_millis(100), 2)).await.unwrap();

    assert_eq!(result, None);
    assert!(rig.trigger.transitions().is_empty());
}

#[tokio::test]
async fn test_trigger_fault_aborts_scan() {
    let mut rig = rig();
    rig.trigger.set_fail(true);

    let result = rig.scanner.scan(&ReadOptions::default()).await;

    assert!(matches!(result, Err(ScannerError::Transport(_))));
    assert_eq!(rig.serial.drained_bytes(), 0);
}

#[test]
fn test_lines_rest_idle_between_pulses() {
    let mut rig = rig();

    rig.scanner.trigger().unwrap();
    rig.scanner.wake().unwrap();
    rig.scanner.trigger().unwrap();

    assert_eq!(rig.trigger.level(), Some(LineLevel::Idle));
    assert_eq!(rig.wake.level(), Some(LineLevel::Idle));
    assert_eq!(rig.trigger.pulses().len(), 2);
    assert_eq!(rig.wake.pulses().len(), 1);
}
