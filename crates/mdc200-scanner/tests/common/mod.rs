//! Common test utilities for driver integration tests.
//!
//! Builds a driver on top of the mock serial link and mock lines and keeps
//! the handles around so tests can feed the link and inspect the lines.

#![allow(dead_code)]

use std::time::Duration;

use mdc200_core::FrameFormat;
use mdc200_hardware::LineLevel;
use mdc200_hardware::mock::{MockOutputLine, MockOutputLineHandle, MockSerial, MockSerialHandle};
use mdc200_scanner::Mdc200;
use tokio::task::JoinHandle;

pub type MockScanner = Mdc200<MockSerial, MockOutputLine, MockOutputLine>;

/// Driver plus the handles of its mock hardware.
pub struct Rig {
    pub scanner: MockScanner,
    pub serial: MockSerialHandle,
    pub trigger: MockOutputLineHandle,
    pub wake: MockOutputLineHandle,
}

/// Driver with the C-128 profile, a trigger line and a wake line.
pub fn rig() -> Rig {
    rig_with_trigger_hook(|_, _| {})
}

/// Like [`rig`], but `hook` runs on every trigger pulse with the serial
/// handle, acting as the scanner's reaction to being triggered.
pub fn rig_with_trigger_hook(
    mut hook: impl FnMut(&MockSerialHandle, u32) + Send + 'static,
) -> Rig {
    let (serial, serial_handle) = MockSerial::new();
    let (wake, wake_handle) = MockOutputLine::new("wake");

    let scanner_side = serial_handle.clone();
    let mut pulses = 0;
    let (trigger, trigger_handle) = MockOutputLine::new("trigger");
    let trigger = trigger.on_level(move |level| {
        if level == LineLevel::Active {
            pulses += 1;
            hook(&scanner_side, pulses);
        }
    });

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

/// Frame `payload` with the C-128 profile.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    FrameFormat::c128().encode(payload).to_vec()
}

/// Inject `bytes` once `delay` has passed on the tokio clock.
pub fn inject_after(handle: &MockSerialHandle, delay: Duration, bytes: impl AsRef<[u8]>) -> JoinHandle<()> {
    let handle = handle.clone();
    let bytes = bytes.as_ref().to_vec();

    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        handle.inject(bytes).unwrap();
    })
}
