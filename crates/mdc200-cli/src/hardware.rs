//! Opening the scanner, real or simulated.

use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use mdc200_hardware::LineLevel;
use mdc200_hardware::devices::{AnyOutputLine, AnySerialTransport};
use mdc200_hardware::mock::{MockOutputLine, MockSerial};
use mdc200_scanner::Mdc200;

use crate::config::AppConfig;

/// Driver type used by the tool for every backend.
pub type Scanner = Mdc200<AnySerialTransport, AnyOutputLine, AnyOutputLine>;

/// Delay between a trigger pulse and the simulated scanner's answer.
const SIMULATED_DECODE_DELAY: Duration = Duration::from_millis(50);

/// Build a driver on a simulated scanner that answers every trigger pulse
/// with `barcode`, framed the way the configured profile expects.
pub fn simulated(config: &AppConfig, barcode: &str) -> Result<Scanner> {
    let frame = config.scanner.frame_format()?.encode(barcode.as_bytes());
    let (serial, scanner_side) = MockSerial::with_name("simulated".to_string());

    let (trigger, _trigger) = MockOutputLine::new("trigger");
    let trigger = trigger.on_level(move |level| {
        if level != LineLevel::Active {
            return;
        }

        let scanner_side = scanner_side.clone();
        let frame = frame.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SIMULATED_DECODE_DELAY).await;
            if let Err(e) = scanner_side.inject(&frame) {
                warn!(error = %e, "Simulated scanner could not answer");
            }
        });
    });

    let wake = config
        .wake
        .as_ref()
        .map(|_| AnyOutputLine::Mock(MockOutputLine::new("wake").0));

    info!(barcode, "Using simulated scanner");
    let scanner = Mdc200::new(
        AnySerialTransport::Mock(serial),
        AnyOutputLine::Mock(trigger),
        wake,
        config.scanner.clone(),
    )?;
    Ok(scanner)
}

/// Open the scanner on the configured serial ports.
#[cfg(feature = "hardware-serial")]
pub async fn open(config: &AppConfig) -> Result<Scanner> {
    use anyhow::Context;
    use mdc200_hardware::serial::{ModemControlLine, TokioSerialTransport};

    use crate::config::LineConfig;

    fn open_line(
        serial: &TokioSerialTransport,
        line: &LineConfig,
    ) -> mdc200_hardware::Result<AnyOutputLine> {
        let line = match &line.port {
            Some(port) => ModemControlLine::open(port, line.signal)?,
            None => serial.modem_line(line.signal)?,
        };
        Ok(AnyOutputLine::Modem(line))
    }

    let serial = TokioSerialTransport::open(&config.port, config.baud_rate)
        .await
        .with_context(|| format!("failed to open scanner port {}", config.port))?;

    let trigger = open_line(&serial, &config.trigger).context("failed to open trigger line")?;
    let wake = config
        .wake
        .as_ref()
        .map(|wake| open_line(&serial, wake))
        .transpose()
        .context("failed to open wake line")?;

    let scanner = Mdc200::new(
        AnySerialTransport::Serial(serial),
        trigger,
        wake,
        config.scanner.clone(),
    )?;
    Ok(scanner)
}

/// Open the scanner on the configured serial ports.
#[cfg(not(feature = "hardware-serial"))]
pub async fn open(_config: &AppConfig) -> Result<Scanner> {
    anyhow::bail!("built without serial port support; use --simulate")
}
