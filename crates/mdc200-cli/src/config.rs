//! Application configuration file.
//!
//! Everything the command line can set can also come from a TOML file;
//! flags win over the file.
//!
//! ```toml
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//!
//! [trigger]
//! signal = "rts"
//!
//! [wake]
//! port = "/dev/ttyUSB1"
//! signal = "dtr"
//!
//! [read]
//! timeout_ms = 1000
//! max_tries = 5
//! trigger = "manual"
//!
//! [scanner]
//! pulse_width_ms = 20
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use mdc200_core::constants::DEFAULT_BAUD_RATE;
use mdc200_core::{ReadOptions, ScannerConfig};
use mdc200_hardware::ModemSignal;

/// Port the scanner's data link is expected on.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// An output line made from a serial port's modem signal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineConfig {
    /// Port providing the signal; the data port when absent.
    #[serde(default)]
    pub port: Option<String>,

    /// Which modem signal drives the line.
    pub signal: ModemSignal,
}

impl LineConfig {
    /// Line on the data port's own modem signal.
    pub fn on_data_port(signal: ModemSignal) -> Self {
        Self { port: None, signal }
    }
}

/// Top-level configuration of the `mdc200` tool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial port carrying the scanner's data link.
    pub port: String,

    /// Baud rate of the data link.
    pub baud_rate: u32,

    /// Line wired to the trigger input.
    pub trigger: LineConfig,

    /// Line wired to the wake input, if any.
    pub wake: Option<LineConfig>,

    /// Options used for every read.
    pub read: ReadOptions,

    /// Scanner profile.
    pub scanner: ScannerConfig,
}

impl AppConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        mdc200_core::config::load_toml(path)
            .with_context(|| format!("failed to load config file {}", path.display()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            trigger: LineConfig::on_data_port(ModemSignal::Rts),
            wake: None,
            read: ReadOptions::default(),
            scanner: ScannerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdc200_core::TriggerMode;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: AppConfig = mdc200_core::config::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_full_file() {
        let config: AppConfig = mdc200_core::config::from_toml_str(
            r#"
            port = "/dev/ttyS1"
            baud_rate = 19200

            [trigger]
            port = "/dev/ttyUSB2"
            signal = "dtr"

            [wake]
            signal = "rts"

            [read]
            timeout_ms = 250
            max_tries = 2
            trigger = "each_attempt"

            [scanner]
            pulse_width_ms = 40
            "#,
        )
        .unwrap();

        assert_eq!(config.port, "/dev/ttyS1");
        assert_eq!(config.baud_rate, 19200);
        assert_eq!(config.trigger.port.as_deref(), Some("/dev/ttyUSB2"));
        assert_eq!(config.trigger.signal, ModemSignal::Dtr);
        assert_eq!(config.wake, Some(LineConfig::on_data_port(ModemSignal::Rts)));
        assert_eq!(config.read.timeout, Duration::from_millis(250));
        assert_eq!(config.read.max_tries, 2);
        assert_eq!(config.read.trigger, TriggerMode::EachAttempt);
        assert_eq!(config.scanner.pulse_width, Duration::from_millis(40));
        // Unset scanner fields keep the C-128 profile
        assert_eq!(config.scanner.prefix, 0x02);
    }

    #[test]
    fn test_unknown_signal_rejected() {
        let result: mdc200_core::Result<AppConfig> =
            mdc200_core::config::from_toml_str("[trigger]\nsignal = \"cts\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "baud_rate = \"fast\"").unwrap();

        let error = AppConfig::load(file.path()).unwrap_err();

        assert!(format!("{:#}", error).contains(&file.path().display().to_string()));
    }
}
