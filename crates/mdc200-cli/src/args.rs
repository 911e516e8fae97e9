//! Command line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use mdc200_core::TriggerMode;
use mdc200_hardware::ModemSignal;

use crate::config::{AppConfig, LineConfig};

#[derive(Debug, Parser)]
#[command(name = "mdc200", version)]
#[command(about = "Read barcodes from an MDC-200 scanner", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Serial port the scanner is connected to
    #[arg(long)]
    pub port: Option<String>,

    /// Baud rate of the serial port
    #[arg(long)]
    pub baud: Option<u32>,

    /// Port whose modem signal drives the trigger (default: the data port)
    #[arg(long)]
    pub trigger_port: Option<String>,

    /// Modem signal used as trigger: rts or dtr
    #[arg(long)]
    pub trigger_signal: Option<ModemSignal>,

    /// Port whose modem signal drives the wake input (default: the data port)
    #[arg(long)]
    pub wake_port: Option<String>,

    /// Modem signal used as wake: rts or dtr
    #[arg(long)]
    pub wake_signal: Option<ModemSignal>,

    /// Timeout of each read attempt in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Number of read attempts
    #[arg(long)]
    pub tries: Option<u32>,

    /// Pulse the trigger before every attempt
    #[arg(long)]
    pub each_attempt: bool,

    /// Keep scanning until interrupted
    #[arg(long = "loop")]
    pub repeat: bool,

    /// Run against a simulated scanner that always reads BARCODE
    #[arg(long, value_name = "BARCODE")]
    pub simulate: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Override file settings with the flags that were given.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = &self.port {
            config.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }

        if let Some(port) = &self.trigger_port {
            config.trigger.port = Some(port.clone());
        }
        if let Some(signal) = self.trigger_signal {
            config.trigger.signal = signal;
        }

        if self.wake_port.is_some() || self.wake_signal.is_some() {
            let wake = config
                .wake
                .get_or_insert_with(|| LineConfig::on_data_port(ModemSignal::Dtr));
            if let Some(port) = &self.wake_port {
                wake.port = Some(port.clone());
            }
            if let Some(signal) = self.wake_signal {
                wake.signal = signal;
            }
        }

        if let Some(timeout_ms) = self.timeout_ms {
            config.read.timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(tries) = self.tries {
            config.read.max_tries = tries;
        }
        if self.each_attempt {
            config.read.trigger = TriggerMode::EachAttempt;
        }
    }

    /// Log filter matching the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
