//! `mdc200`: read barcodes from an MDC-200 scanner.
//!
//! Prints each barcode on stdout; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! mdc200 --port /dev/ttyUSB0 --trigger-signal rts
//! mdc200 --config scanner.toml --loop
//! mdc200 --simulate A23457098 -v
//! ```
//!
//! # Exit Codes
//!
//! - `0`: a barcode was read (or `--loop` was interrupted)
//! - `1`: error
//! - `2`: no barcode read within the allowed attempts

mod args;
mod config;
mod hardware;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mdc200_core::ReadOptions;

use crate::args::Cli;
use crate::config::AppConfig;
use crate::hardware::Scanner;

/// Exit code for a read that found no barcode.
const EXIT_NO_READ: u8 = 2;

/// Result of a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Read,
    NoRead,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(Outcome::Read) => ExitCode::SUCCESS,
        Ok(Outcome::NoRead) => ExitCode::from(EXIT_NO_READ),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome> {
    info!(version = mdc200_core::VERSION, "mdc200 starting");

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    cli.apply(&mut config);
    config.read.validate().context("invalid read options")?;

    let mut scanner = match &cli.simulate {
        Some(barcode) => hardware::simulated(&config, barcode)?,
        None => hardware::open(&config).await?,
    };

    if !cli.repeat {
        return scan_once(&mut scanner, &config.read).await;
    }

    info!("Scanning until interrupted");
    loop {
        tokio::select! {
            result = scan_once(&mut scanner, &config.read) => {
                result?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                return Ok(Outcome::Read);
            }
        }
    }
}

async fn scan_once(scanner: &mut Scanner, options: &ReadOptions) -> Result<Outcome> {
    match scanner.scan(options).await.context("scan failed")? {
        Some(barcode) => {
            info!(
                attempt = barcode.attempt(),
                len = barcode.len(),
                "Barcode read"
            );
            println!("{}", barcode);
            Ok(Outcome::Read)
        }
        None => {
            warn!(max_tries = options.max_tries, "No barcode read");
            Ok(Outcome::NoRead)
        }
    }
}
