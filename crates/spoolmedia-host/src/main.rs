// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolmedia — native-messaging host
//
// Entry point. Loads the configuration, initialises logging on stderr (stdout
// carries the protocol), loads the spooler module once, and answers requests
// until the host closes stdin.

mod protocol;

use std::path::PathBuf;
use std::process::ExitCode;

use spoolmedia_bridge::{PrintBridge, WinSpool};
use spoolmedia_core::BridgeConfig;

/// Environment variable naming an optional JSON config file.
const CONFIG_ENV: &str = "SPOOLMEDIA_CONFIG";

fn load_config() -> (BridgeConfig, Option<String>) {
    let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) else {
        return (BridgeConfig::default(), None);
    };
    match BridgeConfig::load(&path) {
        Ok(config) => (config, None),
        Err(e) => (
            BridgeConfig::default(),
            Some(format!("{}: {e}", path.display())),
        ),
    }
}

fn main() -> ExitCode {
    let (config, config_error) = load_config();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    if let Some(reason) = config_error {
        tracing::warn!(%reason, "config unreadable, using defaults");
    }
    tracing::info!(library = %config.spooler_library, "spoolmedia host starting");

    let spooler = match WinSpool::shared(&config) {
        Ok(spooler) => {
            tracing::debug!(library = spooler.library_name(), "spooler bound");
            spooler
        }
        Err(e) => {
            tracing::error!(error = %e, fatal = e.is_fatal(), "spooler unavailable");
            return ExitCode::FAILURE;
        }
    };

    let bridge = PrintBridge::new(spooler, config);
    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    match protocol::serve(&bridge, &mut stdin, &mut stdout) {
        Ok(handled) => {
            tracing::info!(handled, "input closed, exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "protocol failure");
            ExitCode::FAILURE
        }
    }
}
