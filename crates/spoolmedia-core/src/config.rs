// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// `EnumPrinters` flag selecting printers installed on this machine.
pub const PRINTER_ENUM_LOCAL: u32 = 0x0000_0002;

/// `EnumPrinters` flag selecting printers the user has connected to.
pub const PRINTER_ENUM_CONNECTIONS: u32 = 0x0000_0004;

/// Bridge settings. Every field has a default, so a config file only needs
/// the keys it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Spooler module loaded once per process.
    pub spooler_library: String,
    /// Flags passed to `EnumPrinters` when listing printers.
    pub enum_flags: u32,
    /// Port name passed to `DeviceCapabilities` (empty = let the driver decide).
    pub capability_port: String,
    /// Default tracing filter for the host when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Largest inbound host message accepted, in bytes.
    pub max_message_bytes: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            spooler_library: "winspool.drv".into(),
            enum_flags: PRINTER_ENUM_LOCAL,
            capability_port: String::new(),
            log_filter: "info".into(),
            max_message_bytes: 1024 * 1024,
        }
    }
}

impl BridgeConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the config as pretty-printed JSON.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
