// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Media type service: the operations exposed to the host.
//
// Each operation opens its own printer handle, works on it, and lets the
// handle close itself on the way out. The typed methods (`media_type`,
// `apply_media_type`, `list_printers`) report failures as `SpoolError`; the
// host-facing methods turn those into the exact sentinels the host expects.

use tracing::{debug, info};

use spoolmedia_core::error::{Result, SpoolError};
use spoolmedia_core::{
    BridgeConfig, MEDIA_TYPE_UNAVAILABLE, MediaType, MediaTypeCatalog, PrinterSummary,
};

use crate::catalog::{load_catalog, media_type_names};
use crate::devmode::active_device_mode;
use crate::handle::PrinterHandle;
use crate::layout::{InfoLevel, PrinterInfo1, read_wide_cstr};
use crate::native::Spooler;
use crate::sized_call::{Sizing, sized_call};

/// Spooler operations bound to one spooler implementation and config.
pub struct PrintBridge<'s> {
    spooler: &'s dyn Spooler,
    config: BridgeConfig,
}

impl<'s> PrintBridge<'s> {
    pub fn new(spooler: &'s dyn Spooler, config: BridgeConfig) -> Self {
        Self { spooler, config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // -- Printers --------------------------------------------------------------

    /// Level-1 records of every printer matching the configured enum flags.
    pub fn list_printers(&self) -> Result<Vec<PrinterSummary>> {
        let flags = self.config.enum_flags;
        let mut returned = 0u32;
        let buffer = sized_call("EnumPrintersW", |out| {
            let mut needed = 0u32;
            let ok = self.spooler.enum_printers(
                flags,
                InfoLevel::General.as_u32(),
                out,
                &mut needed,
                &mut returned,
            );
            Sizing {
                ok,
                required: needed as usize,
            }
        })?;

        let printers = (0..returned as usize)
            // SAFETY: PRINTER_INFO_1 is plain data; `record` bounds-checks.
            .map_while(|i| unsafe { buffer.record::<PrinterInfo1>(i) })
            .map(|record| {
                // SAFETY: the strings live in `buffer`, which outlives this
                // closure, and the spooler terminates each of them.
                unsafe {
                    PrinterSummary {
                        name: read_wide_cstr(record.name),
                        description: read_wide_cstr(record.description),
                        comment: read_wide_cstr(record.comment),
                        flags: record.flags,
                    }
                }
            })
            .collect::<Vec<_>>();
        debug!(count = printers.len(), "printers enumerated");
        Ok(printers)
    }

    /// `getPrinters`: printer names separated by `\n`, or `""`.
    pub fn get_printers(&self) -> String {
        match self.list_printers() {
            Ok(printers) => printers
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                debug!(error = %e, "printer enumeration failed");
                String::new()
            }
        }
    }

    /// `openPrinter`: a handle, or `None` for unknown / inaccessible printers.
    pub fn open_printer(&self, name: &str) -> Option<PrinterHandle<'s>> {
        PrinterHandle::open(self.spooler, name)
    }

    /// `closePrinter`.
    pub fn close_printer(&self, handle: PrinterHandle<'_>) -> bool {
        handle.close()
    }

    // -- Media types ----------------------------------------------------------

    /// `getMediaTypeNames`.
    pub fn get_media_type_names(&self, printer: &str) -> Option<MediaTypeCatalog> {
        media_type_names(self.spooler, printer, &self.config.capability_port)
    }

    /// The active `dmMediaType`: per-user when set, otherwise global.
    pub fn media_type(&self, printer: &str) -> Result<u32> {
        let handle = self.open_or_not_found(printer)?;
        let dev_mode = active_device_mode(&handle)
            .ok_or_else(|| SpoolError::NoDeviceMode(printer.to_owned()))?;
        Ok(dev_mode.media_type())
    }

    /// `getMediaType`: the active code, or `-1` when unavailable.
    pub fn get_media_type(&self, printer: &str) -> i64 {
        match self.media_type(printer) {
            Ok(code) => i64::from(code),
            Err(e) => {
                debug!(printer, error = %e, "media type unavailable");
                MEDIA_TYPE_UNAVAILABLE
            }
        }
    }

    /// Write `media_type` into the active device mode and commit it as the
    /// per-user setting (level 9).
    pub fn apply_media_type(&self, printer: &str, media_type: &MediaType) -> Result<()> {
        let handle = self.open_or_not_found(printer)?;
        let code = self.resolve(printer, media_type)?;

        let mut dev_mode = active_device_mode(&handle)
            .ok_or_else(|| SpoolError::NoDeviceMode(printer.to_owned()))?;
        let previous = dev_mode.media_type();
        dev_mode.set_media_type(code);

        let mut record = dev_mode.user_record();
        if !handle.set_info(InfoLevel::UserDevMode, record.as_bytes_mut()) {
            return Err(SpoolError::CommitFailed(printer.to_owned()));
        }
        info!(
            printer,
            previous,
            code,
            source = ?dev_mode.scope(),
            "media type updated"
        );
        Ok(())
    }

    /// `setMediaType`: `true` only when the spooler accepted the update.
    pub fn set_media_type(&self, printer: &str, media_type: impl Into<MediaType>) -> bool {
        let media_type = media_type.into();
        match self.apply_media_type(printer, &media_type) {
            Ok(()) => true,
            Err(e) => {
                debug!(printer, %media_type, error = %e, "media type not set");
                false
            }
        }
    }

    fn open_or_not_found(&self, printer: &str) -> Result<PrinterHandle<'s>> {
        PrinterHandle::open(self.spooler, printer)
            .ok_or_else(|| SpoolError::PrinterNotFound(printer.to_owned()))
    }

    fn resolve(&self, printer: &str, media_type: &MediaType) -> Result<u32> {
        match media_type {
            MediaType::Code(code) => Ok(*code),
            MediaType::Name(name) => {
                load_catalog(self.spooler, printer, &self.config.capability_port)?
                    .code_for(name)
                    .ok_or_else(|| SpoolError::UnknownMediaType {
                        printer: printer.to_owned(),
                        name: name.clone(),
                    })
            }
        }
    }
}
