// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Active device mode lookup: the per-user override when there is one,
// otherwise the printer's global device mode.

use std::ptr::NonNull;

use tracing::debug;

use spoolmedia_core::DeviceModeScope;
use spoolmedia_core::error::Result;

use crate::handle::PrinterHandle;
use crate::layout::{DevMode, InfoLevel, PrinterInfo9, PrinterInfoDevMode};
use crate::sized_call::NativeBuffer;

/// A device mode living inside the `GetPrinter` buffer it was read from.
///
/// The spooler places the `DEVMODE` (plus driver-private bytes) in the same
/// allocation as the `PRINTER_INFO_8/9` record, so the buffer is owned here
/// and the pointer never outlives it. Only `dmMediaType` is touched; every
/// other byte stays exactly as the spooler wrote it.
pub struct ActiveDeviceMode {
    dev_mode: NonNull<DevMode>,
    scope: DeviceModeScope,
    _buffer: NativeBuffer,
}

impl ActiveDeviceMode {
    fn from_info(buffer: NativeBuffer, scope: DeviceModeScope) -> Option<Self> {
        // SAFETY: the record is a single pointer; any bit pattern is valid.
        let info = unsafe { buffer.record::<PrinterInfoDevMode>(0) }?;
        let dev_mode = NonNull::new(info.dev_mode)?;
        Some(Self {
            dev_mode,
            scope,
            _buffer: buffer,
        })
    }

    /// Which device mode this is.
    pub fn scope(&self) -> DeviceModeScope {
        self.scope
    }

    pub fn media_type(&self) -> u32 {
        let dm = self.dev_mode.as_ptr();
        // SAFETY: `dm` points at a complete DEVMODE kept alive by `_buffer`.
        unsafe { (&raw const (*dm).media_type).read_unaligned() }
    }

    /// Overwrite `dmMediaType` in place.
    pub fn set_media_type(&mut self, code: u32) {
        let dm = self.dev_mode.as_ptr();
        // SAFETY: as above, and `&mut self` makes this the only accessor.
        unsafe { (&raw mut (*dm).media_type).write_unaligned(code) }
    }

    pub fn as_ptr(&self) -> *mut DevMode {
        self.dev_mode.as_ptr()
    }

    /// `PRINTER_INFO_9` record pointing at this device mode, for committing
    /// it back as the per-user setting.
    pub fn user_record(&self) -> PrinterInfo9 {
        PrinterInfoDevMode {
            dev_mode: self.dev_mode.as_ptr(),
        }
    }
}

fn level(scope: DeviceModeScope) -> InfoLevel {
    match scope {
        DeviceModeScope::PerUser => InfoLevel::UserDevMode,
        DeviceModeScope::Global => InfoLevel::GlobalDevMode,
    }
}

fn read_scope(
    handle: &PrinterHandle<'_>,
    scope: DeviceModeScope,
) -> Result<Option<ActiveDeviceMode>> {
    let buffer = handle.info(level(scope))?;
    Ok(ActiveDeviceMode::from_info(buffer, scope))
}

/// The device mode currently in effect for `handle`.
///
/// Level 9 (per-user) wins when its pointer is set; a null per-user pointer
/// falls back to level 8 (global). A failing level-9 query is not retried
/// at level 8.
pub fn active_device_mode(handle: &PrinterHandle<'_>) -> Option<ActiveDeviceMode> {
    let printer = handle.printer_name();
    match read_scope(handle, DeviceModeScope::PerUser) {
        Ok(Some(dev_mode)) => return Some(dev_mode),
        Ok(None) => debug!(printer, "no per-user device mode, using global"),
        Err(e) => {
            debug!(printer, error = %e, "per-user device mode unavailable");
            return None;
        }
    }

    match read_scope(handle, DeviceModeScope::Global) {
        Ok(found) => {
            if found.is_none() {
                debug!(printer, "no global device mode either");
            }
            found
        }
        Err(e) => {
            debug!(printer, error = %e, "global device mode unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimPrinter, SimulatedSpooler};

    #[test]
    fn per_user_mode_wins() {
        let sim = SimulatedSpooler::new().with_printer(
            SimPrinter::new("Office").global_media(1).per_user_media(258),
        );
        let handle = PrinterHandle::open(&sim, "Office").unwrap();
        let dev_mode = active_device_mode(&handle).unwrap();
        assert_eq!(dev_mode.scope(), DeviceModeScope::PerUser);
        assert_eq!(dev_mode.media_type(), 258);
    }

    #[test]
    fn null_per_user_falls_back_to_global() {
        let sim = SimulatedSpooler::new().with_printer(SimPrinter::new("Office").global_media(7));
        let handle = PrinterHandle::open(&sim, "Office").unwrap();
        let dev_mode = active_device_mode(&handle).unwrap();
        assert_eq!(dev_mode.scope(), DeviceModeScope::Global);
        assert_eq!(dev_mode.media_type(), 7);
    }

    #[test]
    fn both_null_is_none() {
        let sim = SimulatedSpooler::new().with_printer(SimPrinter::new("Bare"));
        let handle = PrinterHandle::open(&sim, "Bare").unwrap();
        assert!(active_device_mode(&handle).is_none());
    }

    #[test]
    fn failing_user_query_does_not_fall_back() {
        let sim = SimulatedSpooler::new().with_printer(
            SimPrinter::new("Flaky")
                .global_media(3)
                .fail_info_level(InfoLevel::UserDevMode),
        );
        let handle = PrinterHandle::open(&sim, "Flaky").unwrap();
        assert!(active_device_mode(&handle).is_none());
    }

    #[test]
    fn mutation_stays_in_the_queried_buffer() {
        let sim = SimulatedSpooler::new().with_printer(SimPrinter::new("Office").global_media(1));
        let handle = PrinterHandle::open(&sim, "Office").unwrap();
        let mut dev_mode = active_device_mode(&handle).unwrap();
        dev_mode.set_media_type(260);
        assert_eq!(dev_mode.media_type(), 260);
        assert_eq!(dev_mode.user_record().dev_mode, dev_mode.as_ptr());
        // Nothing was committed, so the spooler still has the old value.
        assert_eq!(sim.media_type("Office", DeviceModeScope::Global), Some(1));
    }
}
