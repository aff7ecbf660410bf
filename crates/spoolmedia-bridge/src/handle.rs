// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoped printer handles.
//
// A `PrinterHandle` closes itself exactly once: either through an explicit
// `close()` or, on every other exit path (early return, `?`, panic), when it
// is dropped.

use tracing::{debug, warn};

use spoolmedia_core::error::Result;

use crate::layout::{InfoLevel, to_wide};
use crate::native::{RawHandle, Spooler};
use crate::sized_call::{NativeBuffer, Sizing, sized_call};

/// An open connection to one printer, valid for a single operation.
pub struct PrinterHandle<'s> {
    spooler: &'s dyn Spooler,
    raw: RawHandle,
    printer: String,
    released: bool,
}

impl<'s> PrinterHandle<'s> {
    /// Open `name` with default access rights.
    ///
    /// Unknown printers and denied access both yield `None`; neither is
    /// treated as an error. A name with an embedded NUL cannot be passed to
    /// the spooler intact and also yields `None`.
    pub fn open(spooler: &'s dyn Spooler, name: &str) -> Option<Self> {
        if name.contains('\0') {
            debug!(printer = ?name, "printer name contains NUL");
            return None;
        }
        let wide = to_wide(name);
        match spooler.open_printer(&wide, None) {
            Some(raw) => {
                debug!(printer = %name, "printer opened");
                Some(Self {
                    spooler,
                    raw,
                    printer: name.to_owned(),
                    released: false,
                })
            }
            None => {
                debug!(printer = %name, "printer not found or access denied");
                None
            }
        }
    }

    pub fn printer_name(&self) -> &str {
        &self.printer
    }

    /// Fetch the `level` printer information record via a sized call.
    pub fn info(&self, level: InfoLevel) -> Result<NativeBuffer> {
        sized_call("GetPrinterW", |out| {
            let mut needed = 0u32;
            let ok = self
                .spooler
                .get_printer(self.raw, level.as_u32(), out, &mut needed);
            Sizing {
                ok,
                required: needed as usize,
            }
        })
    }

    /// Write a `level` printer information record (`SetPrinterW`, command 0).
    pub fn set_info(&self, level: InfoLevel, info: &mut [u8]) -> bool {
        self.spooler.set_printer(self.raw, level.as_u32(), info, 0)
    }

    /// Release the handle now and report whether the spooler accepted it.
    pub fn close(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if self.released {
            return true;
        }
        self.released = true;
        let closed = self.spooler.close_printer(self.raw);
        if closed {
            debug!(printer = %self.printer, "printer closed");
        } else {
            warn!(printer = %self.printer, "ClosePrinter reported failure");
        }
        closed
    }
}

impl Drop for PrinterHandle<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for PrinterHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterHandle")
            .field("printer", &self.printer)
            .field("raw", &self.raw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimPrinter, SimulatedSpooler};

    fn spooler() -> SimulatedSpooler {
        SimulatedSpooler::new().with_printer(SimPrinter::new("Office").global_media(1))
    }

    #[test]
    fn unknown_printer_is_none() {
        let sim = spooler();
        assert!(PrinterHandle::open(&sim, "nonexistent-printer-xyz").is_none());
        assert_eq!(sim.opened(), 0);
    }

    #[test]
    fn embedded_nul_is_not_truncated_to_another_printer() {
        let sim = spooler();
        assert!(PrinterHandle::open(&sim, "Office\0elsewhere").is_none());
        assert!(PrinterHandle::open(&sim, "\0").is_none());
        assert_eq!(sim.opened(), 0);
    }

    #[test]
    fn denied_access_is_none() {
        let sim = SimulatedSpooler::new().with_printer(SimPrinter::new("Locked").deny_access());
        assert!(PrinterHandle::open(&sim, "Locked").is_none());
    }

    #[test]
    fn explicit_close_releases_once() {
        let sim = spooler();
        let handle = PrinterHandle::open(&sim, "Office").unwrap();
        assert_eq!(sim.open_handles(), 1);
        assert!(handle.close());
        assert_eq!(sim.opened(), 1);
        assert_eq!(sim.closed(), 1);
    }

    #[test]
    fn drop_releases_on_early_exit() {
        let sim = spooler();
        let early = |sim: &SimulatedSpooler| -> Option<()> {
            let _handle = PrinterHandle::open(sim, "Office")?;
            None::<()>?;
            Some(())
        };
        assert!(early(&sim).is_none());
        assert_eq!(sim.closed(), 1);
        assert_eq!(sim.open_handles(), 0);
    }

    #[test]
    fn drop_releases_on_panic() {
        let sim = spooler();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _handle = PrinterHandle::open(&sim, "Office").unwrap();
            panic!("simulated failure mid-operation");
        }));
        assert!(result.is_err());
        assert_eq!(sim.opened(), 1);
        assert_eq!(sim.closed(), 1);
    }

    #[test]
    fn info_uses_sized_call() {
        let sim = spooler();
        let handle = PrinterHandle::open(&sim, "Office").unwrap();
        let buffer = handle.info(InfoLevel::GlobalDevMode).unwrap();
        let sizes = sim.get_printer_buffer_sizes();
        assert_eq!(sizes, vec![0, buffer.len()]);
    }
}
