// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory spooler for tests, benchmarks, and dry runs off Windows.
//
// It answers the same byte-level protocol as winspool: size probes with
// empty buffers, `PRINTER_INFO_*` records whose pointers reference strings
// and device modes placed later in the caller's buffer, and `SetPrinter`
// reading the device mode back through the caller's pointer. Every call is
// counted so tests can check handle discipline and buffer sizing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use spoolmedia_core::DeviceModeScope;

use crate::layout::{
    DC_MEDIATYPENAMES, DC_MEDIATYPES, DEVMODE_SIZE, DM_MEDIA_TYPE_OFFSET, DevMode, InfoLevel,
    MEDIA_NAME_WIDTH, PrinterDefaults, PrinterInfo1, PrinterInfoDevMode, read_slot, to_wide,
};
use crate::native::{RawHandle, Spooler};

/// Driver-private bytes appended to every simulated device mode.
pub const SIM_DRIVER_EXTRA: usize = 24;

const PTR: usize = size_of::<usize>();

/// One printer known to the simulated spooler.
#[derive(Debug, Clone)]
pub struct SimPrinter {
    name: String,
    description: String,
    comment: String,
    flags: u32,
    global: Option<Vec<u8>>,
    per_user: Option<Vec<u8>>,
    media: Vec<(String, u32)>,
    media_count_override: Option<i32>,
    deny_access: bool,
    fail_commit: bool,
    failing_levels: Vec<u32>,
}

impl SimPrinter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            description: format!("{name},Simulated Driver,"),
            comment: String::new(),
            flags: 0x0080_0000,
            global: None,
            per_user: None,
            media: Vec::new(),
            media_count_override: None,
            deny_access: false,
            fail_commit: false,
            failing_levels: Vec::new(),
        }
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_owned();
        self
    }

    /// Give the printer a global device mode with `code` as its media type.
    pub fn global_media(mut self, code: u32) -> Self {
        self.global = Some(device_mode_image(code, 0x11));
        self
    }

    /// Give the current user a device mode override with `code`.
    pub fn per_user_media(mut self, code: u32) -> Self {
        self.per_user = Some(device_mode_image(code, 0x5A));
        self
    }

    /// Add a supported media type.
    pub fn media(mut self, name: &str, code: u32) -> Self {
        self.media.push((name.to_owned(), code));
        self
    }

    /// Report `count` from the media type count query instead of the real
    /// number (use -1 for a driver failure).
    pub fn media_count_override(mut self, count: i32) -> Self {
        self.media_count_override = Some(count);
        self
    }

    pub fn deny_access(mut self) -> Self {
        self.deny_access = true;
        self
    }

    /// Make `SetPrinter` report failure.
    pub fn fail_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Make `GetPrinter` fail for `level`.
    pub fn fail_info_level(mut self, level: InfoLevel) -> Self {
        self.failing_levels.push(level.as_u32());
        self
    }

    fn device_mode(&self, scope: DeviceModeScope) -> Option<&Vec<u8>> {
        match scope {
            DeviceModeScope::PerUser => self.per_user.as_ref(),
            DeviceModeScope::Global => self.global.as_ref(),
        }
    }
}

/// A device mode with a recognisable byte pattern around `dmMediaType`, so
/// tests can tell whether unrelated bytes survived a round trip.
fn device_mode_image(code: u32, seed: u8) -> Vec<u8> {
    let mut image: Vec<u8> = (0..DEVMODE_SIZE + SIM_DRIVER_EXTRA)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect();
    image[DM_MEDIA_TYPE_OFFSET..DM_MEDIA_TYPE_OFFSET + 4].copy_from_slice(&code.to_ne_bytes());
    image
}

#[derive(Debug, Default)]
struct SimState {
    printers: Vec<SimPrinter>,
    handles: HashMap<usize, usize>,
    next_handle: usize,
    opened: usize,
    closed: usize,
    commits: usize,
    enum_sizes: Vec<usize>,
    get_printer_sizes: Vec<usize>,
    capability_sizes: Vec<(u16, usize)>,
}

impl SimState {
    fn printer_for(&self, handle: RawHandle) -> Option<usize> {
        self.handles.get(&handle.as_raw()).copied()
    }

    fn printer_named(&self, name: &str) -> Option<usize> {
        self.printers.iter().position(|p| p.name == name)
    }
}

/// Thread-safe in-memory implementation of [`Spooler`].
#[derive(Debug, Default)]
pub struct SimulatedSpooler {
    state: Mutex<SimState>,
}

impl SimulatedSpooler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_printer(self, printer: SimPrinter) -> Self {
        self.state().printers.push(printer);
        self
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().expect("simulated spooler lock poisoned")
    }

    /// Successful `OpenPrinter` calls so far.
    pub fn opened(&self) -> usize {
        self.state().opened
    }

    /// Successful `ClosePrinter` calls so far.
    pub fn closed(&self) -> usize {
        self.state().closed
    }

    /// Handles currently open.
    pub fn open_handles(&self) -> usize {
        self.state().handles.len()
    }

    /// Successful `SetPrinter` calls so far.
    pub fn commits(&self) -> usize {
        self.state().commits
    }

    /// Buffer length passed to each `EnumPrinters` call, in order.
    pub fn enum_buffer_sizes(&self) -> Vec<usize> {
        self.state().enum_sizes.clone()
    }

    /// Buffer length passed to each `GetPrinter` call, in order.
    pub fn get_printer_buffer_sizes(&self) -> Vec<usize> {
        self.state().get_printer_sizes.clone()
    }

    /// Capability and output length of each `DeviceCapabilities` call.
    pub fn capability_buffer_sizes(&self) -> Vec<(u16, usize)> {
        self.state().capability_sizes.clone()
    }

    /// Stored device mode bytes, driver-private tail included.
    pub fn device_mode_bytes(&self, printer: &str, scope: DeviceModeScope) -> Option<Vec<u8>> {
        let state = self.state();
        let index = state.printer_named(printer)?;
        state.printers[index].device_mode(scope).cloned()
    }

    /// Stored `dmMediaType` of one device mode.
    pub fn media_type(&self, printer: &str, scope: DeviceModeScope) -> Option<u32> {
        self.device_mode_bytes(printer, scope).map(|image| {
            let field = &image[DM_MEDIA_TYPE_OFFSET..DM_MEDIA_TYPE_OFFSET + 4];
            u32::from_ne_bytes([field[0], field[1], field[2], field[3]])
        })
    }
}

fn put_units(buffer: &mut [u8], offset: usize, units: &[u16]) {
    for (i, unit) in units.iter().enumerate() {
        let at = offset + 2 * i;
        buffer[at..at + 2].copy_from_slice(&unit.to_ne_bytes());
    }
}

impl Spooler for SimulatedSpooler {
    fn enum_printers(
        &self,
        _flags: u32,
        level: u32,
        buffer: &mut [u8],
        needed: &mut u32,
        returned: &mut u32,
    ) -> bool {
        let mut state = self.state();
        state.enum_sizes.push(buffer.len());
        *returned = 0;
        if level != InfoLevel::General.as_u32() {
            *needed = 0;
            return false;
        }

        let strings: Vec<[Vec<u16>; 3]> = state
            .printers
            .iter()
            .map(|p| [to_wide(&p.description), to_wide(&p.name), to_wide(&p.comment)])
            .collect();
        let records = strings.len() * size_of::<PrinterInfo1>();
        let required = records + strings.iter().flatten().map(|s| 2 * s.len()).sum::<usize>();
        *needed = required as u32;
        if required == 0 {
            return true;
        }
        if buffer.len() < required {
            return false;
        }

        // Address values only; all writes go through `buffer`.
        let base = buffer.as_mut_ptr();
        let mut offset = records;
        for (i, (printer, fields)) in state.printers.iter().zip(&strings).enumerate() {
            let mut pointers = [std::ptr::null_mut::<u16>(); 3];
            for (pointer, units) in pointers.iter_mut().zip(fields) {
                put_units(buffer, offset, units);
                *pointer = base.wrapping_add(offset).cast::<u16>();
                offset += 2 * units.len();
            }
            let [description, name, comment] = pointers;
            let record = PrinterInfo1 {
                flags: printer.flags,
                description,
                name,
                comment,
            };
            // SAFETY: `required` covers every record slot, checked above.
            unsafe {
                buffer
                    .as_mut_ptr()
                    .add(i * size_of::<PrinterInfo1>())
                    .cast::<PrinterInfo1>()
                    .write_unaligned(record);
            }
        }
        *returned = strings.len() as u32;
        true
    }

    fn open_printer(
        &self,
        name: &[u16],
        _defaults: Option<&mut PrinterDefaults>,
    ) -> Option<RawHandle> {
        let mut state = self.state();
        let index = state.printer_named(&read_slot(name))?;
        if state.printers[index].deny_access {
            return None;
        }
        state.next_handle += 4;
        let raw = 0x1000 + state.next_handle;
        state.handles.insert(raw, index);
        state.opened += 1;
        Some(RawHandle::from_raw(raw))
    }

    fn close_printer(&self, handle: RawHandle) -> bool {
        let mut state = self.state();
        if state.handles.remove(&handle.as_raw()).is_some() {
            state.closed += 1;
            true
        } else {
            false
        }
    }

    fn get_printer(
        &self,
        handle: RawHandle,
        level: u32,
        buffer: &mut [u8],
        needed: &mut u32,
    ) -> bool {
        let mut state = self.state();
        state.get_printer_sizes.push(buffer.len());
        *needed = 0;
        let Some(index) = state.printer_for(handle) else {
            return false;
        };
        let printer = &state.printers[index];
        if printer.failing_levels.contains(&level) {
            return false;
        }
        let scope = if level == InfoLevel::UserDevMode.as_u32() {
            DeviceModeScope::PerUser
        } else if level == InfoLevel::GlobalDevMode.as_u32() {
            DeviceModeScope::Global
        } else {
            return false;
        };

        let image = printer.device_mode(scope);
        let required = PTR + image.map_or(0, Vec::len);
        *needed = required as u32;
        if buffer.len() < required {
            return false;
        }

        let dev_mode = match image {
            Some(image) => {
                buffer[PTR..required].copy_from_slice(image);
                buffer.as_mut_ptr().wrapping_add(PTR).cast::<DevMode>()
            }
            None => std::ptr::null_mut(),
        };
        // SAFETY: the buffer holds at least one pointer-sized record.
        unsafe {
            buffer
                .as_mut_ptr()
                .cast::<PrinterInfoDevMode>()
                .write_unaligned(PrinterInfoDevMode { dev_mode });
        }
        true
    }

    fn device_capabilities(
        &self,
        device: &[u16],
        _port: &[u16],
        capability: u16,
        output: &mut [u8],
    ) -> i32 {
        let mut state = self.state();
        state.capability_sizes.push((capability, output.len()));
        let Some(index) = state.printer_named(&read_slot(device)) else {
            return -1;
        };
        let printer = &state.printers[index];
        let count = printer
            .media_count_override
            .unwrap_or(printer.media.len() as i32);
        if count <= 0 || output.is_empty() {
            return count;
        }

        match capability {
            DC_MEDIATYPES => {
                if output.len() < printer.media.len() * 4 {
                    return -1;
                }
                for (i, (_, code)) in printer.media.iter().enumerate() {
                    output[i * 4..i * 4 + 4].copy_from_slice(&code.to_ne_bytes());
                }
            }
            DC_MEDIATYPENAMES => {
                let slot_bytes = MEDIA_NAME_WIDTH * 2;
                if output.len() < printer.media.len() * slot_bytes {
                    return -1;
                }
                for (i, (name, _)) in printer.media.iter().enumerate() {
                    let mut slot = [0u16; MEDIA_NAME_WIDTH];
                    for (dst, src) in slot.iter_mut().zip(name.encode_utf16()) {
                        *dst = src;
                    }
                    put_units(output, i * slot_bytes, &slot);
                }
            }
            _ => return -1,
        }
        count
    }

    fn set_printer(&self, handle: RawHandle, level: u32, info: &mut [u8], _command: u32) -> bool {
        let mut state = self.state();
        let Some(index) = state.printer_for(handle) else {
            return false;
        };
        if level != InfoLevel::UserDevMode.as_u32()
            || state.printers[index].fail_commit
            || info.len() < PTR
        {
            return false;
        }

        // SAFETY: length checked above; any pointer bit pattern is valid.
        let record = unsafe { info.as_ptr().cast::<PrinterInfoDevMode>().read_unaligned() };
        let printer = &mut state.printers[index];
        if record.dev_mode.is_null() {
            printer.per_user = None;
        } else {
            let len = printer
                .per_user
                .as_ref()
                .or(printer.global.as_ref())
                .map_or(DEVMODE_SIZE, Vec::len);
            // SAFETY: like the real spooler, trust the caller's record to
            // reference a complete device mode for this printer.
            let bytes = unsafe { std::slice::from_raw_parts(record.dev_mode.cast::<u8>(), len) };
            printer.per_user = Some(bytes.to_vec());
        }
        state.commits += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_handles_are_rejected() {
        let sim = SimulatedSpooler::new().with_printer(SimPrinter::new("Office"));
        assert!(!sim.close_printer(RawHandle::from_raw(42)));
        let mut needed = 0;
        assert!(!sim.get_printer(RawHandle::from_raw(42), 9, &mut [], &mut needed));
        assert_eq!(needed, 0);
    }

    #[test]
    fn images_place_media_type_at_devmode_offset() {
        let sim = SimulatedSpooler::new()
            .with_printer(SimPrinter::new("Office").global_media(0x0102_0304));
        let image = sim.device_mode_bytes("Office", DeviceModeScope::Global).unwrap();
        assert_eq!(image.len(), DEVMODE_SIZE + SIM_DRIVER_EXTRA);
        assert_eq!(sim.media_type("Office", DeviceModeScope::Global), Some(0x0102_0304));
        assert_eq!(sim.media_type("Office", DeviceModeScope::PerUser), None);
    }
}
