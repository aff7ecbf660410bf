// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binary record layouts shared with the spooler.
//
// These mirror the Win32 ABI for the unicode entry points. Only the fields
// this crate interprets are named; everything else is opaque padding that
// must survive a read-modify-write untouched. Sizes and offsets are pinned
// by the compile-time assertions at the bottom of the file.

use std::mem::{offset_of, size_of};

/// `DEVMODEW` size without driver-private bytes.
pub const DEVMODE_SIZE: usize = 220;

/// Offset of `dmMediaType` inside `DEVMODEW`.
pub const DM_MEDIA_TYPE_OFFSET: usize = 196;

const DM_TAIL: usize = DEVMODE_SIZE - DM_MEDIA_TYPE_OFFSET - size_of::<u32>();

/// `DeviceCapabilities` query for media type display names.
pub const DC_MEDIATYPENAMES: u16 = 34;

/// `DeviceCapabilities` query for media type codes.
pub const DC_MEDIATYPES: u16 = 35;

/// Width of one `DC_MEDIATYPENAMES` slot, in UTF-16 units.
pub const MEDIA_NAME_WIDTH: usize = 64;

/// Printer information level understood by `GetPrinter` / `SetPrinter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum InfoLevel {
    /// `PRINTER_INFO_1`: flags plus descriptive strings.
    General = 1,
    /// `PRINTER_INFO_8`: the global device mode.
    GlobalDevMode = 8,
    /// `PRINTER_INFO_9`: the per-user device mode.
    UserDevMode = 9,
}

impl InfoLevel {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// `DEVMODEW` with only `dmMediaType` exposed.
///
/// Driver-private bytes (`dmDriverExtra`) follow the record in memory, so
/// values of this type are never copied out of spooler buffers; they are
/// always accessed in place through a pointer.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DevMode {
    _head: [u8; DM_MEDIA_TYPE_OFFSET],
    pub media_type: u32,
    _tail: [u8; DM_TAIL],
}

/// `PRINTER_INFO_1W`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PrinterInfo1 {
    pub flags: u32,
    pub description: *mut u16,
    pub name: *mut u16,
    pub comment: *mut u16,
}

/// `PRINTER_INFO_8W` and `PRINTER_INFO_9W` share this shape: a single
/// pointer to the global or per-user device mode respectively.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PrinterInfoDevMode {
    pub dev_mode: *mut DevMode,
}

impl PrinterInfoDevMode {
    /// The record as the byte buffer `SetPrinter` takes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: one pointer field and no padding, so every byte is
        // initialised; the borrow of `self` bounds the slice's lifetime.
        unsafe {
            std::slice::from_raw_parts_mut((self as *mut Self).cast::<u8>(), size_of::<Self>())
        }
    }
}

pub type PrinterInfo9 = PrinterInfoDevMode;

/// `PRINTER_DEFAULTSW`. Always passed as null by this crate, which asks for
/// the spooler's default access rights.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PrinterDefaults {
    pub data_type: *mut u16,
    pub dev_mode: *mut DevMode,
    pub desired_access: u32,
}

const PTR: usize = size_of::<usize>();

const _: () = {
    assert!(size_of::<DevMode>() == DEVMODE_SIZE);
    assert!(offset_of!(DevMode, media_type) == DM_MEDIA_TYPE_OFFSET);
    assert!(offset_of!(PrinterInfo1, description) == PTR);
    assert!(offset_of!(PrinterInfo1, comment) == 3 * PTR);
    assert!(size_of::<PrinterInfo1>() == 4 * PTR);
    assert!(size_of::<PrinterInfoDevMode>() == PTR);
    assert!(offset_of!(PrinterDefaults, desired_access) == 2 * PTR);
    assert!(size_of::<PrinterDefaults>() == 3 * PTR);
};

/// NUL-terminated UTF-16 copy of `s` for the wide entry points.
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Decode a fixed-width name slot. Slots are filled to the brim without a
/// terminator when the name is exactly `MEDIA_NAME_WIDTH` units long.
pub fn read_slot(slot: &[u16]) -> String {
    let end = slot.iter().position(|&unit| unit == 0).unwrap_or(slot.len());
    String::from_utf16_lossy(&slot[..end])
}

/// Decode a NUL-terminated UTF-16 string owned by the spooler.
///
/// # Safety
///
/// `ptr` must be null or point to a readable, NUL-terminated UTF-16 string
/// that stays alive for the duration of the call.
pub unsafe fn read_wide_cstr(ptr: *const u16) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: the caller guarantees the string is terminated, so every read
    // up to and including the terminator is in bounds.
    unsafe {
        let mut len = 0;
        while ptr.add(len).read_unaligned() != 0 {
            len += 1;
        }
        let units: Vec<u16> = (0..len).map(|i| ptr.add(i).read_unaligned()).collect();
        String::from_utf16_lossy(&units)
    }
}
