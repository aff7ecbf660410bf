// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The native boundary: one trait method per spooler entry point, and the
// `WinSpool` binding that loads the real module.
//
// Buffers cross the boundary as byte slices. An empty slice stands for the
// null-pointer / zero-size form the spooler uses for size probes.

use std::ffi::c_void;
use std::ptr;
use std::sync::OnceLock;

use libloading::Library;
use tracing::{debug, info};

use spoolmedia_core::BridgeConfig;
use spoolmedia_core::error::{Result, SpoolError};

use crate::layout::{DevMode, PrinterDefaults};

/// Opaque printer handle token as returned by `OpenPrinter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(usize);

impl RawHandle {
    pub fn from_raw(value: usize) -> Self {
        Self(value)
    }

    pub fn as_raw(self) -> usize {
        self.0
    }

    fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

/// Unicode print spooler entry points.
///
/// Return values follow the Win32 conventions: `bool` for BOOL results and
/// the raw `i32` count (or `-1`) for `DeviceCapabilities`.
pub trait Spooler: Send + Sync {
    /// `EnumPrintersW` with a null server name.
    fn enum_printers(
        &self,
        flags: u32,
        level: u32,
        buffer: &mut [u8],
        needed: &mut u32,
        returned: &mut u32,
    ) -> bool;

    /// `OpenPrinterW`. `name` must be NUL-terminated.
    fn open_printer(
        &self,
        name: &[u16],
        defaults: Option<&mut PrinterDefaults>,
    ) -> Option<RawHandle>;

    /// `ClosePrinter`.
    fn close_printer(&self, handle: RawHandle) -> bool;

    /// `GetPrinterW`.
    fn get_printer(&self, handle: RawHandle, level: u32, buffer: &mut [u8], needed: &mut u32)
    -> bool;

    /// `DeviceCapabilitiesW` with a null device mode. `device` and `port`
    /// must be NUL-terminated.
    fn device_capabilities(
        &self,
        device: &[u16],
        port: &[u16],
        capability: u16,
        output: &mut [u8],
    ) -> i32;

    /// `SetPrinterW`. `info` holds the record for `level`.
    fn set_printer(&self, handle: RawHandle, level: u32, info: &mut [u8], command: u32) -> bool;
}

type EnumPrintersW =
    unsafe extern "system" fn(u32, *const u16, u32, *mut u8, u32, *mut u32, *mut u32) -> i32;
type OpenPrinterW =
    unsafe extern "system" fn(*const u16, *mut *mut c_void, *mut PrinterDefaults) -> i32;
type ClosePrinter = unsafe extern "system" fn(*mut c_void) -> i32;
type GetPrinterW = unsafe extern "system" fn(*mut c_void, u32, *mut u8, u32, *mut u32) -> i32;
type DeviceCapabilitiesW =
    unsafe extern "system" fn(*const u16, *const u16, u16, *mut u16, *const DevMode) -> i32;
type SetPrinterW = unsafe extern "system" fn(*mut c_void, u32, *mut u8, u32) -> i32;

/// Typed bindings into the loaded spooler module.
pub struct WinSpool {
    enum_printers: EnumPrintersW,
    open_printer: OpenPrinterW,
    close_printer: ClosePrinter,
    get_printer: GetPrinterW,
    device_capabilities: DeviceCapabilitiesW,
    set_printer: SetPrinterW,
    library_name: String,
    // Keeps the function pointers above valid.
    _library: Library,
}

static SHARED: OnceLock<Result<WinSpool>> = OnceLock::new();

impl WinSpool {
    /// Load the module named in `config` and bind every entry point.
    pub fn load(config: &BridgeConfig) -> Result<Self> {
        let name = config.spooler_library.as_str();
        // SAFETY: loading the spooler module runs its initialisers, which is
        // the documented way to use it.
        let library = unsafe { Library::new(name) }.map_err(|e| SpoolError::Load {
            library: name.to_owned(),
            reason: e.to_string(),
        })?;

        // SAFETY: each type alias matches the Win32 prototype of the export.
        let spool = unsafe {
            Self {
                enum_printers: bind(&library, name, b"EnumPrintersW\0")?,
                open_printer: bind(&library, name, b"OpenPrinterW\0")?,
                close_printer: bind(&library, name, b"ClosePrinter\0")?,
                get_printer: bind(&library, name, b"GetPrinterW\0")?,
                device_capabilities: bind(&library, name, b"DeviceCapabilitiesW\0")?,
                set_printer: bind(&library, name, b"SetPrinterW\0")?,
                library_name: name.to_owned(),
                _library: library,
            }
        };
        info!(library = name, "spooler module loaded");
        Ok(spool)
    }

    /// Process-wide instance, loaded on first use. Later calls return the
    /// same instance (or the same load failure) regardless of `config`.
    pub fn shared(config: &BridgeConfig) -> Result<&'static WinSpool> {
        SHARED
            .get_or_init(|| Self::load(config))
            .as_ref()
            .map_err(replay_failure)
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }
}

/// Fresh copy of a cached load failure, same variant and fields.
fn replay_failure(error: &SpoolError) -> SpoolError {
    match error {
        SpoolError::Load { library, reason } => SpoolError::Load {
            library: library.clone(),
            reason: reason.clone(),
        },
        SpoolError::MissingExport { library, symbol } => SpoolError::MissingExport {
            library: library.clone(),
            symbol: symbol.clone(),
        },
        // `load` only fails with the two variants above.
        other => SpoolError::Load {
            library: String::new(),
            reason: other.to_string(),
        },
    }
}

/// Resolve one export as a plain function pointer.
///
/// # Safety
///
/// `T` must be the exact function pointer type of the export.
unsafe fn bind<T: Copy>(library: &Library, library_name: &str, symbol: &[u8]) -> Result<T> {
    // SAFETY: forwarded to the caller.
    unsafe { library.get::<T>(symbol) }
        .map(|sym| *sym)
        .map_err(|_| SpoolError::MissingExport {
            library: library_name.to_owned(),
            symbol: String::from_utf8_lossy(symbol.strip_suffix(b"\0").unwrap_or(symbol))
                .into_owned(),
        })
}

fn out_ptr(buffer: &mut [u8]) -> *mut u8 {
    if buffer.is_empty() {
        ptr::null_mut()
    } else {
        buffer.as_mut_ptr()
    }
}

fn byte_len(buffer: &[u8]) -> u32 {
    u32::try_from(buffer.len()).unwrap_or(u32::MAX)
}

impl Spooler for WinSpool {
    fn enum_printers(
        &self,
        flags: u32,
        level: u32,
        buffer: &mut [u8],
        needed: &mut u32,
        returned: &mut u32,
    ) -> bool {
        let size = byte_len(buffer);
        // SAFETY: the buffer pointer is null or valid for `size` bytes and
        // both out-params point at live u32s.
        unsafe {
            (self.enum_printers)(flags, ptr::null(), level, out_ptr(buffer), size, needed, returned)
                != 0
        }
    }

    fn open_printer(
        &self,
        name: &[u16],
        defaults: Option<&mut PrinterDefaults>,
    ) -> Option<RawHandle> {
        debug_assert_eq!(name.last(), Some(&0));
        let mut handle: *mut c_void = ptr::null_mut();
        let defaults = defaults.map_or(ptr::null_mut(), |d| d as *mut PrinterDefaults);
        // SAFETY: `name` is NUL-terminated and `handle` is a live out-param.
        let ok = unsafe { (self.open_printer)(name.as_ptr(), &mut handle, defaults) } != 0;
        if ok && !handle.is_null() {
            Some(RawHandle(handle as usize))
        } else {
            debug!("OpenPrinterW failed");
            None
        }
    }

    fn close_printer(&self, handle: RawHandle) -> bool {
        // SAFETY: the handle came from OpenPrinterW and is closed once.
        unsafe { (self.close_printer)(handle.as_ptr()) != 0 }
    }

    fn get_printer(
        &self,
        handle: RawHandle,
        level: u32,
        buffer: &mut [u8],
        needed: &mut u32,
    ) -> bool {
        let size = byte_len(buffer);
        // SAFETY: as for enum_printers.
        unsafe { (self.get_printer)(handle.as_ptr(), level, out_ptr(buffer), size, needed) != 0 }
    }

    fn device_capabilities(
        &self,
        device: &[u16],
        port: &[u16],
        capability: u16,
        output: &mut [u8],
    ) -> i32 {
        debug_assert_eq!(device.last(), Some(&0));
        debug_assert_eq!(port.last(), Some(&0));
        // SAFETY: strings are terminated; the output buffer was sized from a
        // previous probe of the same capability and is pointer-aligned.
        unsafe {
            (self.device_capabilities)(
                device.as_ptr(),
                port.as_ptr(),
                capability,
                out_ptr(output).cast(),
                ptr::null(),
            )
        }
    }

    fn set_printer(&self, handle: RawHandle, level: u32, info: &mut [u8], command: u32) -> bool {
        // SAFETY: `info` holds a complete record for `level`.
        unsafe { (self.set_printer)(handle.as_ptr(), level, out_ptr(info), command) != 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_module_is_a_load_error() {
        let config = BridgeConfig {
            spooler_library: "spoolmedia-no-such-module.drv".into(),
            ..BridgeConfig::default()
        };
        let err = WinSpool::load(&config).err().unwrap();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            SpoolError::Load { ref library, .. } if library == &config.spooler_library
        ));
    }

    #[cfg(target_os = "linux")]
    const EXPORTLESS_MODULE: &str = "libc.so.6";
    #[cfg(target_os = "macos")]
    const EXPORTLESS_MODULE: &str = "libSystem.B.dylib";
    #[cfg(windows)]
    const EXPORTLESS_MODULE: &str = "kernel32.dll";

    #[cfg(any(target_os = "linux", target_os = "macos", windows))]
    #[test]
    fn missing_export_is_fatal() {
        let config = BridgeConfig {
            spooler_library: EXPORTLESS_MODULE.into(),
            ..BridgeConfig::default()
        };
        let err = WinSpool::load(&config).err().unwrap();
        assert!(err.is_fatal());
        match err {
            SpoolError::MissingExport { library, symbol } => {
                assert_eq!(library, EXPORTLESS_MODULE);
                assert_eq!(symbol, "EnumPrintersW");
            }
            other => panic!("expected MissingExport, got {other:?}"),
        }
    }

    #[test]
    fn replayed_failures_keep_variant_and_message() {
        let missing = SpoolError::MissingExport {
            library: "stub.drv".into(),
            symbol: "SetPrinterW".into(),
        };
        let replayed = replay_failure(&missing);
        assert!(matches!(replayed, SpoolError::MissingExport { .. }));
        assert_eq!(replayed.to_string(), missing.to_string());

        let load = SpoolError::Load {
            library: "winspool.drv".into(),
            reason: "not found".into(),
        };
        assert_eq!(
            replay_failure(&load).to_string(),
            "failed to load spooler module winspool.drv: not found"
        );
    }

    // The only test touching the process-wide instance, so it holds whatever
    // the first call here produced.
    #[test]
    fn shared_loads_once_and_ignores_later_config() {
        let first = WinSpool::shared(&BridgeConfig::default());
        let other = BridgeConfig {
            spooler_library: "spoolmedia-other-module.drv".into(),
            ..BridgeConfig::default()
        };
        let second = WinSpool::shared(&other);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                assert!(ptr::eq(a, b));
                assert_eq!(b.library_name(), "winspool.drv");
            }
            (Err(a), Err(b)) => {
                assert_eq!(a.to_string(), b.to_string());
                assert!(b.is_fatal());
                let text = b.to_string();
                assert!(text.contains("winspool.drv"));
                assert!(!text.contains("spoolmedia-other-module.drv"));
                assert_eq!(text.matches("failed to load").count(), 1);
            }
            _ => panic!("shared returned different outcomes"),
        }
    }

    #[test]
    fn raw_handles_keep_their_value() {
        let handle = RawHandle::from_raw(0xBEEF);
        assert_eq!(handle.as_raw(), 0xBEEF);
        assert_eq!(handle.as_ptr() as usize, 0xBEEF);
    }
}
