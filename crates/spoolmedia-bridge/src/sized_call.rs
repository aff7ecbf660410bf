// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Two-phase buffer sizing for variable-length spooler queries.
//
// Every enumerate / get-info / capability call goes through `sized_call`:
// probe with an empty buffer to learn the required size, allocate exactly
// that many bytes, then call again with the real buffer.

use tracing::debug;

use spoolmedia_core::error::{Result, SpoolError};

/// Owned, zero-initialised byte buffer handed to the spooler.
///
/// Backed by `u64` storage so records containing pointers can be read in
/// place with their natural alignment. The visible length is exactly the
/// size the spooler asked for.
pub struct NativeBuffer {
    storage: Vec<u64>,
    len: usize,
}

impl NativeBuffer {
    pub fn zeroed(len: usize) -> Self {
        Self {
            storage: vec![0; len.div_ceil(size_of::<u64>())],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.storage.as_ptr().cast()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.storage.as_mut_ptr().cast()
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `storage` holds at least `len` initialised bytes and u8 has
        // no alignment requirement.
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and the exclusive borrow of `self` guarantees no
        // other view of the storage exists.
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.len) }
    }

    /// Copy out the `index`-th record of type `T`, if it lies within the
    /// buffer.
    ///
    /// # Safety
    ///
    /// The bytes at that position must form a valid `T` (any bit pattern is
    /// fine for the plain-old-data records in `layout`).
    pub unsafe fn record<T: Copy>(&self, index: usize) -> Option<T> {
        let offset = index.checked_mul(size_of::<T>())?;
        if offset.checked_add(size_of::<T>())? > self.len {
            return None;
        }
        // SAFETY: bounds checked above; read_unaligned tolerates any offset.
        Some(unsafe { self.as_ptr().add(offset).cast::<T>().read_unaligned() })
    }

    /// Interpret the buffer as consecutive native-endian `u32` values.
    pub fn u32_values(&self) -> Vec<u32> {
        self.as_bytes()
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    /// Interpret the buffer as consecutive native-endian UTF-16 units.
    pub fn u16_values(&self) -> Vec<u16> {
        self.as_bytes()
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect()
    }
}

impl std::fmt::Debug for NativeBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBuffer").field("len", &self.len).finish()
    }
}

/// What one invocation of a sized native call reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizing {
    /// Whether the call itself reported success.
    pub ok: bool,
    /// Bytes the call needs (or wrote) for its output.
    pub required: usize,
}

impl Sizing {
    pub fn failed() -> Self {
        Self { ok: false, required: 0 }
    }
}

/// Run a native query whose output size is unknown until asked.
///
/// `invoke` receives an empty slice on the probe (the binding must pass a
/// null pointer and size 0) and a slice of exactly the probed size on the
/// second call. A probe that fails without naming a size is a
/// `SizeQuery` error; a probe that succeeds with size 0 yields an empty
/// buffer without a second call.
pub fn sized_call<F>(call: &'static str, mut invoke: F) -> Result<NativeBuffer>
where
    F: FnMut(&mut [u8]) -> Sizing,
{
    let probe = invoke(&mut []);
    if probe.required == 0 {
        if probe.ok {
            debug!(call, "sized call needs no buffer");
            return Ok(NativeBuffer::zeroed(0));
        }
        return Err(SpoolError::SizeQuery { call });
    }

    let mut buffer = NativeBuffer::zeroed(probe.required);
    debug!(call, required = probe.required, "sized call probed");

    let filled = invoke(buffer.as_bytes_mut());
    if !filled.ok || filled.required > buffer.len() {
        return Err(SpoolError::NativeCall { call });
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_empty_then_calls_with_exact_size() {
        let mut seen = Vec::new();
        let buffer = sized_call("Simulated", |out| {
            seen.push(out.len());
            if out.is_empty() {
                return Sizing { ok: false, required: 37 };
            }
            out.fill(0xAB);
            Sizing { ok: true, required: 37 }
        })
        .unwrap();

        assert_eq!(seen, vec![0, 37]);
        assert_eq!(buffer.len(), 37);
        assert!(buffer.as_bytes().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn failed_probe_without_size_is_a_size_query_error() {
        let mut calls = 0;
        let err = sized_call("GetPrinterW", |_| {
            calls += 1;
            Sizing::failed()
        })
        .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, SpoolError::SizeQuery { call: "GetPrinterW" }));
    }

    #[test]
    fn successful_empty_probe_skips_second_call() {
        let mut calls = 0;
        let buffer = sized_call("EnumPrintersW", |_| {
            calls += 1;
            Sizing { ok: true, required: 0 }
        })
        .unwrap();

        assert_eq!(calls, 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn failing_second_call_is_reported() {
        let err = sized_call("EnumPrintersW", |out| Sizing {
            ok: out.is_empty(),
            required: 16,
        })
        .unwrap_err();
        assert!(matches!(err, SpoolError::NativeCall { .. }));
    }

    #[test]
    fn growth_between_calls_is_a_failure() {
        let err = sized_call("GetPrinterW", |out| {
            if out.is_empty() {
                Sizing { ok: false, required: 8 }
            } else {
                Sizing { ok: true, required: 64 }
            }
        })
        .unwrap_err();
        assert!(matches!(err, SpoolError::NativeCall { .. }));
    }

    #[test]
    fn buffer_is_pointer_aligned_and_decodes_values() {
        let mut buffer = NativeBuffer::zeroed(10);
        assert_eq!(buffer.as_ptr() as usize % align_of::<usize>(), 0);
        buffer.as_bytes_mut()[..4].copy_from_slice(&258u32.to_ne_bytes());
        buffer.as_bytes_mut()[4..8].copy_from_slice(&7u32.to_ne_bytes());
        assert_eq!(buffer.u32_values(), vec![258, 7]);
        assert_eq!(buffer.u16_values().len(), 5);
        // SAFETY: u32 accepts any bit pattern.
        assert_eq!(unsafe { buffer.record::<u32>(1) }, Some(7));
        assert_eq!(unsafe { buffer.record::<u32>(2) }, None);
    }
}
