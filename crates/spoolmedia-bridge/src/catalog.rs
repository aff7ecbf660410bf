// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Media type catalog: pairs the driver's `DC_MEDIATYPES` codes with its
// `DC_MEDIATYPENAMES` display names.
//
// The catalog is rebuilt on every query. A count of 0 and the -1 failure
// sentinel are both reported as "no media types".

use tracing::{debug, warn};

use spoolmedia_core::error::{Result, SpoolError};
use spoolmedia_core::{MediaTypeCatalog, MediaTypeEntry};

use crate::layout::{DC_MEDIATYPENAMES, DC_MEDIATYPES, MEDIA_NAME_WIDTH, read_slot, to_wide};
use crate::native::Spooler;
use crate::sized_call::{NativeBuffer, Sizing, sized_call};

/// Bytes per `DC_MEDIATYPES` element (a DWORD).
const CODE_BYTES: usize = size_of::<u32>();

/// Bytes per `DC_MEDIATYPENAMES` element (one fixed-width UTF-16 slot).
const NAME_BYTES: usize = MEDIA_NAME_WIDTH * size_of::<u16>();

/// Run one `DeviceCapabilities` array query through the sized-call protocol.
fn capability_array(
    spooler: &dyn Spooler,
    device: &[u16],
    port: &[u16],
    capability: u16,
    element_bytes: usize,
) -> Result<NativeBuffer> {
    sized_call("DeviceCapabilitiesW", |out| {
        let count = spooler.device_capabilities(device, port, capability, out);
        match usize::try_from(count) {
            Ok(count) => Sizing {
                ok: true,
                required: count * element_bytes,
            },
            Err(_) => Sizing::failed(),
        }
    })
}

/// Build the catalog for `printer`, or explain why there is none.
pub fn load_catalog(
    spooler: &dyn Spooler,
    printer: &str,
    port: &str,
) -> Result<MediaTypeCatalog> {
    if printer.contains('\0') {
        return Err(SpoolError::PrinterNotFound(printer.to_owned()));
    }
    let device = to_wide(printer);
    let port = to_wide(port);

    let codes = capability_array(spooler, &device, &port, DC_MEDIATYPES, CODE_BYTES)?.u32_values();
    if codes.is_empty() {
        return Err(SpoolError::NoMediaTypes(printer.to_owned()));
    }

    let units =
        capability_array(spooler, &device, &port, DC_MEDIATYPENAMES, NAME_BYTES)?.u16_values();
    let names: Vec<String> = units.chunks_exact(MEDIA_NAME_WIDTH).map(read_slot).collect();
    if names.len() != codes.len() {
        warn!(
            printer,
            codes = codes.len(),
            names = names.len(),
            "driver reported mismatched media type arrays"
        );
        return Err(SpoolError::NativeCall {
            call: "DeviceCapabilitiesW",
        });
    }

    let entries = names
        .into_iter()
        .zip(codes)
        .map(|(name, code)| MediaTypeEntry { name, code })
        .collect::<Vec<_>>();
    debug!(printer, count = entries.len(), "media type catalog loaded");
    Ok(MediaTypeCatalog::new(entries))
}

/// `getMediaTypeNames`: the catalog, or `None` when the printer has no
/// media types or the driver query failed.
pub fn media_type_names(
    spooler: &dyn Spooler,
    printer: &str,
    port: &str,
) -> Option<MediaTypeCatalog> {
    load_catalog(spooler, printer, port)
        .inspect_err(|e| debug!(printer, error = %e, "no media type catalog"))
        .ok()
}
