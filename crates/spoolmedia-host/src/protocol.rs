// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native-messaging protocol: each message is a 4-byte native-endian length
// followed by that many bytes of UTF-8 JSON.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use spoolmedia_bridge::PrintBridge;
use spoolmedia_core::{MediaType, MediaTypeCatalog};
use spoolmedia_core::error::{Result, SpoolError};

/// One request from the host application.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    GetPrinters,
    GetMediaTypeNames {
        printer: String,
    },
    GetMediaType {
        printer: String,
    },
    SetMediaType {
        printer: String,
        #[serde(rename = "mediaType")]
        media_type: Value,
    },
}

/// Payload of a successful response, one shape per request kind.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Printers(String),
    MediaTypeNames(Option<MediaTypeCatalog>),
    MediaType(i64),
    Applied(bool),
}

/// `{"result": ...}` or `{"error": "..."}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Result(Reply),
    Error(String),
}

/// String → name, 32-bit non-negative integer → code, anything else → none.
fn media_type_from_json(value: &Value) -> Option<MediaType> {
    match value {
        Value::String(name) => Some(MediaType::Name(name.clone())),
        Value::Number(n) => n
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
            .map(MediaType::Code),
        _ => None,
    }
}

/// Run one request against the bridge and build its response.
pub fn dispatch(bridge: &PrintBridge<'_>, request: Request) -> Response {
    let reply = match request {
        Request::GetPrinters => Reply::Printers(bridge.get_printers()),
        Request::GetMediaTypeNames { printer } => {
            Reply::MediaTypeNames(bridge.get_media_type_names(&printer))
        }
        Request::GetMediaType { printer } => Reply::MediaType(bridge.get_media_type(&printer)),
        Request::SetMediaType {
            printer,
            media_type,
        } => match media_type_from_json(&media_type) {
            Some(media_type) => Reply::Applied(bridge.set_media_type(&printer, media_type)),
            None => {
                debug!(printer = %printer, %media_type, "not a media type name or code");
                Reply::Applied(false)
            }
        },
    };
    Response::Result(reply)
}

/// Decode a raw message body and dispatch it; malformed bodies produce an
/// `error` response instead of ending the session.
pub fn handle_message(bridge: &PrintBridge<'_>, body: &[u8]) -> Response {
    match serde_json::from_slice::<Request>(body) {
        Ok(request) => {
            debug!(?request, "request");
            dispatch(bridge, request)
        }
        Err(e) => {
            warn!(error = %e, "malformed request");
            Response::Error(e.to_string())
        }
    }
}

/// Read one framed message. `Ok(None)` on a clean end of input.
pub fn read_message<R: Read>(reader: &mut R, max_bytes: u32) -> Result<Option<Vec<u8>>> {
    let mut prefix = [0u8; 4];
    match reader.read_exact(&mut prefix) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_ne_bytes(prefix);
    if len > max_bytes {
        return Err(SpoolError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message of {len} bytes exceeds limit of {max_bytes}"),
        )));
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}

/// Write one framed message and flush it.
pub fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<()> {
    let body = serde_json::to_vec(message)?;
    let len = u32::try_from(body.len()).map_err(|_| {
        SpoolError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "response too large to frame",
        ))
    })?;
    writer.write_all(&len.to_ne_bytes())?;
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}

/// Answer requests until the input ends.
pub fn serve<R: Read, W: Write>(
    bridge: &PrintBridge<'_>,
    reader: &mut R,
    writer: &mut W,
) -> Result<usize> {
    let max_bytes = bridge.config().max_message_bytes;
    let mut handled = 0;
    while let Some(body) = read_message(reader, max_bytes)? {
        let response = handle_message(bridge, &body);
        write_message(writer, &response)?;
        handled += 1;
    }
    Ok(handled)
}
