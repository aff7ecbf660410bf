// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the spooler bridge.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Sentinel returned by the host-facing media type query when no value is
/// available (unknown printer, no device mode).
pub const MEDIA_TYPE_UNAVAILABLE: i64 = -1;

/// Media type argument accepted by `setMediaType`: either a driver display
/// name that must be resolved first, or a raw `dmMediaType` code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaType {
    Name(String),
    Code(u32),
}

impl From<&str> for MediaType {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for MediaType {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<u32> for MediaType {
    fn from(code: u32) -> Self {
        Self::Code(code)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name:?}"),
            Self::Code(code) => write!(f, "{code}"),
        }
    }
}

/// Which device mode a value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceModeScope {
    /// The current user's override (may be absent).
    PerUser,
    /// The printer-wide default.
    Global,
}

/// One supported media type as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTypeEntry {
    pub name: String,
    pub code: u32,
}

/// Name→code mapping of one printer's media types, in driver order.
///
/// Names are not guaranteed unique, so the entries are kept as a list
/// rather than collapsed into a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaTypeCatalog {
    entries: Vec<MediaTypeEntry>,
}

impl MediaTypeCatalog {
    pub fn new(entries: Vec<MediaTypeEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MediaTypeEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaTypeEntry> {
        self.entries.iter()
    }

    /// Code for a display name. A repeated name resolves to its last entry.
    pub fn code_for(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.name == name)
            .map(|entry| entry.code)
    }
}

impl Serialize for MediaTypeCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.code)?;
        }
        map.end()
    }
}

/// Descriptive strings of one printer (`PRINTER_INFO_1`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PrinterSummary {
    pub name: String,
    pub description: String,
    pub comment: String,
    pub flags: u32,
}
