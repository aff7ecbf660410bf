// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for spoolmedia.

use thiserror::Error;

/// Top-level error type for all spooler bridge operations.
///
/// Only `Load` and `MissingExport` are fatal. Everything else is an
/// expected outcome that the public operations turn into a sentinel
/// (`None`, `-1`, `false`) before it reaches the host.
#[derive(Debug, Error)]
pub enum SpoolError {
    // -- Native module --
    #[error("failed to load spooler module {library}: {reason}")]
    Load { library: String, reason: String },

    #[error("export '{symbol}' missing from spooler module {library}")]
    MissingExport { library: String, symbol: String },

    // -- Printer access --
    #[error("printer not found or access denied: {0}")]
    PrinterNotFound(String),

    #[error("{call}: buffer size query failed")]
    SizeQuery { call: &'static str },

    #[error("{call} reported failure")]
    NativeCall { call: &'static str },

    // -- Device mode / media types --
    #[error("no per-user or global device mode for printer {0}")]
    NoDeviceMode(String),

    #[error("printer {0} reports no media types")]
    NoMediaTypes(String),

    #[error("unknown media type {name:?} for printer {printer}")]
    UnknownMediaType { printer: String, name: String },

    #[error("spooler rejected the device mode update for printer {0}")]
    CommitFailed(String),

    // -- Host adapter / configuration --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SpoolError {
    /// Whether no further spooler operation can succeed after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Load { .. } | Self::MissingExport { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoolError>;
