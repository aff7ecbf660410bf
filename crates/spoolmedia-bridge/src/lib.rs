// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Spoolmedia — bridge to the Windows print spooler.
//!
//! Lets a host read and change a printer's active media type without
//! knowing the spooler's binary records or calling conventions.
//!
//! Layering, leaves first:
//! - [`layout`]: `#[repr(C)]` records matching the Win32 ABI.
//! - [`sized_call`]: the probe-then-fill protocol for variable-size queries.
//! - [`native`]: the [`Spooler`] trait and the `libloading`-backed [`WinSpool`].
//! - [`handle`]: scoped printer handles that always close.
//! - [`devmode`]: per-user / global device mode resolution.
//! - [`catalog`]: media type name ↔ code pairing.
//! - [`service`]: the host-facing [`PrintBridge`] operations.
//!
//! [`sim`] provides an in-memory [`Spooler`] for tests and non-Windows runs.

pub mod catalog;
pub mod devmode;
pub mod handle;
pub mod layout;
pub mod native;
pub mod service;
pub mod sim;
pub mod sized_call;

pub use handle::PrinterHandle;
pub use native::{RawHandle, Spooler, WinSpool};
pub use service::PrintBridge;
pub use sim::{SimPrinter, SimulatedSpooler};
