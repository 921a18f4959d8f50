// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod errors;
/// Finalization and export of an edited layout.
pub mod finalize;
/// Disk geometry from target discovery.
pub mod geometry;
/// Per-slot record of session intent.
pub mod ledger;
pub mod options;
/// Sorted regions, free-space table and allocation policies.
pub mod region;
/// Slice editing session.
pub mod session;
/// Attribute sink for target instantiation.
pub mod sink;
/// Fixed-capacity VTOC slot table.
pub mod slot;
pub mod swap;
/// VTOC tags and flags.
pub mod tags;
pub mod types;
pub mod utils;

pub use errors::{ErrorKind, SliceError, SliceOp, SliceResult};
pub use geometry::{DiskGeometry, FdiskEntry};
pub use options::SessionOptions;
pub use session::SliceSession;
pub use sink::{AttrSink, SliceList, TargetAttrs, TargetType};
pub use slot::{NDKMAP, Slot, SlotTable};
pub use tags::{SliceFlags, SliceTag};
pub use types::{OnExisting, SliceSize};

/// 512-byte sectors per MiB.
pub const BLOCKS_PER_MB: u64 = 2048;

pub mod prelude {
    pub use super::errors::*;
    pub use super::geometry::*;
    pub use super::ledger::*;
    pub use super::options::SessionOptions;
    pub use super::region::*;
    pub use super::session::SliceSession;
    pub use super::sink::*;
    pub use super::slot::*;
    pub use super::swap::SwapState;
    pub use super::tags::*;
    pub use super::types::*;
    pub use super::BLOCKS_PER_MB;
}
