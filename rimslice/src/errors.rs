// SPDX-License-Identifier: MIT

use core::fmt;

use crate::types::SliceSize;

/// Edit operation rejected on a protected slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOp {
    Create,
    Delete,
    Install,
}

impl fmt::Display for SliceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SliceOp::Create => "create",
            SliceOp::Delete => "delete",
            SliceOp::Install => "install into",
        };
        write!(f, "{s}")
    }
}

/// Coarse classification of a [`SliceError`], stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadInput,
    Protected,
    AlreadyExists,
    AllocationFailed,
    Overlap,
    NoSpace,
    NotFound,
    Instantiation,
}

/// Unified error type for slice table editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceError {
    /// Slot id outside `0..NDKMAP`.
    InvalidSlot { id: u8 },
    BadInput(&'static str),
    /// Reserved or explicitly preserved slot.
    Protected { id: u8, op: SliceOp },
    AlreadyExists { id: u8 },
    /// Every table entry is in use.
    TableFull { id: u8 },
    AllocationFailed { id: u8, requested: SliceSize },
    Overlap {
        first: u8,
        second: u8,
        first_end: u64,
        second_start: u64,
    },
    NoSpace(&'static str),
    NoInstallSlot,
    Sink(&'static str),
}

impl SliceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SliceError::InvalidSlot { .. } | SliceError::BadInput(_) => ErrorKind::BadInput,
            SliceError::Protected { .. } => ErrorKind::Protected,
            SliceError::AlreadyExists { .. } | SliceError::TableFull { .. } => {
                ErrorKind::AlreadyExists
            }
            SliceError::AllocationFailed { .. } => ErrorKind::AllocationFailed,
            SliceError::Overlap { .. } => ErrorKind::Overlap,
            SliceError::NoSpace(_) => ErrorKind::NoSpace,
            SliceError::NoInstallSlot => ErrorKind::NotFound,
            SliceError::Sink(_) => ErrorKind::Instantiation,
        }
    }

    pub fn msg(&self) -> &'static str {
        match self {
            SliceError::InvalidSlot { .. } => "Slot id out of range",
            SliceError::BadInput(msg) => msg,
            SliceError::Protected { .. } => "Slot is protected",
            SliceError::AlreadyExists { .. } => "Slot already exists",
            SliceError::TableFull { .. } => "Slot table is full",
            SliceError::AllocationFailed { .. } => "No free region of requested size",
            SliceError::Overlap { .. } => "Overlapping slots",
            SliceError::NoSpace(msg) => msg,
            SliceError::NoInstallSlot => "No install slot exists",
            SliceError::Sink(msg) => msg,
        }
    }
}

impl fmt::Display for SliceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceError::InvalidSlot { id } => write!(f, "{}: {id}", self.msg()),
            SliceError::Protected { id, op } => {
                write!(f, "cannot {op} slot {id}: reserved or preserved")
            }
            SliceError::AlreadyExists { id } => {
                write!(f, "slot {id} already exists (use overwrite to replace it)")
            }
            SliceError::TableFull { id } => {
                write!(f, "cannot create slot {id}: {}", self.msg())
            }
            SliceError::AllocationFailed { id, requested } => {
                write!(f, "cannot create slot {id}: no free region for {requested}")
            }
            SliceError::Overlap {
                first,
                second,
                first_end,
                second_start,
            } => write!(
                f,
                "slot {first} ends at sector {first_end} past start of slot {second} at sector {second_start}"
            ),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

impl core::error::Error for SliceError {}

pub type SliceResult<T = ()> = Result<T, SliceError>;
