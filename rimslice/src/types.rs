// SPDX-License-Identifier: MIT

use core::fmt;

use crate::BLOCKS_PER_MB;

/// Requested size of a new slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceSize {
    /// Take the whole of the largest free region.
    Max,
    /// Exact size in sectors.
    Sectors(u64),
}

impl SliceSize {
    #[inline]
    pub fn from_mb(mb: u64) -> Self {
        SliceSize::Sectors(mb.saturating_mul(BLOCKS_PER_MB))
    }

    #[inline]
    pub fn is_max(&self) -> bool {
        matches!(self, SliceSize::Max)
    }
}

impl fmt::Display for SliceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceSize::Max => write!(f, "max"),
            SliceSize::Sectors(n) => write!(f, "{n} sectors"),
        }
    }
}

/// What `create_slot` does when the slot id is already in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OnExisting {
    #[default]
    Error,
    Overwrite,
}
