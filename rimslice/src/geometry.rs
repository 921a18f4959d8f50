// SPDX-License-Identifier: MIT

//! Disk geometry handed over by target discovery.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::errors::*;

/// fdisk partition type of a Solaris2 partition.
pub const SOLARIS2_PARTITION_TYPE: u8 = 0xBF;
/// Cylinders kept for control information under a legacy partition table.
pub const CONTROL_CYLINDERS: u64 = 2;

/// One entry of the enclosing fdisk partition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdiskEntry {
    pub partition_type: u8,
    pub size_sec: u64,
}

impl FdiskEntry {
    #[inline]
    pub fn new(partition_type: u8, size_sec: u64) -> Self {
        Self {
            partition_type,
            size_sec,
        }
    }

    #[inline]
    pub fn solaris(size_sec: u64) -> Self {
        Self::new(SOLARIS2_PARTITION_TYPE, size_sec)
    }

    #[inline]
    pub fn is_solaris(&self) -> bool {
        self.partition_type == SOLARIS2_PARTITION_TYPE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskGeometry {
    pub name: String,
    pub total_sectors: u64,
    pub cylinder_sectors: u64,
    pub partitions: Vec<FdiskEntry>,
}

impl DiskGeometry {
    pub fn new(name: impl Into<String>, total_sectors: u64, cylinder_sectors: u64) -> Self {
        Self {
            name: name.into(),
            total_sectors,
            cylinder_sectors,
            partitions: Vec::new(),
        }
    }

    pub fn with_partition(mut self, entry: FdiskEntry) -> Self {
        self.partitions.push(entry);
        self
    }

    pub fn solaris_partition(&self) -> Option<&FdiskEntry> {
        self.partitions.iter().find(|p| p.is_solaris())
    }

    /// Sectors kept for control information (2 cylinders).
    #[inline]
    pub fn control_overhead(&self) -> u64 {
        self.cylinder_sectors.saturating_mul(CONTROL_CYLINDERS)
    }

    pub fn validate(&self) -> SliceResult {
        if self.name.trim().is_empty() {
            return Err(SliceError::BadInput("disk name is empty"));
        }
        if self.total_sectors == 0 {
            return Err(SliceError::BadInput("disk has no sectors"));
        }
        Ok(())
    }
}
