// SPDX-License-Identifier: MIT

use rimslice::{DiskGeometry, FdiskEntry, SliceFlags, Slot};
use serde::Deserialize;

use crate::manifest::size::TagSpec;

fn default_true() -> bool {
    true
}

/// Disk chosen as install target, as reported by discovery.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DiskSpec {
    pub name: String,
    pub total_sectors: u64,
    #[serde(default)]
    pub cylinder_sectors: u64,
    #[serde(default = "default_true")]
    pub legacy_partition_table: bool,
    #[serde(default)]
    pub partitions: Vec<PartitionSpec>,
}

/// Fdisk partition entry. `type = 0xBF` marks the Solaris2 partition.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PartitionSpec {
    #[serde(rename = "type")]
    pub partition_type: u8,
    pub sectors: u64,
}

impl DiskSpec {
    pub fn geometry(&self) -> DiskGeometry {
        self.partitions.iter().fold(
            DiskGeometry::new(self.name.as_str(), self.total_sectors, self.cylinder_sectors),
            |g, p| g.with_partition(FdiskEntry::new(p.partition_type, p.sectors)),
        )
    }
}

/// Slice found on the disk before install.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SliceSpec {
    pub id: u8,
    pub offset: u64,
    pub size: u64,
    #[serde(default)]
    pub tag: TagSpec,
    #[serde(default)]
    pub flags: u16,
}

impl SliceSpec {
    pub fn to_slot(&self) -> Slot {
        Slot::new(self.id, self.offset, self.size, self.tag.0)
            .with_flags(SliceFlags::from_bits_retain(self.flags))
    }
}
