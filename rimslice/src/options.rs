// SPDX-License-Identifier: MIT

use crate::BLOCKS_PER_MB;

/// Options for a slice editing session
#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    /// Unattended install driven by a manifest
    pub automated: bool,
    /// Swap the system needs, in MiB (0 = none)
    pub swap_mb: u64,
    /// Slices live inside an fdisk partition; 2 cylinders are kept for control information
    pub legacy_partition_table: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            automated: false,
            swap_mb: 0,
            legacy_partition_table: true,
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn automated(mut self, automated: bool) -> Self {
        self.automated = automated;
        self
    }

    pub fn with_swap_mb(mut self, mb: u64) -> Self {
        self.swap_mb = mb;
        self
    }

    pub fn legacy_partition_table(mut self, legacy: bool) -> Self {
        self.legacy_partition_table = legacy;
        self
    }

    #[inline]
    pub fn swap_sectors(&self) -> u64 {
        self.swap_mb.saturating_mul(BLOCKS_PER_MB)
    }
}
