// SPDX-License-Identifier: MIT

//! VTOC slice tags and flags.

define_slice_tags! {
    Unassigned => "unassigned", 0x00,
    Boot => "boot", 0x01,
    Root => "root", 0x02,
    Swap => "swap", 0x03,
    Usr => "usr", 0x04,
    Backup => "backup", 0x05,
    Stand => "stand", 0x06,
    Var => "var", 0x07,
    Home => "home", 0x08,
}

impl Default for SliceTag {
    fn default() -> Self {
        SliceTag::Unassigned
    }
}

bitflags::bitflags! {
    /// Per-slot VTOC flags. Unknown bits are kept as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SliceFlags: u16 {
        const UNMOUNTABLE = 0x01;
        const READ_ONLY   = 0x10;
    }
}
