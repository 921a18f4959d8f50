// SPDX-License-Identifier: MIT

//! Hand-over of the final slice layout to target instantiation.

use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::{errors::*, slot::SlotTable, utils::sep_u64};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TargetType {
    Vtoc,
}

/// Explicit slice layout: one column per attribute, one row per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SliceList {
    pub parts: Vec<u8>,
    pub tags: Vec<u16>,
    pub flags: Vec<u16>,
    pub first_sectors: Vec<u64>,
    pub sizes: Vec<u64>,
}

impl SliceList {
    /// Every in-use slot of `table`, reserved ones included, in table order.
    pub fn from_table(table: &SlotTable) -> Self {
        let mut list = Self::default();
        for s in table.iter_used() {
            list.parts.push(s.id);
            list.tags.push(s.tag.as_raw());
            list.flags.push(s.flags.bits());
            list.first_sectors.push(s.offset);
            list.sizes.push(s.size);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// `(id, tag, flags, first sector, size)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (u8, u16, u16, u64, u64)> + '_ {
        (0..self.len()).map(move |i| {
            (
                self.parts[i],
                self.tags[i],
                self.flags[i],
                self.first_sectors[i],
                self.sizes[i],
            )
        })
    }
}

impl fmt::Display for SliceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  ┌────┬──────┬───────┬──────────────┬──────────────┐"
        )?;
        writeln!(
            f,
            "  | Id | Tag  | Flags | 1st sector   | Size         |"
        )?;
        writeln!(
            f,
            "  ├────┼──────┼───────┼──────────────┼──────────────┤"
        )?;
        for (id, tag, flags, start, size) in self.rows() {
            writeln!(
                f,
                "  | {:<2} | {:>4} | {:>#5x} | {:>12} | {:>12} |",
                id,
                tag,
                flags,
                sep_u64(start),
                sep_u64(size)
            )?;
        }
        write!(
            f,
            "  └────┴──────┴───────┴──────────────┴──────────────┘"
        )
    }
}

/// Consumer of the final slice layout.
pub trait AttrSink {
    fn set_target_type(&mut self, target: TargetType) -> SliceResult;
    fn set_disk_name(&mut self, name: &str) -> SliceResult;
    fn set_create_swap_slice(&mut self, create: bool) -> SliceResult;
    /// Let the installer put slot 0 over the whole partition.
    fn set_default_layout(&mut self, default: bool) -> SliceResult;
    fn set_slice_list(&mut self, list: SliceList) -> SliceResult;
}

/// In-memory attribute set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TargetAttrs {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub target_type: Option<TargetType>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub disk_name: Option<String>,
    pub create_swap_slice: bool,
    pub default_layout: bool,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub slices: Option<SliceList>,
}

impl TargetAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slices to create, 0 for the default layout.
    pub fn slice_num(&self) -> usize {
        self.slices.as_ref().map_or(0, SliceList::len)
    }
}

impl AttrSink for TargetAttrs {
    fn set_target_type(&mut self, target: TargetType) -> SliceResult {
        self.target_type = Some(target);
        Ok(())
    }

    fn set_disk_name(&mut self, name: &str) -> SliceResult {
        if name.is_empty() {
            return Err(SliceError::Sink("disk name is empty"));
        }
        self.disk_name = Some(name.into());
        Ok(())
    }

    fn set_create_swap_slice(&mut self, create: bool) -> SliceResult {
        self.create_swap_slice = create;
        Ok(())
    }

    fn set_default_layout(&mut self, default: bool) -> SliceResult {
        self.default_layout = default;
        Ok(())
    }

    fn set_slice_list(&mut self, list: SliceList) -> SliceResult {
        if list.len() > u16::MAX as usize {
            return Err(SliceError::Sink("too many slices"));
        }
        self.slices = Some(list);
        Ok(())
    }
}
