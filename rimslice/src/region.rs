// SPDX-License-Identifier: MIT

//! Sorted used regions, free-space fragments and the allocation policies
//! that pick among them.
//!
//! Both tables are snapshots: they are rebuilt from the slot table before
//! every allocation decision and are never patched in place.

use core::fmt;

use crate::{
    errors::*,
    slot::{NDKMAP, Slot, SlotTable},
    types::SliceSize,
    utils::sep_u64,
};

/// In-use, non-reserved slots ordered by ascending offset.
#[derive(Debug, Clone)]
pub struct SortedRegions {
    regions: [Slot; NDKMAP],
    len: usize,
}

impl SortedRegions {
    pub fn from_table(table: &SlotTable) -> Self {
        let mut sorted = Self {
            regions: [Slot::default(); NDKMAP],
            len: 0,
        };
        for slot in table.iter_used().filter(|s| !s.is_reserved()) {
            sorted.insert_sorted(*slot);
        }
        sorted
    }

    /// Stable insertion: equal offsets keep table order.
    fn insert_sorted(&mut self, slot: Slot) {
        let at = self.regions[..self.len]
            .iter()
            .position(|r| r.offset > slot.offset)
            .unwrap_or(self.len);
        self.regions.copy_within(at..self.len, at + 1);
        self.regions[at] = slot;
        self.len += 1;
    }

    pub fn as_slice(&self) -> &[Slot] {
        &self.regions[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for SortedRegions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "  no slices in sorted table");
        }
        writeln!(f, "  ┌───────┬──────────────┬──────────────┬──────────────┐")?;
        writeln!(f, "  | Slice | Offset       | Size         | Off+Size     |")?;
        writeln!(f, "  ├───────┼──────────────┼──────────────┼──────────────┤")?;
        for r in self.as_slice() {
            writeln!(
                f,
                "  | {:>5} | {:>12} | {:>12} | {:>12} |",
                r.id,
                sep_u64(r.offset),
                sep_u64(r.size),
                sep_u64(r.end())
            )?;
        }
        write!(f, "  └───────┴──────────────┴──────────────┴──────────────┘")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FreeRegion {
    pub offset: u64,
    pub size: u64,
}

impl FreeRegion {
    #[inline]
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

/// Unused space of a partition, in offset order.
#[derive(Debug, Clone)]
pub struct FreeSpaceTable {
    fragments: [FreeRegion; NDKMAP],
    len: usize,
}

impl Default for FreeSpaceTable {
    fn default() -> Self {
        Self {
            fragments: [FreeRegion::default(); NDKMAP],
            len: 0,
        }
    }
}

impl FreeSpaceTable {
    /// Computes the complement of the used regions within `partition_size`.
    ///
    /// Fails with [`SliceError::Overlap`] if two used regions intersect; the
    /// table is then inconsistent and nothing may be allocated from it.
    pub fn build(table: &SlotTable, partition_size: u64) -> SliceResult<Self> {
        let sorted = SortedRegions::from_table(table);
        tracing::debug!("sorted slices table:\n{sorted}");
        Self::from_sorted(&sorted, partition_size)
    }

    pub fn from_sorted(sorted: &SortedRegions, partition_size: u64) -> SliceResult<Self> {
        let mut free = Self::default();
        let regions = sorted.as_slice();

        let (Some(first), Some(last)) = (regions.first(), regions.last()) else {
            free.push(0, partition_size)?;
            return Ok(free);
        };

        if first.offset > 0 {
            free.push(0, first.offset)?;
        }
        for pair in regions.windows(2) {
            let (cur, next) = (&pair[0], &pair[1]);
            if cur.end() > next.offset {
                tracing::error!(
                    first = cur.id,
                    second = next.id,
                    "requested slices overlap"
                );
                return Err(SliceError::Overlap {
                    first: cur.id,
                    second: next.id,
                    first_end: cur.end(),
                    second_start: next.offset,
                });
            }
            free.push(cur.end(), next.offset - cur.end())?;
        }
        if last.end() > partition_size {
            tracing::warn!(
                slice = last.id,
                end = last.end(),
                partition_size,
                "slice extends past end of partition"
            );
        }
        free.push(last.end(), partition_size.saturating_sub(last.end()))?;
        Ok(free)
    }

    /// Builds a table from explicit fragments, skipping empty ones.
    pub fn from_regions(regions: &[FreeRegion]) -> SliceResult<Self> {
        let mut free = Self::default();
        for r in regions {
            free.push(r.offset, r.size)?;
        }
        Ok(free)
    }

    fn push(&mut self, offset: u64, size: u64) -> SliceResult {
        if size == 0 {
            return Ok(());
        }
        if self.len >= NDKMAP {
            return Err(SliceError::NoSpace("free space table is full"));
        }
        self.fragments[self.len] = FreeRegion::new(offset, size);
        self.len += 1;
        Ok(())
    }

    pub fn as_slice(&self) -> &[FreeRegion] {
        &self.fragments[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_free(&self) -> u64 {
        self.as_slice().iter().map(|r| r.size).sum()
    }

    /// Largest fragment; the first one wins ties.
    pub fn largest(&self) -> Option<FreeRegion> {
        self.as_slice()
            .iter()
            .fold(None, |best: Option<FreeRegion>, r| match best {
                Some(b) if r.size <= b.size => Some(b),
                _ => Some(*r),
            })
    }

    /// Tightest fragment holding `requested` sectors, accepting fragments up
    /// to one cylinder short to absorb rounding when the slice is laid down.
    pub fn best_fit(&self, requested: u64, cylinder: u64) -> Option<FreeRegion> {
        let wanted = if requested > cylinder {
            requested - cylinder
        } else {
            requested
        };

        let mut best: Option<FreeRegion> = None;
        for r in self.as_slice() {
            match best {
                None => {
                    if r.size >= wanted {
                        best = Some(*r);
                    }
                }
                Some(b) => {
                    if r.size > wanted && r.size < b.size {
                        best = Some(*r);
                    }
                }
            }
        }
        best
    }

    pub fn find(&self, size: SliceSize, cylinder: u64) -> Option<FreeRegion> {
        match size {
            SliceSize::Max => self.largest(),
            SliceSize::Sectors(n) => self.best_fit(n, cylinder),
        }
    }
}

impl fmt::Display for FreeSpaceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  free space fragments: {}", self.len)?;
        if self.is_empty() {
            return write!(f, "  entire disk/partition now in use");
        }
        writeln!(f, "  ┌──────────────┬──────────────┬──────────────┐")?;
        writeln!(f, "  | Offset       | Size         | Off+Size     |")?;
        writeln!(f, "  ├──────────────┼──────────────┼──────────────┤")?;
        for r in self.as_slice() {
            writeln!(
                f,
                "  | {:>12} | {:>12} | {:>12} |",
                sep_u64(r.offset),
                sep_u64(r.size),
                sep_u64(r.end())
            )?;
        }
        write!(f, "  └──────────────┴──────────────┴──────────────┘")
    }
}
