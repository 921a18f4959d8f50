// SPDX-License-Identifier: MIT

//! Fixed-capacity VTOC slot table.
//!
//! An entry with `size == 0` is unused. Entries are kept in scan order;
//! removal compacts the following entries toward the front.

use core::fmt;

use crate::{
    errors::*,
    tags::{SliceFlags, SliceTag},
    utils::sep_u64,
};

/// Number of slots in a VTOC.
pub const NDKMAP: usize = 16;

/// Whole-partition (backup) slot.
pub const WHOLE_PARTITION_SLOT: u8 = 2;
/// Boot slot.
pub const BOOT_SLOT: u8 = 8;
/// Alternate sectors slot.
pub const ALTERNATES_SLOT: u8 = 9;
/// Slot allocated by the swap policy.
pub const SWAP_SLOT: u8 = 1;

/// Slots that are never user-editable.
#[inline]
pub const fn is_reserved(id: u8) -> bool {
    matches!(id, WHOLE_PARTITION_SLOT | BOOT_SLOT | ALTERNATES_SLOT)
}

#[inline]
pub fn check_slot_id(id: u8) -> SliceResult {
    if (id as usize) < NDKMAP {
        Ok(())
    } else {
        Err(SliceError::InvalidSlot { id })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slot {
    pub id: u8,
    pub offset: u64,
    pub size: u64,
    pub tag: SliceTag,
    pub flags: SliceFlags,
}

impl Slot {
    #[inline]
    pub fn new(id: u8, offset: u64, size: u64, tag: SliceTag) -> Self {
        Self {
            id,
            offset,
            size,
            tag,
            flags: SliceFlags::empty(),
        }
    }

    #[inline]
    pub fn with_flags(mut self, flags: SliceFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// First sector past the slot.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    #[inline]
    pub fn is_reserved(&self) -> bool {
        is_reserved(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    slots: [Slot; NDKMAP],
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotTable {
    pub fn new() -> Self {
        Self {
            slots: [Slot::default(); NDKMAP],
        }
    }

    /// Seeds a table from a discovered VTOC. Empty entries are skipped.
    pub fn from_slots(slots: &[Slot]) -> SliceResult<Self> {
        let mut table = Self::new();
        let mut next = 0usize;
        for slot in slots.iter().filter(|s| !s.is_empty()) {
            check_slot_id(slot.id)?;
            if table.contains(slot.id) {
                return Err(SliceError::BadInput(
                    "discovered slice table repeats a slot id",
                ));
            }
            if next >= NDKMAP {
                return Err(SliceError::BadInput(
                    "discovered slice table exceeds slot capacity",
                ));
            }
            table.slots[next] = *slot;
            next += 1;
        }
        Ok(table)
    }

    /// Finds the in-use entry for `id`.
    pub fn get(&self, id: u8) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id && !s.is_empty())
    }

    #[inline]
    pub fn contains(&self, id: u8) -> bool {
        self.get(id).is_some()
    }

    #[inline]
    pub fn tag_of(&self, id: u8) -> Option<SliceTag> {
        self.get(id).map(|s| s.tag)
    }

    pub(crate) fn position(&self, id: u8) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id && !s.is_empty())
    }

    /// Removes `id`, shifting the following entries left and clearing the tail.
    /// Returns `false` if the slot was not in use.
    pub fn remove(&mut self, id: u8) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.slots.copy_within(index + 1.., index);
        self.slots[NDKMAP - 1] = Slot::default();
        true
    }

    /// Puts `slot` back at `index`, undoing a `remove` at that position.
    pub(crate) fn reinsert(&mut self, index: usize, slot: Slot) {
        self.slots.copy_within(index..NDKMAP - 1, index + 1);
        self.slots[index] = slot;
    }

    /// Index of the first unused entry, `None` when every entry is in use.
    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(Slot::is_empty)
    }

    pub(crate) fn set(&mut self, index: usize, slot: Slot) {
        self.slots[index] = slot;
    }

    /// Whether any non-reserved slot is in use.
    pub fn any_user_slots(&self) -> bool {
        self.iter_used().any(|s| !s.is_reserved())
    }

    pub fn iter_used(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|s| !s.is_empty())
    }

    pub fn used_count(&self) -> usize {
        self.iter_used().count()
    }

    pub fn clear(&mut self) {
        self.slots = [Slot::default(); NDKMAP];
    }

    pub fn as_slice(&self) -> &[Slot] {
        &self.slots
    }
}

impl fmt::Display for SlotTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  ┌────┬──────────────┬──────────────┬──────────────┬────────────┐"
        )?;
        writeln!(
            f,
            "  | Id | Offset       | Size         | Off+Size     | Tag        |"
        )?;
        writeln!(
            f,
            "  ├────┼──────────────┼──────────────┼──────────────┼────────────┤"
        )?;
        for s in self.iter_used().filter(|s| !s.is_reserved()) {
            writeln!(
                f,
                "  | {:<2} | {:>12} | {:>12} | {:>12} | {:<10} |",
                s.id,
                sep_u64(s.offset),
                sep_u64(s.size),
                sep_u64(s.end()),
                s.tag,
            )?;
        }
        write!(
            f,
            "  └────┴──────────────┴──────────────┴──────────────┴────────────┘"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of(slots: &[Slot]) -> SlotTable {
        SlotTable::from_slots(slots).unwrap()
    }

    #[test]
    fn remove_compacts_and_clears_tail() {
        let mut t = table_of(&[
            Slot::new(0, 0, 100, SliceTag::Root),
            Slot::new(3, 100, 50, SliceTag::Unassigned),
            Slot::new(4, 150, 50, SliceTag::Unassigned),
        ]);
        assert!(t.remove(3));
        assert_eq!(t.as_slice()[0].id, 0);
        assert_eq!(t.as_slice()[1].id, 4);
        assert!(t.as_slice()[2].is_empty());
        assert!(t.as_slice()[NDKMAP - 1].is_empty());
        assert!(!t.remove(3));
    }

    #[test]
    fn remove_ignores_unused_entries_with_matching_id() {
        let mut t = table_of(&[Slot::new(3, 0, 100, SliceTag::Unassigned)]);
        // unused entries are zeroed, so they carry id 0
        assert!(!t.remove(0));
        assert_eq!(t.used_count(), 1);
    }

    #[test]
    fn reinsert_undoes_remove() {
        let original = table_of(&[
            Slot::new(0, 0, 100, SliceTag::Root),
            Slot::new(5, 100, 50, SliceTag::Unassigned),
            Slot::new(6, 150, 50, SliceTag::Unassigned),
        ]);
        let mut t = original.clone();
        let index = t.position(5).unwrap();
        let slot = *t.get(5).unwrap();
        t.remove(5);
        t.reinsert(index, slot);
        assert_eq!(t, original);
    }

    #[test]
    fn first_free_reports_full_table() {
        let slots: [Slot; NDKMAP] =
            core::array::from_fn(|i| Slot::new(i as u8, i as u64 * 10, 10, SliceTag::Unassigned));
        let t = table_of(&slots);
        assert_eq!(t.first_free(), None);
        assert_eq!(t.used_count(), NDKMAP);
    }

    #[test]
    fn seeding_rejects_duplicates_and_bad_ids() {
        let dup = [
            Slot::new(3, 0, 10, SliceTag::Unassigned),
            Slot::new(3, 10, 10, SliceTag::Unassigned),
        ];
        assert!(matches!(
            SlotTable::from_slots(&dup),
            Err(SliceError::BadInput(_))
        ));
        let bad = [Slot::new(16, 0, 10, SliceTag::Unassigned)];
        assert_eq!(
            SlotTable::from_slots(&bad),
            Err(SliceError::InvalidSlot { id: 16 })
        );
    }

    #[test]
    fn reserved_slots_do_not_count_as_user_slots() {
        let t = table_of(&[Slot::new(2, 0, 1000, SliceTag::Backup)]);
        assert!(!t.any_user_slots());
        assert!(is_reserved(8) && is_reserved(9) && !is_reserved(1));
    }
}
