// SPDX-License-Identifier: MIT

//! Slice editing session.
//!
//! A session owns the committed disk target of one install: the discovered
//! geometry, the slot table and every piece of editing state. All edits go
//! through it, on a single thread, one call at a time.
//!
//! Typical flow:
//! - seed a session from discovery with [`SliceSession::with_slices`], or
//!   start from an empty table with [`SliceSession::new`]
//! - edit with [`SliceSession::create_slot`], [`SliceSession::delete_slot`]
//!   and [`SliceSession::preserve_slot`]
//! - check and complete the layout with [`SliceSession::finalize`]
//! - hand it over with [`SliceSession::export_target_attrs`]

use crate::{
    errors::*,
    geometry::DiskGeometry,
    ledger::EditLedger,
    options::SessionOptions,
    region::{FreeSpaceTable, SortedRegions},
    slot::{Slot, SlotTable, WHOLE_PARTITION_SLOT, check_slot_id, is_reserved},
    swap::SwapState,
    tags::SliceTag,
    types::{OnExisting, SliceSize},
};

#[derive(Debug, Clone)]
pub struct SliceSession {
    pub(crate) geometry: DiskGeometry,
    pub(crate) options: SessionOptions,
    pub(crate) table: SlotTable,
    pub(crate) ledger: EditLedger,
    pub(crate) swap: SwapState,
    /// Nothing customized yet: the installer may lay out slot 0 over the
    /// whole partition on its own.
    pub(crate) whole_partition_default: bool,
    /// The enclosing partition was deleted; discovered slices are void.
    pub(crate) invalidated: bool,
    /// Partition size held fixed for the duration of a finalize pass.
    pub(crate) pinned_partition_size: Option<u64>,
}

impl SliceSession {
    /// Starts a session with an empty slot table.
    pub fn new(geometry: DiskGeometry, options: SessionOptions) -> SliceResult<Self> {
        Self::with_slices(geometry, options, &[])
    }

    /// Starts a session from a discovered slice table.
    pub fn with_slices(
        geometry: DiskGeometry,
        options: SessionOptions,
        slices: &[Slot],
    ) -> SliceResult<Self> {
        geometry.validate()?;
        let table = SlotTable::from_slots(slices)?;
        if table.used_count() == 0 {
            tracing::info!(disk = %geometry.name, "no slices defined prior to install");
        }
        Ok(Self {
            swap: SwapState::initial(options.swap_mb),
            geometry,
            options,
            table,
            ledger: EditLedger::new(),
            whole_partition_default: true,
            invalidated: false,
            pinned_partition_size: None,
        })
    }

    pub fn geometry(&self) -> &DiskGeometry {
        &self.geometry
    }

    pub fn disk_name(&self) -> &str {
        &self.geometry.name
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn table(&self) -> &SlotTable {
        &self.table
    }

    pub fn ledger(&self) -> &EditLedger {
        &self.ledger
    }

    pub fn slot(&self, id: u8) -> Option<&Slot> {
        self.table.get(id)
    }

    /// Swap provisioning state against the current table. A swap slot that
    /// was deleted or retagged since it was set up reads as `Pending`.
    pub fn swap_state(&self) -> SwapState {
        match self.swap {
            SwapState::Satisfied if !self.swap_slot_ready() => SwapState::Pending,
            state => state,
        }
    }

    /// Swap was needed but slot 1 could not be used for it.
    pub fn swap_failed(&self) -> bool {
        self.swap_state() == SwapState::Failed
    }

    /// No customization so far: slot 0 over the whole partition.
    pub fn uses_default_layout(&self) -> bool {
        self.whole_partition_default
    }

    /// Marks `id` as never to be deleted or overwritten. The slot does not
    /// have to exist.
    pub fn preserve_slot(&mut self, id: u8) -> SliceResult {
        check_slot_id(id)?;
        self.ledger.mark_preserved(id);
        tracing::info!(slice = id, "slice preserved");
        Ok(())
    }

    /// Creates slot `id` in free space.
    ///
    /// [`SliceSize::Max`] takes the whole largest free region; an exact size
    /// goes to the tightest region that holds it. Swap is provisioned first
    /// when the system needs it.
    pub fn create_slot(
        &mut self,
        id: u8,
        size: SliceSize,
        tag: SliceTag,
        on_existing: OnExisting,
    ) -> SliceResult<Slot> {
        tracing::debug!(slice = id, %size, "create slice requested");
        self.check_editable(id, SliceOp::Create)?;
        self.clear_if_invalidated();
        self.apply_swap_policy();
        self.allocate_slot(id, size, tag, on_existing)
    }

    /// Deletes slot `id`. Deleting a slot that is not in the table succeeds
    /// and returns `false`.
    pub fn delete_slot(&mut self, id: u8) -> SliceResult<bool> {
        self.check_editable(id, SliceOp::Delete)?;
        self.clear_if_invalidated();
        if self.remove_slot(id) {
            return Ok(true);
        }
        tracing::warn!(
            slice = id,
            "delete slice: not found, assumed already deleted"
        );
        Ok(false)
    }

    /// The enclosing partition is being deleted. The slot table is cleared
    /// before the next edit or size computation.
    pub fn invalidate(&mut self) {
        tracing::info!("partition marked for deletion; slice info will be ignored");
        self.invalidated = true;
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// Size in sectors available to slices.
    ///
    /// Taken from slot 2 when present, else from the Solaris2 fdisk entry,
    /// else from the whole disk. The last two lose the control cylinders
    /// under a legacy partition table.
    pub fn partition_size(&mut self) -> u64 {
        if let Some(size) = self.pinned_partition_size {
            return size;
        }
        if self.invalidated {
            self.clear_if_invalidated();
        } else if let Some(whole) = self.table.get(WHOLE_PARTITION_SLOT) {
            return whole.size;
        }

        let overhead = if self.options.legacy_partition_table {
            self.geometry.control_overhead()
        } else {
            0
        };
        let (base, source) = match self.geometry.solaris_partition() {
            Some(part) => (part.size_sec, "partition"),
            None => (self.geometry.total_sectors, "disk"),
        };
        let size = base.saturating_sub(overhead);
        if overhead > 0 {
            tracing::debug!(
                cylinder = self.geometry.cylinder_sectors,
                from = base,
                to = size,
                source,
                "slice space reduced by 2 cylinders"
            );
        }
        size
    }

    /// Rebuilds the free-space table from the current slot table.
    pub fn free_space(&mut self) -> SliceResult<FreeSpaceTable> {
        let partition_size = self.partition_size();
        let free = FreeSpaceTable::build(&self.table, partition_size)?;
        tracing::debug!("{free}");
        Ok(free)
    }

    pub fn sorted_regions(&self) -> SortedRegions {
        SortedRegions::from_table(&self.table)
    }

    fn check_editable(&self, id: u8, op: SliceOp) -> SliceResult {
        check_slot_id(id)?;
        if is_reserved(id) || self.ledger.is_preserved(id) {
            return Err(SliceError::Protected { id, op });
        }
        Ok(())
    }

    fn clear_if_invalidated(&mut self) {
        if self.invalidated {
            self.table.clear();
            self.invalidated = false;
        }
    }

    pub(crate) fn remove_slot(&mut self, id: u8) -> bool {
        if !self.table.remove(id) {
            return false;
        }
        self.ledger.mark_deleted(id);
        tracing::info!(slice = id, "slice deleted from table");
        true
    }

    /// Create path shared with the swap policy and the finalizer. Does not
    /// evaluate the swap policy.
    pub(crate) fn allocate_slot(
        &mut self,
        id: u8,
        size: SliceSize,
        tag: SliceTag,
        on_existing: OnExisting,
    ) -> SliceResult<Slot> {
        self.check_editable(id, SliceOp::Create)?;
        tracing::debug!("modified slice table:\n{}", self.table);
        // a zero-sector request asks for the whole free region
        let size = match size {
            SliceSize::Sectors(0) => SliceSize::Max,
            other => other,
        };

        let displaced = match (self.table.position(id), on_existing) {
            (None, _) => None,
            (Some(_), OnExisting::Error) => {
                tracing::error!(slice = id, "slice already exists in the VTOC");
                return Err(SliceError::AlreadyExists { id });
            }
            (Some(index), OnExisting::Overwrite) => {
                tracing::info!(slice = id, "overwriting VTOC entry for existing slice");
                let old = self.table.as_slice()[index];
                self.table.remove(id);
                Some((index, old))
            }
        };

        match self.place_slot(id, size, tag) {
            Ok(slot) => Ok(slot),
            Err(e) => {
                if let Some((index, old)) = displaced {
                    self.table.reinsert(index, old);
                }
                Err(e)
            }
        }
    }

    fn place_slot(&mut self, id: u8, size: SliceSize, tag: SliceTag) -> SliceResult<Slot> {
        let Some(index) = self.table.first_free() else {
            tracing::error!(slice = id, "slice table is full");
            return Err(SliceError::TableFull { id });
        };

        let partition_size = self.partition_size();
        let free = self.free_space()?;
        let Some(region) = free.find(size, self.geometry.cylinder_sectors) else {
            tracing::error!(slice = id, %size, "no unused region of requested size");
            return Err(SliceError::AllocationFailed {
                id,
                requested: size,
            });
        };

        let slot_size = match size {
            SliceSize::Max => region.size,
            SliceSize::Sectors(n) => n,
        };
        let slot = Slot::new(id, region.offset, slot_size, tag);
        self.table.set(index, slot);

        // the cylinder tolerance may have picked a region too short for the
        // slot; it must not run into the next one
        if let Err(e) = FreeSpaceTable::build(&self.table, partition_size) {
            self.table.remove(id);
            tracing::error!(slice = id, %size, "slice would overlap its neighbour");
            return Err(e);
        }

        if !(size.is_max() && region.offset == 0 && region.size == partition_size) {
            self.whole_partition_default = false;
        }
        self.ledger.mark_created(id, slot_size);
        if tag == SliceTag::Root {
            self.ledger.mark_install_target(id);
        }
        tracing::info!(
            slice = id,
            offset = slot.offset,
            size = slot.size,
            %tag,
            "slice created"
        );
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geometry::FdiskEntry, region::FreeRegion, slot::NDKMAP};

    fn session(partition: u64, cylinder: u64) -> SliceSession {
        let g = DiskGeometry::new("c0t0d0", partition, cylinder);
        let opts = SessionOptions::new().legacy_partition_table(false);
        SliceSession::new(g, opts).unwrap()
    }

    fn seeded(partition: u64, slots: &[Slot]) -> SliceSession {
        let g = DiskGeometry::new("c0t0d0", partition, 0);
        let opts = SessionOptions::new().legacy_partition_table(false);
        SliceSession::with_slices(g, opts, slots).unwrap()
    }

    #[test]
    fn create_max_on_empty_table_keeps_default_layout() {
        let mut s = session(10_000, 100);
        let slot = s
            .create_slot(0, SliceSize::Max, SliceTag::Root, OnExisting::Error)
            .unwrap();
        assert_eq!((slot.offset, slot.size), (0, 10_000));
        assert!(s.uses_default_layout());
        assert!(s.ledger().entry(0).unwrap().is_install_target);
    }

    #[test]
    fn exact_size_clears_default_layout() {
        let mut s = session(10_000, 100);
        s.create_slot(0, SliceSize::Sectors(4_000), SliceTag::Root, OnExisting::Error)
            .unwrap();
        assert!(!s.uses_default_layout());
        assert_eq!(s.ledger().entry(0).unwrap().requested_create_size, 4_000);
    }

    #[test]
    fn create_rejects_out_of_range_id() {
        let mut s = session(10_000, 0);
        let e = s
            .create_slot(NDKMAP as u8, SliceSize::Max, SliceTag::Root, OnExisting::Error)
            .unwrap_err();
        assert_eq!(e, SliceError::InvalidSlot { id: 16 });
    }

    #[test]
    fn existing_slot_without_overwrite_is_rejected() {
        let mut s = session(10_000, 0);
        s.create_slot(5, SliceSize::Sectors(100), SliceTag::Unassigned, OnExisting::Error)
            .unwrap();
        let e = s
            .create_slot(5, SliceSize::Sectors(100), SliceTag::Unassigned, OnExisting::Error)
            .unwrap_err();
        assert_eq!(e, SliceError::AlreadyExists { id: 5 });
        assert_eq!(s.table().used_count(), 1);
    }

    #[test]
    fn failed_overwrite_keeps_the_old_slot() {
        let mut s = session(1_000, 0);
        s.create_slot(5, SliceSize::Sectors(100), SliceTag::Home, OnExisting::Error)
            .unwrap();
        let before = s.table().clone();
        let e = s
            .create_slot(5, SliceSize::Sectors(5_000), SliceTag::Home, OnExisting::Overwrite)
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::AllocationFailed);
        assert_eq!(s.table(), &before);
    }

    #[test]
    fn zero_size_request_takes_whole_region() {
        let mut s = session(10_000, 100);
        let slot = s
            .create_slot(5, SliceSize::Sectors(0), SliceTag::Usr, OnExisting::Error)
            .unwrap();
        assert_eq!((slot.offset, slot.size), (0, 10_000));
        assert_eq!(s.slot(5), Some(&slot));
        assert_eq!(s.ledger().entry(5).unwrap().requested_create_size, 10_000);
    }

    #[test]
    fn short_region_within_tolerance_is_rejected_on_overlap() {
        let g = DiskGeometry::new("c0t0d0", 1_000, 10);
        let opts = SessionOptions::new().legacy_partition_table(false);
        let seed = [
            Slot::new(3, 0, 100, SliceTag::Home),
            Slot::new(4, 195, 805, SliceTag::Var),
        ];
        let mut s = SliceSession::with_slices(g, opts, &seed).unwrap();
        let before = s.table().clone();

        let e = s
            .create_slot(5, SliceSize::Sectors(100), SliceTag::Usr, OnExisting::Error)
            .unwrap_err();
        assert_eq!(
            e,
            SliceError::Overlap {
                first: 5,
                second: 4,
                first_end: 200,
                second_start: 195,
            }
        );
        assert_eq!(s.table(), &before);
        assert!(!s.ledger().is_created(5));
        assert!(s.uses_default_layout());

        // the session stays usable
        let slot = s
            .create_slot(6, SliceSize::Sectors(1), SliceTag::Usr, OnExisting::Error)
            .unwrap();
        assert_eq!(slot.offset, 100);
        assert!(s.free_space().is_ok());
    }

    #[test]
    fn table_full_is_distinct_from_no_space() {
        let mut s = session(1_000_000, 0);
        // every entry in use, but only via slots we control directly
        for i in 0..NDKMAP {
            s.table
                .set(i, Slot::new(i as u8, i as u64 * 10, 10, SliceTag::Unassigned));
        }
        let e = s.place_slot(4, SliceSize::Sectors(10), SliceTag::Unassigned).unwrap_err();
        assert_eq!(e, SliceError::TableFull { id: 4 });
        assert_eq!(e.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn partition_size_prefers_slot_2() {
        let mut s = seeded(50_000, &[Slot::new(2, 0, 30_000, SliceTag::Backup)]);
        assert_eq!(s.partition_size(), 30_000);
    }

    #[test]
    fn partition_size_from_fdisk_with_overhead() {
        let g = DiskGeometry::new("c0t0d0", 50_000, 100).with_partition(FdiskEntry::solaris(20_200));
        let mut s = SliceSession::new(g.clone(), SessionOptions::new()).unwrap();
        assert_eq!(s.partition_size(), 20_000);

        let opts = SessionOptions::new().legacy_partition_table(false);
        let mut s = SliceSession::new(g, opts).unwrap();
        assert_eq!(s.partition_size(), 20_200);
    }

    #[test]
    fn partition_size_falls_back_to_disk() {
        let g = DiskGeometry::new("c0t0d0", 50_000, 100);
        let mut s = SliceSession::new(g, SessionOptions::new()).unwrap();
        assert_eq!(s.partition_size(), 49_800);
    }

    #[test]
    fn invalidate_clears_table_once() {
        let g = DiskGeometry::new("c0t0d0", 50_000, 0);
        let seed = [
            Slot::new(2, 0, 30_000, SliceTag::Backup),
            Slot::new(0, 0, 30_000, SliceTag::Root),
        ];
        let mut s = SliceSession::with_slices(g, SessionOptions::new(), &seed).unwrap();
        s.invalidate();
        assert_eq!(s.partition_size(), 50_000);
        assert_eq!(s.table().used_count(), 0);
        assert!(!s.is_invalidated());
        let free = s.free_space().unwrap();
        assert_eq!(free.as_slice(), &[FreeRegion::new(0, 50_000)]);
    }

    #[test]
    fn delete_marks_ledger() {
        let mut s = seeded(1_000, &[Slot::new(3, 0, 100, SliceTag::Home)]);
        assert!(s.delete_slot(3).unwrap());
        assert!(s.ledger().entry(3).unwrap().delete);
        assert!(!s.delete_slot(3).unwrap());
    }

    #[test]
    fn preserve_does_not_require_slot() {
        let mut s = session(1_000, 0);
        s.preserve_slot(7).unwrap();
        assert!(s.ledger().is_preserved(7));
        assert_eq!(
            s.preserve_slot(16).unwrap_err().kind(),
            ErrorKind::BadInput
        );
    }

    #[test]
    fn seeding_rejects_empty_disk_name() {
        let g = DiskGeometry::new("", 1_000, 0);
        assert_eq!(
            SliceSession::new(g, SessionOptions::new()).unwrap_err().kind(),
            ErrorKind::BadInput
        );
    }
}
