// SPDX-License-Identifier: MIT

use rimslice::prelude::*;

fn geometry(partition: u64, cylinder: u64) -> DiskGeometry {
    DiskGeometry::new("c1t0d0", partition, cylinder)
}

fn session(partition: u64, cylinder: u64) -> SliceSession {
    let opts = SessionOptions::new().legacy_partition_table(false);
    SliceSession::new(geometry(partition, cylinder), opts).unwrap()
}

/// Free fragments of 100, 250 and 400 sectors in a 950 sector partition.
fn fragmented() -> SliceSession {
    let opts = SessionOptions::new().legacy_partition_table(false);
    let seed = [
        Slot::new(3, 100, 100, SliceTag::Home),
        Slot::new(4, 450, 100, SliceTag::Var),
    ];
    SliceSession::with_slices(geometry(950, 10), opts, &seed).unwrap()
}

fn assert_no_overlap(table: &SlotTable) {
    let used: Vec<&Slot> = table.iter_used().filter(|s| !s.is_reserved()).collect();
    for (i, a) in used.iter().enumerate() {
        for b in &used[i + 1..] {
            assert!(
                a.end() <= b.offset || b.end() <= a.offset,
                "slots {} and {} overlap",
                a.id,
                b.id
            );
        }
    }
}

#[test]
fn end_to_end_whole_partition() {
    let g = geometry(50_000, 100).with_partition(FdiskEntry::solaris(10_200));
    let mut s = SliceSession::new(g, SessionOptions::new()).unwrap();
    assert_eq!(s.partition_size(), 10_000);

    let slot = s
        .create_slot(0, SliceSize::Max, SliceTag::Root, OnExisting::Error)
        .unwrap();
    assert_eq!((slot.id, slot.offset, slot.size), (0, 0, 10_000));
    assert!(s.free_space().unwrap().is_empty());

    assert_eq!(s.finalize(0).unwrap(), 0);
    let mut attrs = TargetAttrs::new();
    s.export_target_attrs(&mut attrs).unwrap();
    assert!(attrs.default_layout);
    assert!(!attrs.create_swap_slice);
}

#[test]
fn best_fit_picks_tightest_fragment() {
    let mut s = fragmented();
    let free = s.free_space().unwrap();
    let sizes: Vec<u64> = free.as_slice().iter().map(|r| r.size).collect();
    assert_eq!(sizes, [100, 250, 400]);

    let slot = s
        .create_slot(5, SliceSize::Sectors(200), SliceTag::Usr, OnExisting::Error)
        .unwrap();
    assert_eq!((slot.offset, slot.size), (200, 200));
    assert_no_overlap(s.table());
}

#[test]
fn max_takes_largest_fragment() {
    let mut s = fragmented();
    let slot = s
        .create_slot(5, SliceSize::Max, SliceTag::Usr, OnExisting::Error)
        .unwrap();
    assert_eq!((slot.offset, slot.size), (550, 400));
    assert!(!s.uses_default_layout());
}

#[test]
fn idempotent_delete() {
    let mut s = fragmented();
    let before = s.table().clone();
    assert!(!s.delete_slot(7).unwrap());
    assert_eq!(s.table(), &before);
}

#[test]
fn protected_slots_are_immutable() {
    let opts = SessionOptions::new()
        .legacy_partition_table(false)
        .with_swap_mb(1);
    let seed = [
        Slot::new(2, 0, 100_000, SliceTag::Backup),
        Slot::new(4, 0, 1_000, SliceTag::Home),
    ];
    let mut s = SliceSession::with_slices(geometry(100_000, 0), opts, &seed).unwrap();
    s.preserve_slot(4).unwrap();
    s.preserve_slot(6).unwrap();
    let before = s.table().clone();

    for id in [2u8, 8, 9, 4, 6] {
        let e = s
            .create_slot(id, SliceSize::Sectors(10), SliceTag::Usr, OnExisting::Overwrite)
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Protected, "create {id}");
        let e = s.delete_slot(id).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Protected, "delete {id}");
    }
    assert_eq!(s.table(), &before);
    assert_eq!(s.swap_state(), SwapState::Pending);
}

#[test]
fn capacity_exhaustion() {
    let opts = SessionOptions::new().legacy_partition_table(false);
    let seed = [
        Slot::new(2, 0, 1_000_000, SliceTag::Backup),
        Slot::new(8, 0, 10, SliceTag::Boot),
        Slot::new(9, 10, 10, SliceTag::Unassigned),
    ];
    let mut s = SliceSession::with_slices(geometry(1_000_000, 0), opts, &seed).unwrap();
    let user_ids: Vec<u8> = (0..NDKMAP as u8).filter(|&id| !is_reserved(id)).collect();
    for &id in &user_ids {
        s.create_slot(id, SliceSize::Sectors(1_000), SliceTag::Unassigned, OnExisting::Error)
            .unwrap();
    }
    assert_eq!(s.table().first_free(), None);
    assert!(s.free_space().unwrap().total_free() > 0);

    let e = s
        .create_slot(5, SliceSize::Sectors(1_000), SliceTag::Unassigned, OnExisting::Error)
        .unwrap_err();
    assert_eq!(e.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn overwrite_replaces_in_place() {
    let mut s = session(1_000, 10);
    s.create_slot(5, SliceSize::Sectors(100), SliceTag::Home, OnExisting::Error)
        .unwrap();
    s.create_slot(3, SliceSize::Sectors(100), SliceTag::Var, OnExisting::Error)
        .unwrap();
    let slot = s
        .create_slot(5, SliceSize::Sectors(300), SliceTag::Home, OnExisting::Overwrite)
        .unwrap();

    assert_eq!(s.table().iter_used().filter(|s| s.id == 5).count(), 1);
    assert_eq!(s.slot(5).unwrap().size, 300);
    assert_eq!(slot.offset, 200);
    assert_no_overlap(s.table());
}

#[test]
fn swap_is_created_once_before_requested_slot() {
    let opts = SessionOptions::new()
        .legacy_partition_table(false)
        .with_swap_mb(4);
    let mut s = SliceSession::new(geometry(100_000, 0), opts).unwrap();
    let root = s
        .create_slot(0, SliceSize::Max, SliceTag::Root, OnExisting::Error)
        .unwrap();

    assert_eq!(s.table().used_count(), 2);
    let swap = s.slot(1).unwrap();
    assert_eq!(swap.tag, SliceTag::Swap);
    assert_eq!((swap.offset, swap.size), (0, 4 * BLOCKS_PER_MB));
    assert_eq!(root.offset, swap.end());
    assert_eq!(s.swap_state(), SwapState::Satisfied);

    // later creates leave slot 1 alone
    s.delete_slot(0).unwrap();
    s.create_slot(3, SliceSize::Sectors(10), SliceTag::Usr, OnExisting::Error)
        .unwrap();
    assert_eq!(s.table().used_count(), 2);
}

#[test]
fn swap_failure_is_surfaced_not_fatal() {
    let opts = SessionOptions::new()
        .legacy_partition_table(false)
        .with_swap_mb(1_000);
    let mut s = SliceSession::new(geometry(10_000, 0), opts).unwrap();
    s.create_slot(0, SliceSize::Max, SliceTag::Root, OnExisting::Error)
        .unwrap();
    assert!(s.swap_failed());
    s.finalize(0).unwrap();

    let mut attrs = TargetAttrs::new();
    s.export_target_attrs(&mut attrs).unwrap();
    assert!(!attrs.create_swap_slice);
}

/// Random creates and deletes; the table must never hold intersecting slots.
fn run_random_edits(cylinder: u64, mut seed: u64) {
    let mut s = session(200_000, cylinder);
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };

    for _ in 0..500 {
        let r = next();
        let id = (r % NDKMAP as u64) as u8;
        if is_reserved(id) {
            continue;
        }
        if r % 3 == 0 {
            s.delete_slot(id).unwrap();
        } else {
            let size = if r % 7 == 0 {
                SliceSize::Max
            } else {
                SliceSize::Sectors(1 + (r >> 8) % 20_000)
            };
            let policy = if r % 2 == 0 {
                OnExisting::Overwrite
            } else {
                OnExisting::Error
            };
            let before = s.table().clone();
            if let Err(e) = s.create_slot(id, size, SliceTag::Unassigned, policy) {
                if cylinder == 0 {
                    assert_ne!(e.kind(), ErrorKind::Overlap);
                }
                // swap is not required, so a failed create changes nothing
                assert_eq!(s.table(), &before);
            }
        }
        assert_no_overlap(s.table());
        assert!(s.free_space().is_ok());
    }
}

#[test]
fn random_edits_never_overlap() {
    run_random_edits(0, 0x2545_f491);
}

#[test]
fn random_edits_never_overlap_with_cylinder_tolerance() {
    run_random_edits(1_000, 0x2545_f491);
    run_random_edits(4_096, 0x9e37_79b9);
}
