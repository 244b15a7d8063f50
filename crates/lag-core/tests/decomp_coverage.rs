use lag_core::decomp::{slab_range, SlabLayout};
use proptest::prelude::*;

fn assert_covers(worker_count: usize, nmesh: usize) {
    let mut next = 0usize;
    for rank in 0..worker_count {
        let (start, end) = slab_range(rank, worker_count, nmesh);
        assert_eq!(start, next, "gap or overlap at rank {rank}");
        assert!(end >= start);
        next = end;
    }
    assert_eq!(next, nmesh, "union must be exactly [0, nmesh)");
}

#[test]
fn divisible_mesh_splits_evenly() {
    for rank in 0..4 {
        let (start, end) = slab_range(rank, 4, 16);
        assert_eq!(end - start, 4);
        assert_eq!(start, rank * 4);
    }
}

#[test]
fn last_worker_absorbs_remainder() {
    // nmesh=10 over 4 workers: floor-division ranges 0..2, 2..5, 5..7, 7..10.
    assert_eq!(slab_range(0, 4, 10), (0, 2));
    assert_eq!(slab_range(1, 4, 10), (2, 5));
    assert_eq!(slab_range(2, 4, 10), (5, 7));
    assert_eq!(slab_range(3, 4, 10), (7, 10));
}

#[test]
fn single_worker_owns_everything() {
    assert_eq!(slab_range(0, 1, 8), (0, 8));
}

#[test]
fn layout_matches_range_rule() {
    let layout = SlabLayout::for_worker(2, 3, 11);
    let (start, end) = slab_range(2, 3, 11);
    assert_eq!((layout.start, layout.end), (start, end));
    assert_eq!(layout.local_len(), end - start);
    assert!(layout.contains(start));
    assert!(!layout.contains(end));
}

proptest! {
    #[test]
    fn ranges_cover_without_gaps(worker_count in 1usize..17, nmesh in 1usize..257) {
        prop_assume!(nmesh >= worker_count);
        assert_covers(worker_count, nmesh);
    }
}
