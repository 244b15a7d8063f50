//! Slab decomposition of an `nmesh³` grid across a fixed worker group.
//!
//! Every component that reads, writes, or reassembles slabs must derive its
//! ranges from this module. A second, independently implemented rule is how
//! decomposition-mismatch bugs are born; they surface as corrupted collective
//! operations, not as recoverable errors.

use serde::{Deserialize, Serialize};

/// Half-open axis range `[start, end)` assigned to worker `rank`.
///
/// The rule is `[rank*nmesh/count, (rank+1)*nmesh/count)` with integer floor
/// division; the last worker absorbs the remainder of non-divisible mesh
/// sizes. For any `nmesh >= worker_count` the union of all workers' ranges is
/// exactly `[0, nmesh)`, disjoint and gap-free.
pub fn slab_range(rank: usize, worker_count: usize, nmesh: usize) -> (usize, usize) {
    debug_assert!(worker_count > 0, "worker_count must be positive");
    debug_assert!(rank < worker_count, "rank out of range");
    (rank * nmesh / worker_count, (rank + 1) * nmesh / worker_count)
}

/// Slab assignment of one axis of an `nmesh³` grid to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabLayout {
    /// Global mesh size along every axis.
    pub nmesh: usize,
    /// First global index owned by this worker along the decomposed axis.
    pub start: usize,
    /// One past the last global index owned by this worker.
    pub end: usize,
}

impl SlabLayout {
    /// Builds the layout for `rank` within a group of `worker_count`.
    pub fn for_worker(rank: usize, worker_count: usize, nmesh: usize) -> Self {
        let (start, end) = slab_range(rank, worker_count, nmesh);
        Self { nmesh, start, end }
    }

    /// Number of planes owned by this worker along the decomposed axis.
    pub fn local_len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the global index `idx` falls inside this worker's range.
    pub fn contains(&self, idx: usize) -> bool {
        idx >= self.start && idx < self.end
    }
}
