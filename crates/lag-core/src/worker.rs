//! Explicit worker execution context and its collective operations.
//!
//! The engine is single-program-multiple-data: a fixed worker count is
//! established once, every worker executes the identical control flow over
//! its own slab, and workers synchronize only at collective calls. Instead of
//! process-wide rank/communicator globals, a [`WorkerCtx`] value is created
//! once per worker and passed to every component, which also lets kernels be
//! unit tested with a solo context and no real group.
//!
//! Collectives are blocking and must be reached by every worker with matching
//! arguments. A branch that decides whether a collective executes must be
//! derived from shared configuration, never from per-worker data; divergence
//! is a programming error and panics the group (the in-process equivalent of
//! the deadlock it would cause on a real distributed run). There are no
//! cancellation or timeout semantics: a stalled worker stalls the run.

use std::any::Any;
use std::sync::{Arc, Barrier, Mutex};

use crate::errors::{ErrorInfo, LagError};

/// Per-worker execution context: rank, group size, and collective backend.
#[derive(Clone)]
pub struct WorkerCtx {
    rank: usize,
    size: usize,
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Solo,
    Group(Arc<GroupShared>),
}

struct GroupShared {
    barrier: Barrier,
    /// `mailboxes[dest][src]`: one slot per directed worker pair.
    mailboxes: Vec<Vec<Mutex<Option<Box<dyn Any + Send>>>>>,
    scalar: Mutex<f64>,
}

impl GroupShared {
    fn new(size: usize) -> Self {
        let mailboxes = (0..size)
            .map(|_| (0..size).map(|_| Mutex::new(None)).collect::<Vec<_>>())
            .collect();
        Self {
            barrier: Barrier::new(size),
            mailboxes,
            scalar: Mutex::new(0.0),
        }
    }
}

impl WorkerCtx {
    /// Context for a group of one; every collective degenerates to identity.
    pub fn solo() -> Self {
        Self {
            rank: 0,
            size: 1,
            backend: Backend::Solo,
        }
    }

    /// This worker's rank within the group.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Total number of workers in the group.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this worker coordinates root-addressed collectives and I/O.
    pub fn is_root(&self) -> bool {
        self.rank == 0
    }

    /// Blocks until every worker in the group has reached this call.
    pub fn barrier(&self) {
        if let Backend::Group(shared) = &self.backend {
            shared.barrier.wait();
        }
    }

    /// Gathers one scalar from every worker onto the root.
    ///
    /// Returns `Some(values)` (indexed by source rank) on the root and `None`
    /// everywhere else. Collective: every worker must call it.
    pub fn gather(&self, local: f64) -> Option<Vec<f64>> {
        match &self.backend {
            Backend::Solo => Some(vec![local]),
            Backend::Group(shared) => {
                *slot(shared, 0, self.rank) = Some(Box::new(local));
                shared.barrier.wait();
                let gathered = if self.rank == 0 {
                    let mut values = Vec::with_capacity(self.size);
                    for src in 0..self.size {
                        let boxed = slot(shared, 0, src)
                            .take()
                            .expect("gather: a worker skipped the collective");
                        values.push(
                            *boxed
                                .downcast::<f64>()
                                .expect("gather: mismatched collective payload type"),
                        );
                    }
                    Some(values)
                } else {
                    None
                };
                shared.barrier.wait();
                gathered
            }
        }
    }

    /// Broadcasts one scalar from the root so every worker observes the
    /// identical value. The root passes `Some(value)`, everyone else `None`.
    pub fn broadcast(&self, value: Option<f64>) -> f64 {
        match &self.backend {
            Backend::Solo => value.expect("broadcast: root must supply a value"),
            Backend::Group(shared) => {
                if self.rank == 0 {
                    *shared.scalar.lock().expect("broadcast: group poisoned") =
                        value.expect("broadcast: root must supply a value");
                }
                shared.barrier.wait();
                let observed = *shared.scalar.lock().expect("broadcast: group poisoned");
                shared.barrier.wait();
                observed
            }
        }
    }

    /// All-to-all block exchange: `outgoing[d]` is delivered to worker `d`;
    /// the return value holds one block per source rank. This is the
    /// transpose primitive of the distributed transform and the most
    /// expensive collective in the engine.
    pub fn exchange<T: Send + 'static>(&self, outgoing: Vec<T>) -> Vec<T> {
        assert_eq!(
            outgoing.len(),
            self.size,
            "exchange: one outgoing block per worker is required"
        );
        match &self.backend {
            Backend::Solo => outgoing,
            Backend::Group(shared) => {
                for (dest, block) in outgoing.into_iter().enumerate() {
                    *slot(shared, dest, self.rank) = Some(Box::new(block));
                }
                shared.barrier.wait();
                let mut received = Vec::with_capacity(self.size);
                for src in 0..self.size {
                    let boxed = slot(shared, self.rank, src)
                        .take()
                        .expect("exchange: a worker skipped the collective");
                    received.push(
                        *boxed
                            .downcast::<T>()
                            .expect("exchange: mismatched collective payload type"),
                    );
                }
                shared.barrier.wait();
                received
            }
        }
    }
}

fn slot<'a>(
    shared: &'a GroupShared,
    dest: usize,
    src: usize,
) -> std::sync::MutexGuard<'a, Option<Box<dyn Any + Send>>> {
    shared.mailboxes[dest][src]
        .lock()
        .expect("collective mailbox poisoned by a failed worker")
}

/// Runs `body` as an SPMD group of `worker_count` OS threads, one per
/// worker, and returns the per-worker results indexed by rank.
pub fn spawn_workers<T, F>(worker_count: usize, body: F) -> Result<Vec<T>, LagError>
where
    F: Fn(WorkerCtx) -> T + Sync,
    T: Send,
{
    if worker_count == 0 {
        return Err(LagError::Comm(ErrorInfo::new(
            "empty-group",
            "worker_count must be at least 1",
        )));
    }
    let shared = Arc::new(GroupShared::new(worker_count));
    let joined = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..worker_count)
            .map(|rank| {
                let ctx = WorkerCtx {
                    rank,
                    size: worker_count,
                    backend: Backend::Group(Arc::clone(&shared)),
                };
                let body = &body;
                scope.spawn(move || body(ctx))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Result<Vec<_>, _>>()
    });
    joined.map_err(|_| {
        LagError::Comm(
            ErrorInfo::new("worker-panic", "a worker thread panicked")
                .with_hint("the run cannot be resumed; fix the input or code and re-run"),
        )
    })
}
