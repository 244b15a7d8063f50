//! Cross-worker scalar reductions.

use lag_core::WorkerCtx;

use crate::grid::RealGrid;

/// Global mean of a slab-decomposed field, identical on every worker.
///
/// Each worker sums its slab, the sums are gathered onto the root, the root
/// divides by `nmesh³`, and the result is broadcast back so every worker
/// mean-subtracts with the same value. The two-phase gather/broadcast keeps
/// the engine's root-coordinated style; an all-reduce would be equivalent as
/// long as every worker observes the identical value.
pub fn global_mean(ctx: &WorkerCtx, grid: &RealGrid) -> f64 {
    let local: f64 = grid.data().iter().map(|&v| v as f64).sum();
    let gathered = ctx.gather(local);
    let mean = gathered.map(|sums| {
        let n = grid.nmesh() as f64;
        sums.iter().sum::<f64>() / (n * n * n)
    });
    ctx.broadcast(mean)
}

/// Subtracts the global mean in place and returns the mean that was removed.
pub fn subtract_global_mean(ctx: &WorkerCtx, grid: &mut RealGrid) -> f64 {
    let mean = global_mean(ctx, grid);
    let shift = mean as f32;
    for value in grid.data_mut() {
        *value -= shift;
    }
    mean
}
