//! Distributed real-to-half-complex spectral transform.
//!
//! Bound to a fixed mesh shape and worker group at construction. The forward
//! direction runs a real-input FFT along z, a complex FFT along y, a
//! transpose-based redistribution across the group (the collective, and by
//! far the most expensive step per kernel invocation), then a complex FFT
//! along the now-local x axis. The output therefore comes out transposed:
//! full x-frequency range, y-frequency slab, half spectrum along z.
//!
//! `backward(forward(field, normalize=true))` reconstructs `field` to
//! floating tolerance: the forward pass optionally divides by `nmesh³` and
//! the backward pass is the plain unnormalized inverse.

use std::sync::Arc;

use lag_core::errors::{ErrorInfo, LagError};
use lag_core::{SlabLayout, WorkerCtx};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::grid::{half_len, FourierGrid, RealGrid};

/// Slab-decomposed 3D FFT for one mesh shape and one worker group.
pub struct SpectralTransform {
    nmesh: usize,
    real_layout: SlabLayout,
    freq_layout: SlabLayout,
    ctx: WorkerCtx,
    fwd: Arc<dyn Fft<f32>>,
    inv: Arc<dyn Fft<f32>>,
}

impl SpectralTransform {
    /// Plans the transform for `nmesh³` over the given worker context.
    pub fn new(ctx: &WorkerCtx, nmesh: usize) -> Result<Self, LagError> {
        if nmesh < 2 {
            return Err(LagError::Shape(
                ErrorInfo::new("mesh-too-small", "spectral transform requires nmesh >= 2")
                    .with_context("nmesh", nmesh.to_string()),
            ));
        }
        if nmesh < ctx.size() {
            return Err(LagError::Decomposition(
                ErrorInfo::new("mesh-underfilled", "nmesh must be at least the worker count")
                    .with_context("nmesh", nmesh.to_string())
                    .with_context("worker_count", ctx.size().to_string()),
            ));
        }
        let mut planner = FftPlanner::new();
        let fwd = planner.plan_fft_forward(nmesh);
        let inv = planner.plan_fft_inverse(nmesh);
        Ok(Self {
            nmesh,
            real_layout: SlabLayout::for_worker(ctx.rank(), ctx.size(), nmesh),
            freq_layout: SlabLayout::for_worker(ctx.rank(), ctx.size(), nmesh),
            ctx: ctx.clone(),
            fwd,
            inv,
        })
    }

    /// Global mesh size along every axis.
    pub fn nmesh(&self) -> usize {
        self.nmesh
    }

    /// Real-space slab layout (decomposed along x).
    pub fn real_layout(&self) -> SlabLayout {
        self.real_layout
    }

    /// Frequency-space slab layout (decomposed along the y-frequency axis).
    pub fn freq_layout(&self) -> SlabLayout {
        self.freq_layout
    }

    /// The worker context the transform's collectives run over.
    pub fn ctx(&self) -> &WorkerCtx {
        &self.ctx
    }

    /// Forward transform. `normalize` divides the spectrum by `nmesh³`; both
    /// conventions are used in the pipeline and must match the call site.
    pub fn forward(&self, grid: &RealGrid, normalize: bool) -> Result<FourierGrid, LagError> {
        self.check_layout(grid.layout(), self.real_layout, "real")?;
        let n = self.nmesh;
        let nzc = half_len(n);
        let lx = self.real_layout.local_len();
        let ly = self.freq_layout.local_len();
        let mut scratch =
            vec![Complex::new(0.0f32, 0.0); self.fwd.get_inplace_scratch_len()];
        let mut row = vec![Complex::new(0.0f32, 0.0); n];

        // Real-input FFT along z, keeping the non-redundant half spectrum.
        let mut halfz = vec![Complex::new(0.0f32, 0.0); lx * n * nzc];
        for x in 0..lx {
            for y in 0..n {
                let src = (x * n + y) * n;
                for z in 0..n {
                    row[z] = Complex::new(grid.data()[src + z], 0.0);
                }
                self.fwd.process_with_scratch(&mut row, &mut scratch);
                let dst = (x * n + y) * nzc;
                halfz[dst..dst + nzc].copy_from_slice(&row[..nzc]);
            }
        }

        // Complex FFT along y; still local to this worker's x-slab.
        for x in 0..lx {
            for z in 0..nzc {
                for y in 0..n {
                    row[y] = halfz[(x * n + y) * nzc + z];
                }
                self.fwd.process_with_scratch(&mut row, &mut scratch);
                for y in 0..n {
                    halfz[(x * n + y) * nzc + z] = row[y];
                }
            }
        }

        // Transpose redistribution, then the x FFT is local.
        let mut spectrum = self.redistribute_forward(&halfz);
        drop(halfz);
        for yl in 0..ly {
            for z in 0..nzc {
                for x in 0..n {
                    row[x] = spectrum[(x * ly + yl) * nzc + z];
                }
                self.fwd.process_with_scratch(&mut row, &mut scratch);
                for x in 0..n {
                    spectrum[(x * ly + yl) * nzc + z] = row[x];
                }
            }
        }

        if normalize {
            let scale = 1.0 / (n * n * n) as f32;
            for value in spectrum.iter_mut() {
                *value *= scale;
            }
        }
        FourierGrid::from_vec(self.freq_layout, spectrum)
    }

    /// Unnormalized inverse transform back to a real x-slab.
    pub fn backward(&self, grid: &FourierGrid) -> Result<RealGrid, LagError> {
        self.check_layout(grid.layout(), self.freq_layout, "frequency")?;
        let n = self.nmesh;
        let nzc = half_len(n);
        let lx = self.real_layout.local_len();
        let ly = self.freq_layout.local_len();
        let mut scratch =
            vec![Complex::new(0.0f32, 0.0); self.inv.get_inplace_scratch_len()];
        let mut row = vec![Complex::new(0.0f32, 0.0); n];

        let mut spectrum = grid.data().to_vec();
        for yl in 0..ly {
            for z in 0..nzc {
                for x in 0..n {
                    row[x] = spectrum[(x * ly + yl) * nzc + z];
                }
                self.inv.process_with_scratch(&mut row, &mut scratch);
                for x in 0..n {
                    spectrum[(x * ly + yl) * nzc + z] = row[x];
                }
            }
        }

        let mut halfz = self.redistribute_backward(&spectrum);
        drop(spectrum);
        for x in 0..lx {
            for z in 0..nzc {
                for y in 0..n {
                    row[y] = halfz[(x * n + y) * nzc + z];
                }
                self.inv.process_with_scratch(&mut row, &mut scratch);
                for y in 0..n {
                    halfz[(x * n + y) * nzc + z] = row[y];
                }
            }
        }

        // Rebuild the redundant half of the z spectrum from Hermitian
        // symmetry, invert, and keep the real parts.
        let mut out = RealGrid::zeros(self.real_layout);
        for x in 0..lx {
            for y in 0..n {
                let src = (x * n + y) * nzc;
                row[..nzc].copy_from_slice(&halfz[src..src + nzc]);
                for i in 1..n - nzc + 1 {
                    row[n - i] = row[i].conj();
                }
                self.inv.process_with_scratch(&mut row, &mut scratch);
                let dst = (x * n + y) * n;
                for z in 0..n {
                    out.data_mut()[dst + z] = row[z].re;
                }
            }
        }
        Ok(out)
    }

    fn check_layout(
        &self,
        actual: SlabLayout,
        expected: SlabLayout,
        space: &str,
    ) -> Result<(), LagError> {
        if actual != expected {
            return Err(LagError::Decomposition(
                ErrorInfo::new(
                    "slab-mismatch",
                    format!("grid layout does not match the transform's {space}-space decomposition"),
                )
                .with_context("expected", format!("{}..{}", expected.start, expected.end))
                .with_context("actual", format!("{}..{}", actual.start, actual.end))
                .with_hint("derive every slab from the same decomposition call"),
            ));
        }
        Ok(())
    }

    /// x-decomposed `(lx, n, nzc)` → y-decomposed `(n, ly, nzc)`.
    fn redistribute_forward(&self, halfz: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let n = self.nmesh;
        let nzc = half_len(n);
        let lx = self.real_layout.local_len();
        let ly = self.freq_layout.local_len();
        let size = self.ctx.size();

        let mut outgoing = Vec::with_capacity(size);
        for dest in 0..size {
            let dest_slab = SlabLayout::for_worker(dest, size, n);
            let mut block = Vec::with_capacity(lx * dest_slab.local_len() * nzc);
            for x in 0..lx {
                for y in dest_slab.start..dest_slab.end {
                    let src = (x * n + y) * nzc;
                    block.extend_from_slice(&halfz[src..src + nzc]);
                }
            }
            outgoing.push(block);
        }

        let received = self.ctx.exchange(outgoing);
        let mut full = vec![Complex::new(0.0f32, 0.0); n * ly * nzc];
        for (src, block) in received.into_iter().enumerate() {
            let src_slab = SlabLayout::for_worker(src, size, n);
            for xl in 0..src_slab.local_len() {
                let x = src_slab.start + xl;
                for yl in 0..ly {
                    let from = (xl * ly + yl) * nzc;
                    let to = (x * ly + yl) * nzc;
                    full[to..to + nzc].copy_from_slice(&block[from..from + nzc]);
                }
            }
        }
        full
    }

    /// y-decomposed `(n, ly, nzc)` → x-decomposed `(lx, n, nzc)`.
    fn redistribute_backward(&self, spectrum: &[Complex<f32>]) -> Vec<Complex<f32>> {
        let n = self.nmesh;
        let nzc = half_len(n);
        let lx = self.real_layout.local_len();
        let ly = self.freq_layout.local_len();
        let size = self.ctx.size();

        let mut outgoing = Vec::with_capacity(size);
        for dest in 0..size {
            let dest_slab = SlabLayout::for_worker(dest, size, n);
            let mut block = Vec::with_capacity(dest_slab.local_len() * ly * nzc);
            for x in dest_slab.start..dest_slab.end {
                let src = x * ly * nzc;
                block.extend_from_slice(&spectrum[src..src + ly * nzc]);
            }
            outgoing.push(block);
        }

        let received = self.ctx.exchange(outgoing);
        let mut halfz = vec![Complex::new(0.0f32, 0.0); lx * n * nzc];
        for (src, block) in received.into_iter().enumerate() {
            let src_slab = SlabLayout::for_worker(src, size, n);
            let ly_src = src_slab.local_len();
            for xl in 0..lx {
                for yl in 0..ly_src {
                    let y = src_slab.start + yl;
                    let from = (xl * ly_src + yl) * nzc;
                    let to = (xl * n + y) * nzc;
                    halfz[to..to + nzc].copy_from_slice(&block[from..from + nzc]);
                }
            }
        }
        halfz
    }
}
