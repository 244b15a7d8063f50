//! Per-slab wavenumber coordinate grids.
//!
//! Built once per (mesh size, box size, decomposition, worker) and passed to
//! every kernel, so the whole pipeline shares one frequency convention. The
//! discrete values are `fftfreq(n) * 2π n / L` along the two full-range axes
//! and `rfftfreq(n) * 2π n / L` along the half-spectrum axis, restricted to
//! the worker's slab along the frequency-decomposed axis.

use lag_core::SlabLayout;

use crate::grid::half_len;

/// Frequency coordinates for one worker's transposed spectrum slab.
#[derive(Debug, Clone)]
pub struct WavenumberGrid {
    /// Full-range wavenumbers along the x-frequency axis (axis 0), length `nmesh`.
    pub kx: Vec<f64>,
    /// Slab-restricted wavenumbers along the y-frequency axis (axis 1).
    pub ky: Vec<f64>,
    /// Half-spectrum wavenumbers along the z-frequency axis (axis 2), length `nmesh/2+1`.
    pub kz: Vec<f64>,
    layout: SlabLayout,
}

impl WavenumberGrid {
    /// Builds the coordinate grids for the given frequency-space layout.
    pub fn new(lbox: f64, layout: SlabLayout) -> Self {
        let n = layout.nmesh;
        let full = fft_wavenumbers(n, lbox);
        let ky = full[layout.start..layout.end].to_vec();
        Self {
            kx: full,
            ky,
            kz: rfft_wavenumbers(n, lbox),
            layout,
        }
    }

    /// The frequency-space slab layout the grids were restricted to.
    pub fn layout(&self) -> SlabLayout {
        self.layout
    }

    /// Squared wavenumber norm at local mode `(x, y_local, z)`.
    pub fn k_squared(&self, x: usize, y_local: usize, z: usize) -> f64 {
        let kx = self.kx[x];
        let ky = self.ky[y_local];
        let kz = self.kz[z];
        kx * kx + ky * ky + kz * kz
    }

    /// Local index of the single global zero-wavenumber cell, if this worker
    /// owns it. Exactly one worker in the group returns `Some`; kernels that
    /// divide by `k²` must special-case this cell.
    pub fn zero_mode(&self) -> Option<(usize, usize, usize)> {
        if self.layout.contains(0) {
            Some((0, 0, 0))
        } else {
            None
        }
    }
}

/// Full-range discrete wavenumbers: `2π/L` times the signed mode index.
pub fn fft_wavenumbers(nmesh: usize, lbox: f64) -> Vec<f64> {
    let scale = 2.0 * std::f64::consts::PI / lbox;
    (0..nmesh)
        .map(|i| {
            let signed = if i <= (nmesh - 1) / 2 {
                i as f64
            } else {
                i as f64 - nmesh as f64
            };
            scale * signed
        })
        .collect()
}

/// Half-spectrum discrete wavenumbers for real input: `2π i / L`, `i = 0..n/2`.
pub fn rfft_wavenumbers(nmesh: usize, lbox: f64) -> Vec<f64> {
    let scale = 2.0 * std::f64::consts::PI / lbox;
    (0..half_len(nmesh)).map(|i| scale * i as f64).collect()
}
