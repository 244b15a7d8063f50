//! Tidal-tensor kernels.
//!
//! The squared tidal field is `s² = s_ij s_ij` where
//! `s_ij = (k_i k_j / k² − δ_ij/3) · δ_k` in frequency space. Only the six
//! independent pairs of the symmetric tensor are transformed; summing the
//! full 3×3 contraction double-counts each off-diagonal pair.

use lag_core::errors::{ErrorInfo, LagError};
use lag_mesh::grid::{half_len, FourierGrid, RealGrid};
use lag_mesh::transform::SpectralTransform;
use lag_mesh::wavenumbers::WavenumberGrid;

/// Independent index pairs of the symmetric tidal tensor, in xx, xy, xz,
/// yy, yz, zz order.
pub const TENSOR_PAIRS: [(usize, usize); 6] = [(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)];

fn kronecker(i: usize, j: usize) -> f64 {
    if i == j {
        1.0
    } else {
        0.0
    }
}

fn axis_component(kgrid: &WavenumberGrid, axis: usize, x: usize, y_local: usize, z: usize) -> f64 {
    match axis {
        0 => kgrid.kx[x],
        1 => kgrid.ky[y_local],
        _ => kgrid.kz[z],
    }
}

fn check_frequency_layout(
    transform: &SpectralTransform,
    kgrid: &WavenumberGrid,
    delta_k: &FourierGrid,
) -> Result<(), LagError> {
    if kgrid.layout() != transform.freq_layout() || delta_k.layout() != transform.freq_layout() {
        return Err(LagError::Decomposition(
            ErrorInfo::new(
                "kernel-slab-mismatch",
                "wavenumber grid, spectrum, and transform disagree on the frequency decomposition",
            )
            .with_hint("build all three from the same worker context"),
        ));
    }
    Ok(())
}

/// One real-space component `s_ij` of the tidal tensor.
///
/// The single zero-`k²` cell is masked to 1 before dividing and the kernel's
/// result at that cell is overwritten with its limiting value of zero, so the
/// tensor stays traceless cell by cell.
pub fn tidal_component(
    transform: &SpectralTransform,
    kgrid: &WavenumberGrid,
    delta_k: &FourierGrid,
    i: usize,
    j: usize,
) -> Result<RealGrid, LagError> {
    check_frequency_layout(transform, kgrid, delta_k)?;
    let n = transform.nmesh();
    let nzc = half_len(n);
    let ly = transform.freq_layout().local_len();
    let zero = kgrid.zero_mode();

    let mut component = FourierGrid::zeros(transform.freq_layout());
    for x in 0..n {
        for yl in 0..ly {
            for z in 0..nzc {
                let idx = (x * ly + yl) * nzc + z;
                if zero == Some((x, yl, z)) {
                    continue;
                }
                let k_i = axis_component(kgrid, i, x, yl, z);
                let k_j = axis_component(kgrid, j, x, yl, z);
                let mut ksq = kgrid.k_squared(x, yl, z);
                if ksq == 0.0 {
                    ksq = 1.0;
                }
                let weight = (k_i * k_j / ksq - kronecker(i, j) / 3.0) as f32;
                component.data_mut()[idx] = delta_k.data()[idx] * weight;
            }
        }
    }
    transform.backward(&component)
}

/// The squared tidal field `s²` derived from a transformed density.
///
/// Nonnegative everywhere by construction; callers mean-subtract afterwards.
pub fn tidesq(
    transform: &SpectralTransform,
    kgrid: &WavenumberGrid,
    delta_k: &FourierGrid,
) -> Result<RealGrid, LagError> {
    let mut out = RealGrid::zeros(transform.real_layout());
    for (i, j) in TENSOR_PAIRS {
        let component = tidal_component(transform, kgrid, delta_k, i, j)?;
        let weight = if i == j { 1.0f32 } else { 2.0 };
        for (acc, value) in out.data_mut().iter_mut().zip(component.data()) {
            *acc += weight * value * value;
        }
    }
    Ok(out)
}
