//! Curvature (Laplacian) kernel.

use lag_core::errors::{ErrorInfo, LagError};
use lag_mesh::grid::{half_len, FourierGrid, RealGrid};
use lag_mesh::transform::SpectralTransform;
use lag_mesh::wavenumbers::WavenumberGrid;

/// The Laplacian field `∇²δ = IFFT(−k² δ_k)`.
///
/// No division by `k²` occurs, so the zero mode needs no masking: its
/// multiplier is exactly zero, which is also what makes the periodic
/// Laplacian a zero-mean field.
pub fn nablasq(
    transform: &SpectralTransform,
    kgrid: &WavenumberGrid,
    delta_k: &FourierGrid,
) -> Result<RealGrid, LagError> {
    if kgrid.layout() != transform.freq_layout() || delta_k.layout() != transform.freq_layout() {
        return Err(LagError::Decomposition(
            ErrorInfo::new(
                "kernel-slab-mismatch",
                "wavenumber grid, spectrum, and transform disagree on the frequency decomposition",
            )
            .with_hint("build all three from the same worker context"),
        ));
    }
    let n = transform.nmesh();
    let nzc = half_len(n);
    let ly = transform.freq_layout().local_len();

    let mut scaled = FourierGrid::zeros(transform.freq_layout());
    for x in 0..n {
        for yl in 0..ly {
            for z in 0..nzc {
                let idx = (x * ly + yl) * nzc + z;
                let ksq = kgrid.k_squared(x, yl, z);
                scaled.data_mut()[idx] = delta_k.data()[idx] * (-(ksq) as f32);
            }
        }
    }
    transform.backward(&scaled)
}
