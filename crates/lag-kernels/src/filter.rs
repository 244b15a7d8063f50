//! Gaussian low-pass filtering in frequency space.

use lag_core::errors::LagError;
use lag_mesh::grid::{half_len, RealGrid};
use lag_mesh::transform::SpectralTransform;
use lag_mesh::wavenumbers::WavenumberGrid;

/// Default smoothing cutoff when the configuration leaves it unspecified:
/// `π · nmesh / Lbox`, the mesh Nyquist wavenumber.
pub fn default_cutoff(nmesh: usize, lbox: f64) -> f64 {
    std::f64::consts::PI * nmesh as f64 / lbox
}

/// Applies `exp(−k² / (2 kcut²))` to a real field.
///
/// The zero-mode multiplier is exactly 1, so the field's global mean is
/// preserved; there is no division anywhere in this kernel.
pub fn gaussian_filter(
    transform: &SpectralTransform,
    kgrid: &WavenumberGrid,
    field: &RealGrid,
    kcut: f64,
) -> Result<RealGrid, LagError> {
    let mut spectrum = transform.forward(field, true)?;
    let n = transform.nmesh();
    let nzc = half_len(n);
    let ly = transform.freq_layout().local_len();
    let denom = 2.0 * kcut * kcut;

    for x in 0..n {
        for yl in 0..ly {
            for z in 0..nzc {
                let idx = (x * ly + yl) * nzc + z;
                let weight = (-kgrid.k_squared(x, yl, z) / denom).exp() as f32;
                spectrum.data_mut()[idx] *= weight;
            }
        }
    }
    transform.backward(&spectrum)
}
