//! Tabulated transfer functions and their application in frequency space.
//!
//! A transfer table maps wavenumber magnitude to an amplitude ratio between
//! two power spectra. Application interpolates the table cubically at every
//! mode's `|k|`; requests outside the tabulated range continue the end
//! segment's polynomial rather than failing — an accepted approximation, not
//! an error.

use lag_core::errors::{ErrorInfo, LagError};
use lag_mesh::grid::{half_len, RealGrid};
use lag_mesh::transform::SpectralTransform;
use lag_mesh::wavenumbers::WavenumberGrid;

/// Natural cubic spline over strictly increasing knots.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots (natural boundary: zero at both ends).
    second: Vec<f64>,
}

impl CubicSpline {
    /// Fits the spline. Requires at least four strictly increasing knots.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, LagError> {
        if xs.len() != ys.len() {
            return Err(LagError::Growth(
                ErrorInfo::new("spline-len", "knot and value arrays differ in length")
                    .with_context("xs", xs.len().to_string())
                    .with_context("ys", ys.len().to_string()),
            ));
        }
        if xs.len() < 4 {
            return Err(LagError::Growth(
                ErrorInfo::new("spline-short", "cubic interpolation needs at least 4 knots")
                    .with_context("len", xs.len().to_string()),
            ));
        }
        if xs.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(LagError::Growth(ErrorInfo::new(
                "spline-order",
                "knots must be strictly increasing",
            )));
        }

        let n = xs.len();
        // Thomas algorithm on the natural-spline tridiagonal system.
        let mut sub = vec![0.0; n];
        let mut diag = vec![1.0; n];
        let mut sup = vec![0.0; n];
        let mut rhs = vec![0.0; n];
        for i in 1..n - 1 {
            let h0 = xs[i] - xs[i - 1];
            let h1 = xs[i + 1] - xs[i];
            sub[i] = h0;
            diag[i] = 2.0 * (h0 + h1);
            sup[i] = h1;
            rhs[i] = 6.0 * ((ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0);
        }
        for i in 1..n {
            let w = sub[i] / diag[i - 1];
            diag[i] -= w * sup[i - 1];
            rhs[i] -= w * rhs[i - 1];
        }
        let mut second = vec![0.0; n];
        second[n - 1] = rhs[n - 1] / diag[n - 1];
        for i in (0..n - 1).rev() {
            second[i] = (rhs[i] - sup[i] * second[i + 1]) / diag[i];
        }
        Ok(Self { xs, ys, second })
    }

    /// Evaluates the spline, extrapolating with the end segments' cubics.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        let seg = match self.xs.binary_search_by(|knot| knot.total_cmp(&x)) {
            Ok(idx) => idx.min(n - 2),
            Err(0) => 0,
            Err(idx) => (idx - 1).min(n - 2),
        };
        let h = self.xs[seg + 1] - self.xs[seg];
        let t = x - self.xs[seg];
        let slope = (self.ys[seg + 1] - self.ys[seg]) / h
            - h * (2.0 * self.second[seg] + self.second[seg + 1]) / 6.0;
        self.ys[seg]
            + slope * t
            + self.second[seg] / 2.0 * t * t
            + (self.second[seg + 1] - self.second[seg]) / (6.0 * h) * t * t * t
    }
}

/// Tabulated amplitude ratio over wavenumber magnitude.
#[derive(Debug, Clone)]
pub struct TransferTable {
    spline: CubicSpline,
}

impl TransferTable {
    /// Builds the table from tabulated `(k, transfer)` pairs.
    pub fn new(k: Vec<f64>, transfer: Vec<f64>) -> Result<Self, LagError> {
        Ok(Self {
            spline: CubicSpline::new(k, transfer)?,
        })
    }

    /// Builds the table as `sqrt(P_target / P_init)` per tabulated mode.
    pub fn from_spectra(k: &[f64], p_target: &[f64], p_init: &[f64]) -> Result<Self, LagError> {
        if k.len() != p_target.len() || k.len() != p_init.len() {
            return Err(LagError::Growth(
                ErrorInfo::new("spectra-len", "power spectra must share the wavenumber grid")
                    .with_context("k", k.len().to_string())
                    .with_context("target", p_target.len().to_string())
                    .with_context("init", p_init.len().to_string()),
            ));
        }
        if p_init.iter().any(|&p| p <= 0.0) {
            return Err(LagError::Growth(ErrorInfo::new(
                "spectra-nonpositive",
                "initial power spectrum must be positive everywhere",
            )));
        }
        let transfer = p_target
            .iter()
            .zip(p_init)
            .map(|(t, i)| (t / i).sqrt())
            .collect();
        Self::new(k.to_vec(), transfer)
    }

    /// Interpolated (or extrapolated) transfer value at `|k|`.
    pub fn eval(&self, k: f64) -> f64 {
        self.spline.eval(k)
    }
}

/// Rescales a real field by a radial transfer function.
///
/// The zero-wavenumber cell's multiplier is forced to exactly 1 so the
/// field's mean is never touched by the table.
pub fn apply_transfer(
    transform: &SpectralTransform,
    kgrid: &WavenumberGrid,
    field: &RealGrid,
    table: &TransferTable,
) -> Result<RealGrid, LagError> {
    let mut spectrum = transform.forward(field, true)?;
    let n = transform.nmesh();
    let nzc = half_len(n);
    let ly = transform.freq_layout().local_len();
    let zero = kgrid.zero_mode();

    for x in 0..n {
        for yl in 0..ly {
            for z in 0..nzc {
                let idx = (x * ly + yl) * nzc + z;
                let weight = if zero == Some((x, yl, z)) {
                    1.0
                } else {
                    table.eval(kgrid.k_squared(x, yl, z).sqrt())
                };
                spectrum.data_mut()[idx] *= weight as f32;
            }
        }
    }
    transform.backward(&spectrum)
}
