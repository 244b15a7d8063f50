//! Slab-decomposed real and half-complex grids.
//!
//! A real grid holds one worker's contiguous x-slab of an `nmesh³` scalar
//! field, indexed `[x_local][y][z]`. Its frequency-space counterpart comes
//! out of the distributed transform transposed: full x-frequency range along
//! axis 0, this worker's y-frequency slab along axis 1, and the half
//! spectrum (real-input redundancy removed) along axis 2.

use lag_core::errors::{ErrorInfo, LagError};
use lag_core::{SlabLayout, WorkerCtx};
use rustfft::num_complex::Complex;

/// Number of retained half-spectrum modes along the packed axis.
pub fn half_len(nmesh: usize) -> usize {
    nmesh / 2 + 1
}

/// One worker's x-slab of a real scalar field over an `nmesh³` mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct RealGrid {
    layout: SlabLayout,
    data: Vec<f32>,
}

impl RealGrid {
    /// Zero-filled slab for the given layout.
    pub fn zeros(layout: SlabLayout) -> Self {
        let len = layout.local_len() * layout.nmesh * layout.nmesh;
        Self {
            layout,
            data: vec![0.0; len],
        }
    }

    /// Wraps an existing slab buffer, checking its length against the layout.
    pub fn from_vec(layout: SlabLayout, data: Vec<f32>) -> Result<Self, LagError> {
        let expected = layout.local_len() * layout.nmesh * layout.nmesh;
        if data.len() != expected {
            return Err(LagError::Shape(
                ErrorInfo::new("real-grid-len", "slab buffer length does not match layout")
                    .with_context("expected", expected.to_string())
                    .with_context("actual", data.len().to_string()),
            ));
        }
        Ok(Self { layout, data })
    }

    /// The slab layout this grid was built for.
    pub fn layout(&self) -> SlabLayout {
        self.layout
    }

    /// Global mesh size along every axis.
    pub fn nmesh(&self) -> usize {
        self.layout.nmesh
    }

    /// Flat index of local cell `(x_local, y, z)`.
    pub fn idx(&self, x_local: usize, y: usize, z: usize) -> usize {
        (x_local * self.layout.nmesh + y) * self.layout.nmesh + z
    }

    /// Read-only view of the slab values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view of the slab values.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the grid and returns the slab buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

/// One worker's transposed slab of a half-complex spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct FourierGrid {
    layout: SlabLayout,
    data: Vec<Complex<f32>>,
}

impl FourierGrid {
    /// Zero-filled transposed slab for the given frequency layout.
    pub fn zeros(layout: SlabLayout) -> Self {
        let len = layout.nmesh * layout.local_len() * half_len(layout.nmesh);
        Self {
            layout,
            data: vec![Complex::new(0.0, 0.0); len],
        }
    }

    /// Wraps an existing spectrum buffer, checking its length.
    pub fn from_vec(layout: SlabLayout, data: Vec<Complex<f32>>) -> Result<Self, LagError> {
        let expected = layout.nmesh * layout.local_len() * half_len(layout.nmesh);
        if data.len() != expected {
            return Err(LagError::Shape(
                ErrorInfo::new("fourier-grid-len", "spectrum buffer length does not match layout")
                    .with_context("expected", expected.to_string())
                    .with_context("actual", data.len().to_string()),
            ));
        }
        Ok(Self { layout, data })
    }

    /// The frequency-space slab layout (decomposed along the y-frequency axis).
    pub fn layout(&self) -> SlabLayout {
        self.layout
    }

    /// Global mesh size along every axis.
    pub fn nmesh(&self) -> usize {
        self.layout.nmesh
    }

    /// Flat index of local mode `(x, y_local, z)`.
    pub fn idx(&self, x: usize, y_local: usize, z: usize) -> usize {
        (x * self.layout.local_len() + y_local) * half_len(self.layout.nmesh) + z
    }

    /// Read-only view of the spectrum values.
    pub fn data(&self) -> &[Complex<f32>] {
        &self.data
    }

    /// Mutable view of the spectrum values.
    pub fn data_mut(&mut self) -> &mut [Complex<f32>] {
        &mut self.data
    }
}

/// Gathers the full `nmesh³` field onto the root worker, slab by slab in
/// rank order. Collective: every worker must call it; only the root receives
/// the assembled array.
pub fn assemble(ctx: &WorkerCtx, grid: &RealGrid) -> Option<Vec<f32>> {
    let mut outgoing: Vec<Vec<f32>> = Vec::with_capacity(ctx.size());
    for dest in 0..ctx.size() {
        if dest == 0 {
            outgoing.push(grid.data().to_vec());
        } else {
            outgoing.push(Vec::new());
        }
    }
    let received = ctx.exchange(outgoing);
    if ctx.is_root() {
        let n = grid.nmesh();
        let mut full = Vec::with_capacity(n * n * n);
        for slab in received {
            full.extend_from_slice(&slab);
        }
        Some(full)
    } else {
        None
    }
}
