#![deny(missing_docs)]
#![doc = "Distributed grids, wavenumber conventions, and the slab-decomposed spectral transform."]

pub mod grid;
pub mod reduce;
pub mod transform;
pub mod wavenumbers;

pub use grid::{assemble, half_len, FourierGrid, RealGrid};
pub use reduce::{global_mean, subtract_global_mean};
pub use transform::SpectralTransform;
pub use wavenumbers::{fft_wavenumbers, rfft_wavenumbers, WavenumberGrid};
