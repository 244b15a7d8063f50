#![deny(missing_docs)]
#![doc = "Spectral field-derivation kernels for Lagrangian bias basis fields."]

pub mod curvature;
pub mod filter;
pub mod growth;
pub mod tidal;
pub mod transfer;

pub use curvature::nablasq;
pub use filter::{default_cutoff, gaussian_filter};
pub use growth::{Cosmology, GrowthSolver};
pub use tidal::{tidal_component, tidesq, TENSOR_PAIRS};
pub use transfer::{apply_transfer, CubicSpline, TransferTable};
