#![deny(missing_docs)]
#![doc = "Core error types, slab decomposition, and worker execution context for the lag-field engine."]

pub mod decomp;
pub mod errors;
pub mod provenance;
pub mod worker;

pub use decomp::{slab_range, SlabLayout};
pub use errors::{ErrorInfo, LagError};
pub use provenance::{sha256_hex, RunProvenance, SchemaVersion};
pub use worker::{spawn_workers, WorkerCtx};
