#![deny(missing_docs)]
#![doc = "Collective persistence of named fields: shared containers and flattened per-field arrays."]

pub mod container;
pub mod flatten;

pub use container::{open_container, read_slab, write_container, Container, FieldStore};
pub use flatten::{flat_path, flatten, read_flat, FlatField};
