//! Translation engine: type-level and structural mapping between the two
//! schema trees.
//!
//! `types` handles leaf-level payloads (scalars, enums, bit sets, unions,
//! identity and node references). `to_sdf` and `to_yang` walk tree shapes,
//! delegating to `types` per leaf and registering every cross-link with the
//! resolver instead of chasing it.

pub mod to_sdf;
pub mod to_yang;
pub mod types;

pub use to_sdf::translate_module;
pub use to_yang::translate_document;
