//! Compute module - Voxel remapping and frame composition.

mod compositor;
mod transform;

pub mod pattern;

pub use compositor::*;
pub use transform::*;
