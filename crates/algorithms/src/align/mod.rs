//! Grid alignment
//!
//! Resamples a raster onto the exact pixel grid of a reference raster
//! (same origin, resolution, extent and CRS), reprojecting when the
//! target CRS differs from the source's.

mod resample;
mod target;

pub use resample::{align, align_to_target};
pub use target::AlignTarget;
