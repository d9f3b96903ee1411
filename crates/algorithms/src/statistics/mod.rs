//! Statistical summaries over raster populations

mod quantile;

pub use quantile::{classify_terciles, tercile_boundaries, TercileBoundaries};
