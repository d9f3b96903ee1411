//! # BivarGis Core
//!
//! Core types and I/O for the BivarGis bivariate raster toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System handling and WGS84/UTM transforms
//! - `Feedback`: Progress and diagnostic reporting channel
//! - Native GeoTIFF I/O

pub mod crs;
pub mod error;
pub mod feedback;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use feedback::{BufferedFeedback, Feedback, NullFeedback, TracingFeedback};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::feedback::{Feedback, NullFeedback, TracingFeedback};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
}
