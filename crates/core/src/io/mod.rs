//! I/O for georeferenced rasters

mod geotiff;

pub use geotiff::{read_geotiff, write_geotiff};
