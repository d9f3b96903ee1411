//! # BivarGis Style
//!
//! Color palettes and QML style export for bivariate code rasters
//! (values 11-33). A palette is an ordered list of nine
//! (code, label, color) entries; the exporter serializes it as a QGIS
//! paletted-raster style document and can drop a sidecar style next to
//! a raster file.

pub mod palette;
pub mod qml;

pub use palette::{Palette, PaletteEntry, Rgb};
pub use qml::{apply_style, render_qml, write_style};

use thiserror::Error;

/// Errors from palette validation and style serialization.
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("Invalid palette: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StyleError>;
