//! Error types for BivarGis

use thiserror::Error;

/// Main error type for BivarGis operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid input raster: {0}")]
    InvalidInput(String),

    #[error("Alignment failed: {0}")]
    Alignment(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Raster calculator failed in both backends.\nPrimary error: {primary}\nSecondary error: {secondary}")]
    Evaluation { primary: String, secondary: String },

    #[error("No valid pixels to compute quantiles")]
    EmptyPopulation,

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for BivarGis operations
pub type Result<T> = std::result::Result<T, Error>;
