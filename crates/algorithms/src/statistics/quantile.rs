//! Tercile boundaries via linear-interpolated percentiles.

use bivargis_core::{Error, Raster, Result};

/// Percentile ranks splitting a population into terciles.
const TERCILE_RANKS: [f64; 2] = [33.333, 66.667];

/// The two boundary values splitting a population into thirds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TercileBoundaries {
    /// 33.333rd percentile
    pub q1: f64,
    /// 66.667th percentile
    pub q2: f64,
}

/// Compute tercile boundaries over the valid cells of a raster.
///
/// Nodata cells are excluded from the population. Percentiles use the
/// linear interpolation convention: rank `p` maps to fractional index
/// `p/100 * (n-1)` in the sorted sample. A single-cell population yields
/// `q1 == q2 == value`.
pub fn tercile_boundaries(raster: &Raster<f64>) -> Result<TercileBoundaries> {
    let mut values: Vec<f64> = raster
        .data()
        .iter()
        .copied()
        .filter(|&v| !raster.is_nodata(v))
        .collect();

    if values.is_empty() {
        return Err(Error::EmptyPopulation);
    }

    values.sort_by(|a, b| a.total_cmp(b));

    Ok(TercileBoundaries {
        q1: percentile_sorted(&values, TERCILE_RANKS[0]),
        q2: percentile_sorted(&values, TERCILE_RANKS[1]),
    })
}

fn percentile_sorted(sorted: &[f64], rank: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let position = rank / 100.0 * (n - 1) as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(n - 1);
    let fraction = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Classify a raster into tercile classes 1/2/3 against precomputed
/// boundaries.
///
/// Values at or below `q1` fall in class 1; values above `q1` and at or
/// below `q2` in class 2; the rest in class 3. Nodata stays nodata.
pub fn classify_terciles(raster: &Raster<f64>, bounds: TercileBoundaries) -> Raster<f64> {
    let (rows, cols) = raster.shape();
    let mut output: Raster<f64> = raster.with_same_meta(rows, cols);
    output.set_nodata(Some(f64::NAN));

    for ((row, col), &value) in raster.data().indexed_iter() {
        let class = if raster.is_nodata(value) {
            f64::NAN
        } else if value <= bounds.q1 {
            1.0
        } else if value <= bounds.q2 {
            2.0
        } else {
            3.0
        };
        output.data_mut()[(row, col)] = class;
    }

    output
}
