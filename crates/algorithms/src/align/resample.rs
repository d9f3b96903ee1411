//! Bilinear resampling onto an alignment target

use crate::align::AlignTarget;
use crate::maybe_rayon::*;
use bivargis_core::crs::CrsTransform;
use bivargis_core::{Error, Raster, Result, CRS};

/// Align `source` onto the pixel grid of `reference`.
///
/// Derives an [`AlignTarget`] from the reference (optionally in
/// `target_crs`) and resamples `source` onto that exact grid with bilinear
/// interpolation, producing floating-point output with NaN nodata.
///
/// Aligning a raster to itself is a no-op transformation: every target
/// pixel center maps back onto a source pixel center, so the bilinear
/// weights collapse to identity.
pub fn align(
    source: &Raster<f64>,
    reference: &Raster<f64>,
    target_crs: Option<&CRS>,
) -> Result<Raster<f64>> {
    let target = AlignTarget::from_reference(reference, target_crs)?;
    align_to_target(source, &target)
}

/// Resample `source` onto an explicit alignment target.
pub fn align_to_target(source: &Raster<f64>, target: &AlignTarget) -> Result<Raster<f64>> {
    if source.is_empty() {
        return Err(Error::InvalidInput("source raster is empty".into()));
    }

    // Points are pulled from target grid coordinates back into source
    // coordinates, so the transform runs target -> source.
    let to_source = CrsTransform::between(target.crs.as_ref(), source.crs())?;
    let gt = target.transform();
    let (rows, cols) = (target.rows, target.cols);

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, cell) in row_data.iter_mut().enumerate() {
                let (x, y) = gt.pixel_to_geo(col, row);
                let (sx, sy) = to_source.apply(x, y);
                let (colf, rowf) = source.transform().geo_to_pixel(sx, sy);
                *cell = sample_bilinear(source, colf, rowf);
            }
            row_data
        })
        .collect();

    let mut output: Raster<f64> = Raster::from_vec(data, rows, cols)?;
    output.set_transform(gt);
    output.set_crs(target.crs.clone());
    output.set_nodata(Some(f64::NAN));

    Ok(output)
}

/// Bilinear sample at fractional pixel coordinates.
///
/// Neighbors that fall outside the grid or carry nodata are dropped and
/// the remaining weights renormalized; with no valid support the sample is
/// NaN.
fn sample_bilinear(source: &Raster<f64>, colf: f64, rowf: f64) -> f64 {
    if !colf.is_finite() || !rowf.is_finite() {
        return f64::NAN;
    }

    // Shift by half a pixel so integer coordinates land on pixel centers.
    let u = colf - 0.5;
    let v = rowf - 0.5;
    let fx = u - u.floor();
    let fy = v - v.floor();
    let c0 = u.floor() as i64;
    let r0 = v.floor() as i64;

    let (rows, cols) = source.shape();
    let neighbors = [
        (r0, c0, (1.0 - fx) * (1.0 - fy)),
        (r0, c0 + 1, fx * (1.0 - fy)),
        (r0 + 1, c0, (1.0 - fx) * fy),
        (r0 + 1, c0 + 1, fx * fy),
    ];

    let mut acc = 0.0;
    let mut weight_sum = 0.0;
    for (r, c, w) in neighbors {
        if w <= 0.0 || r < 0 || c < 0 || r >= rows as i64 || c >= cols as i64 {
            continue;
        }
        let value = unsafe { source.get_unchecked(r as usize, c as usize) };
        if source.is_nodata(value) {
            continue;
        }
        acc += value * w;
        weight_sum += w;
    }

    if weight_sum < 1e-12 {
        f64::NAN
    } else {
        acc / weight_sum
    }
}
