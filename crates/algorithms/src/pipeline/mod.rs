//! Bivariate classification pipeline
//!
//! Sequences alignment, optional rescaling, quantile computation,
//! per-raster classification and code combination. Each stage completes
//! (including its file I/O) before the next starts; intermediates live in
//! a scoped scratch directory that is removed on every exit path.

mod context;

pub use context::RunContext;

use std::path::{Path, PathBuf};

use crate::align::align;
use crate::calc::{calculate_dual, combine_formula, scale_formula, tercile_class_formula};
use crate::statistics::{tercile_boundaries, TercileBoundaries};
use bivargis_core::io::{read_geotiff, write_geotiff};
use bivargis_core::{Error, Feedback, Raster, Result, CRS};

/// Tunable options of a pipeline run.
#[derive(Debug, Clone)]
pub struct BivariateParams {
    /// Whether to align both inputs onto a common grid first. When off,
    /// the caller guarantees the inputs already share a grid.
    pub align: bool,
    /// CRS override for the aligned grid; defaults to raster A's CRS.
    pub target_crs: Option<CRS>,
    /// Divide raster B by this value before computing its quantiles.
    pub divisor_b: Option<f64>,
}

impl Default for BivariateParams {
    fn default() -> Self {
        Self {
            align: true,
            target_crs: None,
            divisor_b: None,
        }
    }
}

/// Destinations for the three persisted output rasters.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub class_a: PathBuf,
    pub class_b: PathBuf,
    pub bivariate: PathBuf,
}

impl OutputPaths {
    /// Derive the three outputs inside a directory with default names.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            class_a: dir.join("class_a.tif"),
            class_b: dir.join("class_b.tif"),
            bivariate: dir.join("bivariate.tif"),
        }
    }
}

/// Results of a pipeline run: the three output rasters (also persisted
/// to the caller's destinations) and the computed boundary pairs.
#[derive(Debug)]
pub struct BivariateOutput {
    pub class_a: Raster<f64>,
    pub class_b: Raster<f64>,
    pub bivariate: Raster<f64>,
    pub boundaries_a: TercileBoundaries,
    pub boundaries_b: TercileBoundaries,
}

/// Run the full bivariate classification pipeline over two raster files.
///
/// Steps: validate inputs, align (A onto itself in two passes, then B
/// onto aligned A), optionally rescale B, compute tercile boundaries for
/// both rasters, classify each into {1,2,3}, combine as `A*10 + B` and
/// persist the three outputs.
pub fn run_bivariate(
    a_path: impl AsRef<Path>,
    b_path: impl AsRef<Path>,
    params: &BivariateParams,
    outputs: &OutputPaths,
    feedback: &dyn Feedback,
) -> Result<BivariateOutput> {
    if let Some(divisor) = params.divisor_b {
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "divisor_b",
                value: divisor.to_string(),
                reason: "must be a positive number".into(),
            });
        }
    }

    let a = read_input(a_path.as_ref(), "A")?;
    let b = read_input(b_path.as_ref(), "B")?;

    let ctx = RunContext::new()?;

    let (a_aligned, b_aligned) = if params.align {
        feedback.info("Aligning input rasters onto a common grid");
        // First pass snaps A's grid to itself, the second produces the
        // final aligned A; this absorbs sub-pixel drift before A's grid
        // becomes the reference for B.
        let snapped = align(&a, &a, params.target_crs.as_ref())?;
        let a_aligned = align(&a, &snapped, params.target_crs.as_ref())?;
        write_geotiff(&a_aligned, ctx.path("a_aligned.tif"))?;

        let b_aligned = align(&b, &a_aligned, None)?;
        write_geotiff(&b_aligned, ctx.path("b_aligned.tif"))?;

        (a_aligned, b_aligned)
    } else {
        if a.shape() != b.shape() {
            let (ar, ac) = a.shape();
            let (br, bc) = b.shape();
            return Err(Error::SizeMismatch {
                er: ar,
                ec: ac,
                ar: br,
                ac: bc,
            });
        }
        (a, b)
    };

    let b_scaled = match params.divisor_b {
        Some(divisor) => {
            feedback.info(&format!("Rescaling raster B by 1/{divisor}"));
            calculate_dual(
                &scale_formula(divisor),
                &b_aligned,
                None,
                &ctx.path("b_scaled.tif"),
                feedback,
            )?
        }
        None => b_aligned,
    };

    let boundaries_a = tercile_boundaries(&a_aligned)?;
    let boundaries_b = tercile_boundaries(&b_scaled)?;
    feedback.info(&format!(
        "Raster A tercile boundaries: q1={:.4}, q2={:.4}",
        boundaries_a.q1, boundaries_a.q2
    ));
    feedback.info(&format!(
        "Raster B tercile boundaries: q1={:.4}, q2={:.4}",
        boundaries_b.q1, boundaries_b.q2
    ));

    feedback.info("Classifying raster A");
    let class_a = calculate_dual(
        &tercile_class_formula(boundaries_a.q1, boundaries_a.q2),
        &a_aligned,
        None,
        &outputs.class_a,
        feedback,
    )?;

    feedback.info("Classifying raster B");
    let class_b = calculate_dual(
        &tercile_class_formula(boundaries_b.q1, boundaries_b.q2),
        &b_scaled,
        None,
        &outputs.class_b,
        feedback,
    )?;

    feedback.info("Combining class rasters into bivariate codes");
    let bivariate = calculate_dual(
        &combine_formula(),
        &class_a,
        Some(&class_b),
        &outputs.bivariate,
        feedback,
    )?;

    Ok(BivariateOutput {
        class_a,
        class_b,
        bivariate,
        boundaries_a,
        boundaries_b,
    })
}

fn read_input(path: &Path, label: &str) -> Result<Raster<f64>> {
    let raster: Raster<f64> = read_geotiff(path).map_err(|e| {
        Error::InvalidInput(format!(
            "cannot read raster {} at {}: {}",
            label,
            path.display(),
            e
        ))
    })?;
    if raster.is_empty() {
        return Err(Error::InvalidInput(format!(
            "raster {} at {} has no cells",
            label,
            path.display()
        )));
    }
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bivargis_core::{GeoTransform, NullFeedback};

    fn write_sequence(path: &Path, rows: usize, cols: usize) {
        let values: Vec<f64> = (1..=(rows * cols)).map(|v| v as f64).collect();
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r.set_nodata(Some(f64::NAN));
        write_geotiff(&r, path).unwrap();
    }

    #[test]
    fn non_positive_divisor_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.tif");
        write_sequence(&a, 3, 3);

        let params = BivariateParams {
            divisor_b: Some(0.0),
            ..Default::default()
        };
        let outputs = OutputPaths::in_dir(dir.path());
        let err = run_bivariate(&a, &a, &params, &outputs, &NullFeedback).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "divisor_b", .. }));
    }

    #[test]
    fn missing_input_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.tif");
        write_sequence(&a, 3, 3);

        let outputs = OutputPaths::in_dir(dir.path());
        let err = run_bivariate(
            dir.path().join("absent.tif"),
            &a,
            &BivariateParams::default(),
            &outputs,
            &NullFeedback,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn unaligned_inputs_with_alignment_off_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.tif");
        let b = dir.path().join("b.tif");
        write_sequence(&a, 3, 3);
        write_sequence(&b, 4, 4);

        let params = BivariateParams {
            align: false,
            ..Default::default()
        };
        let outputs = OutputPaths::in_dir(dir.path());
        let err = run_bivariate(&a, &b, &params, &outputs, &NullFeedback).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));
    }
}
