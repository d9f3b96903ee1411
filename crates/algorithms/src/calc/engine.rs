//! Calculator backends and the dual-evaluation failover.

use std::path::Path;

use crate::calc::expr::{Dialect, Expr, Operand};
use crate::calc::{CellwiseEngine, TiledEngine};
use bivargis_core::io::write_geotiff;
use bivargis_core::{Error, Feedback, Raster, Result};

/// A raster calculator backend.
///
/// Engines consume formulas in their own textual dialect; the shared
/// [`Expr`] tree is rendered per engine by [`calculate_dual_with`], so
/// both backends evaluate the same logical formula.
pub trait CalcEngine {
    /// Human-readable backend name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// The textual dialect this engine parses.
    fn dialect(&self) -> Dialect;

    /// Evaluate a formula over one or two rasters.
    ///
    /// Cells where any referenced input is nodata come out NaN. Output
    /// carries `a`'s georeferencing and NaN nodata.
    fn evaluate(
        &self,
        formula: &str,
        a: &Raster<f64>,
        b: Option<&Raster<f64>>,
    ) -> Result<Raster<f64>>;
}

/// Shared per-cell evaluation used by both engine implementations after
/// they have parsed the formula in their own dialect.
pub(crate) fn check_inputs(
    expr: &Expr,
    a: &Raster<f64>,
    b: Option<&Raster<f64>>,
) -> Result<()> {
    if a.is_empty() {
        return Err(Error::InvalidInput("raster A is empty".into()));
    }
    match b {
        Some(b) => {
            if b.shape() != a.shape() {
                let (ar, ac) = a.shape();
                let (br, bc) = b.shape();
                return Err(Error::SizeMismatch {
                    er: ar,
                    ec: ac,
                    ar: br,
                    ac: bc,
                });
            }
        }
        None => {
            if expr.uses(Operand::B) {
                return Err(Error::InvalidInput(
                    "formula references raster B but only one raster was provided".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Evaluate `expr` at one cell, masking nodata in any referenced input.
#[inline]
pub(crate) fn eval_cell(
    expr: &Expr,
    a: &Raster<f64>,
    b: Option<&Raster<f64>>,
    row: usize,
    col: usize,
) -> f64 {
    let av = unsafe { a.get_unchecked(row, col) };
    if a.is_nodata(av) {
        return f64::NAN;
    }
    let bv = match b {
        Some(b) => {
            let v = unsafe { b.get_unchecked(row, col) };
            if b.is_nodata(v) {
                return f64::NAN;
            }
            v
        }
        None => 0.0,
    };
    expr.eval(av, bv)
}

/// Evaluate `expr` with the default backend pair and persist the result.
///
/// The tiled engine runs first; if it fails, the cellwise engine gets
/// the same formula and a notice goes to `feedback`. Only when both
/// backends fail does the call error, carrying both messages.
pub fn calculate_dual(
    expr: &Expr,
    a: &Raster<f64>,
    b: Option<&Raster<f64>>,
    out_path: &Path,
    feedback: &dyn Feedback,
) -> Result<Raster<f64>> {
    calculate_dual_with(&TiledEngine, &CellwiseEngine, expr, a, b, out_path, feedback)
}

/// [`calculate_dual`] with explicit engines, for exercising the failover
/// path with a deliberately failing primary.
#[allow(clippy::too_many_arguments)]
pub fn calculate_dual_with(
    primary: &dyn CalcEngine,
    secondary: &dyn CalcEngine,
    expr: &Expr,
    a: &Raster<f64>,
    b: Option<&Raster<f64>>,
    out_path: &Path,
    feedback: &dyn Feedback,
) -> Result<Raster<f64>> {
    let result = match primary.evaluate(&expr.to_formula(primary.dialect()), a, b) {
        Ok(raster) => raster,
        Err(primary_err) => {
            feedback.warning(&format!(
                "{} calculator failed: {}. Falling back to {} calculator.",
                primary.name(),
                primary_err,
                secondary.name()
            ));
            match secondary.evaluate(&expr.to_formula(secondary.dialect()), a, b) {
                Ok(raster) => raster,
                Err(secondary_err) => {
                    return Err(Error::Evaluation {
                        primary: primary_err.to_string(),
                        secondary: secondary_err.to_string(),
                    })
                }
            }
        }
    };

    write_geotiff(&result, out_path)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::expr::combine_formula;
    use bivargis_core::feedback::BufferedFeedback;

    struct FailingEngine;

    impl CalcEngine for FailingEngine {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn dialect(&self) -> Dialect {
            Dialect::Plain
        }

        fn evaluate(
            &self,
            _formula: &str,
            _a: &Raster<f64>,
            _b: Option<&Raster<f64>>,
        ) -> Result<Raster<f64>> {
            Err(Error::InvalidInput("simulated backend outage".into()))
        }
    }

    fn input() -> Raster<f64> {
        Raster::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap()
    }

    #[test]
    fn failover_runs_secondary_and_warns() {
        let a = input();
        let b = input();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("combined.tif");
        let feedback = BufferedFeedback::default();

        let expr = combine_formula();
        let result = calculate_dual_with(
            &FailingEngine,
            &CellwiseEngine,
            &expr,
            &a,
            Some(&b),
            &out,
            &feedback,
        )
        .unwrap();

        assert_eq!(result.get(0, 0).unwrap(), 11.0);
        assert_eq!(result.get(1, 1).unwrap(), 44.0);
        assert!(out.exists());

        let warnings = feedback.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Falling back to cellwise calculator"));
    }

    #[test]
    fn both_backends_failing_reports_both_errors() {
        let a = input();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never.tif");
        let feedback = BufferedFeedback::default();

        let expr = combine_formula(); // needs B, none given
        let err = calculate_dual_with(
            &FailingEngine,
            &CellwiseEngine,
            &expr,
            &a,
            None,
            &out,
            &feedback,
        )
        .unwrap_err();

        match err {
            Error::Evaluation { primary, secondary } => {
                assert!(primary.contains("simulated backend outage"));
                assert!(secondary.contains("raster B"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!out.exists());
    }

    #[test]
    fn successful_primary_skips_secondary() {
        let a = input();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scaled.tif");
        let feedback = BufferedFeedback::default();

        let expr = crate::calc::expr::scale_formula(2.0);
        let result = calculate_dual(&expr, &a, None, &out, &feedback).unwrap();

        assert_eq!(result.get(0, 1).unwrap(), 1.0);
        assert!(feedback.warnings().is_empty());
        assert!(out.exists());
    }
}
