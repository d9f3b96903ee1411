//! Cellwise calculator backend.

use crate::calc::engine::{check_inputs, eval_cell, CalcEngine};
use crate::calc::expr::{parse_formula, Dialect};
use bivargis_core::{Raster, Result};

/// Sequential calculator backend speaking the quoted layer-reference
/// dialect (`"A@1"`, `"B@1"`).
///
/// Functionally equivalent to [`crate::calc::TiledEngine`]; serves as the
/// fallback when the tiled backend fails.
#[derive(Debug, Default)]
pub struct CellwiseEngine;

impl CalcEngine for CellwiseEngine {
    fn name(&self) -> &'static str {
        "cellwise"
    }

    fn dialect(&self) -> Dialect {
        Dialect::LayerRef
    }

    fn evaluate(
        &self,
        formula: &str,
        a: &Raster<f64>,
        b: Option<&Raster<f64>>,
    ) -> Result<Raster<f64>> {
        let expr = parse_formula(formula, Dialect::LayerRef)?;
        check_inputs(&expr, a, b)?;

        let (rows, cols) = a.shape();
        let mut output: Raster<f64> = a.with_same_meta(rows, cols);
        output.set_nodata(Some(f64::NAN));
        for row in 0..rows {
            for col in 0..cols {
                let value = eval_cell(&expr, a, b, row, col);
                output.set(row, col, value)?;
            }
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{combine_formula, tercile_class_formula, TiledEngine};

    fn sequence(rows: usize, cols: usize) -> Raster<f64> {
        let values: Vec<f64> = (1..=(rows * cols)).map(|v| v as f64).collect();
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_nodata(Some(f64::NAN));
        r
    }

    #[test]
    fn parses_layer_reference_dialect() {
        let a = sequence(2, 2);
        let b = sequence(2, 2);
        let result = CellwiseEngine
            .evaluate("\"A@1\"*10+\"B@1\"", &a, Some(&b))
            .unwrap();
        assert_eq!(result.get(0, 0).unwrap(), 11.0);
        assert_eq!(result.get(1, 1).unwrap(), 44.0);
    }

    #[test]
    fn agrees_with_tiled_backend() {
        let a = sequence(4, 4);
        let b = sequence(4, 4);

        for expr in [tercile_class_formula(5.0, 11.0), combine_formula()] {
            let tiled = TiledEngine
                .evaluate(&expr.to_formula(Dialect::Plain), &a, Some(&b))
                .unwrap();
            let cellwise = CellwiseEngine
                .evaluate(&expr.to_formula(Dialect::LayerRef), &a, Some(&b))
                .unwrap();
            for row in 0..4 {
                for col in 0..4 {
                    assert_eq!(
                        tiled.get(row, col).unwrap(),
                        cellwise.get(row, col).unwrap()
                    );
                }
            }
        }
    }

    #[test]
    fn rejects_plain_band_names() {
        let a = sequence(2, 2);
        assert!(CellwiseEngine.evaluate("A+1", &a, None).is_err());
    }
}
