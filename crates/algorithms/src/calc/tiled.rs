//! Tiled calculator backend.

use crate::calc::engine::{check_inputs, eval_cell, CalcEngine};
use crate::calc::expr::{parse_formula, Dialect};
use crate::maybe_rayon::*;
use bivargis_core::{Raster, Result};

/// Row-parallel calculator backend speaking the plain band dialect
/// (`A`, `B`).
///
/// This is the preferred backend: rows are evaluated independently, in
/// parallel when the `parallel` feature is on.
#[derive(Debug, Default)]
pub struct TiledEngine;

impl CalcEngine for TiledEngine {
    fn name(&self) -> &'static str {
        "tiled"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Plain
    }

    fn evaluate(
        &self,
        formula: &str,
        a: &Raster<f64>,
        b: Option<&Raster<f64>>,
    ) -> Result<Raster<f64>> {
        let expr = parse_formula(formula, Dialect::Plain)?;
        check_inputs(&expr, a, b)?;

        let (rows, cols) = a.shape();
        let data: Vec<f64> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = vec![f64::NAN; cols];
                for (col, cell) in row_data.iter_mut().enumerate() {
                    *cell = eval_cell(&expr, a, b, row, col);
                }
                row_data
            })
            .collect();

        let mut output = Raster::from_vec(data, rows, cols)?;
        output.set_transform(*a.transform());
        output.set_crs(a.crs().cloned());
        output.set_nodata(Some(f64::NAN));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bivargis_core::Error;

    fn sequence(rows: usize, cols: usize) -> Raster<f64> {
        let values: Vec<f64> = (1..=(rows * cols)).map(|v| v as f64).collect();
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_nodata(Some(f64::NAN));
        r
    }

    #[test]
    fn evaluates_classification_formula() {
        let a = sequence(3, 3);
        let result = TiledEngine
            .evaluate("(A<=3)*1+((A>3)*(A<=6))*2+(A>6)*3", &a, None)
            .unwrap();

        let expected = [1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0];
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(result.get(i / 3, i % 3).unwrap(), *want);
        }
    }

    #[test]
    fn nodata_cells_stay_nodata() {
        let mut a = sequence(2, 2);
        a.set(0, 1, f64::NAN).unwrap();
        let b = sequence(2, 2);

        let result = TiledEngine.evaluate("A*10+B", &a, Some(&b)).unwrap();
        assert!(result.get(0, 1).unwrap().is_nan());
        assert_eq!(result.get(0, 0).unwrap(), 11.0);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let a = sequence(2, 2);
        let b = sequence(3, 3);
        let err = TiledEngine.evaluate("A+B", &a, Some(&b)).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));
    }

    #[test]
    fn missing_second_raster_is_rejected() {
        let a = sequence(2, 2);
        let err = TiledEngine.evaluate("A+B", &a, None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn output_keeps_georeferencing() {
        use bivargis_core::{GeoTransform, CRS};
        let mut a = sequence(2, 2);
        a.set_transform(GeoTransform::new(10.0, 20.0, 2.0, -2.0));
        a.set_crs(Some(CRS::from_epsg(32630)));

        let result = TiledEngine.evaluate("A/2", &a, None).unwrap();
        assert_eq!(result.transform(), a.transform());
        assert_eq!(result.crs(), a.crs());
        assert_eq!(result.get(1, 1).unwrap(), 2.0);
    }
}
