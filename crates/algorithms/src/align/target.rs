//! Alignment target derivation

use bivargis_core::crs::CrsTransform;
use bivargis_core::{Error, GeoTransform, Raster, Result, CRS};

/// A synthetic grid descriptor derived from a reference raster.
///
/// Describes the pixel grid (origin, pixel size, extent, CRS) that other
/// rasters are resampled onto. Created transiently per pipeline run and
/// discarded after use.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignTarget {
    /// X coordinate of the upper-left corner (min_x)
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner (max_y)
    pub origin_y: f64,
    /// Pixel size in X (positive)
    pub pixel_size_x: f64,
    /// Pixel size in Y (positive)
    pub pixel_size_y: f64,
    /// Grid width in pixels
    pub cols: usize,
    /// Grid height in pixels
    pub rows: usize,
    /// CRS of the target grid
    pub crs: Option<CRS>,
}

impl AlignTarget {
    /// Derive an alignment target from a reference raster.
    ///
    /// Pixel size comes from the absolute x/y scale terms of the
    /// reference's geotransform; the extent is the reference's bounding
    /// box. When `target_crs` differs from the reference's CRS, the
    /// reference extent is transformed corner-by-corner into the target
    /// CRS and its envelope becomes the new extent (pixel size is kept).
    pub fn from_reference(reference: &Raster<f64>, target_crs: Option<&CRS>) -> Result<Self> {
        let (rows, cols) = reference.shape();
        if rows == 0 || cols == 0 {
            return Err(Error::Alignment(format!(
                "reference raster has invalid dimensions {}x{}",
                cols, rows
            )));
        }

        let (px, py) = reference.transform().pixel_size();
        if px <= 0.0 || py <= 0.0 || !px.is_finite() || !py.is_finite() {
            return Err(Error::Alignment(format!(
                "reference raster has degenerate pixel size {}x{}",
                px, py
            )));
        }

        let crs = target_crs.or(reference.crs()).cloned();
        let (min_x, min_y, max_x, max_y) = reference.extent();

        let same_crs = match (reference.crs(), crs.as_ref()) {
            (Some(a), Some(b)) => a.is_equivalent(b),
            _ => true,
        };

        if same_crs {
            return Ok(Self {
                origin_x: min_x,
                origin_y: max_y,
                pixel_size_x: px,
                pixel_size_y: py,
                cols,
                rows,
                crs,
            });
        }

        // Transform all four corners and take the envelope; this handles
        // the non-linear distortion of the projection better than
        // transforming only min/max.
        let to_target = CrsTransform::between(reference.crs(), crs.as_ref())?;
        let corners = [
            (min_x, min_y),
            (min_x, max_y),
            (max_x, min_y),
            (max_x, max_y),
        ];

        let mut t_min_x = f64::MAX;
        let mut t_min_y = f64::MAX;
        let mut t_max_x = f64::MIN;
        let mut t_max_y = f64::MIN;

        for &(x, y) in &corners {
            let (tx, ty) = to_target.apply(x, y);
            t_min_x = t_min_x.min(tx);
            t_min_y = t_min_y.min(ty);
            t_max_x = t_max_x.max(tx);
            t_max_y = t_max_y.max(ty);
        }

        let t_cols = ((t_max_x - t_min_x) / px).ceil() as usize;
        let t_rows = ((t_max_y - t_min_y) / py).ceil() as usize;
        if t_cols == 0 || t_rows == 0 {
            return Err(Error::Alignment(
                "reprojected extent collapses to zero pixels".into(),
            ));
        }

        Ok(Self {
            origin_x: t_min_x,
            origin_y: t_max_y,
            pixel_size_x: px,
            pixel_size_y: py,
            cols: t_cols,
            rows: t_rows,
            crs,
        })
    }

    /// Geotransform of the target grid.
    pub fn transform(&self) -> GeoTransform {
        GeoTransform::new(
            self.origin_x,
            self.origin_y,
            self.pixel_size_x,
            -self.pixel_size_y,
        )
    }

    /// Extent as `(min_x, min_y, max_x, max_y)`.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        self.transform().extent(self.cols, self.rows)
    }
}
