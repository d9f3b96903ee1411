//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and geographic coordinates
/// (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For north-up images (the only kind the bivariate pipeline produces) the
/// rotation terms are 0 and `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation about X axis (usually 0)
    pub row_rotation: f64,
    /// Rotation about Y axis (usually 0)
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Convert pixel coordinates to the geographic coordinates of the pixel
    /// center.
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        let col_f = col as f64 + 0.5;
        let row_f = row as f64 + 0.5;

        let x = self.origin_x + col_f * self.pixel_width + row_f * self.row_rotation;
        let y = self.origin_y + col_f * self.col_rotation + row_f * self.pixel_height;

        (x, y)
    }

    /// Convert geographic coordinates to fractional pixel coordinates.
    ///
    /// An integer part plus 0.5 lands on a pixel center. Returns NaN for a
    /// degenerate transform.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;

        if det.abs() < 1e-10 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;

        (col, row)
    }

    /// Absolute pixel sizes as (x, y).
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }

    /// Bounding extent `(min_x, min_y, max_x, max_y)` for a raster of
    /// `cols` x `rows` pixels.
    ///
    /// Derived the way a warp target extent is built: `min_x`/`max_y` from
    /// the origin, `max_x = min_x + cols * px`, `min_y = max_y - rows * py`.
    pub fn extent(&self, cols: usize, rows: usize) -> (f64, f64, f64, f64) {
        let (px, py) = self.pixel_size();
        let min_x = self.origin_x;
        let max_y = self.origin_y;
        let max_x = min_x + cols as f64 * px;
        let min_y = max_y - rows as f64 * py;

        (min_x, min_y, max_x, max_y)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pixel_to_geo_roundtrip() {
        let gt = GeoTransform::new(100.0, 200.0, 10.0, -10.0);

        let (x, y) = gt.pixel_to_geo(5, 10);
        let (col, row) = gt.geo_to_pixel(x, y);

        assert_relative_eq!(col, 5.5, epsilon = 1e-10);
        assert_relative_eq!(row, 10.5, epsilon = 1e-10);
    }

    #[test]
    fn extent_from_origin() {
        let gt = GeoTransform::new(500.0, 800.0, 30.0, -30.0);
        let (min_x, min_y, max_x, max_y) = gt.extent(10, 5);

        assert_relative_eq!(min_x, 500.0);
        assert_relative_eq!(max_y, 800.0);
        assert_relative_eq!(max_x, 800.0);
        assert_relative_eq!(min_y, 650.0);
    }

    #[test]
    fn pixel_size_is_absolute() {
        let gt = GeoTransform::new(0.0, 0.0, 10.0, -20.0);
        assert_eq!(gt.pixel_size(), (10.0, 20.0));
    }
}
