//! Point transforms between supported coordinate reference systems.

use crate::crs::utm::{is_wgs84, parse_utm_epsg, utm_to_wgs84, wgs84_to_utm};
use crate::crs::CRS;
use crate::error::{Error, Result};

/// A point transform from one CRS to another.
///
/// The supported surface is deliberately small: identity between equivalent
/// CRSs and WGS84 ↔ UTM in both directions. Anything else is an alignment
/// error rather than a silent passthrough, since grid alignment depends on
/// the transform being correct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrsTransform {
    Identity,
    Wgs84ToUtm { zone: u32, north: bool },
    UtmToWgs84 { zone: u32, north: bool },
}

impl CrsTransform {
    /// Build a transform taking points from `from` coordinates to `to`
    /// coordinates.
    ///
    /// A missing CRS on either side is treated as "same grid, unknown
    /// datum": the transform degrades to identity and alignment becomes a
    /// pure grid resample.
    pub fn between(from: Option<&CRS>, to: Option<&CRS>) -> Result<Self> {
        let (from, to) = match (from, to) {
            (Some(f), Some(t)) => (f, t),
            _ => return Ok(Self::Identity),
        };

        if from.is_equivalent(to) {
            return Ok(Self::Identity);
        }

        let (Some(from_epsg), Some(to_epsg)) = (from.epsg(), to.epsg()) else {
            return Err(Error::Alignment(format!(
                "cannot transform between {} and {} without EPSG codes",
                from, to
            )));
        };

        if is_wgs84(from_epsg) {
            if let Some((zone, north)) = parse_utm_epsg(to_epsg) {
                return Ok(Self::Wgs84ToUtm { zone, north });
            }
        }
        if is_wgs84(to_epsg) {
            if let Some((zone, north)) = parse_utm_epsg(from_epsg) {
                return Ok(Self::UtmToWgs84 { zone, north });
            }
        }

        Err(Error::Alignment(format!(
            "unsupported CRS pair: {} -> {} (supported: identity, WGS84 <-> UTM)",
            from, to
        )))
    }

    /// Transform a point `(x, y)`.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        match *self {
            Self::Identity => (x, y),
            Self::Wgs84ToUtm { zone, north } => wgs84_to_utm(x, y, zone, north),
            Self::UtmToWgs84 { zone, north } => utm_to_wgs84(x, y, zone, north),
        }
    }

    /// The transform going the other way.
    pub fn inverse(&self) -> Self {
        match *self {
            Self::Identity => Self::Identity,
            Self::Wgs84ToUtm { zone, north } => Self::UtmToWgs84 { zone, north },
            Self::UtmToWgs84 { zone, north } => Self::Wgs84ToUtm { zone, north },
        }
    }
}
