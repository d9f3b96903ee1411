//! Native GeoTIFF reading/writing.
//!
//! Uses the `tiff` crate for single-band raster I/O, with enough GeoTIFF
//! tag handling for the alignment pipeline: pixel scale, tiepoint, EPSG
//! geokey and the GDAL nodata sentinel.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

// GeoTIFF keys carried in the key directory
const KEY_GT_MODEL_TYPE: u32 = 1024;
const KEY_GT_RASTER_TYPE: u32 = 1025;
const KEY_GEOGRAPHIC_TYPE: u32 = 2048;
const KEY_PROJECTED_CS_TYPE: u32 = 3072;

/// Read a single-band GeoTIFF file into a Raster.
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    let mut decoder =
        Decoder::new(file).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::F32(buf) => cast_buffer(&buf),
        DecodingResult::F64(buf) => cast_buffer(&buf),
        DecodingResult::U8(buf) => cast_buffer(&buf),
        DecodingResult::U16(buf) => cast_buffer(&buf),
        DecodingResult::U32(buf) => cast_buffer(&buf),
        DecodingResult::I16(buf) => cast_buffer(&buf),
        DecodingResult::I32(buf) => cast_buffer(&buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    // Georeferencing is mandatory: a raster with a made-up default grid
    // would silently misalign everything downstream.
    raster.set_transform(read_geotransform(&mut decoder)?);

    if let Some(epsg) = read_epsg(&mut decoder) {
        raster.set_crs(Some(CRS::from_epsg(epsg)));
    }
    if let Ok(text) = decoder.get_tag_ascii_string(Tag::GdalNodata) {
        if let Ok(nd) = text.trim().trim_end_matches('\0').parse::<f64>() {
            raster.set_nodata(num_traits::cast(nd));
        }
    }

    Ok(raster)
}

fn cast_buffer<T: RasterElement, S: Copy + num_traits::NumCast>(buf: &[S]) -> Vec<T> {
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect()
}

/// Read the geotransform from ModelPixelScaleTag + ModelTiepointTag.
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::InvalidInput("raster has no ModelPixelScale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::InvalidInput("raster has no ModelTiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]; scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];

        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::InvalidInput(
        "raster georeferencing tags are malformed".into(),
    ))
}

/// Extract the EPSG code from the GeoKeyDirectory, if present.
fn read_epsg<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder.get_tag_u32_vec(Tag::GeoKeyDirectoryTag).ok()?;

    // Directory entries are groups of 4 shorts: key, location, count, value.
    for entry in keys.get(4..)?.chunks_exact(4) {
        if entry[0] == KEY_PROJECTED_CS_TYPE || entry[0] == KEY_GEOGRAPHIC_TYPE {
            let code = entry[3];
            if code > 0 && code < 65535 {
                return Some(code);
            }
        }
    }
    None
}

/// Write a Raster to a single-band GeoTIFF file (32-bit float samples).
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let gt = raster.transform();

    let scale = vec![gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, scale.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

    let tiepoint = vec![0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, tiepoint.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

    // Minimal GeoKeyDirectory: model type, raster type and the EPSG code
    // when known, so downstream GIS tools pick up the CRS.
    let epsg = raster.crs().and_then(|c| c.epsg());
    let mut geokeys: Vec<u16> = vec![1, 1, 0, 2];
    let (model_type, epsg_key) = match epsg {
        Some(4326) => (2u16, Some((KEY_GEOGRAPHIC_TYPE as u16, 4326u16))),
        Some(code) => (1u16, Some((KEY_PROJECTED_CS_TYPE as u16, code as u16))),
        None => (1u16, None),
    };
    geokeys.extend_from_slice(&[KEY_GT_MODEL_TYPE as u16, 0, 1, model_type]);
    geokeys.extend_from_slice(&[KEY_GT_RASTER_TYPE as u16, 0, 1, 1]);
    if let Some((key, code)) = epsg_key {
        geokeys[3] = 3; // key count
        geokeys.extend_from_slice(&[key, 0, 1, code]);
    }
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, geokeys.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

    if let Some(nd) = raster.nodata().and_then(|v| v.to_f64()) {
        let text = if nd.is_nan() {
            "nan".to_string()
        } else {
            format!("{}", nd)
        };
        image
            .encoder()
            .write_tag(Tag::GdalNodata, text.as_str())
            .map_err(|e| Error::Other(format!("Cannot write nodata tag: {}", e)))?;
    }

    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raster() -> Raster<f64> {
        let mut r = Raster::from_vec((1..=12).map(f64::from).collect(), 3, 4).unwrap();
        r.set_transform(GeoTransform::new(500_000.0, 4_000_000.0, 30.0, -30.0));
        r.set_crs(Some(CRS::from_epsg(32630)));
        r.set_nodata(Some(f64::NAN));
        r
    }

    #[test]
    fn geotiff_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.tif");

        let original = sample_raster();
        write_geotiff(&original, &path).unwrap();
        let restored: Raster<f64> = read_geotiff(&path).unwrap();

        assert_eq!(restored.shape(), original.shape());
        for row in 0..3 {
            for col in 0..4 {
                assert_eq!(
                    restored.get(row, col).unwrap(),
                    original.get(row, col).unwrap()
                );
            }
        }
        assert_eq!(restored.transform(), original.transform());
        assert_eq!(restored.crs().and_then(|c| c.epsg()), Some(32630));
        assert!(restored.nodata().is_some_and(f64::is_nan));
    }

    #[test]
    fn numeric_nodata_sentinel_survives_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.tif");

        let mut raster = sample_raster();
        raster.set_nodata(Some(-9999.0));
        raster.set(0, 0, -9999.0).unwrap();
        write_geotiff(&raster, &path).unwrap();

        let restored: Raster<f64> = read_geotiff(&path).unwrap();
        assert_eq!(restored.nodata(), Some(-9999.0));
        assert!(restored.is_nodata(restored.get(0, 0).unwrap()));
        assert_eq!(restored.valid_count(), 11);
    }

    #[test]
    fn ungeoreferenced_tiff_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.tif");

        // Plain grayscale TIFF with no geo tags at all.
        let file = File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        encoder
            .write_image::<Gray32Float>(2, 2, &[1.0f32, 2.0, 3.0, 4.0])
            .unwrap();

        let result: Result<Raster<f64>> = read_geotiff(&path);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn geotiff_roundtrip_preserves_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holes.tif");

        let mut raster = sample_raster();
        raster.set(1, 1, f64::NAN).unwrap();
        write_geotiff(&raster, &path).unwrap();

        let restored: Raster<f64> = read_geotiff(&path).unwrap();
        assert!(restored.get(1, 1).unwrap().is_nan());
        assert_eq!(restored.get(0, 0).unwrap(), 1.0);
    }

    #[test]
    fn read_missing_file_fails() {
        let result: Result<Raster<f64>> = read_geotiff("/no/such/raster.tif");
        assert!(result.is_err());
    }
}
