//! QML style document writer.

use std::fs;
use std::path::Path;

use bivargis_core::Feedback;

use crate::palette::Palette;
use crate::Result;

const DOCTYPE: &str = "<!DOCTYPE qgis PUBLIC 'http://mrcc.com/qgis.dtd' 'SYSTEM'>\n";

const HEADER: &str = concat!(
    "<qgis autoRefreshTime=\"0\" version=\"3.22.0-Bialowieza\" ",
    "styleCategories=\"LayerConfiguration|Symbology|MapTips|AttributeTable|Rendering|CustomProperties|Temporal|Elevation|Notes\" ",
    "maxScale=\"0\" autoRefreshMode=\"Disabled\" hasScaleBasedVisibilityFlag=\"0\" minScale=\"1e+08\">\n",
    "  <flags><Identifiable>1</Identifiable><Removable>1</Removable><Searchable>1</Searchable></flags>\n",
    "  <pipe>\n",
    "    <provider><resampling zoomedOutResamplingMethod=\"nearestNeighbour\" enabled=\"false\" ",
    "zoomedInResamplingMethod=\"nearestNeighbour\" maxOversampling=\"2\"/></provider>\n",
    "    <rasterrenderer opacity=\"1\" band=\"1\" type=\"paletted\" alphaBand=\"-1\" nodataColor=\"\">\n",
    "      <rasterTransparency/>\n",
    "      <colorPalette>\n",
);

const FOOTER: &str = concat!(
    "      </colorPalette>\n",
    "      <colorramp type=\"randomcolors\" name=\"[source]\"/>\n",
    "    </rasterrenderer>\n",
    "    <brightnesscontrast brightness=\"0\" contrast=\"0\" gamma=\"1\"/>\n",
    "    <rasterresampler maxOversampling=\"2\"/>\n",
    "  </pipe>\n",
    "  <blendMode>0</blendMode>\n",
    "</qgis>\n",
);

/// Render a paletted-raster QML style document for a palette.
pub fn render_qml(palette: &Palette) -> String {
    let mut doc = String::with_capacity(2048);
    doc.push_str(DOCTYPE);
    doc.push_str(HEADER);
    for entry in palette.entries() {
        doc.push_str(&format!(
            "        <paletteEntry alpha=\"255\" label=\"{}\" color=\"{}\" value=\"{}\"/>\n",
            entry.label,
            entry.color.to_hex(),
            entry.code
        ));
    }
    doc.push_str(FOOTER);
    doc
}

/// Write the style document for `palette` to `qml_path`.
///
/// The palette is fully validated before this point, so nothing is
/// written on a validation failure.
pub fn write_style(palette: &Palette, qml_path: impl AsRef<Path>) -> Result<()> {
    fs::write(qml_path, render_qml(palette))?;
    Ok(())
}

/// Place a copy of the style next to a raster file as `<stem>.qml` so
/// layer-based viewers pick it up automatically.
///
/// Application is best-effort: a failure is reported as a warning and
/// the already-written style file remains valid.
pub fn apply_style(raster_path: &Path, qml_path: &Path, feedback: &dyn Feedback) {
    let sidecar = raster_path.with_extension("qml");
    match fs::copy(qml_path, &sidecar) {
        Ok(_) => feedback.info(&format!("Style applied: {}", sidecar.display())),
        Err(e) => {
            feedback.warning(&format!(
                "Could not apply style to {}: {}",
                raster_path.display(),
                e
            ));
            feedback.warning("You can manually load the QML file onto the raster layer.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bivargis_core::BufferedFeedback;

    #[test]
    fn document_contains_all_palette_entries() {
        let doc = render_qml(&Palette::PurpleBlue);

        assert!(doc.starts_with(DOCTYPE));
        assert!(doc.ends_with("</qgis>\n"));
        assert_eq!(doc.matches("<paletteEntry").count(), 9);
        assert!(doc.contains(
            "<paletteEntry alpha=\"255\" label=\"Low A, Low B\" color=\"#E8E8E8\" value=\"11\"/>"
        ));
        assert!(doc.contains(
            "<paletteEntry alpha=\"255\" label=\"High A, High B\" color=\"#3A4893\" value=\"33\"/>"
        ));
        assert!(doc.contains("type=\"paletted\""));
    }

    #[test]
    fn write_style_persists_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bivariate.qml");
        write_style(&Palette::OrangeGreen, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("color=\"#D3D3D3\" value=\"11\""));
        assert!(written.contains("color=\"#164E28\" value=\"33\""));
    }

    #[test]
    fn apply_style_writes_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let qml = dir.path().join("style.qml");
        write_style(&Palette::PurpleBlue, &qml).unwrap();
        let raster = dir.path().join("bivariate.tif");
        fs::write(&raster, b"stub").unwrap();

        let feedback = BufferedFeedback::new();
        apply_style(&raster, &qml, &feedback);

        assert!(dir.path().join("bivariate.qml").exists());
        assert!(feedback.contains("Style applied"));
    }

    #[test]
    fn apply_style_failure_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let missing_qml = dir.path().join("absent.qml");
        let raster = dir.path().join("bivariate.tif");

        let feedback = BufferedFeedback::new();
        apply_style(&raster, &missing_qml, &feedback);

        assert!(feedback.contains("Could not apply style"));
    }
}
