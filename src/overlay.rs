use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::colorize::{colorize, ColorizedImage};
use crate::console::console_log;
use crate::error::DecodeResult;
use crate::options::OverlayOptions;
use crate::raster::{decode_archive, RasterSample, NO_DATA_VALUE};
use crate::sink::{CanvasSink, ImageSink};
use crate::terrain_rgb::terrain_rgb_image;

/// A decoded, colorized GeoTIFF ready to be placed on the map as an image
/// source.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct GeoTiffOverlay {
    entry_name: String,
    raster: RasterSample,
    image: ColorizedImage,
    options: OverlayOptions,
}

impl GeoTiffOverlay {
    /// Decode `archive_bytes` and colorize the result.
    pub fn build(archive_bytes: &[u8], options: OverlayOptions) -> DecodeResult<GeoTiffOverlay> {
        options.validate()?;
        let decoded = decode_archive(archive_bytes)?;
        let image = colorize(&decoded.raster);
        console_log!(
            "Colorized {} ({}x{})",
            decoded.entry_name,
            image.width(),
            image.height()
        );
        Ok(GeoTiffOverlay {
            entry_name: decoded.entry_name,
            raster: decoded.raster,
            image,
            options,
        })
    }

    pub fn raster(&self) -> &RasterSample {
        &self.raster
    }

    pub fn image(&self) -> &ColorizedImage {
        &self.image
    }

    pub fn options(&self) -> &OverlayOptions {
        &self.options
    }

    /// Swap the placement options. Pixels do not depend on them, so only the
    /// layer description changes.
    pub fn apply_options(&mut self, options: OverlayOptions) -> DecodeResult<()> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    pub fn render<S: ImageSink>(&self, sink: &mut S) -> DecodeResult<()> {
        sink.put_image(&self.image)
    }

    /// Image source, raster layer and fit-bounds call for the map.
    pub fn layer_spec_value(&self) -> Value {
        let bbox = self.raster.bounding_box();
        json!({
            "source": {
                "id": self.options.source_id_str(),
                "type": "image",
                "coordinates": bbox.corners(),
            },
            "layer": {
                "id": self.options.layer_id_str(),
                "type": "raster",
                "source": self.options.source_id_str(),
                "paint": {
                    "raster-opacity": self.options.raster_opacity(),
                },
            },
            "fitBounds": {
                "bounds": bbox.fit_bounds(),
                "padding": self.options.fit_padding(),
                "duration": self.options.fit_duration_ms(),
            },
        })
    }

    pub fn metadata_value(&self) -> Value {
        let range = self.raster.valid_range();
        json!({
            "entry": self.entry_name,
            "width": self.raster.width(),
            "height": self.raster.height(),
            "nodata": NO_DATA_VALUE,
            "min": range.map(|r| r.min),
            "max": range.map(|r| r.max),
            "range": range,
            "validPixels": self.raster.valid_count(),
            "bbox": self.raster.bounding_box().to_array(),
            "bounds": self.raster.bounding_box(),
            "options": self.options,
        })
    }
}

#[wasm_bindgen]
impl GeoTiffOverlay {
    #[wasm_bindgen(constructor)]
    pub fn new(
        archive_bytes: &[u8],
        options: Option<OverlayOptions>,
    ) -> Result<GeoTiffOverlay, JsValue> {
        Ok(GeoTiffOverlay::build(archive_bytes, options.unwrap_or_default())?)
    }

    #[wasm_bindgen(getter)]
    pub fn entry_name(&self) -> String {
        self.entry_name.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// `[west, south, east, north]`
    #[wasm_bindgen(getter)]
    pub fn bbox(&self) -> Vec<f64> {
        self.raster.bounding_box().to_array().to_vec()
    }

    #[wasm_bindgen(getter)]
    pub fn min(&self) -> Option<f64> {
        self.raster.valid_range().map(|r| r.min)
    }

    #[wasm_bindgen(getter)]
    pub fn max(&self) -> Option<f64> {
        self.raster.valid_range().map(|r| r.max)
    }

    /// Copy of the RGBA pixels.
    #[wasm_bindgen(getter)]
    pub fn pixels(&self) -> Vec<u8> {
        self.image.pixels().to_vec()
    }

    /// RGBA pixels as a `Uint8ClampedArray`, ready for `new ImageData(...)`.
    #[wasm_bindgen]
    pub fn pixel_data(&self) -> js_sys::Uint8ClampedArray {
        js_sys::Uint8ClampedArray::from(self.image.pixels())
    }

    /// Flattened `[lon, lat]` pairs: top-left, top-right, bottom-right, bottom-left.
    #[wasm_bindgen]
    pub fn image_coordinates(&self) -> Vec<f64> {
        self.raster
            .bounding_box()
            .corners()
            .iter()
            .flatten()
            .copied()
            .collect()
    }

    /// Flattened `[[west, south], [east, north]]`.
    #[wasm_bindgen]
    pub fn fit_bounds(&self) -> Vec<f64> {
        self.raster
            .bounding_box()
            .fit_bounds()
            .iter()
            .flatten()
            .copied()
            .collect()
    }

    #[wasm_bindgen]
    pub fn layer_spec(&self) -> String {
        self.layer_spec_value().to_string()
    }

    #[wasm_bindgen]
    pub fn metadata(&self) -> String {
        self.metadata_value().to_string()
    }

    #[wasm_bindgen]
    pub fn set_options(&mut self, options: OverlayOptions) -> Result<(), JsValue> {
        Ok(self.apply_options(options)?)
    }

    /// Draw the pixels into `canvas` and return its PNG data URL.
    #[wasm_bindgen]
    pub fn draw_to_canvas(&self, canvas: HtmlCanvasElement) -> Result<String, JsValue> {
        let mut sink = CanvasSink::new(canvas);
        self.render(&mut sink)?;
        Ok(sink.to_data_url()?)
    }

    /// Terrain-RGB encoding of the raw samples, RGBA with opaque alpha.
    #[wasm_bindgen]
    pub fn terrain_rgb_pixels(&self) -> Vec<u8> {
        terrain_rgb_image(&self.raster).into_pixels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::sink::RgbaBuffer;
    use crate::test_fixtures::zipped_float_geotiff;

    fn overlay() -> GeoTiffOverlay {
        // 3x1 raster near Zermatt: min, no-data, max
        let zip = zipped_float_geotiff(3, 1, &[0.0, -9999.0, 100.0], (7.7, 46.1), (0.01, 0.1));
        GeoTiffOverlay::build(&zip, OverlayOptions::default()).unwrap()
    }

    #[test]
    fn test_build_and_pixels() {
        let overlay = overlay();
        assert_eq!((overlay.width(), overlay.height()), (3, 1));
        assert_eq!(overlay.min(), Some(0.0));
        assert_eq!(overlay.max(), Some(100.0));
        assert_eq!(
            overlay.pixels(),
            vec![0, 0, 128, 200, 0, 0, 0, 0, 255, 0, 0, 200]
        );
    }

    #[test]
    fn test_coordinates() {
        let overlay = overlay();
        let bbox = overlay.bbox();
        assert_eq!(bbox.len(), 4);
        assert!(bbox[0] < bbox[2] && bbox[1] < bbox[3]);

        let coords = overlay.image_coordinates();
        assert_eq!(coords.len(), 8);
        // top-left is (west, north), bottom-right is (east, south)
        assert_eq!((coords[0], coords[1]), (bbox[0], bbox[3]));
        assert_eq!((coords[4], coords[5]), (bbox[2], bbox[1]));

        assert_eq!(overlay.fit_bounds(), vec![bbox[0], bbox[1], bbox[2], bbox[3]]);
    }

    #[test]
    fn test_layer_spec() {
        let mut overlay = overlay();
        let spec = overlay.layer_spec_value();
        assert_eq!(spec["source"]["id"], "geotiff-source");
        assert_eq!(spec["source"]["type"], "image");
        assert_eq!(spec["source"]["coordinates"].as_array().unwrap().len(), 4);
        assert_eq!(spec["layer"]["source"], "geotiff-source");
        assert_eq!(spec["layer"]["paint"]["raster-opacity"], 0.7);
        assert_eq!(spec["fitBounds"]["padding"], 50);
        assert_eq!(spec["fitBounds"]["duration"], 1000);

        let pixels_before = overlay.pixels();
        let options = OverlayOptions::parse(r#"{"rasterOpacity": 0.3}"#).unwrap();
        overlay.apply_options(options).unwrap();
        assert_eq!(overlay.layer_spec_value()["layer"]["paint"]["raster-opacity"], 0.3);
        assert_eq!(overlay.pixels(), pixels_before);

        let mut bad = OverlayOptions::default();
        bad.set_raster_opacity(2.0);
        assert!(matches!(
            overlay.apply_options(bad),
            Err(DecodeError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_metadata() {
        let meta = overlay().metadata_value();
        assert_eq!(meta["entry"], "raster.tif");
        assert_eq!(meta["width"], 3);
        assert_eq!(meta["nodata"], -9999.0);
        assert_eq!(meta["min"], 0.0);
        assert_eq!(meta["max"], 100.0);
        assert_eq!(meta["validPixels"], 2);
        assert_eq!(meta["range"]["min"], 0.0);
        assert_eq!(meta["range"]["max"], 100.0);
        assert_eq!(meta["bounds"]["west"], meta["bbox"][0]);
        assert_eq!(meta["bounds"]["north"], meta["bbox"][3]);
        assert_eq!(meta["options"]["sourceId"], "geotiff-source");
        assert_eq!(meta["options"]["rasterOpacity"], 0.7);
    }

    #[test]
    fn test_metadata_all_nodata() {
        let zip = zipped_float_geotiff(2, 1, &[-9999.0, -9999.0], (0.0, 1.0), (0.5, 1.0));
        let overlay = GeoTiffOverlay::build(&zip, OverlayOptions::default()).unwrap();
        assert_eq!(overlay.min(), None);
        assert!(overlay.metadata_value()["min"].is_null());
        assert!(overlay.metadata_value()["range"].is_null());
        assert!(overlay.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_render_to_buffer() {
        let overlay = overlay();
        let mut sink = RgbaBuffer::new();
        overlay.render(&mut sink).unwrap();
        assert_eq!((sink.width, sink.height), (3, 1));
        assert_eq!(sink.data, overlay.pixels());
    }

    #[test]
    fn test_terrain_rgb_pixels() {
        let pixels = overlay().terrain_rgb_pixels();
        assert_eq!(pixels.len(), 12);
        assert!(pixels.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(
            GeoTiffOverlay::build(b"", OverlayOptions::default()),
            Err(DecodeError::Archive(_))
        ));
    }
}
