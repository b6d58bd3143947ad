use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::error::{DecodeError, DecodeResult};

/// How the decoded raster is placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
#[wasm_bindgen]
pub struct OverlayOptions {
    raster_opacity: f64,
    fit_padding: u32,
    fit_duration_ms: u32,
    source_id: String,
    layer_id: String,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        OverlayOptions {
            raster_opacity: 0.7,
            fit_padding: 50,
            fit_duration_ms: 1000,
            source_id: "geotiff-source".to_string(),
            layer_id: "geotiff-layer".to_string(),
        }
    }
}

impl OverlayOptions {
    /// Parse camelCase JSON; missing fields keep their defaults.
    pub fn parse(json: &str) -> DecodeResult<OverlayOptions> {
        let options: OverlayOptions = serde_json::from_str(json)
            .map_err(|e| DecodeError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> DecodeResult<()> {
        if !(0.0..=1.0).contains(&self.raster_opacity) {
            return Err(DecodeError::InvalidOptions(format!(
                "rasterOpacity must be within [0, 1], got {}",
                self.raster_opacity
            )));
        }
        if self.source_id.is_empty() || self.layer_id.is_empty() {
            return Err(DecodeError::InvalidOptions(
                "sourceId and layerId must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn source_id_str(&self) -> &str {
        &self.source_id
    }

    pub fn layer_id_str(&self) -> &str {
        &self.layer_id
    }
}

#[wasm_bindgen]
impl OverlayOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> OverlayOptions {
        OverlayOptions::default()
    }

    #[wasm_bindgen]
    pub fn from_json(json: &str) -> Result<OverlayOptions, JsValue> {
        Ok(OverlayOptions::parse(json)?)
    }

    /// camelCase JSON, the same shape `from_json` reads.
    #[wasm_bindgen]
    pub fn to_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self)
            .map_err(|e| JsValue::from(DecodeError::InvalidOptions(e.to_string())))
    }

    #[wasm_bindgen(getter)]
    pub fn raster_opacity(&self) -> f64 {
        self.raster_opacity
    }

    #[wasm_bindgen(setter)]
    pub fn set_raster_opacity(&mut self, opacity: f64) {
        self.raster_opacity = opacity;
    }

    #[wasm_bindgen(getter)]
    pub fn fit_padding(&self) -> u32 {
        self.fit_padding
    }

    #[wasm_bindgen(setter)]
    pub fn set_fit_padding(&mut self, padding: u32) {
        self.fit_padding = padding;
    }

    #[wasm_bindgen(getter)]
    pub fn fit_duration_ms(&self) -> u32 {
        self.fit_duration_ms
    }

    #[wasm_bindgen(setter)]
    pub fn set_fit_duration_ms(&mut self, duration_ms: u32) {
        self.fit_duration_ms = duration_ms;
    }

    #[wasm_bindgen(getter)]
    pub fn source_id(&self) -> String {
        self.source_id.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn layer_id(&self) -> String {
        self.layer_id.clone()
    }
}
