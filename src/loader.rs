use wasm_bindgen::prelude::*;

use crate::console::console_log;
use crate::error::{DecodeError, DecodeResult};
use crate::options::OverlayOptions;
use crate::overlay::GeoTiffOverlay;

/// Reject a non-2xx fetch before any decoding happens.
pub fn accept_response(url: &str, status: u16, bytes: Vec<u8>) -> DecodeResult<Vec<u8>> {
    if !(200..300).contains(&status) {
        return Err(DecodeError::Fetch {
            url: url.to_string(),
            reason: format!("HTTP {}", status),
        });
    }
    Ok(bytes)
}

/// Hands out request tokens so a result that arrives after a newer request
/// started can be dropped instead of published.
#[wasm_bindgen]
#[derive(Debug, Default, Clone)]
pub struct LoadSequence {
    latest: u32,
}

impl LoadSequence {
    /// Decode a fetched archive unless `token` has been superseded.
    ///
    /// `Ok(None)` means the result is stale; errors of stale requests are
    /// dropped as well.
    pub fn complete(
        &self,
        token: u32,
        url: &str,
        status: u16,
        bytes: Vec<u8>,
        options: OverlayOptions,
    ) -> DecodeResult<Option<GeoTiffOverlay>> {
        if !self.is_current(token) {
            console_log!("Dropping superseded load #{} of {}", token, url);
            return Ok(None);
        }
        let bytes = accept_response(url, status, bytes)?;
        GeoTiffOverlay::build(&bytes, options).map(Some)
    }
}

#[wasm_bindgen]
impl LoadSequence {
    #[wasm_bindgen(constructor)]
    pub fn new() -> LoadSequence {
        LoadSequence::default()
    }

    /// Start a new request; every earlier token becomes stale.
    #[wasm_bindgen]
    pub fn begin(&mut self) -> u32 {
        self.latest = self.latest.wrapping_add(1);
        self.latest
    }

    #[wasm_bindgen]
    pub fn is_current(&self, token: u32) -> bool {
        token == self.latest
    }

    #[wasm_bindgen]
    pub fn finish(
        &self,
        token: u32,
        url: &str,
        status: u16,
        bytes: Vec<u8>,
        options: Option<OverlayOptions>,
    ) -> Result<Option<GeoTiffOverlay>, JsValue> {
        Ok(self.complete(token, url, status, bytes, options.unwrap_or_default())?)
    }
}
