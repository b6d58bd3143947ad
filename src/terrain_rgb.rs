//! Terrain-RGB elevation encoding.
//!
//! `height = -10000 + (R * 256^2 + G * 256 + B) * 0.1`, i.e. 0.1 m precision
//! over roughly -10 km .. +1667 km.

use wasm_bindgen::prelude::*;

use crate::colorize::ColorizedImage;
use crate::raster::{is_valid_sample, RasterSample};

const BASE_OFFSET_M: f64 = 10_000.0;
const PRECISION_M: f64 = 0.1;
const STEPS_PER_M: f64 = 10.0;
const MAX_ENCODED: f64 = 16_777_215.0; // 256^3 - 1

/// Encode an elevation in meters. No-data and non-finite values encode as 0 m.
pub fn encode_elevation(elevation_m: f64) -> [u8; 3] {
    let elevation = if is_valid_sample(elevation_m) {
        elevation_m
    } else {
        0.0
    };
    let value = ((elevation + BASE_OFFSET_M) * STEPS_PER_M)
        .floor()
        .clamp(0.0, MAX_ENCODED) as u32;
    [
        ((value >> 16) & 0xff) as u8,
        ((value >> 8) & 0xff) as u8,
        (value & 0xff) as u8,
    ]
}

#[wasm_bindgen]
pub fn decode_elevation(r: u8, g: u8, b: u8) -> f64 {
    let value = r as f64 * 65536.0 + g as f64 * 256.0 + b as f64;
    -BASE_OFFSET_M + value * PRECISION_M
}

/// Opaque Terrain-RGB image of a raster, same layout as the colorized one.
pub fn terrain_rgb_image(raster: &RasterSample) -> ColorizedImage {
    let mut pixels = Vec::with_capacity(raster.samples().len() * 4);
    for &value in raster.samples() {
        let [r, g, b] = encode_elevation(value);
        pixels.extend_from_slice(&[r, g, b, 255]);
    }
    ColorizedImage::from_rgba(raster.width(), raster.height(), pixels)
}
