use crate::colormap::ColorRamp;
use crate::console::console_warn;
use crate::raster::{is_valid_sample, RasterSample};

/// Alpha written for every valid sample.
pub const VALID_ALPHA: u8 = 200;

/// RGBA rendering of a raster, 4 bytes per sample in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorizedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ColorizedImage {
    pub(crate) fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Flat RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len() / 4
    }

    /// RGBA of the pixel at row-major `index`.
    pub fn pixel(&self, index: usize) -> Option<[u8; 4]> {
        let start = index.checked_mul(4)?;
        let px = self.pixels.get(start..start + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

/// Colorize a raster through the terrain ramp.
pub fn colorize(raster: &RasterSample) -> ColorizedImage {
    colorize_with_ramp(raster, &ColorRamp::terrain())
}

/// Normalize each valid sample against the raster's valid range and map it
/// through `ramp`. No-data and non-finite samples become transparent black.
pub fn colorize_with_ramp(raster: &RasterSample, ramp: &ColorRamp) -> ColorizedImage {
    let samples = raster.samples();
    let mut pixels = vec![0u8; samples.len() * 4];

    let range = match raster.require_valid_range() {
        Ok(range) => range,
        Err(err) => {
            // all-transparent output is already in place
            console_warn!("{}; rendering a transparent image", err);
            return ColorizedImage::from_rgba(raster.width(), raster.height(), pixels);
        }
    };
    let span = range.span();

    for (value, pixel) in samples.iter().zip(pixels.chunks_exact_mut(4)) {
        if !is_valid_sample(*value) {
            continue;
        }
        let t = if span == 0.0 {
            0.0
        } else {
            ((value - range.min) / span).clamp(0.0, 1.0)
        };
        let color = ramp.evaluate(t);
        pixel.copy_from_slice(&[color.r, color.g, color.b, VALID_ALPHA]);
    }

    ColorizedImage::from_rgba(raster.width(), raster.height(), pixels)
}
