//! Destinations for colorized pixels.
//!
//! The pipeline never touches the DOM itself; callers hand it an
//! [`ImageSink`]. The browser uses [`CanvasSink`], tests and headless callers
//! use [`RgbaBuffer`].

use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::colorize::ColorizedImage;
use crate::error::{DecodeError, DecodeResult};

pub trait ImageSink {
    /// Replace the sink's contents with `image`.
    fn put_image(&mut self, image: &ColorizedImage) -> DecodeResult<()>;
}

/// In-memory RGBA surface holding the last image written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    /// Number of images written so far.
    pub writes: usize,
}

impl RgbaBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageSink for RgbaBuffer {
    fn put_image(&mut self, image: &ColorizedImage) -> DecodeResult<()> {
        self.width = image.width();
        self.height = image.height();
        self.data.clear();
        self.data.extend_from_slice(image.pixels());
        self.writes += 1;
        Ok(())
    }
}

/// Draws into an HTML canvas through its 2D context.
pub struct CanvasSink {
    canvas: HtmlCanvasElement,
}

impl CanvasSink {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// PNG data URL of the canvas, suitable as a map image source url.
    pub fn to_data_url(&self) -> DecodeResult<String> {
        self.canvas
            .to_data_url()
            .map_err(|e| DecodeError::Sink(format!("toDataURL failed: {:?}", e)))
    }

    fn context(&self) -> DecodeResult<CanvasRenderingContext2d> {
        self.canvas
            .get_context("2d")
            .map_err(|e| DecodeError::Sink(format!("getContext failed: {:?}", e)))?
            .ok_or_else(|| DecodeError::Sink("Could not get 2D context".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| DecodeError::Sink("context is not a CanvasRenderingContext2d".to_string()))
    }
}

impl ImageSink for CanvasSink {
    fn put_image(&mut self, image: &ColorizedImage) -> DecodeResult<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::Sink("cannot draw an empty image".to_string()));
        }
        self.canvas.set_width(image.width());
        self.canvas.set_height(image.height());

        let context = self.context()?;
        let data = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(image.pixels()),
            image.width(),
            image.height(),
        )
        .map_err(|e| DecodeError::Sink(format!("ImageData creation failed: {:?}", e)))?;

        context
            .put_image_data(&data, 0.0, 0.0)
            .map_err(|e| DecodeError::Sink(format!("putImageData failed: {:?}", e)))
    }
}
