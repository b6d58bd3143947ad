//! Error types for the overlay pipeline.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Result type alias using DecodeError.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Failures of the fetch → decode → colorize → sink pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Input bytes could not be obtained upstream of the decoder.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The archive could not be opened or holds no raster entry.
    #[error("Archive error: {0}")]
    Archive(String),

    /// The raster container is malformed or lacks image/georeferencing data.
    #[error("Raster parse error: {0}")]
    RasterParse(String),

    /// Every sample is no-data, so no value range exists.
    #[error("Raster has no valid samples ({total} no-data pixels)")]
    DegenerateRange { total: usize },

    #[error("Invalid overlay options: {0}")]
    InvalidOptions(String),

    #[error("Image sink error: {0}")]
    Sink(String),
}

impl DecodeError {
    /// Whether the error should abort the request.
    ///
    /// A degenerate range still yields a fully transparent image.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecodeError::DegenerateRange { .. })
    }
}

impl From<zip::result::ZipError> for DecodeError {
    fn from(err: zip::result::ZipError) -> Self {
        DecodeError::Archive(err.to_string())
    }
}

impl From<tiff::TiffError> for DecodeError {
    fn from(err: tiff::TiffError) -> Self {
        DecodeError::RasterParse(err.to_string())
    }
}

impl From<DecodeError> for JsValue {
    fn from(err: DecodeError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Failures of the simulated device route.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("Route must contain at least one point")]
    Empty,

    #[error("Route coordinates must come in [lat, lon] pairs, got {0} values")]
    OddCoordinateCount(usize),

    #[error("Invalid coordinate at point {index}: ({lat}, {lon})")]
    InvalidCoordinate { index: usize, lat: f64, lon: f64 },

    #[error("Step interval must be positive, got {0} ms")]
    InvalidInterval(u32),
}

impl From<RouteError> for JsValue {
    fn from(err: RouteError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
