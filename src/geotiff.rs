use std::io::Cursor;

use num_traits::ToPrimitive;
use proj4rs::Proj;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use crate::console::{console_log, console_warn};
use crate::error::{DecodeError, DecodeResult};

// GeoTIFF tag ids
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;

// GeoKey ids
const GT_MODEL_TYPE_KEY: u16 = 1024;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;

const WGS84_LONGLAT: &str = "+proj=longlat +datum=WGS84 +no_defs";
const WEB_MERCATOR: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs";

/// Affine transformation from pixel (col, row) to model coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTransform {
    /// X-coordinate of the upper-left corner of the upper-left pixel
    pub origin_x: f64,
    /// Y-coordinate of the upper-left corner of the upper-left pixel
    pub origin_y: f64,
    /// Pixel width in model units
    pub pixel_width: f64,
    /// Pixel height in model units (typically negative)
    pub pixel_height: f64,
    /// X shift per row (usually 0)
    pub rotation_x: f64,
    /// Y shift per column (usually 0)
    pub rotation_y: f64,
}

impl GeoTransform {
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.rotation_x;
        let y = self.origin_y + col * self.rotation_y + row * self.pixel_height;
        (x, y)
    }

    /// Model-space corners of a `width` x `height` raster, clockwise from top-left.
    pub fn corners(&self, width: u32, height: u32) -> [(f64, f64); 4] {
        let (w, h) = (width as f64, height as f64);
        [
            self.pixel_to_geo(0.0, 0.0),
            self.pixel_to_geo(w, 0.0),
            self.pixel_to_geo(w, h),
            self.pixel_to_geo(0.0, h),
        ]
    }

    /// Parse an ESRI world file (.tfw, .tifw, .wld).
    ///
    /// Six lines: A (pixel width), D (rotation Y), B (rotation X),
    /// E (pixel height), C and F (center of the upper-left pixel).
    pub fn from_world_file(content: &str) -> DecodeResult<GeoTransform> {
        let values: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if values.len() < 6 {
            return Err(DecodeError::RasterParse(format!(
                "world file must contain 6 lines, found {}",
                values.len()
            )));
        }

        let mut parsed = [0.0f64; 6];
        for (i, (slot, raw)) in parsed.iter_mut().zip(&values).enumerate() {
            *slot = raw.parse::<f64>().map_err(|e| {
                DecodeError::RasterParse(format!("world file line {}: {}", i + 1, e))
            })?;
        }
        let [pixel_width, rotation_y, rotation_x, pixel_height, center_x, center_y] = parsed;

        // C/F address the pixel center; shift back half a pixel to the corner.
        Ok(GeoTransform {
            origin_x: center_x - 0.5 * pixel_width - 0.5 * rotation_x,
            origin_y: center_y - 0.5 * rotation_y - 0.5 * pixel_height,
            pixel_width,
            pixel_height,
            rotation_x,
            rotation_y,
        })
    }
}

/// Coordinate reference system declared by the GeoKey directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelCrs {
    /// Lon/lat degrees (or no declaration at all).
    Geographic,
    /// Projected CRS with its EPSG code.
    Projected(u16),
}

impl ModelCrs {
    /// Read the model type from a raw GeoKeyDirectory.
    ///
    /// Layout: a 4-short header whose last value is the key count, then
    /// `(key id, tag location, count, value)` quadruples.
    pub fn from_geo_keys(directory: &[u16]) -> ModelCrs {
        if directory.len() < 4 {
            return ModelCrs::Geographic;
        }
        let mut model_type = None;
        let mut projected = None;
        let mut geographic = None;
        for key in directory[4..].chunks_exact(4).take(directory[3] as usize) {
            // Only inline (location 0) values are of interest here.
            if key[1] != 0 {
                continue;
            }
            match key[0] {
                GT_MODEL_TYPE_KEY => model_type = Some(key[3]),
                PROJECTED_CS_TYPE_KEY => projected = Some(key[3]),
                GEOGRAPHIC_TYPE_KEY => geographic = Some(key[3]),
                _ => {}
            }
        }

        match (model_type, projected) {
            (Some(MODEL_TYPE_PROJECTED), Some(code)) => ModelCrs::Projected(code),
            (Some(MODEL_TYPE_GEOGRAPHIC), _) => ModelCrs::Geographic,
            (None, Some(code)) if geographic.is_none() => ModelCrs::Projected(code),
            _ => ModelCrs::Geographic,
        }
    }

    /// proj string for the EPSG codes we can reproject from.
    fn proj_string(&self) -> Option<String> {
        match *self {
            ModelCrs::Geographic => None,
            ModelCrs::Projected(code @ 32601..=32660) => Some(format!(
                "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
                code - 32600
            )),
            ModelCrs::Projected(code @ 32701..=32760) => Some(format!(
                "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
                code - 32700
            )),
            ModelCrs::Projected(3857) => Some(WEB_MERCATOR.to_string()),
            ModelCrs::Projected(_) => None,
        }
    }
}

/// First image of a TIFF, reduced to what the overlay needs.
#[derive(Debug, Clone)]
pub struct DecodedTiff {
    pub width: u32,
    pub height: u32,
    /// First sample band, row-major.
    pub samples: Vec<f64>,
    /// None when the file carries no georeferencing tags.
    pub transform: Option<GeoTransform>,
    pub crs: ModelCrs,
}

impl DecodedTiff {
    /// Parse the first image subfile and its first band.
    pub fn parse(bytes: &[u8]) -> DecodeResult<DecodedTiff> {
        // Raised limits so large DEMs decode in one piece
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 2_000_000_000;
        limits.ifd_value_size = 500_000_000;
        limits.intermediate_buffer_size = 500_000_000;

        let mut decoder = Decoder::new(Cursor::new(bytes))
            .map_err(|e| {
                DecodeError::RasterParse(format!("not a valid TIFF/GeoTIFF file: {}", e))
            })?
            .with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        if width == 0 || height == 0 {
            return Err(DecodeError::RasterParse(format!(
                "image has zero size ({}x{})",
                width, height
            )));
        }

        let image = decoder.read_image().map_err(|e| {
            let message = e.to_string();
            if message.contains("Unknown") || message.contains("unsupported") {
                DecodeError::RasterParse(format!(
                    "unsupported TIFF compression or layout: {}",
                    message
                ))
            } else {
                DecodeError::RasterParse(format!("failed to read image: {}", message))
            }
        })?;

        console_log!("TIFF data type: {}", sample_type_name(&image));
        let interleaved = widen_samples(image);

        let pixel_count = width as usize * height as usize;
        let samples = first_band(interleaved, pixel_count)?;

        let transform = read_transform(&mut decoder);
        let crs = decoder
            .get_tag_u16_vec(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))
            .map(|keys| ModelCrs::from_geo_keys(&keys))
            .unwrap_or(ModelCrs::Geographic);

        Ok(DecodedTiff {
            width,
            height,
            samples,
            transform,
            crs,
        })
    }
}

fn sample_type_name(data: &DecodingResult) -> &'static str {
    match data {
        DecodingResult::U8(_) => "U8 (8-bit unsigned)",
        DecodingResult::U16(_) => "U16 (16-bit unsigned)",
        DecodingResult::U32(_) => "U32 (32-bit unsigned)",
        DecodingResult::U64(_) => "U64 (64-bit unsigned)",
        DecodingResult::I8(_) => "I8 (8-bit signed)",
        DecodingResult::I16(_) => "I16 (16-bit signed)",
        DecodingResult::I32(_) => "I32 (32-bit signed)",
        DecodingResult::I64(_) => "I64 (64-bit signed)",
        DecodingResult::F32(_) => "F32 (32-bit float)",
        DecodingResult::F64(_) => "F64 (64-bit float)",
    }
}

fn widen<T: ToPrimitive>(values: Vec<T>) -> Vec<f64> {
    values
        .into_iter()
        .map(|v| v.to_f64().unwrap_or(f64::NAN))
        .collect()
}

fn widen_samples(data: DecodingResult) -> Vec<f64> {
    match data {
        DecodingResult::U8(values) => widen(values),
        DecodingResult::U16(values) => widen(values),
        DecodingResult::U32(values) => widen(values),
        DecodingResult::U64(values) => widen(values),
        DecodingResult::I8(values) => widen(values),
        DecodingResult::I16(values) => widen(values),
        DecodingResult::I32(values) => widen(values),
        DecodingResult::I64(values) => widen(values),
        DecodingResult::F32(values) => widen(values),
        DecodingResult::F64(values) => values,
    }
}

/// Keep every `n`th sample of a chunky (interleaved) buffer.
fn first_band(interleaved: Vec<f64>, pixel_count: usize) -> DecodeResult<Vec<f64>> {
    if interleaved.len() < pixel_count || interleaved.len() % pixel_count != 0 {
        return Err(DecodeError::RasterParse(format!(
            "sample count {} does not match {} pixels",
            interleaved.len(),
            pixel_count
        )));
    }
    let samples_per_pixel = interleaved.len() / pixel_count;
    if samples_per_pixel == 1 {
        return Ok(interleaved);
    }
    Ok(interleaved.into_iter().step_by(samples_per_pixel).collect())
}

fn read_transform(decoder: &mut Decoder<Cursor<&[u8]>>) -> Option<GeoTransform> {
    // ModelTransformationTag: row-major 4x4, x = m0*col + m1*row + m3, y = m4*col + m5*row + m7
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION)) {
        if m.len() == 16 {
            return Some(GeoTransform {
                origin_x: m[3],
                origin_y: m[7],
                pixel_width: m[0],
                pixel_height: m[5],
                rotation_x: m[1],
                rotation_y: m[4],
            });
        }
        console_warn!("ModelTransformationTag has {} values, expected 16", m.len());
    }

    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .ok()
        .filter(|s| s.len() >= 2)?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT))
        .ok()
        .filter(|t| t.len() >= 6)?;

    // Tiepoint is (I, J, K, X, Y, Z): raster (I, J) sits at model (X, Y).
    let (pixel_i, pixel_j) = (tiepoint[0], tiepoint[1]);
    let (geo_x, geo_y) = (tiepoint[3], tiepoint[4]);
    let (scale_x, scale_y) = (scale[0], scale[1]);

    Some(GeoTransform {
        origin_x: geo_x - pixel_i * scale_x,
        origin_y: geo_y + pixel_j * scale_y,
        pixel_width: scale_x,
        pixel_height: -scale_y,
        rotation_x: 0.0,
        rotation_y: 0.0,
    })
}

/// Envelope `(west, south, east, north)` of the raster in lon/lat degrees.
///
/// Projected rasters are reprojected corner by corner when the CRS is one we
/// know; otherwise their native coordinates pass through with a warning.
pub fn geographic_bounds(
    transform: &GeoTransform,
    crs: ModelCrs,
    width: u32,
    height: u32,
) -> DecodeResult<(f64, f64, f64, f64)> {
    let mut corners = transform.corners(width, height);

    if let ModelCrs::Projected(code) = crs {
        match crs.proj_string() {
            Some(source) => {
                let src = Proj::from_proj_string(&source).map_err(|e| {
                    DecodeError::RasterParse(format!("EPSG:{} projection: {:?}", code, e))
                })?;
                let dst = Proj::from_proj_string(WGS84_LONGLAT).map_err(|e| {
                    DecodeError::RasterParse(format!("WGS84 projection: {:?}", e))
                })?;
                for corner in corners.iter_mut() {
                    let mut point = (corner.0, corner.1, 0.0);
                    proj4rs::transform::transform(&src, &dst, &mut point).map_err(|e| {
                        DecodeError::RasterParse(format!(
                            "cannot reproject ({}, {}) from EPSG:{}: {:?}",
                            corner.0, corner.1, code, e
                        ))
                    })?;
                    *corner = (point.0.to_degrees(), point.1.to_degrees());
                }
                console_log!("Reprojected bounds from EPSG:{} to WGS84", code);
            }
            None => console_warn!(
                "Unsupported projected CRS EPSG:{}; bounds stay in native units",
                code
            ),
        }
    }

    let west = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
    let east = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
    let south = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
    let north = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

    if !(west.is_finite() && east.is_finite() && south.is_finite() && north.is_finite()) {
        return Err(DecodeError::RasterParse(
            "georeferencing produced non-finite bounds".to_string(),
        ));
    }
    if !(west < east && south < north) {
        return Err(DecodeError::RasterParse(format!(
            "degenerate bounding box [{}, {}, {}, {}]",
            west, south, east, north
        )));
    }

    Ok((west, south, east, north))
}
