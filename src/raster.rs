use serde::Serialize;

use crate::archive;
use crate::console::{console_log, console_warn};
use crate::error::{DecodeError, DecodeResult};
use crate::geotiff::{self, DecodedTiff, GeoTransform};
use crate::utils::format_bbox;

/// Sentinel marking missing measurements.
pub const NO_DATA_VALUE: f64 = -9999.0;

/// A sample is valid when it is finite and not the no-data sentinel.
#[inline]
pub fn is_valid_sample(value: f64) -> bool {
    value.is_finite() && value != NO_DATA_VALUE
}

/// Geographic rectangle covered by a raster, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> DecodeResult<BoundingBox> {
        if !(west < east && south < north) {
            return Err(DecodeError::RasterParse(format!(
                "invalid bounding box [{}, {}, {}, {}]",
                west, south, east, north
            )));
        }
        Ok(BoundingBox {
            west,
            south,
            east,
            north,
        })
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Image-source corners as `[lon, lat]`: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [[f64; 2]; 4] {
        [
            [self.west, self.north],
            [self.east, self.north],
            [self.east, self.south],
            [self.west, self.south],
        ]
    }

    /// `[[west, south], [east, north]]`, the shape map fit-bounds calls expect.
    pub fn fit_bounds(&self) -> [[f64; 2]; 2] {
        [[self.west, self.south], [self.east, self.north]]
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    /// False when the box leaves the lon/lat domain, usually a sign of
    /// projected coordinates passed through unchanged.
    pub fn is_geographic(&self) -> bool {
        self.west >= -180.0 && self.east <= 180.0 && self.south >= -90.0 && self.north <= 90.0
    }
}

/// Min/max over the valid samples of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    /// Single pass over the samples, skipping no-data and non-finite values.
    pub fn scan(samples: &[f64]) -> Option<ValidRange> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut seen = false;
        for &value in samples.iter().filter(|v| is_valid_sample(**v)) {
            seen = true;
            if value < min {
                min = value;
            }
            if value > max {
                max = value;
            }
        }
        seen.then_some(ValidRange { min, max })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// A decoded, georeferenced single-band raster.
///
/// Immutable once built: fields are private and the type only hands out
/// shared views.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSample {
    width: u32,
    height: u32,
    samples: Vec<f64>,
    bounding_box: BoundingBox,
    valid_range: Option<ValidRange>,
}

impl RasterSample {
    pub fn new(
        width: u32,
        height: u32,
        samples: Vec<f64>,
        bounding_box: BoundingBox,
    ) -> DecodeResult<RasterSample> {
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(DecodeError::RasterParse(format!(
                "{} samples for a {}x{} raster",
                samples.len(),
                width,
                height
            )));
        }
        let valid_range = ValidRange::scan(&samples);
        Ok(RasterSample {
            width,
            height,
            samples,
            bounding_box,
            valid_range,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// None when every sample is no-data.
    pub fn valid_range(&self) -> Option<ValidRange> {
        self.valid_range
    }

    /// Like [`valid_range`](Self::valid_range), but reports the all-invalid
    /// case as the soft [`DecodeError::DegenerateRange`].
    pub fn require_valid_range(&self) -> DecodeResult<ValidRange> {
        self.valid_range.ok_or(DecodeError::DegenerateRange {
            total: self.samples.len(),
        })
    }

    pub fn valid_count(&self) -> usize {
        self.samples.iter().filter(|v| is_valid_sample(**v)).count()
    }
}

/// A decoded raster plus the name of the archive entry it came from.
#[derive(Debug, Clone)]
pub struct DecodedArchive {
    pub entry_name: String,
    pub raster: RasterSample,
}

/// Archive bytes → the first GeoTIFF entry → georeferenced raster.
///
/// All-or-nothing: any failure discards everything decoded so far.
pub fn decode(archive_bytes: &[u8]) -> DecodeResult<RasterSample> {
    decode_archive(archive_bytes).map(|decoded| decoded.raster)
}

pub fn decode_archive(archive_bytes: &[u8]) -> DecodeResult<DecodedArchive> {
    let entry = archive::extract_raster(archive_bytes)?;
    let tiff = DecodedTiff::parse(&entry.bytes)?;

    let transform = match (&tiff.transform, &entry.world_file) {
        (Some(transform), _) => transform.clone(),
        (None, Some(world_file)) => {
            console_log!("No GeoTIFF tags in {}, using world file", entry.name);
            GeoTransform::from_world_file(world_file)?
        }
        (None, None) => {
            return Err(DecodeError::RasterParse(format!(
                "{} has no readable bounding box (no GeoTIFF tags or world file)",
                entry.name
            )))
        }
    };

    let (west, south, east, north) =
        geotiff::geographic_bounds(&transform, tiff.crs, tiff.width, tiff.height)?;
    let bounding_box = BoundingBox::new(west, south, east, north)?;
    if !bounding_box.is_geographic() {
        console_warn!(
            "Bounds {} are outside the lon/lat domain; the raster may be in a projected CRS",
            format_bbox(&bounding_box.to_array())
        );
    }

    let raster = RasterSample::new(tiff.width, tiff.height, tiff.samples, bounding_box)?;
    match raster.valid_range() {
        Some(range) => console_log!(
            "Decoded {}x{} raster, bounds {}, range [{}, {}]",
            raster.width(),
            raster.height(),
            format_bbox(&bounding_box.to_array()),
            range.min,
            range.max
        ),
        None => console_warn!("Raster {} contains only no-data values", entry.name),
    }

    Ok(DecodedArchive {
        entry_name: entry.name,
        raster,
    })
}
