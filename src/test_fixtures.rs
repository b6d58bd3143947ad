//! In-memory archives and GeoTIFFs for unit tests.

use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_DOUBLE: u16 = 12;

/// Build a deflated zip archive with the given entries, in order.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    build_zip(entries, CompressionMethod::Deflated)
}

/// Same as [`zip_archive`] but uncompressed, so headers can be patched freely.
pub fn zip_archive_stored(entries: &[(&str, &[u8])]) -> Vec<u8> {
    build_zip(entries, CompressionMethod::Stored)
}

fn build_zip(entries: &[(&str, &[u8])], method: CompressionMethod) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(method);
    for (name, bytes) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Header fields to overwrite in an entry's local and central records.
#[derive(Default)]
pub struct HeaderPatch {
    pub method: Option<u16>,
    pub size: Option<u32>,
}

const LOCAL_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
const CENTRAL_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];

/// Rewrite the compression method and/or uncompressed size of `name`.
pub fn patch_entry_header(zip: &mut [u8], name: &str, edit: impl Fn(&mut HeaderPatch)) {
    let mut patch = HeaderPatch::default();
    edit(&mut patch);

    // (signature, method offset, size offset, name length offset, name offset)
    let layouts = [(LOCAL_SIGNATURE, 8, 22, 26, 30), (CENTRAL_SIGNATURE, 10, 24, 28, 46)];
    for (signature, method_at, size_at, name_len_at, name_at) in layouts {
        let mut patched = false;
        for start in 0..zip.len().saturating_sub(name_at) {
            if zip[start..start + 4] != signature {
                continue;
            }
            let name_len =
                u16::from_le_bytes([zip[start + name_len_at], zip[start + name_len_at + 1]]);
            let name_start = start + name_at;
            let name_end = name_start + name_len as usize;
            if name_end > zip.len() || &zip[name_start..name_end] != name.as_bytes() {
                continue;
            }
            if let Some(method) = patch.method {
                zip[start + method_at..start + method_at + 2]
                    .copy_from_slice(&method.to_le_bytes());
            }
            if let Some(size) = patch.size {
                zip[start + size_at..start + size_at + 4].copy_from_slice(&size.to_le_bytes());
            }
            patched = true;
        }
        assert!(patched, "no header for {} found", name);
    }
}

struct IfdEntry {
    tag: u16,
    kind: u16,
    count: u32,
    payload: Vec<u8>,
}

fn shorts(tag: u16, values: &[u16]) -> IfdEntry {
    let mut payload = Vec::new();
    for v in values {
        payload.write_u16::<LittleEndian>(*v).unwrap();
    }
    IfdEntry {
        tag,
        kind: TYPE_SHORT,
        count: values.len() as u32,
        payload,
    }
}

fn long(tag: u16, value: u32) -> IfdEntry {
    let mut payload = Vec::new();
    payload.write_u32::<LittleEndian>(value).unwrap();
    IfdEntry {
        tag,
        kind: TYPE_LONG,
        count: 1,
        payload,
    }
}

fn doubles(tag: u16, values: &[f64]) -> IfdEntry {
    let mut payload = Vec::new();
    for v in values {
        payload.write_f64::<LittleEndian>(*v).unwrap();
    }
    IfdEntry {
        tag,
        kind: TYPE_DOUBLE,
        count: values.len() as u32,
        payload,
    }
}

/// A single-strip, uncompressed, little-endian TIFF with optional GeoTIFF tags.
pub struct TiffFixture {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u16,
    /// 1 = unsigned int, 2 = signed int, 3 = IEEE float
    pub sample_format: u16,
    pub samples_per_pixel: u16,
    pub data: Vec<u8>,
    pub pixel_scale: Option<[f64; 3]>,
    pub tiepoint: Option<[f64; 6]>,
    pub transformation: Option<[f64; 16]>,
    pub geo_keys: Option<Vec<u16>>,
}

impl TiffFixture {
    /// Float32 raster georeferenced by tiepoint + pixel scale.
    pub fn float32(
        width: u32,
        height: u32,
        samples: &[f32],
        origin: (f64, f64),
        scale: (f64, f64),
    ) -> Self {
        let mut data = Vec::with_capacity(samples.len() * 4);
        for s in samples {
            data.write_f32::<LittleEndian>(*s).unwrap();
        }
        TiffFixture {
            width,
            height,
            bits_per_sample: 32,
            sample_format: 3,
            samples_per_pixel: 1,
            data,
            pixel_scale: Some([scale.0, scale.1, 0.0]),
            tiepoint: Some([0.0, 0.0, 0.0, origin.0, origin.1, 0.0]),
            transformation: None,
            geo_keys: None,
        }
    }

    /// Signed 16-bit raster without any georeferencing tags.
    pub fn int16_plain(width: u32, height: u32, samples: &[i16]) -> Self {
        let mut data = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            data.write_i16::<LittleEndian>(*s).unwrap();
        }
        TiffFixture {
            width,
            height,
            bits_per_sample: 16,
            sample_format: 2,
            samples_per_pixel: 1,
            data,
            pixel_scale: None,
            tiepoint: None,
            transformation: None,
            geo_keys: None,
        }
    }

    /// 8-bit RGB raster, interleaved, without georeferencing tags.
    pub fn rgb8(width: u32, height: u32, pixels: &[[u8; 3]]) -> Self {
        TiffFixture {
            width,
            height,
            bits_per_sample: 8,
            sample_format: 1,
            samples_per_pixel: 3,
            data: pixels.iter().flatten().copied().collect(),
            pixel_scale: None,
            tiepoint: None,
            transformation: None,
            geo_keys: None,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let bits: Vec<u16> = vec![self.bits_per_sample; self.samples_per_pixel as usize];
        let formats: Vec<u16> = vec![self.sample_format; self.samples_per_pixel as usize];
        let photometric = if self.samples_per_pixel == 3 { 2 } else { 1 };

        let mut entries = vec![
            long(256, self.width),
            long(257, self.height),
            shorts(258, &bits),
            shorts(259, &[1]),
            shorts(262, &[photometric]),
            long(273, 0), // patched below
            shorts(277, &[self.samples_per_pixel]),
            long(278, self.height),
            long(279, self.data.len() as u32),
            shorts(284, &[1]),
            shorts(339, &formats),
        ];
        if let Some(scale) = self.pixel_scale {
            entries.push(doubles(33550, &scale));
        }
        if let Some(tiepoint) = self.tiepoint {
            entries.push(doubles(33922, &tiepoint));
        }
        if let Some(matrix) = self.transformation {
            entries.push(doubles(34264, &matrix));
        }
        if let Some(keys) = &self.geo_keys {
            entries.push(shorts(34735, keys));
        }
        entries.sort_by_key(|e| e.tag);

        let ifd_size = 2 + entries.len() * 12 + 4;
        let pixel_offset = 8 + ifd_size;
        for entry in entries.iter_mut().filter(|e| e.tag == 273) {
            entry.payload = (pixel_offset as u32).to_le_bytes().to_vec();
        }

        let mut extra_offset = pixel_offset + self.data.len();
        if extra_offset % 2 == 1 {
            extra_offset += 1;
        }
        let mut extra = Vec::new();

        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.write_u16::<LittleEndian>(42).unwrap();
        out.write_u32::<LittleEndian>(8).unwrap();
        out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
        for entry in &entries {
            out.write_u16::<LittleEndian>(entry.tag).unwrap();
            out.write_u16::<LittleEndian>(entry.kind).unwrap();
            out.write_u32::<LittleEndian>(entry.count).unwrap();
            if entry.payload.len() <= 4 {
                let mut inline = entry.payload.clone();
                inline.resize(4, 0);
                out.extend_from_slice(&inline);
            } else {
                let offset = extra_offset + extra.len();
                out.write_u32::<LittleEndian>(offset as u32).unwrap();
                extra.extend_from_slice(&entry.payload);
                if extra.len() % 2 == 1 {
                    extra.push(0);
                }
            }
        }
        out.write_u32::<LittleEndian>(0).unwrap();

        out.extend_from_slice(&self.data);
        out.resize(extra_offset, 0);
        out.extend_from_slice(&extra);
        out
    }
}

/// A zipped single-band GeoTIFF covering `[origin.0, origin.0 + width * scale.0]`
/// in x and `[origin.1 - height * scale.1, origin.1]` in y.
pub fn zipped_float_geotiff(
    width: u32,
    height: u32,
    samples: &[f32],
    origin: (f64, f64),
    scale: (f64, f64),
) -> Vec<u8> {
    let tiff = TiffFixture::float32(width, height, samples, origin, scale).encode();
    zip_archive(&[("raster.tif", tiff.as_slice())])
}
