use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::console::{console_log, console_warn};
use crate::error::{DecodeError, DecodeResult};

/// Extensions recognised as a raster payload (compared case-insensitively).
pub const RASTER_EXTENSIONS: [&str; 2] = [".tif", ".tiff"];

/// Extensions recognised as an ESRI world file next to the raster.
const WORLD_FILE_EXTENSIONS: [&str; 4] = [".tfw", ".tifw", ".tiffw", ".wld"];

/// The raster entry pulled out of an archive, fully decompressed.
#[derive(Debug, Clone)]
pub struct RasterEntry {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Contents of a sibling world file, if the archive carries one.
    pub world_file: Option<String>,
}

pub fn is_raster_name(name: &str) -> bool {
    has_extension(name, &RASTER_EXTENSIONS)
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    let lower = name.to_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext))
}

/// Strip the extension and lowercase, so `DEM.TIF` and `dem.tfw` pair up.
fn stem(name: &str) -> String {
    let lower = name.to_lowercase();
    match lower.rfind('.') {
        Some(idx) => lower[..idx].to_string(),
        None => lower,
    }
}

/// Largest uncompressed entry we are willing to inflate.
pub const MAX_ENTRY_BYTES: u64 = 1 << 30;

/// Open the archive and extract the first raster entry in container order.
///
/// When several entries carry a raster extension the first one in the
/// central directory wins; the rest are ignored. Only the chosen entry (and
/// its world file, if any) is decompressed.
pub fn extract_raster(archive_bytes: &[u8]) -> DecodeResult<RasterEntry> {
    if archive_bytes.is_empty() {
        return Err(DecodeError::Archive("archive is empty".to_string()));
    }

    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;

    // Raw access reads headers only, so entries we cannot inflate still list.
    let mut raster_index = None;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if raster_index.is_none() && !entry.is_dir() && is_raster_name(entry.name()) {
            raster_index = Some(i);
        }
        names.push(entry.name().to_string());
    }

    let index = raster_index
        .ok_or_else(|| DecodeError::Archive("No GeoTIFF file found in zip".to_string()))?;
    let name = names[index].clone();

    let bytes = read_entry(&mut archive, index)?;
    console_log!("Extracted {} ({} bytes) from archive", name, bytes.len());

    let raster_stem = stem(&name);
    let world_file = names
        .iter()
        .position(|candidate| {
            has_extension(candidate, &WORLD_FILE_EXTENSIONS) && stem(candidate) == raster_stem
        })
        .and_then(|i| read_world_file(&mut archive, i, &names[i]));

    Ok(RasterEntry {
        name,
        bytes,
        world_file,
    })
}

/// A world file is only a fallback, so an unreadable one is skipped.
fn read_world_file(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    index: usize,
    name: &str,
) -> Option<String> {
    let text = read_entry(archive, index).and_then(|raw| {
        String::from_utf8(raw)
            .map_err(|_| DecodeError::Archive(format!("world file {} is not valid UTF-8", name)))
    });
    match text {
        Ok(text) => {
            console_log!("Found world file {}", name);
            Some(text)
        }
        Err(e) => {
            console_warn!("Ignoring world file {}: {}", name, e);
            None
        }
    }
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, index: usize) -> DecodeResult<Vec<u8>> {
    let mut file = archive.by_index(index)?;
    if file.size() > MAX_ENTRY_BYTES {
        return Err(DecodeError::Archive(format!(
            "{} declares {} bytes, limit is {}",
            file.name(),
            file.size(),
            MAX_ENTRY_BYTES
        )));
    }
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| {
        DecodeError::Archive(format!("failed to decompress {}: {}", file.name(), e))
    })?;
    Ok(bytes)
}
