use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{:.0} m", meters)
    }
}

/// `[west, south, east, north]` with 5 decimals (~1 m at the equator).
pub fn format_bbox(bbox: &[f64; 4]) -> String {
    format!(
        "[{:.5}, {:.5}, {:.5}, {:.5}]",
        bbox[0], bbox[1], bbox[2], bbox[3]
    )
}
