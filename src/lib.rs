use wasm_bindgen::prelude::*;

mod archive;
mod colorize;
mod colormap;
mod console;
mod error;
mod geotiff;
mod loader;
mod options;
mod overlay;
mod raster;
mod route;
mod sink;
mod terrain_rgb;
mod utils;

#[cfg(test)]
mod test_fixtures;

pub use archive::*;
pub use colorize::*;
pub use colormap::*;
pub use error::*;
pub use geotiff::*;
pub use loader::*;
pub use options::*;
pub use overlay::*;
pub use raster::*;
pub use route::*;
pub use sink::*;
pub use terrain_rgb::*;
pub use utils::*;

// Initialize WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    console::console_log!("GeoTIFF overlay WASM module initialized");
}
