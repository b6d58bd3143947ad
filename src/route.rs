use geo::{HaversineLength, LineString};
use wasm_bindgen::prelude::*;

use crate::error::RouteError;
use crate::utils::format_distance;

pub const DEFAULT_STEP_INTERVAL_MS: u32 = 1000;

/// Peace Avenue, Ulaanbaatar, west to east, as `[lat, lon]`.
pub const ULAANBAATAR_ROUTE: [[f64; 2]; 11] = [
    [47.915084, 106.89252], // Gandan Monastery / western Peace Ave
    [47.9155, 106.8965],    // State Department Store
    [47.916, 106.901],
    [47.9165, 106.906],
    [47.917, 106.911],
    [47.9176, 106.9176], // Sukhbaatar Square
    [47.918, 106.9215],
    [47.9185, 106.926],
    [47.919, 106.931],
    [47.9195, 106.936], // Eastern crossroad
    [47.92, 106.941],
];

/// Simulated device position stepping along a fixed route.
///
/// The host drives it from a timer every `interval_ms`; after the last
/// point the position wraps to the first.
#[wasm_bindgen]
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSimulator {
    route: Vec<[f64; 2]>,
    index: usize,
    interval_ms: u32,
}

impl RouteSimulator {
    pub fn from_points(
        route: Vec<[f64; 2]>,
        interval_ms: u32,
    ) -> Result<RouteSimulator, RouteError> {
        if route.is_empty() {
            return Err(RouteError::Empty);
        }
        if interval_ms == 0 {
            return Err(RouteError::InvalidInterval(interval_ms));
        }
        for (index, &[lat, lon]) in route.iter().enumerate() {
            let valid =
                lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0;
            if !valid {
                return Err(RouteError::InvalidCoordinate { index, lat, lon });
            }
        }
        Ok(RouteSimulator {
            route,
            index: 0,
            interval_ms,
        })
    }

    /// Route from a flat `[lat0, lon0, lat1, lon1, ...]` list.
    pub fn from_flat(coordinates: &[f64], interval_ms: u32) -> Result<RouteSimulator, RouteError> {
        if coordinates.len() % 2 != 0 {
            return Err(RouteError::OddCoordinateCount(coordinates.len()));
        }
        let route = coordinates
            .chunks_exact(2)
            .map(|pair| [pair[0], pair[1]])
            .collect();
        RouteSimulator::from_points(route, interval_ms)
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.route
    }

    pub fn current(&self) -> [f64; 2] {
        self.route[self.index]
    }

    /// Move to the next point, wrapping after the last one.
    pub fn advance(&mut self) -> [f64; 2] {
        self.index = (self.index + 1) % self.route.len();
        self.current()
    }

    /// Great-circle length of the open route in meters.
    pub fn length_m(&self) -> f64 {
        let line: LineString<f64> = self
            .route
            .iter()
            .map(|&[lat, lon]| (lon, lat))
            .collect::<Vec<_>>()
            .into();
        line.haversine_length()
    }
}

#[wasm_bindgen]
impl RouteSimulator {
    /// Simulator on the built-in Ulaanbaatar route.
    #[wasm_bindgen(constructor)]
    pub fn new(interval_ms: Option<u32>) -> Result<RouteSimulator, JsValue> {
        Ok(RouteSimulator::from_points(
            ULAANBAATAR_ROUTE.to_vec(),
            interval_ms.unwrap_or(DEFAULT_STEP_INTERVAL_MS),
        )?)
    }

    #[wasm_bindgen]
    pub fn from_coordinates(
        coordinates: Vec<f64>,
        interval_ms: Option<u32>,
    ) -> Result<RouteSimulator, JsValue> {
        Ok(RouteSimulator::from_flat(
            &coordinates,
            interval_ms.unwrap_or(DEFAULT_STEP_INTERVAL_MS),
        )?)
    }

    /// Advance one point and return it as `[lat, lon]`.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Vec<f64> {
        self.advance().to_vec()
    }

    #[wasm_bindgen(getter)]
    pub fn position(&self) -> Vec<f64> {
        self.current().to_vec()
    }

    #[wasm_bindgen(getter)]
    pub fn index(&self) -> usize {
        self.index
    }

    #[wasm_bindgen(getter)]
    pub fn len(&self) -> usize {
        self.route.len()
    }

    #[wasm_bindgen(getter)]
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Flattened `[lat, lon]` pairs for drawing the route line.
    #[wasm_bindgen]
    pub fn route(&self) -> Vec<f64> {
        self.route.iter().flatten().copied().collect()
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.index = 0;
    }

    #[wasm_bindgen]
    pub fn route_length_m(&self) -> f64 {
        self.length_m()
    }

    #[wasm_bindgen]
    pub fn summary(&self) -> String {
        format!(
            "{} points, {} route, step every {} ms",
            self.route.len(),
            format_distance(self.length_m()),
            self.interval_ms
        )
    }
}
