//! Piecewise-linear color ramps.

/// RGB color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A control point of a ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub pos: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(pos: f64, color: Rgb) -> Self {
        Self { pos, color }
    }
}

const TERRAIN_STOPS: [ColorStop; 6] = [
    ColorStop::new(0.0, Rgb::new(0, 0, 128)),   // Dark blue
    ColorStop::new(0.2, Rgb::new(0, 128, 255)), // Light blue
    ColorStop::new(0.4, Rgb::new(0, 255, 128)), // Cyan-green
    ColorStop::new(0.6, Rgb::new(128, 255, 0)), // Yellow-green
    ColorStop::new(0.8, Rgb::new(255, 200, 0)), // Orange
    ColorStop::new(1.0, Rgb::new(255, 0, 0)),   // Red
];

/// Ordered control points; positions ascend.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self::terrain()
    }
}

impl ColorRamp {
    /// The fixed blue → green → yellow → red terrain ramp.
    pub fn terrain() -> Self {
        Self {
            stops: TERRAIN_STOPS.to_vec(),
        }
    }

    /// Build a ramp from stops sorted by position. Returns None for fewer than
    /// two stops or descending/non-finite positions.
    pub fn from_stops(stops: Vec<ColorStop>) -> Option<Self> {
        if stops.len() < 2 || stops.iter().any(|s| !s.pos.is_finite()) {
            return None;
        }
        if stops.windows(2).any(|w| w[0].pos > w[1].pos) {
            return None;
        }
        Some(Self { stops })
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Evaluate the ramp at `t`.
    ///
    /// The first adjacent pair with `lower.pos <= t <= upper.pos` wins; when
    /// no pair brackets `t` the first and last stops are used.
    pub fn evaluate(&self, t: f64) -> Rgb {
        let mut lower = self.stops[0];
        let mut upper = self.stops[self.stops.len() - 1];

        for pair in self.stops.windows(2) {
            if t >= pair[0].pos && t <= pair[1].pos {
                lower = pair[0];
                upper = pair[1];
                break;
            }
        }

        let span = upper.pos - lower.pos;
        let local_t = if span == 0.0 { 0.0 } else { (t - lower.pos) / span };

        Rgb::new(
            lerp_channel(lower.color.r, upper.color.r, local_t),
            lerp_channel(lower.color.g, upper.color.g, local_t),
            lerp_channel(lower.color.b, upper.color.b, local_t),
        )
    }
}

/// Interpolate one channel and round to nearest, halves up.
fn lerp_channel(from: u8, to: u8, t: f64) -> u8 {
    let value = from as f64 + (to as f64 - from as f64) * t;
    (value + 0.5).floor().clamp(0.0, 255.0) as u8
}
