use css_color::Srgb;
use image::Rgba;
use rand::Rng;

use crate::error::{GenError, Result};

/// A fixed set of colors with a nearest-color relation.
pub trait Palette {
    fn len(&self) -> usize;

    /// Closest palette color to `color` under the palette's own distance.
    fn nearest(&self, color: Rgba<u8>) -> Rgba<u8>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Distance used to pick the nearest palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distance {
    /// Plain squared distance over R, G, B and A.
    #[default]
    Euclidean,
    /// Squared channel deltas weighted by Rec.601 luma coefficients, plus alpha.
    Luma,
}

impl Distance {
    #[inline(always)]
    fn between(self, a: Rgba<u8>, b: Rgba<u8>) -> u64 {
        let d = |i: usize| {
            let v = a.0[i] as i64 - b.0[i] as i64;
            (v * v) as u64
        };
        match self {
            Distance::Euclidean => d(0) + d(1) + d(2) + d(3),
            Distance::Luma => 299 * d(0) + 587 * d(1) + 114 * d(2) + 1000 * d(3),
        }
    }
}

/// Ordered, non-empty list of colors. Ties go to the earlier entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    colors: Vec<Rgba<u8>>,
    distance: Distance,
}

impl ColorPalette {
    pub fn new(colors: Vec<Rgba<u8>>) -> Result<Self> {
        if colors.is_empty() {
            return Err(GenError::EmptyPalette);
        }
        Ok(Self {
            colors,
            distance: Distance::default(),
        })
    }

    /// Parse CSS color strings (`"#ff0000"`, `"red"`, `"rgb(0 0 0)"`, ...).
    /// Unparseable entries are skipped with a warning.
    pub fn from_css<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let mut colors = Vec::with_capacity(specs.len());
        for spec in specs {
            let spec = spec.as_ref();
            match spec.parse::<Srgb>() {
                Ok(parsed) => {
                    let to_u8 = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
                    let px = Rgba([
                        to_u8(parsed.red),
                        to_u8(parsed.green),
                        to_u8(parsed.blue),
                        to_u8(parsed.alpha),
                    ]);
                    tracing::trace!(input = %spec, rgba = ?px.0, "resolved palette color");
                    colors.push(px);
                }
                Err(_) => tracing::warn!(color = %spec, "failed to parse palette color"),
            }
        }
        Self::new(colors)
    }

    /// `size` opaque colors with channels drawn uniformly from `[0, 254]`.
    pub fn random<R: Rng>(size: usize, rng: &mut R) -> Result<Self> {
        let mut channel = || rng.random_range(0..255u8);
        let colors = (0..size)
            .map(|_| Rgba([channel(), channel(), channel(), 255]))
            .collect();
        Self::new(colors)
    }

    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    pub fn colors(&self) -> &[Rgba<u8>] {
        &self.colors
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }
}

impl Palette for ColorPalette {
    fn len(&self) -> usize {
        self.colors.len()
    }

    fn nearest(&self, color: Rgba<u8>) -> Rgba<u8> {
        let mut best = self.colors[0];
        let mut best_dist = u64::MAX;
        for &c in &self.colors {
            let dist = self.distance.between(color, c);
            if dist < best_dist {
                best_dist = dist;
                best = c;
                if dist == 0 {
                    break;
                }
            }
        }
        best
    }
}
