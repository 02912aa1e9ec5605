//! Palette reduction with horizontal error diffusion.
//!
//! The rounding error of every pixel is carried into the next pixel of the same row, so
//! columns must be visited strictly left to right. Rows do not share state.

use image::Rgba;

use crate::error::{GenError, Result};
use crate::palette::Palette;
use crate::raster::{Canvas, Raster};

/// Accumulated per-channel error carried along a row, plus the alpha of the last sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorRemainder {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: u8,
}

impl ColorRemainder {
    /// Add the carried error to `color`. Alpha comes from `color`, never accumulated.
    pub fn absorb(self, color: Rgba<u8>) -> Self {
        let [r, g, b, a] = color.0;
        Self {
            r: r as i32 + self.r,
            g: g as i32 + self.g,
            b: b as i32 + self.b,
            a,
        }
    }

    /// Displayable color: each straight channel clamped to `[0, 255]`, which is the
    /// `[0, alpha]` range once premultiplied.
    pub fn candidate(self) -> Rgba<u8> {
        let ch = |v: i32| v.clamp(0, 255) as u8;
        Rgba([ch(self.r), ch(self.g), ch(self.b), self.a])
    }

    /// Error left over after emitting `chosen` for this adjusted color.
    pub fn carry(self, chosen: Rgba<u8>) -> Self {
        let [r, g, b, a] = chosen.0;
        Self {
            r: self.r - r as i32,
            g: self.g - g as i32,
            b: self.b - b as i32,
            a,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

/// Reduce `image` to `palette`, output in the image's color model.
pub fn quantize<I, P>(image: &I, palette: &P) -> Result<Canvas>
where
    I: Raster + Sync + ?Sized,
    P: Palette + Sync + ?Sized,
{
    if image.is_empty() {
        return Err(GenError::MissingInput { what: "image" });
    }
    if palette.is_empty() {
        return Err(GenError::MissingInput { what: "palette" });
    }
    let (width, height) = image.dimensions();
    let _span = tracing::debug_span!("quantize", width, height, colors = palette.len()).entered();

    let mut canvas = Canvas::new(width, height, image.color_model());
    diffuse_rows(image, palette, &mut canvas);
    tracing::debug!(width, height, "palette applied");
    Ok(canvas.finish())
}

/// Quantize row `y` into `out`, returning the remainder left after the last column.
pub fn quantize_row<I, P>(image: &I, palette: &P, y: u32, out: &mut [Rgba<u8>]) -> ColorRemainder
where
    I: Raster + ?Sized,
    P: Palette + ?Sized,
{
    let mut remainder = ColorRemainder::default();
    for (x, px) in out.iter_mut().enumerate().take(image.width() as usize) {
        let adjusted = remainder.absorb(image.at(x as u32, y));
        let chosen = palette.nearest(adjusted.candidate());
        *px = chosen;
        remainder = adjusted.carry(chosen);
    }
    remainder
}

#[cfg(not(feature = "parallel"))]
fn diffuse_rows<I, P>(image: &I, palette: &P, canvas: &mut Canvas)
where
    I: Raster + Sync + ?Sized,
    P: Palette + Sync + ?Sized,
{
    for (y, row) in canvas.rows_mut().enumerate() {
        quantize_row(image, palette, y as u32, row);
    }
}

#[cfg(feature = "parallel")]
fn diffuse_rows<I, P>(image: &I, palette: &P, canvas: &mut Canvas)
where
    I: Raster + Sync + ?Sized,
    P: Palette + Sync + ?Sized,
{
    use rayon::prelude::*;

    canvas.par_rows_mut().enumerate().for_each(|(y, row)| {
        quantize_row(image, palette, y as u32, row);
    });
}
