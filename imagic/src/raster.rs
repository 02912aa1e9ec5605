//! Read-only pixel access shared by inputs and the output canvas.
//!
//! Inputs come straight from the `image` crate (decoded by the caller); the engines only
//! ever see them through [`Raster`]. Output is a [`Canvas`] filled row by row and handed
//! back complete.

use image::{ColorType, DynamicImage, GenericImageView, ImageBuffer, Rgba, RgbaImage};

/// Color model of a raster. Output pixels are projected into it when written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorModel {
    #[default]
    Rgba,
    Rgb,
    Luma,
    LumaAlpha,
}

impl ColorModel {
    pub fn from_color_type(color: ColorType) -> Self {
        match color {
            ColorType::L8 | ColorType::L16 => ColorModel::Luma,
            ColorType::La8 | ColorType::La16 => ColorModel::LumaAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorModel::Rgb,
            _ => ColorModel::Rgba,
        }
    }

    /// Project a pixel into this model, still expressed as RGBA.
    pub fn convert(self, px: Rgba<u8>) -> Rgba<u8> {
        let [r, g, b, a] = px.0;
        match self {
            ColorModel::Rgba => px,
            ColorModel::Rgb => Rgba([r, g, b, 255]),
            ColorModel::Luma => {
                let l = luma(r, g, b);
                Rgba([l, l, l, 255])
            }
            ColorModel::LumaAlpha => {
                let l = luma(r, g, b);
                Rgba([l, l, l, a])
            }
        }
    }
}

// Rec.601 weights in integer form.
#[inline(always)]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let sum = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    ((sum + 500) / 1000) as u8
}

/// Widen an 8-bit channel onto the 16-bit scale `[0, 0xFFFF]`.
#[inline(always)]
pub fn widen(c: u8) -> u32 {
    c as u32 * 0x101
}

/// A 2D grid of RGBA pixels. Callers must keep `x < width` and `y < height`;
/// out-of-range access is a bug and panics.
pub trait Raster {
    fn dimensions(&self) -> (u32, u32);
    fn color_model(&self) -> ColorModel;
    fn at(&self, x: u32, y: u32) -> Rgba<u8>;

    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn is_empty(&self) -> bool {
        let (w, h) = self.dimensions();
        w == 0 || h == 0
    }
}

impl Raster for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        GenericImageView::dimensions(self)
    }

    fn color_model(&self) -> ColorModel {
        ColorModel::from_color_type(self.color())
    }

    fn at(&self, x: u32, y: u32) -> Rgba<u8> {
        self.get_pixel(x, y)
    }
}

impl Raster for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        ImageBuffer::dimensions(self)
    }

    fn color_model(&self) -> ColorModel {
        ColorModel::Rgba
    }

    fn at(&self, x: u32, y: u32) -> Rgba<u8> {
        *ImageBuffer::get_pixel(self, x, y)
    }
}

/// Owned output raster. Allocated once; rows are written through disjoint slices.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    model: ColorModel,
    pixels: Vec<Rgba<u8>>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, model: ColorModel) -> Self {
        Self {
            width,
            height,
            model,
            pixels: vec![Rgba([0, 0, 0, 0]); width as usize * height as usize],
        }
    }

    /// Mutable row slices, top to bottom. Pixels written here are not yet projected
    /// into the color model; call [`Canvas::finish`] once all rows are filled.
    pub(crate) fn rows_mut(&mut self) -> std::slice::ChunksMut<'_, Rgba<u8>> {
        self.pixels.chunks_mut(self.width.max(1) as usize)
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn par_rows_mut(&mut self) -> rayon::slice::ChunksMut<'_, Rgba<u8>> {
        use rayon::slice::ParallelSliceMut;
        self.pixels.par_chunks_mut(self.width.max(1) as usize)
    }

    pub(crate) fn finish(mut self) -> Self {
        if self.model != ColorModel::Rgba {
            let model = self.model;
            for px in self.pixels.iter_mut() {
                *px = model.convert(*px);
            }
        }
        self
    }

    pub fn pixels(&self) -> &[Rgba<u8>] {
        &self.pixels
    }

    pub fn row(&self, y: u32) -> &[Rgba<u8>] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }

    /// Materialize as an `image` buffer in the canvas color model.
    pub fn into_dynamic_image(self) -> DynamicImage {
        let Canvas {
            width,
            height,
            model,
            pixels,
        } = self;
        let raw: Vec<u8> = pixels.iter().flat_map(|p| p.0).collect();
        // Buffer length always matches width * height * 4.
        let rgba = RgbaImage::from_raw(width, height, raw)
            .unwrap_or_else(|| RgbaImage::new(width, height));
        let img = DynamicImage::ImageRgba8(rgba);
        match model {
            ColorModel::Rgba => img,
            ColorModel::Rgb => DynamicImage::ImageRgb8(img.to_rgb8()),
            ColorModel::Luma => DynamicImage::ImageLuma8(img.to_luma8()),
            ColorModel::LumaAlpha => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
        }
    }
}

impl Raster for Canvas {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn color_model(&self) -> ColorModel {
        self.model
    }

    fn at(&self, x: u32, y: u32) -> Rgba<u8> {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}
