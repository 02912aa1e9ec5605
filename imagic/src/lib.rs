//! Autostereogram synthesis and error-diffusion palette reduction.
//!
//! Both engines work on the abstract [`Raster`] read interface and return an owned
//! [`Canvas`]. Decoding and encoding image files is left to the caller (the bundled binary
//! uses the `image` crate).

pub mod config;
pub mod depth;
pub mod error;
pub mod linker;
pub mod palette;
pub mod quantize;
pub mod raster;
pub mod stereogram;

pub use config::{Config, DEPTH_MAX, EdgePolicy};
pub use error::{GenError, Result};
pub use palette::{ColorPalette, Distance, Palette};
pub use quantize::{ColorRemainder, quantize};
pub use raster::{Canvas, ColorModel, Raster};
pub use stereogram::{synthesize, synthesize_with_model};

/// Autostereogram from a depth map and a background texture.
pub fn synthesize_autostereogram<D, B>(
    depth_map: &D,
    background: &B,
    config: &Config,
) -> Result<Canvas>
where
    D: Raster + Sync + ?Sized,
    B: Raster + Sync + ?Sized,
{
    synthesize(depth_map, background, config)
}

/// Reduce `image` to the colors of `palette` with horizontal error diffusion.
pub fn quantize_to_palette<I, P>(image: &I, palette: &P) -> Result<Canvas>
where
    I: Raster + Sync + ?Sized,
    P: Palette + Sync + ?Sized,
{
    quantize(image, palette)
}
