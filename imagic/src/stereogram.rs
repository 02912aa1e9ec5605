use crate::config::Config;
use crate::error::{GenError, Result};
use crate::linker::RowLinker;
use crate::raster::{Canvas, ColorModel, Raster};

/// Build an autostereogram sized to `depth_map`, in the background's color model.
pub fn synthesize<D, B>(depth_map: &D, background: &B, config: &Config) -> Result<Canvas>
where
    D: Raster + Sync + ?Sized,
    B: Raster + Sync + ?Sized,
{
    synthesize_with_model(depth_map, background, config, background.color_model())
}

/// Same as [`synthesize`] with an explicit output color model.
pub fn synthesize_with_model<D, B>(
    depth_map: &D,
    background: &B,
    config: &Config,
    model: ColorModel,
) -> Result<Canvas>
where
    D: Raster + Sync + ?Sized,
    B: Raster + Sync + ?Sized,
{
    if depth_map.is_empty() {
        return Err(GenError::MissingInput { what: "depth map" });
    }
    if background.is_empty() {
        return Err(GenError::MissingInput { what: "background" });
    }
    config.validate()?;

    let (width, height) = depth_map.dimensions();
    let _span = tracing::debug_span!(
        "synthesize",
        width,
        height,
        bg_width = background.width(),
        bg_height = background.height(),
        cross_eyed = config.cross_eyed
    )
    .entered();

    let linker = RowLinker::new(depth_map, background, config);
    let mut canvas = Canvas::new(width, height, model);
    let corrected = fill_rows(&linker, &mut canvas)?;
    if corrected > 0 {
        tracing::warn!(
            corrected,
            policy = ?config.edge_policy,
            bg_width = background.width(),
            "background index exceeded background width"
        );
    }
    tracing::debug!(width, height, "autostereogram assembled");
    Ok(canvas.finish())
}

#[cfg(not(feature = "parallel"))]
fn fill_rows<D, B>(linker: &RowLinker<'_, D, B>, canvas: &mut Canvas) -> Result<usize>
where
    D: Raster + Sync + ?Sized,
    B: Raster + Sync + ?Sized,
{
    let mut corrected = 0;
    for (y, row) in canvas.rows_mut().enumerate() {
        corrected += linker.fill_row(y as u32, row)?;
    }
    Ok(corrected)
}

#[cfg(feature = "parallel")]
fn fill_rows<D, B>(linker: &RowLinker<'_, D, B>, canvas: &mut Canvas) -> Result<usize>
where
    D: Raster + Sync + ?Sized,
    B: Raster + Sync + ?Sized,
{
    use rayon::prelude::*;

    // Collected in row order so the reported failure is the lowest failing row.
    let results: Vec<Result<usize>> = canvas
        .par_rows_mut()
        .enumerate()
        .map(|(y, row)| linker.fill_row(y as u32, row))
        .collect();
    results.into_iter().sum()
}
