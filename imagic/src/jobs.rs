use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::DynamicImage;
use imagic::{ColorPalette, Raster};
use tokio::task::spawn_blocking;

use crate::settings::{PaletteJob, StereogramJob};

/// Decode an image file on the blocking pool.
async fn load_image(path: PathBuf) -> Result<DynamicImage> {
    spawn_blocking(move || {
        image::open(&path).with_context(|| format!("decoding image {}", path.display()))
    })
    .await?
}

async fn save_image(img: DynamicImage, path: &Path) -> Result<()> {
    let path = path.to_path_buf();
    spawn_blocking(move || {
        img.save(&path)
            .with_context(|| format!("writing image {}", path.display()))
    })
    .await?
}

/// Build one autostereogram from its job description and write it to disk.
pub async fn run_stereogram(id: &str, job: &StereogramJob) -> Result<()> {
    // Both inputs must be decoded before the engine runs.
    let (depth, background) = tokio::try_join!(
        load_image(job.depth.clone()),
        load_image(job.background.clone())
    )?;
    let config = job.to_config(depth.width());
    let model = job.color_model.map(Into::into);
    tracing::debug!(
        job = %id,
        depth_w = depth.width(),
        depth_h = depth.height(),
        bg_w = background.width(),
        bg_h = background.height(),
        separation_min = config.separation_min,
        separation_max = config.separation_max,
        cross_eyed = config.cross_eyed,
        invert_depth = config.invert_depth,
        "starting autostereogram job"
    );
    let canvas = spawn_blocking(move || {
        let model = model.unwrap_or_else(|| background.color_model());
        imagic::synthesize_with_model(&depth, &background, &config, model)
    })
    .await?
    .with_context(|| format!("synthesizing autostereogram for job '{id}'"))?;
    save_image(canvas.into_dynamic_image(), &job.output).await?;
    tracing::info!(job = %id, output = %job.output.display(), "wrote autostereogram");
    Ok(())
}

/// Build the palette a job asks for: explicit colors win over a random palette.
pub fn job_palette(job: &PaletteJob) -> Result<ColorPalette> {
    let palette = if !job.colors.is_empty() {
        ColorPalette::from_css(&job.colors).context("no usable colors in palette job")?
    } else if let Some(size) = job.random_size {
        ColorPalette::random(size, &mut rand::rng())
            .context("random palette size must be positive")?
    } else {
        anyhow::bail!("palette job needs `colors` or `random_size`");
    };
    Ok(palette.with_distance(job.distance.unwrap_or_default().into()))
}

/// Reduce one image to its job palette and write it to disk.
pub async fn run_palette(id: &str, job: &PaletteJob) -> Result<()> {
    let palette = job_palette(job)?;
    let input = load_image(job.input.clone()).await?;
    tracing::debug!(
        job = %id,
        width = input.width(),
        height = input.height(),
        colors = palette.colors().len(),
        "starting palette job"
    );
    let canvas = spawn_blocking(move || imagic::quantize_to_palette(&input, &palette))
        .await?
        .with_context(|| format!("applying palette for job '{id}'"))?;
    save_image(canvas.into_dynamic_image(), &job.output).await?;
    tracing::info!(job = %id, output = %job.output.display(), "wrote palette image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DistanceSetting;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn palette_job(colors: &[&str], random_size: Option<usize>) -> PaletteJob {
        PaletteJob {
            input: PathBuf::from("in.png"),
            output: PathBuf::from("out.png"),
            colors: colors.iter().map(|c| c.to_string()).collect(),
            random_size,
            distance: Some(DistanceSetting::Luma),
        }
    }

    #[test]
    fn explicit_colors_take_precedence() {
        let pal = job_palette(&palette_job(&["black", "white"], Some(40))).unwrap();
        assert_eq!(pal.colors().len(), 2);
        assert_eq!(pal.distance(), imagic::Distance::Luma);
    }

    #[test]
    fn random_palette_when_no_colors() {
        let pal = job_palette(&palette_job(&[], Some(5))).unwrap();
        assert_eq!(pal.colors().len(), 5);
    }

    #[test]
    fn palette_job_without_source_fails() {
        assert!(job_palette(&palette_job(&[], None)).is_err());
        assert!(job_palette(&palette_job(&[], Some(0))).is_err());
    }

    #[tokio::test]
    async fn stereogram_job_round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let depth_path = dir.path().join("depth.png");
        let bg_path = dir.path().join("bg.png");
        let out_path = dir.path().join("out.png");
        GrayImage::from_pixel(40, 3, Luma([0])).save(&depth_path).unwrap();
        RgbaImage::from_fn(40, 3, |x, _| Rgba([x as u8 * 6, 0, 0, 255]))
            .save(&bg_path)
            .unwrap();
        let job = StereogramJob {
            depth: depth_path,
            background: bg_path,
            output: out_path.clone(),
            separation_min: None,
            separation_max: None,
            cross_eyed: false,
            invert_depth: false,
            depth_max: None,
            edge_policy: None,
            color_model: None,
        };
        run_stereogram("test", &job).await.unwrap();
        let written = image::open(&out_path).unwrap();
        assert_eq!((written.width(), written.height()), (40, 3));
    }

    #[tokio::test]
    async fn palette_job_reads_gif_input() {
        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("in.gif");
        let out_path = dir.path().join("out.png");
        RgbaImage::from_fn(6, 2, |x, _| Rgba([x as u8 * 40, 0, 0, 255]))
            .save(&in_path)
            .unwrap();
        let job = PaletteJob {
            input: in_path,
            output: out_path.clone(),
            colors: vec!["black".into(), "red".into()],
            random_size: None,
            distance: None,
        };
        run_palette("gif", &job).await.unwrap();
        let written = image::open(&out_path).unwrap().to_rgba8();
        assert_eq!((written.width(), written.height()), (6, 2));
        assert!(written.pixels().all(|p| p.0[1] == 0 && p.0[2] == 0));
    }

    #[tokio::test]
    async fn missing_input_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let job = PaletteJob {
            input: dir.path().join("absent.png"),
            output: dir.path().join("out.png"),
            colors: vec!["black".into()],
            random_size: None,
            distance: None,
        };
        let err = run_palette("absent", &job).await.unwrap_err();
        assert!(format!("{err:#}").contains("absent.png"));
    }
}
