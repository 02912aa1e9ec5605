use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use imagic::{ColorModel, Config, Distance, EdgePolicy};
use serde::{Deserialize, Serialize};
use tokio::fs;
use toml_edit::DocumentMut;

#[cfg(feature = "embed_config")]
use rust_embed::RustEmbed;

#[cfg(feature = "embed_config")]
#[derive(RustEmbed)]
#[folder = "../"]
#[include = "imagic.example.toml"]
struct ConfigAssets;

/// Default on-disk config filename
pub const DEFAULT_CONFIG_PATH: &str = "imagic.toml";

/// Strongly typed representation of the configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    pub logging: Option<Logging>,
    #[serde(default)]
    pub stereograms: BTreeMap<String, StereogramJob>,
    #[serde(default)]
    pub palettes: BTreeMap<String, PaletteJob>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicySetting {
    #[default]
    Clamp,
    Wrap,
    Strict,
}

impl From<EdgePolicySetting> for EdgePolicy {
    fn from(value: EdgePolicySetting) -> Self {
        match value {
            EdgePolicySetting::Clamp => EdgePolicy::Clamp,
            EdgePolicySetting::Wrap => EdgePolicy::Wrap,
            EdgePolicySetting::Strict => EdgePolicy::Strict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorModelSetting {
    Rgba,
    Rgb,
    Luma,
    LumaAlpha,
}

impl From<ColorModelSetting> for ColorModel {
    fn from(value: ColorModelSetting) -> Self {
        match value {
            ColorModelSetting::Rgba => ColorModel::Rgba,
            ColorModelSetting::Rgb => ColorModel::Rgb,
            ColorModelSetting::Luma => ColorModel::Luma,
            ColorModelSetting::LumaAlpha => ColorModel::LumaAlpha,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSetting {
    #[default]
    Euclidean,
    Luma,
}

impl From<DistanceSetting> for Distance {
    fn from(value: DistanceSetting) -> Self {
        match value {
            DistanceSetting::Euclidean => Distance::Euclidean,
            DistanceSetting::Luma => Distance::Luma,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StereogramJob {
    /// Grayscale depth map; white is near.
    pub depth: PathBuf,
    /// Texture repeated across the output.
    pub background: PathBuf,
    pub output: PathBuf,
    /// Overrides `depth_width / 14`. Non-positive values are ignored.
    pub separation_min: Option<i64>,
    /// Overrides `depth_width / 10`. Non-positive values are ignored.
    pub separation_max: Option<i64>,
    #[serde(default)]
    pub cross_eyed: bool,
    #[serde(default)]
    pub invert_depth: bool,
    pub depth_max: Option<u32>,
    pub edge_policy: Option<EdgePolicySetting>,
    /// Output color model; defaults to the background's.
    pub color_model: Option<ColorModelSetting>,
}

impl StereogramJob {
    /// Engine config for a depth map `depth_width` pixels wide.
    pub fn to_config(&self, depth_width: u32) -> Config {
        let mut cfg = Config::for_width(depth_width)
            .cross_eyed(self.cross_eyed)
            .invert_depth(self.invert_depth)
            .with_edge_policy(self.edge_policy.unwrap_or_default().into());
        if let Some(v) = positive(self.separation_min) {
            cfg.separation_min = v;
        }
        if let Some(v) = positive(self.separation_max) {
            cfg.separation_max = v;
        }
        if let Some(d) = self.depth_max {
            cfg = cfg.with_depth_max(d);
        }
        cfg
    }
}

fn positive(v: Option<i64>) -> Option<u32> {
    v.filter(|&v| v > 0).map(|v| v.min(u32::MAX as i64) as u32)
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaletteJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// CSS color strings.
    #[serde(default)]
    pub colors: Vec<String>,
    /// When set (and `colors` is empty), generate this many random opaque colors.
    pub random_size: Option<usize>,
    pub distance: Option<DistanceSetting>,
}

/// Parsed config document plus the path it came from.
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
    doc: DocumentMut,
}

impl ConfigManager {
    /// Load existing config file. If the file does not exist, creates it from the embedded example.
    pub async fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        if !path.exists() {
            #[cfg(feature = "embed_config")]
            {
                if let Some(example_file) = ConfigAssets::get("imagic.example.toml") {
                    let example_content = std::str::from_utf8(&example_file.data)
                        .with_context(|| "embedded example config is not valid UTF-8")?;

                    fs::write(&path, example_content)
                        .await
                        .with_context(|| format!("writing example config to {}", path.display()))?;

                    tracing::info!(
                        path = %path.display(),
                        "created default config file; edit it to add jobs"
                    );
                } else {
                    bail!(
                        "config file {} not found and embedded example is not available",
                        path.display()
                    );
                }
            }
            #[cfg(not(feature = "embed_config"))]
            {
                bail!("config file {} not found", path.display());
            }
        }

        let text = fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading config file {}", path.display()))?;
        let doc = text
            .parse::<DocumentMut>()
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Convert current document to strongly typed struct.
    pub fn to_struct(&self) -> Result<Settings> {
        let typed: Settings = toml_edit::de::from_document(self.doc.clone())
            .with_context(|| format!("invalid config in {}", self.path.display()))?;
        Ok(typed)
    }
}
