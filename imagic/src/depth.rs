//! Depth sampling and depth-to-disparity mapping.
//!
//! Depth-map pixels are widened to the 16-bit scale, averaged over R/G/B, weighted by
//! alpha (transparent counts as far) and rescaled to `[0, depth_max]`.

use crate::config::Config;
use crate::raster::{Raster, widen};

const CHANNEL_MAX: u64 = 0xFFFF;

/// Normalized depth of the depth-map pixel at `(x, y)`, in `[0, config.depth_max]`.
pub fn depth_at<R: Raster + ?Sized>(depth_map: &R, x: u32, y: u32, config: &Config) -> u32 {
    let [r, g, b, a] = depth_map.at(x, y).0;
    let rgb = (widen(r) + widen(g) + widen(b)) as u64 / 3; // [0, 0xFFFF]
    let rgba = rgb * widen(a) as u64 / CHANNEL_MAX; // [0, 0xFFFF]
    let depth = (rgba * config.depth_max as u64 / CHANNEL_MAX) as u32;
    if config.invert_depth {
        invert(depth, config.depth_max)
    } else {
        depth
    }
}

/// Flip a depth within `[0, depth_max]`. Applying it twice is the identity.
#[inline]
pub fn invert(depth: u32, depth_max: u32) -> u32 {
    depth_max - depth.min(depth_max)
}

/// Horizontal pixel offset linking a column to its left partner for the given depth.
///
/// Cross-eyed: deeper means more separation. Wall-eyed: deeper means less.
pub fn offset_for_depth(depth: u32, config: &Config) -> u32 {
    let range = config.separation_max.saturating_sub(config.separation_min) as u64;
    let depth = depth.min(config.depth_max) as u64;
    let scaled = (depth * range / config.depth_max.max(1) as u64) as u32;
    if config.cross_eyed {
        config.separation_min + scaled
    } else {
        config.separation_max - scaled
    }
}
