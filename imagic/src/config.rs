use crate::error::{GenError, Result};

/// Upper bound of the normalized depth range `[0, DEPTH_MAX]`.
pub const DEPTH_MAX: u32 = 3000;

/// What to do with a background column index that lands past the background's right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgePolicy {
    /// Pin to the last column and log a diagnostic.
    #[default]
    Clamp,
    /// Wrap around modulo the background width and log a diagnostic.
    Wrap,
    /// Fail the synthesis with [`GenError::IndexOutOfRange`].
    Strict,
}

/// Stereogram parameters. Built once per invocation, immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Smallest horizontal disparity in pixels.
    pub separation_min: u32,
    /// Largest horizontal disparity in pixels.
    pub separation_max: u32,
    /// Encode for cross-eyed viewing instead of wall-eyed (parallel) viewing.
    pub cross_eyed: bool,
    /// Treat dark depth-map pixels as near instead of far.
    pub invert_depth: bool,
    pub depth_max: u32,
    pub edge_policy: EdgePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separation_min: 0,
            separation_max: 0,
            cross_eyed: false,
            invert_depth: false,
            depth_max: DEPTH_MAX,
            edge_policy: EdgePolicy::default(),
        }
    }
}

impl Config {
    /// Defaults derived from the depth map width: separations of `width / 14` and `width / 10`.
    pub fn for_width(width: u32) -> Self {
        Self {
            separation_min: width / 14,
            separation_max: width / 10,
            ..Self::default()
        }
    }

    pub fn with_separation(mut self, min: u32, max: u32) -> Self {
        self.separation_min = min;
        self.separation_max = max;
        self
    }

    pub fn cross_eyed(mut self, cross_eyed: bool) -> Self {
        self.cross_eyed = cross_eyed;
        self
    }

    pub fn invert_depth(mut self, invert_depth: bool) -> Self {
        self.invert_depth = invert_depth;
        self
    }

    pub fn with_depth_max(mut self, depth_max: u32) -> Self {
        self.depth_max = depth_max;
        self
    }

    pub fn with_edge_policy(mut self, edge_policy: EdgePolicy) -> Self {
        self.edge_policy = edge_policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.separation_max < self.separation_min {
            return Err(GenError::InvalidConfig(format!(
                "separation_max ({}) is smaller than separation_min ({})",
                self.separation_max, self.separation_min
            )));
        }
        if self.depth_max == 0 {
            return Err(GenError::InvalidConfig("depth_max must be positive".into()));
        }
        Ok(())
    }
}
