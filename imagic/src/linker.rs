//! Per-row pixel linking.
//!
//! Each output column is linked to the column `offset` pixels to its left. Columns whose
//! link falls off the left edge form the seeded strip; everything after it copies the
//! background index of its link, so the texture repeats with a depth-dependent period.

use image::Rgba;

use crate::config::{Config, EdgePolicy};
use crate::depth::{depth_at, offset_for_depth};
use crate::error::{GenError, Result};
use crate::raster::Raster;

/// Background lookup plan for one output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedRow {
    /// Background row sampled by this output row.
    pub bg_y: u32,
    /// Background column per output column, already inside the background width.
    pub bg_indexes: Vec<usize>,
    /// Number of indexes the edge policy had to pull back inside the background.
    pub corrected: usize,
}

pub struct RowLinker<'a, D: ?Sized, B: ?Sized> {
    depth_map: &'a D,
    background: &'a B,
    config: &'a Config,
}

impl<'a, D, B> RowLinker<'a, D, B>
where
    D: Raster + ?Sized,
    B: Raster + ?Sized,
{
    pub fn new(depth_map: &'a D, background: &'a B, config: &'a Config) -> Self {
        Self {
            depth_map,
            background,
            config,
        }
    }

    /// Nearest background row for output row `y`.
    pub fn background_row(&self, y: u32) -> u32 {
        let (bg_h, dm_h) = (self.background.height() as u64, self.depth_map.height() as u64);
        (y as u64 * bg_h / dm_h.max(1)) as u32
    }

    /// Column each output pixel links to; negative when the link leaves the image.
    pub fn source_indexes(&self, y: u32) -> Vec<i64> {
        (0..self.depth_map.width())
            .map(|x| {
                let depth = depth_at(self.depth_map, x, y, self.config);
                x as i64 - offset_for_depth(depth, self.config) as i64
            })
            .collect()
    }

    pub fn link_row(&self, y: u32) -> Result<LinkedRow> {
        let bg_y = self.background_row(y);
        let sources = self.source_indexes(y);
        let strip = initial_width(&sources);
        if strip == 0 {
            return Err(GenError::DegenerateRow { y });
        }

        let bg_width = self.background.width();
        let step = bg_width as usize / strip;
        let mut bg_indexes = vec![0usize; sources.len()];
        for (x, slot) in bg_indexes.iter_mut().take(strip).enumerate() {
            *slot = x * step;
        }

        let mut used = vec![false; sources.len()];
        for x in strip..sources.len() {
            let si = sources[x];
            if si < 0 {
                bg_indexes[x] = bg_indexes[x - 1] + 1;
                continue;
            }
            let si = si as usize;
            if used[si] && !self.config.cross_eyed {
                // Two right-eye columns sharing one left-eye sample read as two depths.
                bg_indexes[x] = bg_indexes[x - 1] + 1;
            } else {
                bg_indexes[x] = bg_indexes[si];
                used[si] = true;
            }
        }

        let corrected = self.apply_edge_policy(&mut bg_indexes, y)?;
        Ok(LinkedRow {
            bg_y,
            bg_indexes,
            corrected,
        })
    }

    /// Link row `y` and write its pixels into `out`. Returns the corrected index count.
    pub fn fill_row(&self, y: u32, out: &mut [Rgba<u8>]) -> Result<usize> {
        let linked = self.link_row(y)?;
        for (px, &bg_x) in out.iter_mut().zip(linked.bg_indexes.iter()) {
            *px = self.background.at(bg_x as u32, linked.bg_y);
        }
        Ok(linked.corrected)
    }

    fn apply_edge_policy(&self, bg_indexes: &mut [usize], y: u32) -> Result<usize> {
        let width = self.background.width();
        let limit = width as usize;
        let mut corrected = 0;
        for (x, idx) in bg_indexes.iter_mut().enumerate() {
            if *idx < limit {
                continue;
            }
            match self.config.edge_policy {
                EdgePolicy::Clamp => *idx = limit - 1,
                EdgePolicy::Wrap => *idx %= limit,
                EdgePolicy::Strict => {
                    return Err(GenError::IndexOutOfRange {
                        x: x as u32,
                        y,
                        index: *idx,
                        width,
                    });
                }
            }
            corrected += 1;
        }
        Ok(corrected)
    }
}

/// Length of the leading run of columns without a valid left link.
pub fn initial_width(sources: &[i64]) -> usize {
    sources.iter().take_while(|&&si| si < 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn depth_row(cols: &[[u8; 4]]) -> RgbaImage {
        let mut img = RgbaImage::new(cols.len() as u32, 1);
        for (x, px) in cols.iter().enumerate() {
            img.put_pixel(x as u32, 0, Rgba(*px));
        }
        img
    }

    /// Background whose red channel encodes the column index times ten.
    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([(x * 10) as u8, y as u8, 0, 255]))
    }

    #[test]
    fn prefix_counts_only_leading_negatives() {
        assert_eq!(initial_width(&[-3, -1, 0, -2]), 2);
        assert_eq!(initial_width(&[0, -1]), 0);
        assert_eq!(initial_width(&[-1, -1]), 2);
        assert_eq!(initial_width(&[]), 0);
    }

    #[test]
    fn cross_eyed_strip_then_forwarding() {
        let dm = depth_row(&[WHITE; 10]);
        let bg = gradient(10, 1);
        let cfg = Config::default().with_separation(0, 4).cross_eyed(true);
        let linker = RowLinker::new(&dm, &bg, &cfg);
        assert_eq!(linker.source_indexes(0), vec![-4, -3, -2, -1, 0, 1, 2, 3, 4, 5]);
        let row = linker.link_row(0).unwrap();
        assert_eq!(row.bg_indexes, vec![0, 2, 4, 6, 0, 2, 4, 6, 0, 2]);
        assert_eq!(row.corrected, 0);
    }

    #[test]
    fn wall_eyed_far_plane_uses_widest_separation() {
        let dm = depth_row(&[BLACK; 10]);
        let bg = gradient(10, 1);
        let cfg = Config::default().with_separation(0, 4);
        let row = RowLinker::new(&dm, &bg, &cfg).link_row(0).unwrap();
        assert_eq!(row.bg_indexes, vec![0, 2, 4, 6, 0, 2, 4, 6, 0, 2]);
    }

    #[test]
    fn wall_eyed_collision_advances_instead_of_reusing() {
        let dm = depth_row(&[BLACK, BLACK, BLACK, BLACK, BLACK, WHITE, BLACK, BLACK]);
        let bg = gradient(8, 1);
        let cfg = Config::default().with_separation(2, 4);
        let linker = RowLinker::new(&dm, &bg, &cfg);
        assert_eq!(linker.source_indexes(0), vec![-4, -3, -2, -1, 0, 3, 2, 3]);
        let row = linker.link_row(0).unwrap();
        // column 7 links to 3 which column 5 already claimed
        assert_eq!(row.bg_indexes, vec![0, 2, 4, 6, 0, 6, 4, 5]);
    }

    #[test]
    fn cross_eyed_ignores_collisions() {
        let dm = depth_row(&[WHITE, WHITE, WHITE, WHITE, WHITE, BLACK, WHITE, WHITE]);
        let bg = gradient(8, 1);
        let cfg = Config::default().with_separation(2, 4).cross_eyed(true);
        let linker = RowLinker::new(&dm, &bg, &cfg);
        assert_eq!(linker.source_indexes(0), vec![-4, -3, -2, -1, 0, 3, 2, 3]);
        let row = linker.link_row(0).unwrap();
        assert_eq!(row.bg_indexes, vec![0, 2, 4, 6, 0, 6, 4, 6]);
    }

    #[test]
    fn zero_width_strip_is_degenerate() {
        // far plane in wall-eyed mode with separation_min = 0 links column 0 to itself
        let dm = depth_row(&[WHITE; 10]);
        let bg = gradient(10, 1);
        let cfg = Config::default().with_separation(0, 4);
        let err = RowLinker::new(&dm, &bg, &cfg).link_row(0).unwrap_err();
        assert_eq!(err, GenError::DegenerateRow { y: 0 });
    }

    fn overflowing(policy: EdgePolicy) -> Result<LinkedRow> {
        let dm = depth_row(&[WHITE, BLACK, WHITE, WHITE]);
        let bg = gradient(2, 1);
        let cfg = Config::default()
            .with_separation(1, 5)
            .cross_eyed(true)
            .with_edge_policy(policy);
        RowLinker::new(&dm, &bg, &cfg).link_row(0)
    }

    #[test]
    fn clamp_pins_overflow_to_last_column() {
        let row = overflowing(EdgePolicy::Clamp).unwrap();
        assert_eq!(row.bg_indexes, vec![0, 0, 1, 1]);
        assert_eq!(row.corrected, 1);
    }

    #[test]
    fn wrap_folds_overflow_back() {
        let row = overflowing(EdgePolicy::Wrap).unwrap();
        assert_eq!(row.bg_indexes, vec![0, 0, 1, 0]);
        assert_eq!(row.corrected, 1);
    }

    #[test]
    fn strict_reports_overflow() {
        let err = overflowing(EdgePolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            GenError::IndexOutOfRange {
                x: 3,
                y: 0,
                index: 2,
                width: 2
            }
        );
    }

    #[test]
    fn background_rows_scale_with_height() {
        let dm = RgbaImage::from_pixel(4, 4, Rgba(BLACK));
        let bg = gradient(4, 2);
        let cfg = Config::default().with_separation(1, 2);
        let linker = RowLinker::new(&dm, &bg, &cfg);
        let rows: Vec<u32> = (0..4).map(|y| linker.background_row(y)).collect();
        assert_eq!(rows, vec![0, 0, 1, 1]);
    }

    #[test]
    fn fill_row_samples_background() {
        let dm = depth_row(&[WHITE; 6]);
        let bg = gradient(6, 1);
        let cfg = Config::default().with_separation(0, 3).cross_eyed(true);
        let mut out = vec![Rgba([0, 0, 0, 0]); 6];
        let corrected = RowLinker::new(&dm, &bg, &cfg).fill_row(0, &mut out).unwrap();
        assert_eq!(corrected, 0);
        let reds: Vec<u8> = out.iter().map(|p| p.0[0]).collect();
        assert_eq!(reds, vec![0, 20, 40, 0, 20, 40]);
    }
}
