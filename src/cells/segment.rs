use super::stats::CellStats;
use crate::config::ExtractorParams;

/// One cell of the grid: its moment statistics plus the planarity verdict
/// from the validation gates.
#[derive(Clone, Copy, Debug, Default)]
pub struct CellSegment {
    pub stats: CellStats,
    planar: bool,
}

impl CellSegment {
    /// Fits a cell from its contiguous `patch_size^2` block of organized
    /// points. Four gates run in order, cheapest first; the eigen
    /// decomposition only runs once the block has enough valid points and
    /// continuous depth along its middle scan lines.
    pub fn from_block(xs: &[f32], ys: &[f32], zs: &[f32], params: &ExtractorParams) -> Self {
        let patch = params.patch_size;
        debug_assert_eq!(zs.len(), patch * patch);

        let mut stats = CellStats::default();
        for i in 0..zs.len() {
            if zs[i] > 0.0 {
                stats.accumulate(xs[i], ys[i], zs[i]);
            }
        }
        if (stats.count() as usize) < params.min_pts_per_cell {
            return Self {
                stats,
                planar: false,
            };
        }

        let mid = patch / 2;
        let horizontal = |i: usize| zs[mid * patch + i];
        let vertical = |i: usize| zs[i * patch + mid];
        if !depth_continuous(horizontal, patch, params)
            || !depth_continuous(vertical, patch, params)
        {
            return Self {
                stats,
                planar: false,
            };
        }

        stats.calculate_stats();
        let depth_sigma =
            params.depth_sigma_coeff * stats.mean().z * stats.mean().z + params.depth_sigma_margin;
        let planar = stats.mse() <= depth_sigma * depth_sigma;
        Self { stats, planar }
    }

    #[inline]
    pub fn is_planar(&self) -> bool {
        self.planar
    }
}

/// Scans adjacent depths along one cell scan line. A step counts as a
/// discontinuity when both depths are valid and differ by more than the
/// threshold, or when exactly one of them is missing.
fn depth_continuous(z_at: impl Fn(usize) -> f32, len: usize, params: &ExtractorParams) -> bool {
    let mut discontinuities = 0usize;
    for i in 0..len.saturating_sub(1) {
        let (a, b) = (z_at(i), z_at(i + 1));
        let step = if a > 0.0 && b > 0.0 {
            (a - b).abs() > params.depth_discontinuity_threshold
        } else {
            (a > 0.0) != (b > 0.0)
        };
        if step {
            discontinuities += 1;
            if discontinuities > params.max_number_depth_discontinuity {
                return false;
            }
        }
    }
    true
}
