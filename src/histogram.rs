//! 2D spherical-angle histogram of cell normals used to seed region growing.
//!
//! Normals are quantized over (polar, azimuth) into a `B x B` bin grid; a
//! reverse index maps each cell to its bin so cells can be removed as they
//! are consumed by the grower.

use crate::bitmap::CellBitmap;
use crate::cells::CellSegment;
use nalgebra::Vector3;

pub struct NormalHistogram {
    counts: Vec<u32>,
    /// Bin of each cell, -1 when absent or already removed.
    cell_bins: Vec<i32>,
}

impl NormalHistogram {
    /// Bins the normals of every cell selected by `mask`.
    pub fn build(bins_per_coord: usize, cells: &[CellSegment], mask: &CellBitmap) -> Self {
        let mut counts = vec![0u32; bins_per_coord * bins_per_coord];
        let mut cell_bins = vec![-1i32; cells.len()];
        for cell_id in mask.ones() {
            let bin = bin_for_normal(&cells[cell_id].stats.normal(), bins_per_coord);
            cell_bins[cell_id] = bin as i32;
            counts[bin] += 1;
        }
        Self { counts, cell_bins }
    }

    /// Returns the cells of the most-populated bin in increasing id order, or
    /// an empty vector once the histogram is exhausted. Ties resolve to the
    /// lowest bin id.
    pub fn peak(&self) -> Vec<usize> {
        let mut best_bin = 0usize;
        let mut best_count = 0u32;
        for (bin, &count) in self.counts.iter().enumerate() {
            if count > best_count {
                best_count = count;
                best_bin = bin;
            }
        }
        if best_count == 0 {
            return Vec::new();
        }
        self.cell_bins
            .iter()
            .enumerate()
            .filter(|(_, &bin)| bin == best_bin as i32)
            .map(|(cell_id, _)| cell_id)
            .collect()
    }

    /// Removes a cell from its bin; removing an absent cell is a no-op.
    pub fn remove(&mut self, cell_id: usize) {
        let bin = self.cell_bins[cell_id];
        if bin >= 0 {
            self.counts[bin as usize] -= 1;
            self.cell_bins[cell_id] = -1;
        }
    }

    /// Total number of cells still represented.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    #[cfg(test)]
    fn bin_of(&self, cell_id: usize) -> i32 {
        self.cell_bins[cell_id]
    }
}

/// Quantizes a camera-facing unit normal into a (polar, azimuth) bin.
///
/// Polar runs over [0, pi] as `acos(-nz)`; azimuth over [-pi, pi] from the
/// normal's xy projection. At the polar pole the azimuth is ill-defined, so
/// bin_x == 0 collapses bin_y to 0.
fn bin_for_normal(normal: &Vector3<f64>, bins_per_coord: usize) -> usize {
    use std::f64::consts::PI;
    let proj_norm = (normal.x * normal.x + normal.y * normal.y)
        .sqrt()
        .max(f64::MIN_POSITIVE);
    let polar = (-normal.z).clamp(-1.0, 1.0).acos();
    let azimuth = (normal.x / proj_norm).atan2(normal.y / proj_norm);

    let scale = (bins_per_coord - 1) as f64;
    let bin_x = (scale * polar / PI) as usize;
    let bin_y = if bin_x == 0 {
        0
    } else {
        (scale * (azimuth + PI) / (2.0 * PI)) as usize
    };
    bin_y * bins_per_coord + bin_x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::CellStats;
    use crate::config::ExtractorParams;

    fn cell_with_normal(dir: [f64; 3]) -> CellSegment {
        // Builds a tiny planar patch orthogonal to `dir` far enough from the
        // origin that the fitted normal keeps the requested orientation.
        let n = Vector3::new(dir[0], dir[1], dir[2]).normalize();
        let center = -n * 1000.0;
        let u = if n.x.abs() < 0.9 {
            Vector3::x_axis().cross(&n).normalize()
        } else {
            Vector3::y_axis().cross(&n).normalize()
        };
        let v = n.cross(&u);
        let mut stats = CellStats::default();
        for i in -2i32..=2 {
            for j in -2i32..=2 {
                let p = center + u * (i as f64 * 5.0) + v * (j as f64 * 5.0);
                stats.accumulate(p.x as f32, p.y as f32, p.z as f32);
            }
        }
        stats.calculate_stats();
        let mut cell = CellSegment::default();
        cell.stats = stats;
        cell
    }

    fn full_mask(len: usize) -> CellBitmap {
        let mut mask = CellBitmap::new(len);
        for i in 0..len {
            mask.set(i);
        }
        mask
    }

    #[test]
    fn counts_track_mask_population() {
        let cells: Vec<CellSegment> = vec![
            cell_with_normal([0.0, 0.0, -1.0]),
            cell_with_normal([0.0, 0.0, -1.0]),
            cell_with_normal([1.0, 0.0, -1.0]),
        ];
        let mut mask = full_mask(cells.len());
        mask.clear(2);
        let hist = NormalHistogram::build(20, &cells, &mask);
        assert_eq!(hist.total(), 2);
        assert_eq!(hist.bin_of(2), -1);
    }

    #[test]
    fn peak_returns_members_of_densest_bin() {
        let cells: Vec<CellSegment> = vec![
            cell_with_normal([0.0, 0.0, -1.0]),
            cell_with_normal([1.0, 0.0, -1.0]),
            cell_with_normal([0.0, 0.0, -1.0]),
            cell_with_normal([0.0, 0.0, -1.0]),
        ];
        let mask = full_mask(cells.len());
        let hist = NormalHistogram::build(20, &cells, &mask);
        assert_eq!(hist.peak(), vec![0, 2, 3]);
    }

    #[test]
    fn remove_is_idempotent_and_updates_peak() {
        let cells: Vec<CellSegment> = vec![
            cell_with_normal([0.0, 0.0, -1.0]),
            cell_with_normal([0.0, 0.0, -1.0]),
            cell_with_normal([1.0, 0.0, -1.0]),
        ];
        let mask = full_mask(cells.len());
        let mut hist = NormalHistogram::build(20, &cells, &mask);
        hist.remove(0);
        hist.remove(0);
        hist.remove(1);
        assert_eq!(hist.total(), 1);
        assert_eq!(hist.peak(), vec![2]);
        hist.remove(2);
        assert!(hist.peak().is_empty());
    }

    #[test]
    fn pole_normals_share_one_bin_regardless_of_azimuth() {
        let straight = Vector3::new(0.0, 0.0, -1.0);
        let b = 20;
        let bin = bin_for_normal(&straight, b);
        assert_eq!(bin, 0);
        // A zero xy projection would divide by zero without the clamp; any
        // azimuth must collapse into the pole bin.
        let tiny_tilt = Vector3::new(1e-12, -1e-12, -1.0).normalize();
        assert_eq!(bin_for_normal(&tiny_tilt, b), 0);
    }

    #[test]
    fn distinct_orientations_map_to_distinct_bins() {
        let b = 20;
        let left = bin_for_normal(&Vector3::new(0.5, 0.0, -1.0).normalize(), b);
        let right = bin_for_normal(&Vector3::new(-0.5, 0.0, -1.0).normalize(), b);
        let up = bin_for_normal(&Vector3::new(0.0, 0.5, -1.0).normalize(), b);
        assert_ne!(left, right);
        assert_ne!(left, up);
        assert_ne!(right, up);
    }

    #[test]
    fn all_bins_stay_in_range() {
        let b = ExtractorParams::default().histogram_bins_per_coord;
        let dirs = [
            [0.0, 0.0, -1.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [1.0, 1.0, 1.0],
            [-1.0, -1.0, -1.0],
        ];
        for dir in dirs {
            let n = Vector3::new(dir[0], dir[1], dir[2]).normalize();
            assert!(bin_for_normal(&n, b) < b * b);
        }
    }
}
