//! Seeded flood-fill over the cell grid.

use crate::bitmap::CellBitmap;
use crate::cells::CellSegment;
use crate::types::CellLayout;

/// Grows a region from `seed` over the 4-connected cell grid into
/// `activation`. A neighbour is accepted when it is still unassigned, its
/// normal agrees with the cell it was reached from, and its mean lies within
/// that cell's plane tolerance. The explicit stack visits cells in the same
/// order as the natural recursive formulation (left, right, up, down from
/// each accepted cell) so the traversal stays deterministic on bounded
/// stacks.
pub(crate) fn grow_seed(
    layout: &CellLayout,
    cells: &[CellSegment],
    unassigned: &CellBitmap,
    activation: &mut CellBitmap,
    cell_dist_tols: &[f32],
    min_cos_angle: f64,
    seed: usize,
    stack: &mut Vec<(usize, usize)>,
) {
    stack.clear();
    stack.push((seed, seed));

    while let Some((index, prev)) = stack.pop() {
        if !unassigned.get(index) || activation.get(index) {
            continue;
        }

        let prev_stats = &cells[prev].stats;
        let stats = &cells[index].stats;
        let cos_angle = prev_stats.normal().dot(&stats.normal());
        let merge_dist = prev_stats.normal().dot(&stats.mean()) + prev_stats.d();
        if cos_angle < min_cos_angle
            || merge_dist * merge_dist > f64::from(cell_dist_tols[index])
        {
            continue;
        }

        activation.set(index);

        let x = index % layout.cells_x;
        let y = index / layout.cells_x;
        // Pushed in reverse so the left neighbour is explored first.
        if y + 1 < layout.cells_y {
            stack.push((index + layout.cells_x, index));
        }
        if y > 0 {
            stack.push((index - layout.cells_x, index));
        }
        if x + 1 < layout.cells_x {
            stack.push((index + 1, index));
        }
        if x > 0 {
            stack.push((index - 1, index));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::CellStats;

    const TOL: f32 = 400.0;

    /// Builds a 1x4 grid of flat cells at the given depths.
    fn row_of_cells(depths: &[f64]) -> (CellLayout, Vec<CellSegment>) {
        let layout = CellLayout::new(2, 2 * depths.len(), 2);
        let mut cells = Vec::new();
        for (i, &z) in depths.iter().enumerate() {
            let mut stats = CellStats::default();
            for r in 0..4 {
                for c in 0..4 {
                    stats.accumulate(
                        (i * 4 + c) as f32 * 2.0,
                        r as f32 * 2.0,
                        z as f32 + 0.01 * ((r + c) % 2) as f32,
                    );
                }
            }
            stats.calculate_stats();
            let mut cell = CellSegment::default();
            cell.stats = stats;
            cells.push(cell);
        }
        (layout, cells)
    }

    fn all_unassigned(n: usize) -> CellBitmap {
        let mut bm = CellBitmap::new(n);
        for i in 0..n {
            bm.set(i);
        }
        bm
    }

    #[test]
    fn coplanar_row_is_fully_activated() {
        let (layout, cells) = row_of_cells(&[1000.0, 1000.0, 1000.0, 1000.0]);
        let unassigned = all_unassigned(cells.len());
        let mut activation = CellBitmap::new(cells.len());
        let mut stack = Vec::new();
        grow_seed(
            &layout,
            &cells,
            &unassigned,
            &mut activation,
            &[TOL; 4],
            0.93,
            0,
            &mut stack,
        );
        assert_eq!(activation.count(), 4);
    }

    #[test]
    fn depth_step_blocks_growth() {
        let (layout, cells) = row_of_cells(&[1000.0, 1000.0, 1100.0, 1100.0]);
        let unassigned = all_unassigned(cells.len());
        let mut activation = CellBitmap::new(cells.len());
        let mut stack = Vec::new();
        grow_seed(
            &layout,
            &cells,
            &unassigned,
            &mut activation,
            &[TOL; 4],
            0.93,
            0,
            &mut stack,
        );
        let activated: Vec<usize> = activation.ones().collect();
        assert_eq!(activated, vec![0, 1]);
    }

    #[test]
    fn assigned_cells_are_not_revisited() {
        let (layout, cells) = row_of_cells(&[1000.0, 1000.0, 1000.0, 1000.0]);
        let mut unassigned = all_unassigned(cells.len());
        unassigned.clear(1);
        let mut activation = CellBitmap::new(cells.len());
        let mut stack = Vec::new();
        grow_seed(
            &layout,
            &cells,
            &unassigned,
            &mut activation,
            &[TOL; 4],
            0.93,
            0,
            &mut stack,
        );
        // Cell 1 is consumed, so growth cannot reach cells 2 and 3.
        let activated: Vec<usize> = activation.ones().collect();
        assert_eq!(activated, vec![0]);
    }
}
