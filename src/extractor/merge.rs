//! Merging of touching, geometrically compatible plane segments.

use crate::bitmap::CellBitmap;
use crate::cells::CellStats;
use crate::types::CellLayout;

/// Merges adjacent compatible segments and returns the canonical label map:
/// `merge[i] <= i` and `merge[merge[i]] == merge[i]`. Segments absorbed into
/// a representative have their moments folded into it; the representative's
/// derived stats are refreshed after each expanded row.
pub(crate) fn merge_planes(
    segments: &mut [CellStats],
    layout: &CellLayout,
    coarse_labels: &[i32],
    min_cos_angle: f64,
    max_merge_dist: f64,
) -> Vec<usize> {
    let nr_planes = segments.len();
    let adjacency = build_adjacency(nr_planes, layout, coarse_labels);

    let mut merge: Vec<usize> = (0..nr_planes).collect();
    for row in 0..nr_planes {
        let rep = merge[row];
        let mut expanded = false;
        for col in (row + 1)..nr_planes {
            if !adjacency[row].get(col) {
                continue;
            }
            let cos_angle = segments[rep].normal().dot(&segments[col].normal());
            let dist = segments[rep].normal().dot(&segments[col].mean()) + segments[rep].d();
            if cos_angle > min_cos_angle && dist * dist < max_merge_dist {
                let absorbed = segments[col];
                segments[rep].merge(&absorbed);
                merge[col] = rep;
                expanded = true;
            }
        }
        if expanded {
            segments[rep].calculate_stats();
        }
    }
    merge
}

/// Adjacency over segment labels: one bit per ordered pair of distinct
/// segments sharing an internal grid edge, then symmetrized.
fn build_adjacency(
    nr_planes: usize,
    layout: &CellLayout,
    coarse_labels: &[i32],
) -> Vec<CellBitmap> {
    let mut adjacency: Vec<CellBitmap> =
        (0..nr_planes).map(|_| CellBitmap::new(nr_planes)).collect();
    for r in 0..layout.cells_y {
        for c in 0..layout.cells_x {
            let label = coarse_labels[layout.cell_index(r, c)];
            if label <= 0 {
                continue;
            }
            if c + 1 < layout.cells_x {
                let right = coarse_labels[layout.cell_index(r, c + 1)];
                if right > 0 && right != label {
                    adjacency[(label - 1) as usize].set((right - 1) as usize);
                }
            }
            if r + 1 < layout.cells_y {
                let below = coarse_labels[layout.cell_index(r + 1, c)];
                if below > 0 && below != label {
                    adjacency[(label - 1) as usize].set((below - 1) as usize);
                }
            }
        }
    }
    for i in 0..nr_planes {
        for j in 0..i {
            if adjacency[i].get(j) {
                adjacency[j].set(i);
            }
            if adjacency[j].get(i) {
                adjacency[i].set(j);
            }
        }
    }
    adjacency
}
