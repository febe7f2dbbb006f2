//! Pixel-granularity refinement of the merged cell labelling.
//!
//! Each merged plane group is eroded (3x3 cross) to find its stable core and
//! dilated (3x3 square) to find its influence zone. Core cells keep their
//! label wholesale; pixels in the ring between the two masks are re-tested
//! against the group's plane individually, with a frame-global best-distance
//! buffer arbitrating between competing planes.

use crate::cells::CellStats;
use crate::config::ExtractorParams;
use crate::extractor::workspace::FrameWorkspace;
use crate::types::CellLayout;

/// Runs the refinement pass over every merged group. Fills the eroded label
/// grid and the stacked per-pixel labels in the workspace and returns the
/// number of final planes.
pub(crate) fn refine_planes(
    layout: &CellLayout,
    params: &ExtractorParams,
    segments: &[CellStats],
    merge_labels: &[usize],
    ws: &mut FrameWorkspace,
) -> usize {
    let (cells_x, cells_y) = (layout.cells_x, layout.cells_y);
    let mut nr_final = 0usize;

    for (i, &rep) in merge_labels.iter().enumerate() {
        if rep != i {
            continue;
        }
        ws.mask.fill(0);
        for (cell, &label) in ws.coarse_labels.iter().enumerate() {
            if label > 0 && merge_labels[(label - 1) as usize] == i {
                ws.mask[cell] = 1;
            }
        }

        erode_cross(&ws.mask, cells_x, cells_y, &mut ws.mask_eroded);
        // A plane with no stable core is dropped entirely.
        if ws.mask_eroded.iter().all(|&m| m == 0) {
            continue;
        }
        dilate_square(&ws.mask, cells_x, cells_y, &mut ws.mask_dilated);

        nr_final += 1;
        let label = nr_final as u8;
        for (cell, &eroded) in ws.mask_eroded.iter().enumerate() {
            if eroded != 0 {
                ws.eroded_labels[cell] = label;
            }
        }
        refine_boundary_cells(layout, params, &segments[i], label, ws);
    }
    nr_final
}

/// Re-tests every pixel of the cells in `dilated - eroded` against the
/// group plane, keeping the closest plane seen so far for each pixel.
fn refine_boundary_cells(
    layout: &CellLayout,
    params: &ExtractorParams,
    plane: &CellStats,
    label: u8,
    ws: &mut FrameWorkspace,
) {
    let pts_per_cell = layout.pts_per_cell();
    let normal = plane.normal();
    let d = plane.d();
    let max_dist = params.refinement_multiplier_coeff * plane.mse();

    for cell in 0..layout.total_cells() {
        if ws.mask_dilated[cell] == 0 || ws.mask_eroded[cell] != 0 {
            continue;
        }
        let offset = cell * pts_per_cell;
        for pt in offset..offset + pts_per_cell {
            let signed = normal.x * f64::from(ws.organized_xs[pt])
                + normal.y * f64::from(ws.organized_ys[pt])
                + normal.z * f64::from(ws.organized_zs[pt])
                + d;
            let dist = (signed * signed) as f32;
            if f64::from(dist) < max_dist && dist < ws.stacked_distances[pt] {
                ws.stacked_distances[pt] = dist;
                ws.stacked_labels[pt] = label;
            }
        }
    }
}

/// Composes the final pixel image: eroded cells flood their block with the
/// cell label, boundary cells copy the per-pixel refinement outcome, and
/// residual pixels outside the tiling stay 0.
pub(crate) fn compose_labels(layout: &CellLayout, ws: &FrameWorkspace) -> Vec<u8> {
    let mut labels = vec![0u8; layout.image_height * layout.image_width];
    let patch = layout.patch_size;
    let pts_per_cell = layout.pts_per_cell();

    for cell_r in 0..layout.cells_y {
        for cell_c in 0..layout.cells_x {
            let cell = layout.cell_index(cell_r, cell_c);
            let r_offset = cell_r * patch;
            let c_offset = cell_c * patch;
            let cell_label = ws.eroded_labels[cell];
            if cell_label > 0 {
                for r in r_offset..r_offset + patch {
                    labels[r * layout.image_width + c_offset..][..patch].fill(cell_label);
                }
            } else {
                let mut idx = cell * pts_per_cell;
                for r in r_offset..r_offset + patch {
                    for c in c_offset..c_offset + patch {
                        if ws.stacked_labels[idx] > 0 {
                            labels[r * layout.image_width + c] = ws.stacked_labels[idx];
                        }
                        idx += 1;
                    }
                }
            }
        }
    }
    labels
}

/// Non-refinement path: map coarse cell labels through the merge map,
/// compact representatives into dense labels and scale cells to pixels.
pub(crate) fn coarse_to_labels(
    layout: &CellLayout,
    coarse_labels: &[i32],
    merge_labels: &[usize],
) -> (Vec<u8>, usize) {
    let mut dense = vec![0u8; merge_labels.len()];
    let mut nr_final = 0usize;
    for (i, &rep) in merge_labels.iter().enumerate() {
        if rep == i {
            nr_final += 1;
            dense[i] = nr_final as u8;
        }
    }

    let mut labels = vec![0u8; layout.image_height * layout.image_width];
    let patch = layout.patch_size;
    for cell_r in 0..layout.cells_y {
        for cell_c in 0..layout.cells_x {
            let coarse = coarse_labels[layout.cell_index(cell_r, cell_c)];
            if coarse <= 0 {
                continue;
            }
            let label = dense[merge_labels[(coarse - 1) as usize]];
            let r_offset = cell_r * patch;
            let c_offset = cell_c * patch;
            for r in r_offset..r_offset + patch {
                labels[r * layout.image_width + c_offset..][..patch].fill(label);
            }
        }
    }
    (labels, nr_final)
}

/// Erosion with a 3x3 cross kernel; neighbours outside the grid count as
/// foreground so border cells are not eroded by the image edge.
fn erode_cross(src: &[u8], width: usize, height: usize, dst: &mut [u8]) {
    for r in 0..height {
        for c in 0..width {
            let idx = r * width + c;
            let mut keep = src[idx] != 0;
            if keep && r > 0 {
                keep = src[idx - width] != 0;
            }
            if keep && r + 1 < height {
                keep = src[idx + width] != 0;
            }
            if keep && c > 0 {
                keep = src[idx - 1] != 0;
            }
            if keep && c + 1 < width {
                keep = src[idx + 1] != 0;
            }
            dst[idx] = u8::from(keep);
        }
    }
}

/// Dilation with a full 3x3 kernel; neighbours outside the grid count as
/// background.
fn dilate_square(src: &[u8], width: usize, height: usize, dst: &mut [u8]) {
    for r in 0..height {
        for c in 0..width {
            let mut hit = false;
            for dr in r.saturating_sub(1)..(r + 2).min(height) {
                for dc in c.saturating_sub(1)..(c + 2).min(width) {
                    if src[dr * width + dc] != 0 {
                        hit = true;
                    }
                }
            }
            dst[r * width + c] = u8::from(hit);
        }
    }
}
