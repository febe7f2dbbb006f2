use crate::types::{CellLayout, PointCloud};

/// Re-lays a pixel-major point cloud into cell-major order so that each cell
/// reads its `patch_size^2` points as one contiguous block: pixel `(r, c)`
/// lands at `cell_id * patch^2 + local_r * patch + local_c` in each plane.
/// Residual pixels outside the exact tiling are dropped.
pub fn organize_by_cell(
    cloud: &PointCloud,
    layout: &CellLayout,
    out_xs: &mut [f32],
    out_ys: &mut [f32],
    out_zs: &mut [f32],
) {
    debug_assert_eq!(out_xs.len(), layout.tiled_len());
    let patch = layout.patch_size;
    let width = layout.image_width;
    for r in 0..layout.cells_y * patch {
        let cell_r = r / patch;
        let local_r = r % patch;
        for c in 0..layout.cells_x * patch {
            let cell_c = c / patch;
            let local_c = c % patch;
            let src = r * width + c;
            let dst = layout.cell_index(cell_r, cell_c) * layout.pts_per_cell()
                + local_r * patch
                + local_c;
            out_xs[dst] = cloud.xs[src];
            out_ys[dst] = cloud.ys[src];
            out_zs[dst] = cloud.zs[src];
        }
    }
}
