//! Per-frame buffers reused across frames to keep the hot path allocation-free.
//!
//! Every grid, bitmap and scratch mask is sized once from the cell layout.
//! The extractor mutates them stage by stage; `clean_artifacts` returns them
//! to their pristine state at frame end so the instance can be reused.

use crate::bitmap::CellBitmap;
use crate::cells::CellSegment;
use crate::types::CellLayout;

#[derive(Debug)]
pub(crate) struct FrameWorkspace {
    /// Cell-major coordinate planes produced by the organizer.
    pub organized_xs: Vec<f32>,
    pub organized_ys: Vec<f32>,
    pub organized_zs: Vec<f32>,
    /// One entry per cell, rebuilt by the planarity classifier.
    pub cells: Vec<CellSegment>,
    pub planar: CellBitmap,
    pub unassigned: CellBitmap,
    pub activation: CellBitmap,
    /// Squared growing tolerance per cell.
    pub cell_dist_tols: Vec<f32>,
    /// Region-grower work stack of (cell index, predecessor index).
    pub grow_stack: Vec<(usize, usize)>,
    /// Cell label after region growing, 0 = unassigned.
    pub coarse_labels: Vec<i32>,
    /// Cell label after erosion during refinement.
    pub eroded_labels: Vec<u8>,
    /// Per-pixel tentative labels in organized (cell-major) order.
    pub stacked_labels: Vec<u8>,
    /// Best squared plane distance recorded per pixel.
    pub stacked_distances: Vec<f32>,
    /// Morphology scratch masks over the cell grid.
    pub mask: Vec<u8>,
    pub mask_eroded: Vec<u8>,
    pub mask_dilated: Vec<u8>,
}

impl FrameWorkspace {
    pub fn new(layout: &CellLayout) -> Self {
        let cells = layout.total_cells();
        let pts = layout.tiled_len();
        Self {
            organized_xs: vec![0.0; pts],
            organized_ys: vec![0.0; pts],
            organized_zs: vec![0.0; pts],
            cells: Vec::with_capacity(cells),
            planar: CellBitmap::new(cells),
            unassigned: CellBitmap::new(cells),
            activation: CellBitmap::new(cells),
            cell_dist_tols: vec![0.0; cells],
            grow_stack: Vec::with_capacity(64),
            coarse_labels: vec![0; cells],
            eroded_labels: vec![0; cells],
            stacked_labels: vec![0; pts],
            stacked_distances: vec![f32::INFINITY; pts],
            mask: vec![0; cells],
            mask_eroded: vec![0; cells],
            mask_dilated: vec![0; cells],
        }
    }

    /// Resets every per-frame structure; called at frame end.
    pub fn clean_artifacts(&mut self) {
        self.cells.clear();
        self.planar.clear_all();
        self.unassigned.clear_all();
        self.activation.clear_all();
        self.cell_dist_tols.fill(0.0);
        self.coarse_labels.fill(0);
        self.eroded_labels.fill(0);
        self.stacked_labels.fill(0);
        self.stacked_distances.fill(f32::INFINITY);
        self.mask.fill(0);
        self.mask_eroded.fill(0);
        self.mask_dilated.fill(0);
    }
}
