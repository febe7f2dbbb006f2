//! Extractor pipeline driving the plane segmentation end-to-end.
//!
//! The [`PlaneExtractor`] exposes a simple API: feed an organized point cloud
//! and get a per-pixel plane labelling. Internally it coordinates the cell
//! re-layout, planar cell classification, histogram-seeded region growing,
//! plane merging and the optional per-pixel refinement.
//!
//! Typical usage:
//! ```no_run
//! use plane_extract::{ExtractorParams, PlaneExtractor, PointCloud};
//!
//! # fn example(xs: &[f32], ys: &[f32], zs: &[f32]) -> Result<(), plane_extract::ExtractorError> {
//! let mut extractor = PlaneExtractor::new(480, 640, ExtractorParams::default())?;
//! let seg = extractor.process(&PointCloud::from_planes(xs, ys, zs))?;
//! println!("{} planes", seg.nr_planes);
//! # Ok(())
//! # }
//! ```

use super::growth::grow_seed;
use super::merge::merge_planes;
use super::refine::{coarse_to_labels, compose_labels, refine_planes};
use super::workspace::FrameWorkspace;
use crate::cells::{organize_by_cell, CellSegment, CellStats};
use crate::config::ExtractorParams;
use crate::diagnostics::{FrameDiagnostics, TimingBreakdown};
use crate::error::ExtractorError;
use crate::histogram::NormalHistogram;
use crate::types::{CellLayout, PointCloud, Segmentation};
use log::debug;
use std::time::Instant;

/// Lower clamp of the per-cell growing tolerance (millimetres).
const MIN_MERGE_DIST: f64 = 20.0;

/// Plane extractor orchestrating the segmentation stages over one frame.
///
/// All buffers are sized at construction from the image dimensions and patch
/// size; processing a frame allocates nothing beyond the segment list. The
/// instance is reusable across frames but not shareable across threads while
/// a frame is in flight.
#[derive(Debug)]
pub struct PlaneExtractor {
    params: ExtractorParams,
    layout: CellLayout,
    workspace: FrameWorkspace,
}

impl PlaneExtractor {
    /// Creates an extractor for `image_height` x `image_width` frames.
    pub fn new(
        image_height: usize,
        image_width: usize,
        params: ExtractorParams,
    ) -> Result<Self, ExtractorError> {
        params.validate()?;
        let layout = CellLayout::new(image_height, image_width, params.patch_size);
        if layout.cells_y == 0 || layout.cells_x == 0 {
            return Err(ExtractorError::ImageTooSmall {
                height: image_height,
                width: image_width,
                patch_size: params.patch_size,
            });
        }
        let workspace = FrameWorkspace::new(&layout);
        Ok(Self {
            params,
            layout,
            workspace,
        })
    }

    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    /// Segments one frame into planar regions.
    pub fn process(&mut self, cloud: &PointCloud) -> Result<Segmentation, ExtractorError> {
        self.process_with_diagnostics(cloud).map(|(seg, _)| seg)
    }

    /// Segments one frame and reports per-stage diagnostics.
    pub fn process_with_diagnostics(
        &mut self,
        cloud: &PointCloud,
    ) -> Result<(Segmentation, FrameDiagnostics), ExtractorError> {
        let expected = self.layout.image_height * self.layout.image_width;
        if cloud.len() != expected {
            return Err(ExtractorError::DimensionMismatch {
                expected,
                actual: cloud.len(),
            });
        }

        let total_start = Instant::now();
        let mut diag = FrameDiagnostics {
            image_width: self.layout.image_width,
            image_height: self.layout.image_height,
            cells_x: self.layout.cells_x,
            cells_y: self.layout.cells_y,
            ..Default::default()
        };

        // 1. Cell-major re-layout.
        let organize_start = Instant::now();
        organize_by_cell(
            cloud,
            &self.layout,
            &mut self.workspace.organized_xs,
            &mut self.workspace.organized_ys,
            &mut self.workspace.organized_zs,
        );
        let organize_ms = organize_start.elapsed().as_secs_f64() * 1000.0;

        // 2. Planar cell classification.
        let classify_start = Instant::now();
        self.find_planar_cells();
        let classify_ms = classify_start.elapsed().as_secs_f64() * 1000.0;
        let planar_cells = self.workspace.planar.count();
        debug!(
            "PlaneExtractor::process planar cells {}/{}",
            planar_cells,
            self.layout.total_cells()
        );
        diag.planar_cells = planar_cells;
        diag.planar_map = (0..self.layout.total_cells())
            .map(|i| u8::from(self.workspace.planar.get(i)))
            .collect();

        // 3. Histogram over planar-cell normals + per-cell tolerances.
        let seed_prep_start = Instant::now();
        let mut histogram = NormalHistogram::build(
            self.params.histogram_bins_per_coord,
            &self.workspace.cells,
            &self.workspace.planar,
        );
        self.compute_cell_dist_tols();
        let seed_prep_ms = seed_prep_start.elapsed().as_secs_f64() * 1000.0;

        // 4. Region growing.
        let grow_start = Instant::now();
        let mut segments = self.create_plane_segments(&mut histogram);
        let grow_ms = grow_start.elapsed().as_secs_f64() * 1000.0;
        debug!("PlaneExtractor::process raw segments {}", segments.len());
        diag.segments_raw = segments.len();
        diag.coarse_map = self.workspace.coarse_labels.clone();

        // 5. Merge compatible neighbours.
        let merge_start = Instant::now();
        let merge_labels = merge_planes(
            &mut segments,
            &self.layout,
            &self.workspace.coarse_labels,
            self.params.min_cos_angle_for_merge,
            self.params.max_merge_dist,
        );
        let merge_ms = merge_start.elapsed().as_secs_f64() * 1000.0;
        let planes_merged = merge_labels
            .iter()
            .enumerate()
            .filter(|&(i, &rep)| rep == i)
            .count();
        debug!("PlaneExtractor::process planes after merge {planes_merged}");
        diag.planes_merged = planes_merged;
        diag.merged_map = self
            .workspace
            .coarse_labels
            .iter()
            .map(|&v| {
                if v > 0 {
                    merge_labels[(v - 1) as usize] as i32 + 1
                } else {
                    0
                }
            })
            .collect();

        // 6. Pixel labelling, refined or coarse.
        let refine_start = Instant::now();
        let (labels, nr_planes) = if self.params.do_refinement {
            let nr_final = refine_planes(
                &self.layout,
                &self.params,
                &segments,
                &merge_labels,
                &mut self.workspace,
            );
            (compose_labels(&self.layout, &self.workspace), nr_final)
        } else {
            coarse_to_labels(&self.layout, &self.workspace.coarse_labels, &merge_labels)
        };
        let refine_ms = refine_start.elapsed().as_secs_f64() * 1000.0;
        diag.planes_final = nr_planes;

        // 7. Cleanup so the instance can take the next frame.
        self.workspace.clean_artifacts();

        let latency = total_start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "PlaneExtractor::process done planes={} latency_ms={:.3}",
            nr_planes, latency
        );

        let mut timings = TimingBreakdown::with_total(latency);
        timings.push("organize", organize_ms);
        timings.push("classify", classify_ms);
        timings.push("seed_prep", seed_prep_ms);
        timings.push("grow", grow_ms);
        timings.push("merge", merge_ms);
        timings.push("refine", refine_ms);
        diag.timings = timings;

        let segmentation = Segmentation {
            labels,
            width: self.layout.image_width,
            height: self.layout.image_height,
            nr_planes,
            latency_ms: latency,
        };
        Ok((segmentation, diag))
    }

    /// Fits every cell and records the planar verdicts.
    fn find_planar_cells(&mut self) {
        let pts = self.layout.pts_per_cell();
        let ws = &mut self.workspace;
        ws.cells.clear();
        for cell_id in 0..self.layout.total_cells() {
            let block = cell_id * pts..(cell_id + 1) * pts;
            let cell = CellSegment::from_block(
                &ws.organized_xs[block.clone()],
                &ws.organized_ys[block.clone()],
                &ws.organized_zs[block],
                &self.params,
            );
            if cell.is_planar() {
                ws.planar.set(cell_id);
            }
            ws.cells.push(cell);
        }
        ws.unassigned.copy_from(&ws.planar);
    }

    /// Squared growing tolerance per planar cell, derived from the cell's
    /// projected diameter and the merge angle.
    fn compute_cell_dist_tols(&mut self) {
        let sin_angle = (1.0 - self.params.min_cos_angle_for_merge.powi(2)).sqrt();
        let pts = self.layout.pts_per_cell();
        let ws = &mut self.workspace;
        for cell_id in ws.planar.ones() {
            let first = cell_id * pts;
            let last = first + pts - 1;
            let dx = f64::from(ws.organized_xs[last] - ws.organized_xs[first]);
            let dy = f64::from(ws.organized_ys[last] - ws.organized_ys[first]);
            let dz = f64::from(ws.organized_zs[last] - ws.organized_zs[first]);
            let diameter = (dx * dx + dy * dy + dz * dz).sqrt();
            let truncated =
                (diameter * sin_angle).clamp(MIN_MERGE_DIST, self.params.max_merge_dist);
            ws.cell_dist_tols[cell_id] = (truncated * truncated) as f32;
        }
    }

    /// Histogram-seeded region growing: repeatedly seed from the densest
    /// normal bin, flood the cell grid, and keep regions that are large and
    /// planar enough. Consumed cells leave the histogram and the unassigned
    /// mask whether or not their region is kept, so the loop always makes
    /// progress.
    fn create_plane_segments(&mut self, histogram: &mut NormalHistogram) -> Vec<CellStats> {
        let mut segments: Vec<CellStats> = Vec::new();
        let mut remaining = self.workspace.planar.count();

        while remaining > 0 {
            let candidates = histogram.peak();
            if candidates.len() < self.params.min_region_growing_candidate_size {
                break;
            }

            // Seed with the lowest-MSE candidate, lowest cell id on ties.
            let mut seed_id = candidates[0];
            let mut min_mse = f64::INFINITY;
            for &candidate in &candidates {
                let mse = self.workspace.cells[candidate].stats.mse();
                if mse < min_mse {
                    seed_id = candidate;
                    min_mse = mse;
                }
            }

            self.workspace.activation.clear_all();
            {
                let ws = &mut self.workspace;
                grow_seed(
                    &self.layout,
                    &ws.cells,
                    &ws.unassigned,
                    &mut ws.activation,
                    &ws.cell_dist_tols,
                    self.params.min_cos_angle_for_merge,
                    seed_id,
                    &mut ws.grow_stack,
                );
            }

            let mut segment = CellStats::default();
            for cell_id in self.workspace.activation.ones() {
                segment.merge(&self.workspace.cells[cell_id].stats);
                histogram.remove(cell_id);
                remaining -= 1;
            }
            let nr_activated = self.workspace.activation.count();
            self.workspace
                .unassigned
                .difference_with(&self.workspace.activation);

            if nr_activated < self.params.min_region_growing_cells_activated {
                continue;
            }

            segment.calculate_stats();
            if segment.score() > self.params.min_region_planarity_score {
                segments.push(segment);
                let label = segments.len() as i32;
                for cell_id in self.workspace.activation.ones() {
                    self.workspace.coarse_labels[cell_id] = label;
                }
            }
        }
        segments
    }
}
