//! Structured per-frame diagnostics and CSV debug dumps.
//!
//! Diagnostics are observational: they never influence the label output.
//! Stage grids are kept as plain copies so tools can dump them as CSV next
//! to the final labelling.

use serde::Serialize;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Wall-clock timing of one pipeline stage.
#[derive(Clone, Debug, Serialize)]
pub struct StageTiming {
    pub name: &'static str,
    pub elapsed_ms: f64,
}

/// Total frame time plus per-stage contributions.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn with_total(total_ms: f64) -> Self {
        Self {
            total_ms,
            stages: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &'static str, elapsed_ms: f64) {
        self.stages.push(StageTiming { name, elapsed_ms });
    }
}

/// Per-frame report of the segmentation stages.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FrameDiagnostics {
    pub image_width: usize,
    pub image_height: usize,
    pub cells_x: usize,
    pub cells_y: usize,
    /// Cells that passed the planarity classifier.
    pub planar_cells: usize,
    /// Segments produced by region growing.
    pub segments_raw: usize,
    /// Distinct planes after merging.
    pub planes_merged: usize,
    /// Planes in the final labelling (refinement can still drop planes).
    pub planes_final: usize,
    pub timings: TimingBreakdown,
    /// Planar-cell map over the cell grid (1 = planar).
    #[serde(skip)]
    pub planar_map: Vec<u8>,
    /// Cell labels straight after region growing.
    #[serde(skip)]
    pub coarse_map: Vec<i32>,
    /// Cell labels after applying the merge map.
    #[serde(skip)]
    pub merged_map: Vec<i32>,
}

/// Writes a row-major grid as CSV, one image row per line.
pub fn write_csv_grid<T: Display>(path: &Path, width: usize, values: &[T]) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for row in values.chunks(width) {
        let mut first = true;
        for value in row {
            if !first {
                write!(out, ",")?;
            }
            write!(out, "{value}")?;
            first = false;
        }
        writeln!(out)?;
    }
    out.flush()
}
