use crate::error::ExtractorError;
use serde::Serialize;

/// Borrowed view over an organized point cloud stored as three coordinate
/// planes of `height * width` floats. Pixel `(r, c)` sits at linear index
/// `r * width + c` in each plane; a zero Z marks an invalid pixel.
#[derive(Clone, Copy, Debug)]
pub struct PointCloud<'a> {
    pub xs: &'a [f32],
    pub ys: &'a [f32],
    pub zs: &'a [f32],
}

impl<'a> PointCloud<'a> {
    pub fn from_planes(xs: &'a [f32], ys: &'a [f32], zs: &'a [f32]) -> Self {
        Self { xs, ys, zs }
    }

    /// Number of points in the shortest plane.
    pub fn len(&self) -> usize {
        self.xs.len().min(self.ys.len()).min(self.zs.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned organized point cloud in plane-major layout.
#[derive(Clone, Debug, Default)]
pub struct OwnedPointCloud {
    pub width: usize,
    pub height: usize,
    xs: Vec<f32>,
    ys: Vec<f32>,
    zs: Vec<f32>,
}

impl OwnedPointCloud {
    pub fn new(height: usize, width: usize, xs: Vec<f32>, ys: Vec<f32>, zs: Vec<f32>) -> Self {
        Self {
            width,
            height,
            xs,
            ys,
            zs,
        }
    }

    /// Splits an interleaved `height * width * 3` row-major `[x, y, z]` tensor
    /// into coordinate planes.
    pub fn from_interleaved(
        height: usize,
        width: usize,
        data: &[f32],
    ) -> Result<Self, ExtractorError> {
        let n = height * width;
        if data.len() != n * 3 {
            return Err(ExtractorError::DimensionMismatch {
                expected: n * 3,
                actual: data.len(),
            });
        }
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        let mut zs = Vec::with_capacity(n);
        for p in data.chunks_exact(3) {
            xs.push(p[0]);
            ys.push(p[1]);
            zs.push(p[2]);
        }
        Ok(Self {
            width,
            height,
            xs,
            ys,
            zs,
        })
    }

    pub fn as_view(&self) -> PointCloud<'_> {
        PointCloud {
            xs: &self.xs,
            ys: &self.ys,
            zs: &self.zs,
        }
    }
}

/// Cell tiling of an image: `patch_size` x `patch_size` tiles in row-major
/// order, residual pixels outside the exact tiling discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellLayout {
    pub image_height: usize,
    pub image_width: usize,
    pub patch_size: usize,
    pub cells_y: usize,
    pub cells_x: usize,
}

impl CellLayout {
    pub fn new(image_height: usize, image_width: usize, patch_size: usize) -> Self {
        Self {
            image_height,
            image_width,
            patch_size,
            cells_y: image_height / patch_size,
            cells_x: image_width / patch_size,
        }
    }

    #[inline]
    pub fn total_cells(&self) -> usize {
        self.cells_y * self.cells_x
    }

    #[inline]
    pub fn pts_per_cell(&self) -> usize {
        self.patch_size * self.patch_size
    }

    /// Number of points in the tiled area (organized buffers are this long).
    #[inline]
    pub fn tiled_len(&self) -> usize {
        self.total_cells() * self.pts_per_cell()
    }

    #[inline]
    pub fn cell_index(&self, cell_r: usize, cell_c: usize) -> usize {
        cell_r * self.cells_x + cell_c
    }
}

/// Result of segmenting one frame.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Segmentation {
    /// Row-major `height * width` label image; 0 = unassigned, planes are
    /// labelled densely from 1.
    #[serde(skip)]
    pub labels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Number of planes in the final labelling.
    pub nr_planes: usize,
    pub latency_ms: f64,
}
