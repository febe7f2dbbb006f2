//! Depth-image loading and pinhole back-projection.
//!
//! Depth frames are 16-bit grayscale images with one depth sample per pixel
//! (zero marks a dropout). Back-projection through the pinhole model turns a
//! frame into the organized point cloud the extractor consumes.

use crate::error::ExtractorError;
use crate::types::OwnedPointCloud;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pinhole camera intrinsics in pixels.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

/// A single depth frame.
#[derive(Clone, Debug)]
pub struct DepthImage {
    width: usize,
    height: usize,
    depths: Vec<u16>,
}

impl DepthImage {
    /// Loads a 16-bit grayscale depth image from disk.
    pub fn open(path: &Path) -> Result<Self, ExtractorError> {
        let img = image::open(path)?.to_luma16();
        let width = img.width() as usize;
        let height = img.height() as usize;
        Ok(Self {
            width,
            height,
            depths: img.into_raw(),
        })
    }

    /// Wraps raw depth samples; `depths` is row-major `height * width`.
    pub fn from_raw(height: usize, width: usize, depths: Vec<u16>) -> Result<Self, ExtractorError> {
        if depths.len() != height * width {
            return Err(ExtractorError::DimensionMismatch {
                expected: height * width,
                actual: depths.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depths,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Back-projects the frame into an organized point cloud in the camera
    /// frame. Dropout pixels stay at the origin with Z == 0.
    pub fn to_point_cloud(&self, intrinsics: &Intrinsics) -> OwnedPointCloud {
        let n = self.width * self.height;
        let mut xs = vec![0.0f32; n];
        let mut ys = vec![0.0f32; n];
        let mut zs = vec![0.0f32; n];
        for r in 0..self.height {
            for c in 0..self.width {
                let idx = r * self.width + c;
                let z = f32::from(self.depths[idx]);
                if z > 0.0 {
                    xs[idx] = (c as f32 - intrinsics.cx) * z / intrinsics.fx;
                    ys[idx] = (r as f32 - intrinsics.cy) * z / intrinsics.fy;
                    zs[idx] = z;
                }
            }
        }
        OwnedPointCloud::new(self.height, self.width, xs, ys, zs)
    }
}
