//! Synthetic organized point clouds back-projected through a pinhole model.

use plane_extract::Intrinsics;

/// Three coordinate planes in row-major pixel order.
pub struct Cloud {
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
    pub zs: Vec<f32>,
}

impl Cloud {
    pub fn as_view(&self) -> plane_extract::PointCloud<'_> {
        plane_extract::PointCloud::from_planes(&self.xs, &self.ys, &self.zs)
    }
}

pub fn centered_intrinsics(height: usize, width: usize) -> Intrinsics {
    Intrinsics {
        fx: 500.0,
        fy: 500.0,
        cx: width as f32 / 2.0,
        cy: height as f32 / 2.0,
    }
}

/// Builds a cloud from a per-pixel depth function; zero depth marks an
/// invalid pixel that stays at the origin.
pub fn cloud_from_depth(
    height: usize,
    width: usize,
    intrinsics: &Intrinsics,
    depth: impl Fn(usize, usize) -> f32,
) -> Cloud {
    let n = height * width;
    let mut xs = vec![0.0f32; n];
    let mut ys = vec![0.0f32; n];
    let mut zs = vec![0.0f32; n];
    for r in 0..height {
        for c in 0..width {
            let z = depth(r, c);
            if z > 0.0 {
                let idx = r * width + c;
                xs[idx] = (c as f32 - intrinsics.cx) * z / intrinsics.fx;
                ys[idx] = (r as f32 - intrinsics.cy) * z / intrinsics.fy;
                zs[idx] = z;
            }
        }
    }
    Cloud { xs, ys, zs }
}

/// Depth of the plane `z = z0 + sx * x + sy * y` observed at pixel `(r, c)`.
pub fn plane_depth(
    z0: f32,
    sx: f32,
    sy: f32,
    r: usize,
    c: usize,
    intrinsics: &Intrinsics,
) -> f32 {
    let denom = 1.0
        - sx * (c as f32 - intrinsics.cx) / intrinsics.fx
        - sy * (r as f32 - intrinsics.cy) / intrinsics.fy;
    z0 / denom
}

/// Deterministic sub-millimetre depth perturbation in [-0.3, 0.3].
pub fn ripple(r: usize, c: usize) -> f32 {
    let phase = (3 * r + 3 * c) % 7;
    (phase as f32 - 3.0) * 0.1
}

/// Deterministic uniform pseudo-noise in [lo, hi] seeded per pixel.
pub fn uniform_noise(r: usize, c: usize, lo: f32, hi: f32) -> f32 {
    let mut state = (r as u32)
        .wrapping_mul(2654435761)
        .wrapping_add(c as u32)
        .wrapping_mul(2246822519);
    state ^= state >> 13;
    state = state.wrapping_mul(1274126177);
    state ^= state >> 16;
    lo + (hi - lo) * (state as f32 / u32::MAX as f32)
}
