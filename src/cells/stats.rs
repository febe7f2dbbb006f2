//! First- and second-moment accumulator for a set of 3D points with PCA-derived
//! plane parameters.
//!
//! The accumulator is additive: merging two instances yields the same moments
//! as accumulating the union of their points, which is what lets region
//! growing and plane merging build segment statistics without revisiting
//! pixels. Derived quantities (mean, normal, offset, MSE, score) go stale on
//! merge and are refreshed by [`CellStats::calculate_stats`].

use nalgebra::{Matrix3, SymmetricEigen, Vector3};

#[derive(Clone, Copy, Debug, Default)]
pub struct CellStats {
    sum_x: f64,
    sum_y: f64,
    sum_z: f64,
    sum_xx: f64,
    sum_yy: f64,
    sum_zz: f64,
    sum_xy: f64,
    sum_xz: f64,
    sum_yz: f64,
    count: u32,
    mean: Vector3<f64>,
    normal: Vector3<f64>,
    d: f64,
    mse: f64,
    score: f64,
}

impl CellStats {
    /// Accumulates one valid point. Callers are responsible for filtering out
    /// invalid (Z == 0) pixels.
    pub fn accumulate(&mut self, x: f32, y: f32, z: f32) {
        let (x, y, z) = (f64::from(x), f64::from(y), f64::from(z));
        self.sum_x += x;
        self.sum_y += y;
        self.sum_z += z;
        self.sum_xx += x * x;
        self.sum_yy += y * y;
        self.sum_zz += z * z;
        self.sum_xy += x * y;
        self.sum_xz += x * z;
        self.sum_yz += y * z;
        self.count += 1;
    }

    /// Additive merge of the moment accumulators. Derived values are stale
    /// until the next [`CellStats::calculate_stats`].
    pub fn merge(&mut self, other: &CellStats) {
        self.sum_x += other.sum_x;
        self.sum_y += other.sum_y;
        self.sum_z += other.sum_z;
        self.sum_xx += other.sum_xx;
        self.sum_yy += other.sum_yy;
        self.sum_zz += other.sum_zz;
        self.sum_xy += other.sum_xy;
        self.sum_xz += other.sum_xz;
        self.sum_yz += other.sum_yz;
        self.count += other.count;
    }

    /// Recomputes mean, covariance eigenstructure, camera-facing normal,
    /// plane offset, MSE and planarity score from the current moments.
    pub fn calculate_stats(&mut self) {
        if self.count == 0 {
            return;
        }
        let n = f64::from(self.count);
        self.mean = Vector3::new(self.sum_x / n, self.sum_y / n, self.sum_z / n);

        let cxx = self.sum_xx / n - self.mean.x * self.mean.x;
        let cyy = self.sum_yy / n - self.mean.y * self.mean.y;
        let czz = self.sum_zz / n - self.mean.z * self.mean.z;
        let cxy = self.sum_xy / n - self.mean.x * self.mean.y;
        let cxz = self.sum_xz / n - self.mean.x * self.mean.z;
        let cyz = self.sum_yz / n - self.mean.y * self.mean.z;
        let cov = Matrix3::new(cxx, cxy, cxz, cxy, cyy, cyz, cxz, cyz, czz);

        let eig = SymmetricEigen::new(cov);
        let mut min_idx = 0;
        let mut max_idx = 0;
        for i in 1..3 {
            if eig.eigenvalues[i] < eig.eigenvalues[min_idx] {
                min_idx = i;
            }
            if eig.eigenvalues[i] > eig.eigenvalues[max_idx] {
                max_idx = i;
            }
        }

        let mut normal = eig.eigenvectors.column(min_idx).into_owned();
        let norm = normal.norm();
        if norm > 0.0 {
            normal /= norm;
        }
        // Orient toward the camera at the origin.
        if normal.dot(&self.mean) > 0.0 {
            normal = -normal;
        }
        self.normal = normal;
        self.d = -normal.dot(&self.mean);
        self.mse = eig.eigenvalues[min_idx].max(0.0);
        self.score = eig.eigenvalues[max_idx] / eig.eigenvalues[min_idx].max(f64::EPSILON);
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn mean(&self) -> Vector3<f64> {
        self.mean
    }

    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// Plane offset: `normal . x + d == 0` for points on the plane.
    #[inline]
    pub fn d(&self) -> f64 {
        self.d
    }

    /// Smallest covariance eigenvalue; variance of points along the normal.
    #[inline]
    pub fn mse(&self) -> f64 {
        self.mse
    }

    /// Largest-to-smallest eigenvalue ratio; planarity strength.
    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }
}
