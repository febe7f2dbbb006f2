#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod depth;
pub mod diagnostics;
pub mod error;
pub mod extractor;
pub mod types;

// "Expert" modules - public, but considered unstable internals.
pub mod bitmap;
pub mod cells;
pub mod histogram;

// --- High-level re-exports -------------------------------------------------

// Main entry points: extractor + results.
pub use crate::config::ExtractorParams;
pub use crate::error::ExtractorError;
pub use crate::extractor::PlaneExtractor;
pub use crate::types::{OwnedPointCloud, PointCloud, Segmentation};

// Per-frame diagnostics returned alongside the segmentation.
pub use crate::diagnostics::FrameDiagnostics;

// Depth-frame helpers generally useful to callers.
pub use crate::depth::{DepthImage, Intrinsics};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::{ExtractorParams, PlaneExtractor, PointCloud, Segmentation};
}
