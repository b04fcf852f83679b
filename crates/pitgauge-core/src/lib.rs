//! pitgauge-core — geometric quality metrics for drilled shaft point clouds.
//!
//! Estimates total depth, average and minimum cross-sectional diameter,
//! and verticality of a roughly cylindrical excavated shaft from a 3-D
//! survey cloud (z-down, mouth at z = 0). The pipeline stages are:
//!
//! 1. **Depth** – percentile depth estimate over the in-shaft z range.
//! 2. **Slice** – horizontal depth bands between mouth and floor margins.
//! 3. **Circle** – per-slice robust cross-section fit (3-point
//!    circumcircle + RANSAC).
//! 4. **Axis** – principal axis through the fitted slice centers via SVD,
//!    reported as the angular deviation from true vertical.
//!
//! The crate performs no I/O: callers load the cloud, optionally crop it
//! with [`cloud::Aabb`], and hand a `&[[f64; 3]]` to [`analyze`].

pub mod axis;
pub mod circle;
pub mod cloud;
pub mod pipeline;
pub mod slice;

pub use circle::{Circle, RansacCircle, RansacParams};
pub use cloud::Aabb;
pub use pipeline::{
    analyze, AnalysisError, AnalysisParams, AnalysisStatus, PitMetrics, SliceRecord,
};
pub use slice::SliceParams;
