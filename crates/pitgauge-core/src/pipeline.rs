//! End-to-end shaft survey analysis.
//!
//! A single linear pass over a caller-owned cloud:
//! depth estimate → depth slicing → per-slice RANSAC circle fit →
//! diameter aggregation → axis verticality. Slice-level and trial-level
//! failures are absorbed locally; only cumulative failure (no usable
//! depth, no usable slice fit) surfaces as an error, and a fit failure
//! still carries the depth that was already computed.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::axis;
use crate::circle::{fit_circle_ransac, RansacParams};
use crate::cloud::percentile;
use crate::slice::{slice_bands, SliceParams};

// ── Configuration ──────────────────────────────────────────────────────────

/// Configuration for a full analysis run.
///
/// Defaults reproduce the field preset for shafts up to ~30 m.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Points with `z <= z_filter_margin` are treated as at or above the
    /// mouth and excluded from the depth estimate (metres).
    pub z_filter_margin: f64,
    /// Depth is this percentile of the filtered z sample, tolerating a
    /// small fraction of beyond-floor noise returns.
    pub depth_percentile: f64,
    /// Depth slicing configuration.
    pub slice: SliceParams,
    /// Per-slice RANSAC configuration.
    pub ransac: RansacParams,
    /// RNG seed for the RANSAC trials. `None` draws from entropy, which
    /// makes diameters non-reproducible run-to-run.
    pub seed: Option<u64>,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            z_filter_margin: 0.01,
            depth_percentile: 99.5,
            slice: SliceParams::default(),
            ransac: RansacParams::default(),
            seed: None,
        }
    }
}

// ── Result types ───────────────────────────────────────────────────────────

/// Fitted cross-section for one depth slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceRecord {
    /// Band center depth (metres).
    pub center_z: f64,
    /// Fitted circle radius (metres).
    pub radius: f64,
    /// Fitted circle center x (metres).
    pub center_x: f64,
    /// Fitted circle center y (metres).
    pub center_y: f64,
}

/// Outcome classification of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Depth, diameters and (with >= 2 slices) verticality were computed.
    Complete,
    /// The shaft is too shallow to layer; only the depth is meaningful.
    TooShallow,
}

/// Survey metrics for one shaft cloud. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitMetrics {
    /// Estimated total depth (metres).
    pub depth: f64,
    /// Mean fitted diameter over all slices (metres).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_diameter: Option<f64>,
    /// Minimum fitted diameter over all slices (metres).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_diameter: Option<f64>,
    /// Angular deviation of the shaft axis from vertical (degrees).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verticality_deg: Option<f64>,
    /// Per-slice fits in ascending depth order.
    pub slices: Vec<SliceRecord>,
    pub status: AnalysisStatus,
}

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors that abort an analysis run.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The input cloud has no points.
    EmptyInput,
    /// No points below the mouth margin; depth is undefined.
    NoPitRegion,
    /// Every slice was degenerate or failed RANSAC. The depth estimate
    /// was already computed and is carried along.
    FitFailure { depth: f64 },
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "point cloud is empty"),
            Self::NoPitRegion => {
                write!(f, "no points below the mouth margin; cannot estimate depth")
            }
            Self::FitFailure { depth } => write!(
                f,
                "circle fitting failed on every slice (depth estimate {:.3} m)",
                depth
            ),
        }
    }
}

impl std::error::Error for AnalysisError {}

// ── Pipeline ───────────────────────────────────────────────────────────────

/// Run the full survey analysis over a cloud.
///
/// The cloud uses a z-down convention: `z = 0` at the shaft mouth, depth
/// increasing downward. The cloud is only read, never mutated, and two
/// clouds can be analyzed concurrently; the only per-run state is the
/// RANSAC RNG seeded from [`AnalysisParams::seed`].
pub fn analyze(points: &[[f64; 3]], params: &AnalysisParams) -> Result<PitMetrics, AnalysisError> {
    if points.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    // 1. Depth estimate from the in-shaft z sample.
    let shaft_z: Vec<f64> = points
        .iter()
        .map(|p| p[2])
        .filter(|&z| z > params.z_filter_margin)
        .collect();
    let depth =
        percentile(&shaft_z, params.depth_percentile).ok_or(AnalysisError::NoPitRegion)?;

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // 2.-3. Slice and fit. Bands with < 3 points never reach the fitter,
    // and a band that defeats RANSAC is dropped without failing the run.
    let mut slices: Vec<SliceRecord> = Vec::new();
    let mut n_bands = 0usize;
    for band in slice_bands(depth, &params.slice) {
        n_bands += 1;
        let xy = band.project_xy(points);
        if xy.len() < 3 {
            continue;
        }
        if let Some(fit) = fit_circle_ransac(&xy, &params.ransac, &mut rng) {
            slices.push(SliceRecord {
                center_z: band.center_z,
                radius: fit.circle.radius,
                center_x: fit.circle.cx,
                center_y: fit.circle.cy,
            });
        }
    }

    if n_bands == 0 {
        return Ok(PitMetrics {
            depth,
            avg_diameter: None,
            min_diameter: None,
            verticality_deg: None,
            slices: Vec::new(),
            status: AnalysisStatus::TooShallow,
        });
    }
    if slices.is_empty() {
        return Err(AnalysisError::FitFailure { depth });
    }

    // 4. Diameter aggregation.
    let inv_n = 1.0 / slices.len() as f64;
    let avg_diameter = 2.0 * slices.iter().map(|s| s.radius * inv_n).sum::<f64>();
    let min_diameter = 2.0 * slices.iter().map(|s| s.radius).fold(f64::INFINITY, f64::min);

    // 5. Verticality through the fitted centers. A single slice cannot
    // define an axis; the field stays absent in that case.
    let centers: Vec<[f64; 3]> = slices
        .iter()
        .map(|s| [s.center_x, s.center_y, s.center_z])
        .collect();
    let verticality_deg = axis::verticality_degrees(&centers).ok();

    Ok(PitMetrics {
        depth,
        avg_diameter: Some(avg_diameter),
        min_diameter: Some(min_diameter),
        verticality_deg,
        slices,
        status: AnalysisStatus::Complete,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────
