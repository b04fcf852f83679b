//! Circle fitting primitives.
//!
//! Implements:
//! - Closed-form circumcircle through three points.
//! - RANSAC wrapper for outlier-robust fitting of noisy cross-sections.

use rand::Rng;
use serde::{Deserialize, Serialize};

// ── Error type ─────────────────────────────────────────────────────────────

/// Errors that can occur during circle fitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircleFitError {
    /// Too few points for the requested operation.
    TooFewPoints { needed: usize, got: usize },
    /// The three sample points are (near-)collinear.
    Collinear,
    /// The circumcircle radius is outside the numerically valid range.
    RadiusOutOfRange,
    /// No RANSAC trial produced a valid circle.
    NoModel,
}

impl std::fmt::Display for CircleFitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { needed, got } => {
                write!(f, "too few points: need {}, got {}", needed, got)
            }
            Self::Collinear => write!(f, "sample points are collinear"),
            Self::RadiusOutOfRange => write!(f, "circumcircle radius out of valid range"),
            Self::NoModel => write!(f, "no trial produced a valid circle"),
        }
    }
}

impl std::error::Error for CircleFitError {}

// ── Types ──────────────────────────────────────────────────────────────────

/// Geometric circle parameters in the slice plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center x (metres).
    pub cx: f64,
    /// Center y (metres).
    pub cy: f64,
    /// Radius (metres), always >= 0.
    pub radius: f64,
}

impl Circle {
    /// Check basic validity: finite values, non-negative radius.
    pub fn is_valid(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.radius.is_finite() && self.radius >= 0.0
    }

    /// Distance from a point to the circle rim.
    ///
    /// For a degenerate zero-radius circle this is the distance to the
    /// center, so such a model can still collect inliers.
    pub fn rim_distance(&self, p: [f64; 2]) -> f64 {
        let dx = p[0] - self.cx;
        let dy = p[1] - self.cy;
        let dist = (dx * dx + dy * dy).sqrt();
        if self.radius == 0.0 {
            dist
        } else {
            (dist - self.radius).abs()
        }
    }

    /// Sample `n` points evenly spaced on the rim.
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
                [
                    self.cx + self.radius * t.cos(),
                    self.cy + self.radius * t.sin(),
                ]
            })
            .collect()
    }
}

// ── Three-point solver ─────────────────────────────────────────────────────

/// Absolute determinant threshold below which a sample counts as collinear.
/// Not scale-normalized; very large coordinate magnitudes may misclassify.
const COLLINEAR_DET_EPS: f64 = 1e-6;
/// Squared radius below which the fit collapses to a zero-radius circle.
const MIN_RADIUS_SQ: f64 = 1e-12;
/// Squared radius above which the fit is treated as numerically invalid.
const MAX_RADIUS_SQ: f64 = 1e10;

/// Compute the circumcircle through three points.
///
/// Returns `None` when the points are near-collinear or the resulting
/// radius is out of the valid range. A tiny but well-conditioned sample
/// yields a zero-radius circle rather than a rejection.
pub fn circle_from_3_points(p1: [f64; 2], p2: [f64; 2], p3: [f64; 2]) -> Option<Circle> {
    try_circle_from_3_points(p1, p2, p3).ok()
}

/// Like [`circle_from_3_points`], distinguishing the failure mode.
pub fn try_circle_from_3_points(
    p1: [f64; 2],
    p2: [f64; 2],
    p3: [f64; 2],
) -> Result<Circle, CircleFitError> {
    let temp = p2[0] * p2[0] + p2[1] * p2[1];
    let bc = (p1[0] * p1[0] + p1[1] * p1[1] - temp) / 2.0;
    let cd = (temp - p3[0] * p3[0] - p3[1] * p3[1]) / 2.0;
    let det = (p1[0] - p2[0]) * (p2[1] - p3[1]) - (p2[0] - p3[0]) * (p1[1] - p2[1]);

    if det.abs() < COLLINEAR_DET_EPS {
        return Err(CircleFitError::Collinear);
    }

    let cx = (bc * (p2[1] - p3[1]) - cd * (p1[1] - p2[1])) / det;
    let cy = (cd * (p1[0] - p2[0]) - bc * (p2[0] - p3[0])) / det;

    let radius_sq = (p1[0] - cx) * (p1[0] - cx) + (p1[1] - cy) * (p1[1] - cy);
    if radius_sq > MAX_RADIUS_SQ {
        return Err(CircleFitError::RadiusOutOfRange);
    }
    let radius = if radius_sq < MIN_RADIUS_SQ {
        0.0
    } else {
        radius_sq.sqrt()
    };

    Ok(Circle { cx, cy, radius })
}

// ── RANSAC ─────────────────────────────────────────────────────────────────

/// Configuration for RANSAC circle fitting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RansacParams {
    /// Number of trials. Trials whose minimal sample is degenerate still
    /// consume the budget.
    pub iterations: usize,
    /// Inlier threshold: rim distance in metres.
    pub inlier_threshold: f64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            iterations: 5000,
            inlier_threshold: 0.2,
        }
    }
}

/// Result of a RANSAC fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RansacCircle {
    pub circle: Circle,
    pub num_inliers: usize,
}

/// Fit a circle robustly using RANSAC.
///
/// Samples 3-point minimal subsets with the supplied RNG, solves each via
/// [`circle_from_3_points`], and keeps the candidate with the strictly
/// greatest inlier count (ties keep the earliest candidate). There is no
/// minimum-support gate: the best candidate is returned as long as at
/// least one trial produced a valid circle.
pub fn fit_circle_ransac(
    points: &[[f64; 2]],
    params: &RansacParams,
    rng: &mut impl Rng,
) -> Option<RansacCircle> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let mut best: Option<RansacCircle> = None;
    let mut best_inlier_count = 0usize;

    for _ in 0..params.iterations {
        let [i, j, k] = sample_triple(rng, n);
        let Some(circle) = circle_from_3_points(points[i], points[j], points[k]) else {
            continue;
        };

        let inlier_count = points
            .iter()
            .filter(|&&p| circle.rim_distance(p) < params.inlier_threshold)
            .count();

        if inlier_count > best_inlier_count {
            best_inlier_count = inlier_count;
            best = Some(RansacCircle {
                circle,
                num_inliers: inlier_count,
            });
        }
    }

    best
}

/// Like [`fit_circle_ransac`], returning a detailed error on failure.
pub fn try_fit_circle_ransac(
    points: &[[f64; 2]],
    params: &RansacParams,
    rng: &mut impl Rng,
) -> Result<RansacCircle, CircleFitError> {
    let n = points.len();
    if n < 3 {
        return Err(CircleFitError::TooFewPoints { needed: 3, got: n });
    }
    fit_circle_ransac(points, params, rng).ok_or(CircleFitError::NoModel)
}

/// Sample 3 distinct indices from `0..n` using a partial Fisher–Yates shuffle.
fn sample_triple(rng: &mut impl Rng, n: usize) -> [usize; 3] {
    debug_assert!(n >= 3);
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..3 {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }
    [indices[0], indices[1], indices[2]]
}

// ── Tests ──────────────────────────────────────────────────────────────────
