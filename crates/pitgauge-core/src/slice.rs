//! Depth slicing of a shaft cloud into horizontal bands.
//!
//! Bands are generated between fixed margins from the shaft mouth and
//! floor, ordered by ascending depth, and evaluated lazily: each band
//! selects its member points on demand from the caller-owned cloud.

use serde::{Deserialize, Serialize};

/// Slicing starts this far below the mouth (metres).
pub const MOUTH_MARGIN: f64 = 0.5;
/// Slicing stops this far above the estimated floor (metres).
pub const FLOOR_MARGIN: f64 = 0.5;

/// Configuration for depth slicing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceParams {
    /// Spacing between consecutive band centers (metres).
    pub interval: f64,
    /// Band thickness (metres).
    pub thickness: f64,
}

impl Default for SliceParams {
    fn default() -> Self {
        Self {
            interval: 1.0,
            thickness: 0.30,
        }
    }
}

/// A horizontal depth band `[center_z - half_thickness, center_z + half_thickness]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceBand {
    pub center_z: f64,
    pub half_thickness: f64,
}

impl SliceBand {
    /// Closed-interval band membership.
    pub fn contains(&self, z: f64) -> bool {
        z >= self.center_z - self.half_thickness && z <= self.center_z + self.half_thickness
    }

    /// Collect the XY projection of the cloud points inside this band.
    pub fn project_xy(&self, points: &[[f64; 3]]) -> Vec<[f64; 2]> {
        points
            .iter()
            .filter(|p| self.contains(p[2]))
            .map(|p| [p[0], p[1]])
            .collect()
    }
}

/// Lazy iterator over the slice bands for a shaft of the given depth.
///
/// Centers form the arithmetic progression `MOUTH_MARGIN + i * interval`,
/// strictly below `depth - FLOOR_MARGIN`. Each center is computed by index
/// multiplication, so iteration does not accumulate rounding error and a
/// fresh call restarts the identical sequence.
pub fn slice_bands(depth: f64, params: &SliceParams) -> SliceBands {
    SliceBands {
        z_start: MOUTH_MARGIN,
        z_end: depth - FLOOR_MARGIN,
        interval: params.interval,
        half_thickness: params.thickness / 2.0,
        index: 0,
    }
}

/// Iterator produced by [`slice_bands`].
#[derive(Debug, Clone)]
pub struct SliceBands {
    z_start: f64,
    z_end: f64,
    interval: f64,
    half_thickness: f64,
    index: usize,
}

impl Iterator for SliceBands {
    type Item = SliceBand;

    fn next(&mut self) -> Option<SliceBand> {
        if !(self.interval > 0.0) {
            return None;
        }
        let center_z = self.z_start + self.index as f64 * self.interval;
        if center_z >= self.z_end {
            return None;
        }
        self.index += 1;
        Some(SliceBand {
            center_z,
            half_thickness: self.half_thickness,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_centers_progression() {
        let params = SliceParams {
            interval: 1.0,
            thickness: 0.3,
        };
        let centers: Vec<f64> = slice_bands(12.0, &params).map(|b| b.center_z).collect();
        // 0.5, 1.5, ..., strictly below 11.5.
        assert_eq!(centers.len(), 11);
        assert_relative_eq!(centers[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(centers[10], 10.5, epsilon = 1e-12);
        for w in centers.windows(2) {
            assert_relative_eq!(w[1] - w[0], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_end_is_exclusive() {
        let params = SliceParams {
            interval: 0.5,
            thickness: 0.3,
        };
        // z_end = 1.5: the center at exactly 1.5 must not be produced.
        let centers: Vec<f64> = slice_bands(2.0, &params).map(|b| b.center_z).collect();
        assert_eq!(centers, vec![0.5, 1.0]);
    }

    #[test]
    fn test_too_shallow_is_empty() {
        let params = SliceParams::default();
        assert_eq!(slice_bands(1.0, &params).count(), 0);
        assert_eq!(slice_bands(0.9, &params).count(), 0);
        assert_eq!(slice_bands(-3.0, &params).count(), 0);
    }

    #[test]
    fn test_nonpositive_interval_is_empty() {
        let params = SliceParams {
            interval: 0.0,
            thickness: 0.3,
        };
        assert_eq!(slice_bands(10.0, &params).count(), 0);
    }

    #[test]
    fn test_restartable() {
        let params = SliceParams::default();
        let a: Vec<f64> = slice_bands(8.0, &params).map(|b| b.center_z).collect();
        let b: Vec<f64> = slice_bands(8.0, &params).map(|b| b.center_z).collect();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_band_membership_is_closed() {
        let band = SliceBand {
            center_z: 2.0,
            half_thickness: 0.15,
        };
        assert!(band.contains(1.85));
        assert!(band.contains(2.15));
        assert!(band.contains(2.0));
        assert!(!band.contains(1.8499999));
        assert!(!band.contains(2.1500001));
    }

    #[test]
    fn test_project_xy_filters_by_band() {
        let band = SliceBand {
            center_z: 1.0,
            half_thickness: 0.15,
        };
        let cloud = vec![
            [0.1, 0.2, 0.9],
            [0.3, 0.4, 1.15],
            [0.5, 0.6, 1.2], // outside
            [0.7, 0.8, 0.85],
        ];
        let xy = band.project_xy(&cloud);
        assert_eq!(xy, vec![[0.1, 0.2], [0.3, 0.4], [0.7, 0.8]]);
    }
}
