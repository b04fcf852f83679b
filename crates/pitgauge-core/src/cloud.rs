//! Point-cloud helpers shared by the pipeline and its callers.
//!
//! The core never owns or mutates a cloud; these helpers read a
//! caller-owned `&[[f64; 3]]` and produce derived values.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box with closed bounds on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    pub fn contains(&self, p: [f64; 3]) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Copy out the points inside the box.
    pub fn crop(&self, points: &[[f64; 3]]) -> Vec<[f64; 3]> {
        points.iter().copied().filter(|&p| self.contains(p)).collect()
    }
}

/// Tight bounds of a cloud, or `None` for an empty cloud.
pub fn bounds(points: &[[f64; 3]]) -> Option<Aabb> {
    let first = points.first()?;
    let mut bb = Aabb {
        min: *first,
        max: *first,
    };
    for p in &points[1..] {
        for i in 0..3 {
            bb.min[i] = bb.min[i].min(p[i]);
            bb.max[i] = bb.max[i].max(p[i]);
        }
    }
    Some(bb)
}

/// Linear-interpolation percentile over an unsorted sample.
///
/// `pct` is in percent (`99.5` for the 99.5th percentile) and is clamped
/// to `[0, 100]`. Returns `None` for an empty sample.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_crop_closed_bounds() {
        let bb = Aabb {
            min: [-1.0, -1.0, 0.0],
            max: [1.0, 1.0, 2.0],
        };
        let cloud = vec![
            [0.0, 0.0, 1.0],
            [1.0, -1.0, 2.0],  // on the boundary: kept
            [1.1, 0.0, 1.0],   // outside x
            [0.0, 0.0, -0.01], // outside z
        ];
        let kept = bb.crop(&cloud);
        assert_eq!(kept, vec![[0.0, 0.0, 1.0], [1.0, -1.0, 2.0]]);
    }

    #[test]
    fn test_bounds() {
        assert!(bounds(&[]).is_none());
        let bb = bounds(&[[1.0, 2.0, 3.0], [-1.0, 5.0, 0.5]]).unwrap();
        assert_eq!(bb.min, [-1.0, 2.0, 0.5]);
        assert_eq!(bb.max, [1.0, 5.0, 3.0]);
    }

    #[test]
    fn test_percentile_median() {
        let vals = vec![3.0, 1.0, 2.0];
        assert_relative_eq!(percentile(&vals, 50.0).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_interpolates() {
        // 0..=100 evenly spaced: the p-th percentile is exactly p.
        let vals: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        assert_relative_eq!(percentile(&vals, 99.5).unwrap(), 99.5, epsilon = 1e-12);
        assert_relative_eq!(percentile(&vals, 25.0).unwrap(), 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_extremes() {
        let vals = vec![5.0, -2.0, 7.5];
        assert_relative_eq!(percentile(&vals, 0.0).unwrap(), -2.0, epsilon = 1e-12);
        assert_relative_eq!(percentile(&vals, 100.0).unwrap(), 7.5, epsilon = 1e-12);
        assert!(percentile(&[], 50.0).is_none());
    }

    #[test]
    fn test_percentile_single_value() {
        assert_relative_eq!(percentile(&[4.2], 99.5).unwrap(), 4.2, epsilon = 1e-12);
    }
}
