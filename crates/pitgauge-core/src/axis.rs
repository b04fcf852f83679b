//! Shaft axis estimation from fitted slice centers.
//!
//! The axis is the dominant principal direction of the mean-centered
//! slice-center cloud, obtained from an SVD of the N×3 matrix. Only the
//! dominant right-singular vector is used, so the usual SVD sign
//! ambiguity is resolved by forcing the depth component non-negative
//! (z grows downward, so the canonical axis points down the shaft).

use nalgebra::{DMatrix, Vector3};

/// Errors that can occur during axis estimation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisError {
    /// A principal direction needs at least two distinct centers.
    TooFewPoints { needed: usize, got: usize },
}

impl std::fmt::Display for AxisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { needed, got } => {
                write!(f, "too few axis points: need {}, got {}", needed, got)
            }
        }
    }
}

impl std::error::Error for AxisError {}

/// Fit the dominant axis through a set of 3-D points.
///
/// Returns a unit vector with `z >= 0`.
pub fn principal_axis(points: &[[f64; 3]]) -> Result<Vector3<f64>, AxisError> {
    let n = points.len();
    if n < 2 {
        return Err(AxisError::TooFewPoints { needed: 2, got: n });
    }

    let inv_n = 1.0 / n as f64;
    let mut centroid = [0.0f64; 3];
    for p in points {
        centroid[0] += p[0] * inv_n;
        centroid[1] += p[1] * inv_n;
        centroid[2] += p[2] * inv_n;
    }

    let centered = DMatrix::from_fn(n, 3, |r, c| points[r][c] - centroid[c]);
    let svd = centered.svd(false, true);
    let v_t = svd.v_t.expect("V^T requested from SVD");

    // Row of V^T paired with the largest singular value; not assuming any
    // ordering of the decomposition output.
    let mut dominant = 0usize;
    for (i, sv) in svd.singular_values.iter().enumerate() {
        if *sv > svd.singular_values[dominant] {
            dominant = i;
        }
    }

    let row = v_t.row(dominant);
    let mut axis = Vector3::new(row[0], row[1], row[2]);
    if axis.z < 0.0 {
        axis = -axis;
    }
    Ok(axis)
}

/// Angular deviation, in degrees, between the fitted axis and true vertical.
pub fn verticality_degrees(points: &[[f64; 3]]) -> Result<f64, AxisError> {
    let axis = principal_axis(points)?;
    // axis . (0, 0, 1) == axis.z
    Ok(axis.z.clamp(-1.0, 1.0).acos().to_degrees())
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_too_few_points() {
        assert_eq!(
            principal_axis(&[]).unwrap_err(),
            AxisError::TooFewPoints { needed: 2, got: 0 }
        );
        assert_eq!(
            verticality_degrees(&[[0.0, 0.0, 1.0]]).unwrap_err(),
            AxisError::TooFewPoints { needed: 2, got: 1 }
        );
    }

    #[test]
    fn test_vertical_cylinder_is_zero_degrees() {
        let centers: Vec<[f64; 3]> = (0..10).map(|i| [0.0, 0.0, 0.5 + i as f64]).collect();
        let deg = verticality_degrees(&centers).expect("should estimate");
        assert_relative_eq!(deg, 0.0, epsilon = 0.01);
    }

    #[test]
    fn test_known_tilt_recovered() {
        // Centers along a line tilted 2 degrees from vertical in the XZ plane.
        let theta = 2.0f64.to_radians();
        let centers: Vec<[f64; 3]> = (0..12)
            .map(|i| {
                let t = i as f64;
                [t * theta.sin(), 0.0, t * theta.cos()]
            })
            .collect();
        let deg = verticality_degrees(&centers).expect("should estimate");
        assert_relative_eq!(deg, 2.0, epsilon = 0.5);
    }

    #[test]
    fn test_tilt_with_lateral_noise() {
        let theta = 1.0f64.to_radians();
        // Deterministic small wobble around the tilted line.
        let centers: Vec<[f64; 3]> = (0..30)
            .map(|i| {
                let t = i as f64;
                let wobble = 0.002 * (t * 2.399).sin();
                [t * theta.sin() + wobble, wobble * 0.5, t * theta.cos()]
            })
            .collect();
        let deg = verticality_degrees(&centers).expect("should estimate");
        assert_relative_eq!(deg, 1.0, epsilon = 0.1);
    }

    #[test]
    fn test_sign_normalization() {
        // Same line fed in descending depth order must give the same axis.
        let up: Vec<[f64; 3]> = (0..8).map(|i| [0.1 * i as f64, 0.0, i as f64]).collect();
        let down: Vec<[f64; 3]> = up.iter().rev().copied().collect();
        let a = principal_axis(&up).unwrap();
        let b = principal_axis(&down).unwrap();
        assert!(a.z >= 0.0 && b.z >= 0.0);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-9);
    }

    #[test]
    fn test_idempotent() {
        let centers: Vec<[f64; 3]> = (0..5).map(|i| [0.01 * i as f64, 0.0, i as f64]).collect();
        let a = verticality_degrees(&centers).unwrap();
        let b = verticality_degrees(&centers).unwrap();
        assert_eq!(a, b);
    }
}
