// Vector helpers for the swerve kinematics: 2D rotation, matrix-vector product
// and cartesian to polar conversion.

/// Error types for the linear algebra helpers
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MathError {
    #[error("Cannot multiply {rows}x{cols} matrix by vector of length {len}")]
    DimensionMismatch { rows: usize, cols: usize, len: usize },

    #[error("Matrix row {row} has {found} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A vector in polar form. `angle` is in radians, within (-PI, PI].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolarVector {
    pub magnitude: f64,
    pub angle: f64,
}

impl PolarVector {
    /// Returns the vector as [x, y]
    pub fn to_cartesian(&self) -> [f64; 2] {
        [
            self.magnitude * self.angle.cos(),
            self.magnitude * self.angle.sin(),
        ]
    }
}

/// Rotate `vector` counter-clockwise by `angle` radians
pub fn rotate_2d(angle: f64, vector: [f64; 2]) -> [f64; 2] {
    let (sin, cos) = angle.sin_cos();
    let [x, y] = vector;
    [cos * x - sin * y, sin * x + cos * y]
}

/// Multiply an R x C matrix (given as rows) by a vector of length C
///
/// The shape is checked up front so a wrong operand never produces a
/// silently truncated result.
pub fn matrix_vector_multiply<R: AsRef<[f64]>>(
    matrix: &[R],
    vector: &[f64],
) -> Result<Vec<f64>, MathError> {
    let cols = matrix.first().map(|row| row.as_ref().len()).unwrap_or(0);

    if matrix.is_empty() || cols != vector.len() {
        return Err(MathError::DimensionMismatch {
            rows: matrix.len(),
            cols,
            len: vector.len(),
        });
    }

    matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(MathError::RaggedMatrix {
                    row: i,
                    expected: cols,
                    found: row.len(),
                });
            }
            Ok(row.iter().zip(vector).map(|(m, v)| m * v).sum())
        })
        .collect()
}

/// Convert (x, y) to magnitude and angle. The origin maps to (0, 0).
pub fn cartesian_to_polar(x: f64, y: f64) -> PolarVector {
    PolarVector {
        magnitude: x.hypot(y),
        angle: y.atan2(x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_rotate_quarter_turn() {
        let [x, y] = rotate_2d(FRAC_PI_2, [1.0, 0.0]);
        assert!(x.abs() < EPS);
        assert!((y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        assert_eq!(rotate_2d(0.0, [0.3, -0.7]), [0.3, -0.7]);
    }

    #[test]
    fn test_rotate_preserves_length() {
        let [x, y] = rotate_2d(2.1, [3.0, 4.0]);
        assert!((x.hypot(y) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_matrix_vector_multiply() {
        let m = [[1.0, 2.0, 3.0], [0.0, -1.0, 0.5]];
        let result = matrix_vector_multiply(&m, &[1.0, 1.0, 2.0]).unwrap();
        assert_eq!(result, vec![9.0, 0.0]);
    }

    #[test]
    fn test_matrix_vector_multiply_rejects_mismatch() {
        let m = [[1.0, 2.0], [3.0, 4.0]];
        let err = matrix_vector_multiply(&m, &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            MathError::DimensionMismatch {
                rows: 2,
                cols: 2,
                len: 3
            }
        );
    }

    #[test]
    fn test_matrix_vector_multiply_rejects_ragged_rows() {
        let m = vec![vec![1.0, 2.0], vec![3.0]];
        let err = matrix_vector_multiply(&m, &[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            MathError::RaggedMatrix {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_matrix_vector_multiply_rejects_empty() {
        let m: [[f64; 0]; 0] = [];
        assert!(matrix_vector_multiply(&m, &[]).is_err());
    }

    #[test]
    fn test_cartesian_to_polar() {
        let origin = cartesian_to_polar(0.0, 0.0);
        assert_eq!(origin.magnitude, 0.0);
        assert_eq!(origin.angle, 0.0);

        let east = cartesian_to_polar(1.0, 0.0);
        assert!((east.magnitude - 1.0).abs() < EPS);
        assert!(east.angle.abs() < EPS);

        let north = cartesian_to_polar(0.0, 1.0);
        assert!((north.magnitude - 1.0).abs() < EPS);
        assert!((north.angle - FRAC_PI_2).abs() < EPS);

        let west = cartesian_to_polar(-2.0, 0.0);
        assert!((west.angle - PI).abs() < EPS);
    }

    #[test]
    fn test_polar_back_to_cartesian() {
        let [x, y] = cartesian_to_polar(-0.4, 1.3).to_cartesian();
        assert!((x + 0.4).abs() < EPS);
        assert!((y - 1.3).abs() < EPS);
    }
}
