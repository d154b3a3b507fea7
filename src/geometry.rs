//! Distance and fit-quality primitives shared by the estimator and the
//! global search, plus the small amount of rotation plumbing both need.

use nalgebra::{DMatrix, DVector, Rotation3, Unit, Vector3};

use crate::error::{DriftError, Result};
use crate::types::PointSet;

fn ensure_same_dim(a: &PointSet, b: &PointSet) -> Result<usize> {
    if a.ncols() != b.ncols() {
        return Err(DriftError::DimensionMismatch {
            expected: a.ncols(),
            found: b.ncols(),
        });
    }
    Ok(a.ncols())
}

/// Squared Euclidean distance between every point of `b` and every point of `a`.
///
/// Returns an `M x N` matrix (`M = b.nrows()`, `N = a.nrows()`) whose `(j, i)`
/// entry is `|b_j - a_i|^2`.
pub fn pairwise_distance_squared(a: &PointSet, b: &PointSet) -> Result<DMatrix<f64>> {
    let dim = ensure_same_dim(a, b)?;
    Ok(DMatrix::from_fn(b.nrows(), a.nrows(), |j, i| {
        (0..dim)
            .map(|k| {
                let d = b[(j, k)] - a[(i, k)];
                d * d
            })
            .sum()
    }))
}

/// One-sided root-mean-square nearest-neighbour distance.
///
/// Every point of `b` is matched to its closest point of `a`; the result is the
/// square root of the mean of those squared distances. This measures how well
/// `b` is covered by `a`, so `rmsd(a, b)` and `rmsd(b, a)` generally differ.
pub fn rmsd(a: &PointSet, b: &PointSet) -> Result<f64> {
    if a.nrows() == 0 || b.nrows() == 0 {
        return Err(DriftError::InvalidArgument(format!(
            "RMSD needs non-empty point sets, got {} and {} points",
            a.nrows(),
            b.nrows()
        )));
    }
    let dist = pairwise_distance_squared(a, b)?;
    let total: f64 = dist.row_iter().map(|row| row.min()).sum();
    Ok((total / b.nrows() as f64).sqrt())
}

/// Counter-clockwise planar rotation by `angle` radians.
pub fn rotation_matrix_2d(angle: f64) -> DMatrix<f64> {
    let (sin, cos) = angle.sin_cos();
    DMatrix::from_row_slice(2, 2, &[cos, -sin, sin, cos])
}

/// Right-handed rotation by `angle` radians about `axis` (need not be unit length).
pub fn rotation_matrix_3d(angle: f64, axis: &[f64; 3]) -> Result<DMatrix<f64>> {
    let axis = Unit::try_new(Vector3::new(axis[0], axis[1], axis[2]), f64::EPSILON)
        .ok_or_else(|| {
            DriftError::InvalidArgument("rotation axis must be a non-zero vector".into())
        })?;
    let rotation = Rotation3::from_axis_angle(&axis, angle);
    Ok(DMatrix::from_iterator(3, 3, rotation.matrix().iter().copied()))
}

/// Apply `p -> scale * rotation * p + translation` to every row of `points`.
pub fn rigid_xform(
    points: &PointSet,
    rotation: &DMatrix<f64>,
    translation: &DVector<f64>,
    scale: f64,
) -> Result<PointSet> {
    let dim = points.ncols();
    if rotation.nrows() != dim || rotation.ncols() != dim {
        return Err(DriftError::DimensionMismatch {
            expected: dim,
            found: rotation.nrows(),
        });
    }
    if translation.len() != dim {
        return Err(DriftError::DimensionMismatch {
            expected: dim,
            found: translation.len(),
        });
    }

    let mut out = points * rotation.transpose() * scale;
    for mut row in out.row_iter_mut() {
        for (k, value) in row.iter_mut().enumerate() {
            *value += translation[k];
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::FRAC_PI_2;

    fn triangle() -> PointSet {
        PointSet::from_row_slice(3, 2, &[0.0, 0.0, 2.0, 0.0, 0.0, 1.0])
    }

    #[test]
    fn pairwise_distance_has_moving_rows_and_fixed_columns() {
        let a = triangle();
        let b = PointSet::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 0.0]);
        let dist = pairwise_distance_squared(&a, &b).unwrap();

        assert_eq!(dist.shape(), (2, 3));
        assert_relative_eq!(dist[(0, 0)], 2.0);
        assert_relative_eq!(dist[(0, 1)], 2.0);
        assert_relative_eq!(dist[(0, 2)], 1.0);
        assert_relative_eq!(dist[(1, 1)], 4.0);
    }

    #[test]
    fn pairwise_distance_transpose_swaps_arguments() {
        let a = triangle();
        let b = PointSet::from_row_slice(4, 2, &[0.3, -1.0, 2.5, 0.7, -0.2, 0.1, 1.0, 1.0]);
        let ab = pairwise_distance_squared(&a, &b).unwrap();
        let ba = pairwise_distance_squared(&b, &a).unwrap();
        assert_relative_eq!(ab.transpose(), ba, epsilon = 1e-12);
    }

    #[test]
    fn pairwise_distance_rejects_mixed_dimensions() {
        let a = triangle();
        let b = PointSet::zeros(2, 3);
        let err = pairwise_distance_squared(&a, &b).unwrap_err();
        assert_eq!(
            err,
            DriftError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn rmsd_of_a_set_with_itself_is_zero() {
        let a = triangle();
        assert_abs_diff_eq!(rmsd(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn rmsd_averages_over_the_second_argument() {
        let a = PointSet::from_row_slice(1, 2, &[0.0, 0.0]);
        let b = PointSet::from_row_slice(2, 2, &[3.0, 0.0, 0.0, 1.0]);
        // (9 + 1) / 2 = 5
        assert_relative_eq!(rmsd(&a, &b).unwrap(), 5.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn rmsd_rejects_empty_sets() {
        let a = triangle();
        let empty = PointSet::zeros(0, 2);
        assert!(rmsd(&a, &empty).unwrap_err().is_invalid_argument());
        assert!(rmsd(&empty, &a).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn planar_rotation_is_counter_clockwise() {
        let r = rotation_matrix_2d(FRAC_PI_2);
        let p = PointSet::from_row_slice(1, 2, &[1.0, 0.0]);
        let rotated = rigid_xform(&p, &r, &DVector::zeros(2), 1.0).unwrap();
        assert_abs_diff_eq!(rotated[(0, 0)], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rotated[(0, 1)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn spatial_rotation_about_z_matches_planar_rotation() {
        let r3 = rotation_matrix_3d(0.7, &[0.0, 0.0, 2.0]).unwrap();
        let r2 = rotation_matrix_2d(0.7);
        assert_relative_eq!(r3.view((0, 0), (2, 2)).into_owned(), r2, epsilon = 1e-12);
        assert_relative_eq!(r3[(2, 2)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(r3.determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn spatial_rotation_rejects_zero_axis() {
        assert!(rotation_matrix_3d(1.0, &[0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn rigid_xform_scales_rotates_then_translates() {
        let p = PointSet::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 2.0]);
        let r = rotation_matrix_2d(FRAC_PI_2);
        let t = DVector::from_column_slice(&[10.0, -1.0]);
        let out = rigid_xform(&p, &r, &t, 0.5).unwrap();
        assert_abs_diff_eq!(out[(0, 0)], 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[(0, 1)], -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(out[(1, 0)], 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[(1, 1)], -1.0, epsilon = 1e-12);
    }
}
