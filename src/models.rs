//! Transformation model produced by the registration routines.

use nalgebra::{DMatrix, DVector};

use crate::error::{DriftError, Result};
use crate::geometry::{rigid_xform, rotation_matrix_2d};
use crate::types::PointSet;

/// Similarity transform `p -> scale * rotation * p + translation`.
///
/// `rotation` is a proper `D x D` rotation (orthonormal, determinant +1). The
/// estimator only ever builds it from an SVD with reflection correction, so it
/// is not re-checked here.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidTransform {
    pub rotation: DMatrix<f64>,
    pub translation: DVector<f64>,
    pub scale: f64,
}

impl RigidTransform {
    pub fn new(rotation: DMatrix<f64>, translation: DVector<f64>, scale: f64) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Identity rotation, zero translation, unit scale.
    pub fn identity(dim: usize) -> Self {
        Self::new(DMatrix::identity(dim, dim), DVector::zeros(dim), 1.0)
    }

    /// Planar rotation by `angle` with no translation and unit scale.
    pub fn from_angle(angle: f64) -> Self {
        Self::new(rotation_matrix_2d(angle), DVector::zeros(2), 1.0)
    }

    pub fn dim(&self) -> usize {
        self.translation.len()
    }

    pub fn rotation_determinant(&self) -> f64 {
        self.rotation.determinant()
    }

    /// Map every row of `points` through the transform.
    pub fn apply(&self, points: &PointSet) -> Result<PointSet> {
        rigid_xform(points, &self.rotation, &self.translation, self.scale)
    }

    /// The transform undoing this one. Fails for a zero scale.
    pub fn inverse(&self) -> Result<Self> {
        if self.scale == 0.0 || !self.scale.is_finite() {
            return Err(DriftError::Computation(format!(
                "cannot invert a transform with scale {}",
                self.scale
            )));
        }
        let rotation = self.rotation.transpose();
        let scale = 1.0 / self.scale;
        let translation = -(&rotation * &self.translation) * scale;
        Ok(Self::new(rotation, translation, scale))
    }

    pub(crate) fn check_dim(&self, dim: usize) -> Result<()> {
        if self.rotation.shape() != (dim, dim) || self.translation.len() != dim {
            return Err(DriftError::InvalidArgument(format!(
                "initial transform is {}-dimensional, points are {}-dimensional",
                self.translation.len(),
                dim
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(DriftError::InvalidArgument(format!(
                "initial scale must be positive and finite, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RigidTransform;
    use crate::types::PointSet;
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    #[test]
    fn identity_leaves_points_unchanged() {
        let points = PointSet::from_row_slice(2, 3, &[1.0, 2.0, 3.0, -4.0, 0.5, 9.0]);
        let moved = RigidTransform::identity(3).apply(&points).unwrap();
        assert_relative_eq!(moved, points);
    }

    #[test]
    fn inverse_round_trips_points() {
        let mut transform = RigidTransform::from_angle(0.4);
        transform.translation = DVector::from_column_slice(&[0.1, 0.3]);
        transform.scale = 0.5;

        let points = PointSet::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.2, -0.7, 0.9]);
        let there = transform.apply(&points).unwrap();
        let back = transform.inverse().unwrap().apply(&there).unwrap();
        assert_relative_eq!(back, points, epsilon = 1e-12);
        assert_relative_eq!(transform.rotation_determinant(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn dimension_check_rejects_wrong_size_and_scale() {
        assert!(RigidTransform::identity(3).check_dim(2).is_err());
        let mut flat = RigidTransform::identity(2);
        flat.scale = 0.0;
        assert!(flat.check_dim(2).is_err());
        assert!(RigidTransform::identity(2).check_dim(2).is_ok());
    }
}
