//! Scoring strategies for ranking candidate alignments.

use crate::core::Scoring;
use crate::error::Result;
use crate::geometry::rmsd;
use crate::models::RigidTransform;
use crate::types::PointSet;

/// Scores a transform by the RMSD from each transformed moving point to its
/// nearest fixed point.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmsdScoring;

impl RmsdScoring {
    pub fn new() -> Self {
        Self
    }
}

impl Scoring<RigidTransform> for RmsdScoring {
    type Score = f64;

    fn score(
        &self,
        fixed: &PointSet,
        moving: &PointSet,
        model: &RigidTransform,
    ) -> Result<Self::Score> {
        rmsd(fixed, &model.apply(moving)?)
    }
}

#[cfg(test)]
mod tests {
    use super::RmsdScoring;
    use crate::core::Scoring;
    use crate::models::RigidTransform;
    use crate::types::PointSet;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra::DVector;

    #[test]
    fn rmsd_scoring_measures_transformed_moving_points() {
        let fixed = PointSet::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let moving = PointSet::from_row_slice(2, 2, &[5.0, 5.0, 6.0, 5.0]);

        let mut shift = RigidTransform::identity(2);
        shift.translation = DVector::from_column_slice(&[-5.0, -5.0]);
        let scoring = RmsdScoring::new();
        assert_abs_diff_eq!(scoring.score(&fixed, &moving, &shift).unwrap(), 0.0);

        // Only the moving points are averaged: the uncovered fixed point (0, 1)
        // does not count against the transform.
        shift.translation = DVector::from_column_slice(&[-5.0, -5.5]);
        assert_relative_eq!(
            scoring.score(&fixed, &moving, &shift).unwrap(),
            0.5,
            epsilon = 1e-12
        );
    }
}
