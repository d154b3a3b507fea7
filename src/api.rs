//! High-level registration API.
//!
//! These functions wire the estimator, scoring and settings together for the
//! common cases. Use [`crate::core::GlobalAlignment`] or
//! [`crate::estimators::RigidDrift`] directly for finer control.

use crate::core::GlobalAlignment;
use crate::error::{DriftError, Result};
use crate::estimators::{DriftOutcome, RigidDrift, Termination};
use crate::models::RigidTransform;
use crate::scoring::RmsdScoring;
use crate::settings::{DriftSettings, GlobalAlignmentSettings};
use crate::types::PointSet;

/// Result of a multi-start global alignment.
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    /// Best transform mapping `moving` onto `fixed`.
    pub transform: RigidTransform,
    /// RMSD of the transformed moving set against the fixed set.
    pub rmsd: f64,
    /// Initial rotation angle of the winning candidate.
    pub initial_angle: f64,
    /// EM iterations the winning candidate ran.
    pub iterations: usize,
    pub termination: Termination,
    /// Number of candidates evaluated.
    pub candidates: usize,
}

/// Start a lazy rigid CPD estimator with outlier weight `outlier_weight`.
///
/// The returned iterator yields one refined transform per EM step; bound it
/// with `take` or [`RigidDrift::run`].
pub fn rigid_drift<'a>(
    fixed: &'a PointSet,
    moving: &'a PointSet,
    outlier_weight: f64,
    initial: Option<RigidTransform>,
) -> Result<RigidDrift<'a>> {
    RigidDrift::new(
        fixed,
        moving,
        &DriftSettings::with_outlier_weight(outlier_weight),
        initial,
    )
}

/// Run rigid CPD for at most `max_iterations` steps.
///
/// # Arguments
/// * `fixed` - Target point set (N x D)
/// * `moving` - Point set to be aligned (M x D)
/// * `max_iterations` - Iteration cap
/// * `initial` - Optional warm-start transform (identity if None)
/// * `settings_opt` - Optional estimator settings (uses defaults if None)
pub fn register_rigid(
    fixed: &PointSet,
    moving: &PointSet,
    max_iterations: usize,
    initial: Option<RigidTransform>,
    settings_opt: Option<DriftSettings>,
) -> Result<DriftOutcome> {
    let settings = settings_opt.unwrap_or_default();
    RigidDrift::new(fixed, moving, &settings, initial)?.run(max_iterations)
}

/// Align two planar point sets from multiple initial rotations.
///
/// The outlier weight `w` is `settings.drift.outlier_weight` (0.5 by default);
/// [`global_alignment_with_outlier_weight`] sets only that.
///
/// # Arguments
/// * `fixed` - Target point set (N x 2)
/// * `moving` - Point set to be aligned (M x 2)
/// * `settings_opt` - Optional search settings (uses defaults if None)
///
/// # Returns
/// `AlignmentResult` holding the lowest-RMSD transform found.
pub fn global_alignment(
    fixed: &PointSet,
    moving: &PointSet,
    settings_opt: Option<GlobalAlignmentSettings>,
) -> Result<AlignmentResult> {
    let settings = settings_opt.unwrap_or_default();
    let mut pipeline = GlobalAlignment::new(settings, RmsdScoring::new());
    pipeline.run(fixed, moving)?;

    match (
        pipeline.best_transform,
        pipeline.best_score,
        pipeline.best_angle,
        pipeline.best_termination,
    ) {
        (Some(transform), Some(rmsd), Some(initial_angle), Some(termination)) => {
            Ok(AlignmentResult {
                transform,
                rmsd,
                initial_angle,
                iterations: pipeline.best_iterations,
                termination,
                candidates: pipeline.candidates,
            })
        }
        _ => Err(DriftError::Computation(
            "global alignment produced no transform".into(),
        )),
    }
}

/// [`global_alignment`] with default search settings and outlier weight
/// `outlier_weight`.
pub fn global_alignment_with_outlier_weight(
    fixed: &PointSet,
    moving: &PointSet,
    outlier_weight: f64,
) -> Result<AlignmentResult> {
    let settings = GlobalAlignmentSettings {
        drift: DriftSettings::with_outlier_weight(outlier_weight),
        ..GlobalAlignmentSettings::default()
    };
    global_alignment(fixed, moving, Some(settings))
}
