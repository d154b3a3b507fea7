//! Core traits and the multi-start alignment pipeline.
//!
//! The rigid EM objective is non-convex in the rotation angle, so a single run
//! can settle in a poor local optimum. [`GlobalAlignment`] restarts the
//! estimator from a ring of initial rotations, scores each result with a
//! pluggable [`Scoring`] strategy and keeps the best one.

use std::f64::consts::TAU;

use tracing::{debug, info};

use crate::error::{DriftError, Result};
use crate::estimators::RigidDrift;
use crate::models::RigidTransform;
use crate::settings::GlobalAlignmentSettings;
use crate::types::PointSet;

pub use crate::estimators::Termination;

/// Scoring strategy used to rank candidate alignments.
///
/// Lower scores are better. Incomparable scores (e.g. NaN) never win.
pub trait Scoring<M> {
    type Score: Clone + PartialOrd + std::fmt::Debug;

    /// Score `model` applied to `moving` against `fixed`.
    fn score(&self, fixed: &PointSet, moving: &PointSet, model: &M) -> Result<Self::Score>;
}

/// Multi-start planar alignment pipeline.
#[derive(Debug)]
pub struct GlobalAlignment<Sc>
where
    Sc: Scoring<RigidTransform>,
{
    pub settings: GlobalAlignmentSettings,
    pub scoring: Sc,

    // Outputs / diagnostics
    pub best_transform: Option<RigidTransform>,
    pub best_score: Option<Sc::Score>,
    pub best_angle: Option<f64>,
    pub best_iterations: usize,
    pub best_termination: Option<Termination>,
    pub candidates: usize,
}

impl<Sc> GlobalAlignment<Sc>
where
    Sc: Scoring<RigidTransform>,
{
    pub fn new(settings: GlobalAlignmentSettings, scoring: Sc) -> Self {
        Self {
            settings,
            scoring,
            best_transform: None,
            best_score: None,
            best_angle: None,
            best_iterations: 0,
            best_termination: None,
            candidates: 0,
        }
    }

    /// Initial rotation angles `0, step, 2*step, ...` below 2π.
    pub fn candidate_angles(&self) -> Result<Vec<f64>> {
        let step = self.settings.angle_step;
        if !(step.is_finite() && step > 0.0) {
            return Err(DriftError::InvalidArgument(format!(
                "angle step must be positive and finite, got {step}"
            )));
        }
        Ok((0..)
            .map(|k| k as f64 * step)
            .take_while(|&angle| angle < TAU)
            .collect())
    }

    /// Run every candidate and keep the lowest-scoring transform.
    ///
    /// Ties go to the earliest candidate.
    pub fn run(&mut self, fixed: &PointSet, moving: &PointSet) -> Result<()> {
        let dim = fixed.ncols();
        if dim != 2 {
            return Err(DriftError::NotImplemented(format!(
                "global alignment is only implemented for D = 2, got D = {dim}"
            )));
        }
        let angles = self.candidate_angles()?;

        self.best_transform = None;
        self.best_score = None;
        self.best_angle = None;
        self.best_iterations = 0;
        self.best_termination = None;
        self.candidates = 0;

        for angle in angles {
            let initial = RigidTransform::from_angle(angle);
            let outcome = RigidDrift::new(fixed, moving, &self.settings.drift, Some(initial))?
                .run(self.settings.max_iterations)?;
            self.candidates += 1;

            let score = self.scoring.score(fixed, moving, &outcome.transform)?;
            debug!(
                angle,
                ?score,
                iterations = outcome.iterations,
                termination = ?outcome.termination,
                "global alignment candidate"
            );

            let better = match &self.best_score {
                None => score.partial_cmp(&score).is_some(),
                Some(best) => score < *best,
            };
            if better {
                self.best_score = Some(score);
                self.best_transform = Some(outcome.transform);
                self.best_angle = Some(angle);
                self.best_iterations = outcome.iterations;
                self.best_termination = Some(outcome.termination);
            }
        }

        if self.best_transform.is_none() {
            return Err(DriftError::Computation(
                "no alignment candidate produced a comparable score".into(),
            ));
        }
        info!(
            candidates = self.candidates,
            angle = ?self.best_angle,
            score = ?self.best_score,
            "global alignment finished"
        );
        Ok(())
    }
}
