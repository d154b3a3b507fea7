//! Rigid Coherent Point Drift.
//!
//! The moving set is treated as the centroids of an isotropic Gaussian mixture
//! (plus one uniform outlier component) that generated the fixed set. Each EM
//! step computes soft correspondences (E-step) and then solves the weighted
//! orthogonal Procrustes problem in closed form (M-step).
//!
//! [`RigidDrift`] is an iterator: every call to `next` performs one EM step and
//! yields the refined transform. It stops on its own when σ² collapses or blows
//! up, and records why in [`RigidDrift::termination`]. Callers impose their own
//! iteration cap, either with `Iterator::take` or with [`RigidDrift::run`].

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector, SVD};
use tracing::{debug, trace};

use crate::error::{DriftError, Result};
use crate::models::RigidTransform;
use crate::settings::DriftSettings;
use crate::types::PointSet;

/// Singular values below this fraction of the Cauchy-Schwarz bound on the
/// cross-covariance are treated as zero.
const RANK_TOLERANCE: f64 = 1e-12;

/// Why an estimator run stopped producing transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// σ² fell to the convergence threshold: the mixture has collapsed onto
    /// the moving points.
    Converged,
    /// σ² left the representable or plausible range, or the E-step could not
    /// be evaluated.
    Diverged,
    /// The caller's iteration budget ran out first.
    IterationCap,
}

/// Final state of an estimator run.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftOutcome {
    /// Last emitted transform, or the initial one if no step completed.
    pub transform: RigidTransform,
    pub sigma_squared: f64,
    pub iterations: usize,
    pub termination: Termination,
}

/// Lazy EM estimator aligning `moving` onto `fixed`.
#[derive(Debug, Clone)]
pub struct RigidDrift<'a> {
    fixed: &'a PointSet,
    moving: &'a PointSet,
    outlier_weight: f64,
    convergence_sigma_squared: f64,
    max_sigma_squared: f64,

    transform: RigidTransform,
    sigma_squared: f64,
    matched_weight: Option<f64>,
    iteration: usize,
    termination: Option<Termination>,
    failed: bool,
}

impl<'a> RigidDrift<'a> {
    /// Validate the inputs and seed the estimator.
    ///
    /// Without `initial`, the run starts from the identity transform. σ² is
    /// seeded from the summed pairwise squared distance over `D * M * N`.
    pub fn new(
        fixed: &'a PointSet,
        moving: &'a PointSet,
        settings: &DriftSettings,
        initial: Option<RigidTransform>,
    ) -> Result<Self> {
        if fixed.nrows() == 0 || moving.nrows() == 0 || fixed.ncols() == 0 {
            return Err(DriftError::InvalidArgument(format!(
                "expecting non-empty point sets, got {}x{} and {}x{}",
                fixed.nrows(),
                fixed.ncols(),
                moving.nrows(),
                moving.ncols()
            )));
        }
        if fixed.ncols() != moving.ncols() {
            return Err(DriftError::InvalidArgument(format!(
                "expecting points with matching dimensionality, got {} and {}",
                fixed.ncols(),
                moving.ncols()
            )));
        }
        let w = settings.outlier_weight;
        if !(0.0..=1.0).contains(&w) {
            return Err(DriftError::InvalidArgument(format!(
                "w must be in the range [0..1], got {w}"
            )));
        }
        if fixed.iter().chain(moving.iter()).any(|v| !v.is_finite()) {
            return Err(DriftError::InvalidArgument(
                "point coordinates must be finite".into(),
            ));
        }

        let dim = fixed.ncols();
        let transform = match initial {
            Some(t) => {
                t.check_dim(dim)?;
                t
            }
            None => RigidTransform::identity(dim),
        };

        let (n, m) = (fixed.nrows(), moving.nrows());
        let total: f64 = (0..m)
            .flat_map(|j| (0..n).map(move |i| (j, i)))
            .map(|(j, i)| (moving.row(j) - fixed.row(i)).norm_squared())
            .sum();
        let sigma_squared = total / (dim * m * n) as f64;

        Ok(Self {
            fixed,
            moving,
            outlier_weight: w,
            convergence_sigma_squared: settings.convergence_sigma_squared,
            max_sigma_squared: sigma_squared * settings.divergence_ratio,
            transform,
            sigma_squared,
            matched_weight: None,
            iteration: 0,
            termination: None,
            failed: false,
        })
    }

    /// Why the sequence ended, or `None` while it can still produce steps.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn sigma_squared(&self) -> f64 {
        self.sigma_squared
    }

    /// Sum `N_p` of all soft correspondences from the latest E-step.
    pub fn matched_weight(&self) -> Option<f64> {
        self.matched_weight
    }

    pub fn iterations(&self) -> usize {
        self.iteration
    }

    /// Current estimate (the initial guess before the first step).
    pub fn transform(&self) -> &RigidTransform {
        &self.transform
    }

    /// Pull up to `max_iterations` steps and report the final state.
    pub fn run(mut self, max_iterations: usize) -> Result<DriftOutcome> {
        for _ in 0..max_iterations {
            match self.next() {
                Some(step) => {
                    step?;
                }
                None => break,
            }
        }
        Ok(DriftOutcome {
            termination: self.termination.unwrap_or(Termination::IterationCap),
            transform: self.transform,
            sigma_squared: self.sigma_squared,
            iterations: self.iteration,
        })
    }

    fn stop(&mut self, termination: Termination) {
        debug!(
            ?termination,
            iterations = self.iteration,
            sigma_squared = self.sigma_squared,
            "rigid drift stopped"
        );
        self.termination = Some(termination);
    }

    fn check_sigma(&self) -> Option<Termination> {
        let s2 = self.sigma_squared;
        if !s2.is_finite() || s2 > self.max_sigma_squared {
            Some(Termination::Diverged)
        } else if s2 <= self.convergence_sigma_squared {
            Some(Termination::Converged)
        } else {
            None
        }
    }

    /// Soft correspondence matrix `P` (`M x N`) for the current transform and σ².
    ///
    /// Returns `None` when the mixture cannot be evaluated: the outlier term is
    /// not finite (w = 1 or σ² overflowing) or no fixed point received weight.
    fn expectation(&self) -> Result<Option<DMatrix<f64>>> {
        let dim = self.fixed.ncols() as f64;
        let (n, m) = (self.fixed.nrows(), self.moving.nrows());
        let w = self.outlier_weight;

        let outlier = (2.0 * PI * self.sigma_squared).powf(dim / 2.0) * w / (1.0 - w)
            * m as f64
            / n as f64;
        if !outlier.is_finite() {
            return Ok(None);
        }

        let transformed = self.transform.apply(self.moving)?;
        let scale = -1.0 / (2.0 * self.sigma_squared);
        let mut p = DMatrix::from_fn(m, n, |j, i| {
            (scale * (transformed.row(j) - self.fixed.row(i)).norm_squared()).exp()
        });

        for mut column in p.column_iter_mut() {
            let denominator = column.sum() + outlier;
            if denominator > 0.0 && denominator.is_finite() {
                column /= denominator;
            } else {
                column.fill(0.0);
            }
        }

        if p.sum() <= f64::MIN_POSITIVE {
            return Ok(None);
        }
        Ok(Some(p))
    }

    /// Weighted Procrustes solve. Returns the new transform and σ².
    fn maximization(&self, p: &DMatrix<f64>) -> Result<(RigidTransform, f64)> {
        let (fixed, moving) = (self.fixed, self.moving);
        let dim = fixed.ncols();

        let n_p = p.sum();
        let p1 = DVector::from_iterator(p.nrows(), p.row_iter().map(|row| row.sum()));
        let pt1 = DVector::from_iterator(p.ncols(), p.column_iter().map(|col| col.sum()));

        let mu_x = fixed.transpose() * &pt1 / n_p;
        let mu_y = moving.transpose() * &p1 / n_p;
        let x_hat = PointSet::from_fn(fixed.nrows(), dim, |i, k| fixed[(i, k)] - mu_x[k]);
        let y_hat = PointSet::from_fn(moving.nrows(), dim, |j, k| moving[(j, k)] - mu_y[k]);

        let x_spread: f64 = x_hat
            .row_iter()
            .zip(pt1.iter())
            .map(|(row, weight)| weight * row.norm_squared())
            .sum();
        let y_spread: f64 = y_hat
            .row_iter()
            .zip(p1.iter())
            .map(|(row, weight)| weight * row.norm_squared())
            .sum();
        if !(y_spread > f64::MIN_POSITIVE && y_spread.is_finite()) {
            return Err(DriftError::Computation(format!(
                "weighted spread of the moving set vanished ({y_spread})"
            )));
        }

        let a = x_hat.transpose() * p.transpose() * &y_hat;

        let svd = SVD::try_new(a.clone(), true, true, f64::EPSILON, 0).ok_or_else(|| {
            DriftError::Computation("SVD of the cross-covariance did not converge".into())
        })?;
        let tolerance = RANK_TOLERANCE * (x_spread * y_spread).sqrt();
        let rank = svd.singular_values.iter().filter(|&&v| v > tolerance).count();
        if rank + 1 < dim {
            return Err(DriftError::Computation(format!(
                "cross-covariance has rank {rank}, the {dim}-D rotation is ambiguous"
            )));
        }
        let u = svd
            .u
            .ok_or_else(|| DriftError::Computation("SVD returned no U factor".into()))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| DriftError::Computation("SVD returned no V^T factor".into()))?;

        // Flip the last axis if U * V^T is a reflection.
        let mut c = DMatrix::<f64>::identity(dim, dim);
        c[(dim - 1, dim - 1)] = (&u * &v_t).determinant().signum();
        let rotation = &u * c * &v_t;

        let explained = (a.transpose() * &rotation).trace();
        let scale = explained / y_spread;
        let translation = &mu_x - &rotation * &mu_y * scale;
        let sigma_squared = (x_spread - scale * explained) / (n_p * dim as f64);

        Ok((RigidTransform::new(rotation, translation, scale), sigma_squared))
    }
}

impl Iterator for RigidDrift<'_> {
    type Item = Result<RigidTransform>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.termination.is_some() {
            return None;
        }
        if let Some(termination) = self.check_sigma() {
            self.stop(termination);
            return None;
        }

        let p = match self.expectation() {
            Ok(Some(p)) => p,
            Ok(None) => {
                self.stop(Termination::Diverged);
                return None;
            }
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };
        let n_p = p.sum();

        match self.maximization(&p) {
            Ok((transform, sigma_squared)) => {
                self.iteration += 1;
                self.matched_weight = Some(n_p);
                self.sigma_squared = sigma_squared;
                self.transform = transform;
                trace!(
                    iteration = self.iteration,
                    sigma_squared,
                    scale = self.transform.scale,
                    n_p,
                    "rigid drift step"
                );
                Some(Ok(self.transform.clone()))
            }
            Err(e) => {
                self.failed = true;
                debug!(error = %e, iterations = self.iteration, "rigid drift failed");
                Some(Err(e))
            }
        }
    }
}
