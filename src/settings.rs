//! Configuration types for the rigid estimator and the global search.

use std::f64::consts::FRAC_PI_4;

/// Settings for a single Coherent Point Drift run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftSettings {
    /// Weight `w` of the uniform outlier component, in \[0, 1\].
    pub outlier_weight: f64,
    /// The run is reported as converged once σ² drops to or below this value.
    pub convergence_sigma_squared: f64,
    /// The run is reported as diverged once σ² exceeds its initial value by
    /// this factor.
    pub divergence_ratio: f64,
}

impl Default for DriftSettings {
    fn default() -> Self {
        Self {
            outlier_weight: 0.5,
            convergence_sigma_squared: 1e-10,
            divergence_ratio: 1e8,
        }
    }
}

impl DriftSettings {
    pub fn with_outlier_weight(outlier_weight: f64) -> Self {
        Self {
            outlier_weight,
            ..Self::default()
        }
    }
}

/// Settings for the multi-start planar alignment search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalAlignmentSettings {
    pub drift: DriftSettings,
    /// Spacing of the initial rotation guesses over \[0, 2π).
    pub angle_step: f64,
    /// Iterations pulled from each candidate's estimator at most.
    pub max_iterations: usize,
}

impl Default for GlobalAlignmentSettings {
    fn default() -> Self {
        Self {
            drift: DriftSettings::default(),
            angle_step: FRAC_PI_4,
            max_iterations: 100,
        }
    }
}
