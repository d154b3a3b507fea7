//! # Drift - Rigid Coherent Point Drift
//!
//! `drift` estimates the similarity transform (rotation, translation, uniform
//! scale) that best aligns one point set onto another when correspondences
//! are unknown. The point counts may differ, and points may be missing,
//! duplicated or noisy.
//!
//! The estimator is the rigid variant of Coherent Point Drift (CPD). It is an
//! Expectation-Maximization procedure over a Gaussian mixture centred on the
//! transformed moving points, plus a uniform outlier component. Every M-step
//! solves a weighted orthogonal Procrustes problem through an SVD with
//! reflection correction, so each emitted rotation is proper.
//!
//! ## Quick Start
//!
//! ```rust
//! use drift::{global_alignment, rmsd, PointSet};
//!
//! let fixed = PointSet::from_row_slice(5, 2, &[
//!     0.0, 0.0, 1.0, 0.1, 0.4, 0.9, 1.3, 1.2, -0.5, 0.6,
//! ]);
//! // The same shape, shifted.
//! let moving = fixed.map(|v| v + 0.25);
//!
//! let result = global_alignment(&fixed, &moving, None).unwrap();
//! let aligned = result.transform.apply(&moving).unwrap();
//! assert!(rmsd(&fixed, &aligned).unwrap() < 1e-3);
//! ```
//!
//! ## Driving the estimator yourself
//!
//! [`RigidDrift`](estimators::RigidDrift) is an iterator. Each item is one EM
//! step, so the caller decides how many steps to pull:
//!
//! ```rust
//! use drift::{rigid_drift, PointSet};
//!
//! let fixed = PointSet::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 1.0, 2.0, 0.0, 1.0]);
//! let mut estimator = rigid_drift(&fixed, &fixed, 0.5, None).unwrap();
//! let last = estimator.by_ref().take(50).last().unwrap().unwrap();
//! println!("stopped after {} steps: {:?}", estimator.iterations(), estimator.termination());
//! println!("scale = {}", last.scale);
//! ```
//!
//! ## Modules
//!
//! - **[`api`](api)**: High-level functions for the common cases
//! - **[`core`](core)**: The [`Scoring`](core::Scoring) trait and the `GlobalAlignment` pipeline
//! - **[`estimators`](estimators)**: The rigid CPD estimator and its termination tags
//! - **[`geometry`](geometry)**: Pairwise distances, RMSD and rotation helpers
//! - **[`models`](models)**: The [`RigidTransform`](models::RigidTransform) model
//! - **[`scoring`](scoring)**: Built-in scoring strategies
//! - **[`settings`](settings)**: Configuration types
//! - **[`synthetic`](synthetic)**: Reproducible degradations for test data

pub mod api;
pub mod core;
pub mod error;
pub mod estimators;
pub mod geometry;
pub mod models;
pub mod scoring;
pub mod settings;
pub mod synthetic;
pub mod types;

#[cfg(feature = "python")]
pub mod python;

// Re-export high-level API
pub use api::{
    global_alignment, global_alignment_with_outlier_weight, register_rigid, rigid_drift,
    AlignmentResult,
};

pub use crate::core::{GlobalAlignment, Scoring};
pub use error::{DriftError, Result};
pub use estimators::{DriftOutcome, RigidDrift, Termination};
pub use geometry::{pairwise_distance_squared, rmsd};
pub use models::RigidTransform;
pub use settings::{DriftSettings, GlobalAlignmentSettings};
pub use types::PointSet;
