//! Estimators for point set registration.
//!
//! - Rigid Coherent Point Drift (rotation, translation, uniform scale)

pub mod rigid_drift;

pub use rigid_drift::{DriftOutcome, RigidDrift, Termination};
