//! Synthetic test data: degrade a reference point set into a plausible
//! "observed" set by dropping points, applying a similarity transform,
//! duplicating points and adding Gaussian noise.
//!
//! Degradations are reproducible: [`generate_degradation`] draws everything
//! from a `StdRng` seeded by the caller.

use nalgebra::{DMatrix, DVector};
use rand::distributions::Uniform;
use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::error::{DriftError, Result};
use crate::geometry::{rigid_xform, rotation_matrix_2d, rotation_matrix_3d};
use crate::types::PointSet;

/// Rotation part of a degradation.
#[derive(Debug, Clone, PartialEq)]
pub enum Rotation {
    Planar { angle: f64 },
    Spatial { angle: f64, axis: [f64; 3] },
}

impl Rotation {
    pub fn matrix(&self) -> Result<DMatrix<f64>> {
        match self {
            Rotation::Planar { angle } => Ok(rotation_matrix_2d(*angle)),
            Rotation::Spatial { angle, axis } => rotation_matrix_3d(*angle, axis),
        }
    }
}

/// Everything needed to turn a reference set into a degraded one.
#[derive(Debug, Clone, PartialEq)]
pub struct Degradation {
    pub rotation: Rotation,
    pub translation: DVector<f64>,
    pub scale: f64,
    /// Reference rows removed before anything else happens.
    pub drop: Vec<usize>,
    /// Copies of each remaining row (0 removes it as well).
    pub duplications: Vec<usize>,
    /// Added to the duplicated rows; shape `sum(duplications) x D`.
    pub noise: PointSet,
}

/// Ranges for [`generate_degradation`].
#[derive(Debug, Clone, PartialEq)]
pub struct DegradationSettings {
    pub dim: usize,
    /// Number of points in the reference set.
    pub points: usize,
    /// Number of points to drop.
    pub drop: usize,
    /// Inclusive range of copies per remaining point.
    pub duplicate: (usize, usize),
    pub rotate: (f64, f64),
    pub translate: (f64, f64),
    pub scale: (f64, f64),
    /// Standard deviation of the additive noise.
    pub noise: f64,
}

impl Default for DegradationSettings {
    fn default() -> Self {
        Self {
            dim: 2,
            points: 10,
            drop: 0,
            duplicate: (1, 1),
            rotate: (-std::f64::consts::PI, std::f64::consts::PI),
            translate: (-1.0, 1.0),
            scale: (0.5, 1.5),
            noise: 0.01,
        }
    }
}

/// Apply `degradation` to `reference`.
pub fn degrade(reference: &PointSet, degradation: &Degradation) -> Result<PointSet> {
    let dim = reference.ncols();
    if let Some(&bad) = degradation.drop.iter().find(|&&i| i >= reference.nrows()) {
        return Err(DriftError::InvalidArgument(format!(
            "cannot drop point {bad} of a {}-point set",
            reference.nrows()
        )));
    }

    let kept: Vec<usize> = (0..reference.nrows())
        .filter(|i| !degradation.drop.contains(i))
        .collect();
    if degradation.duplications.len() != kept.len() {
        return Err(DriftError::InvalidArgument(format!(
            "{} duplication counts given for {} remaining points",
            degradation.duplications.len(),
            kept.len()
        )));
    }
    let total: usize = degradation.duplications.iter().sum();
    if degradation.noise.shape() != (total, dim) {
        return Err(DriftError::InvalidArgument(format!(
            "noise must be {total}x{dim}, got {}x{}",
            degradation.noise.nrows(),
            degradation.noise.ncols()
        )));
    }

    let points = reference.select_rows(kept.iter());
    let moved = rigid_xform(
        &points,
        &degradation.rotation.matrix()?,
        &degradation.translation,
        degradation.scale,
    )?;

    let repeated: Vec<usize> = degradation
        .duplications
        .iter()
        .enumerate()
        .flat_map(|(i, &n)| std::iter::repeat(i).take(n))
        .collect();
    Ok(moved.select_rows(repeated.iter()) + &degradation.noise)
}

/// Draw a random degradation from `settings`, reproducibly for a given `seed`.
pub fn generate_degradation(settings: &DegradationSettings, seed: u64) -> Result<Degradation> {
    let DegradationSettings {
        dim,
        points,
        drop,
        duplicate,
        rotate,
        translate,
        scale,
        noise,
    } = *settings;

    if drop > points {
        return Err(DriftError::InvalidArgument(format!(
            "cannot drop {drop} of {points} points"
        )));
    }
    if duplicate.0 > duplicate.1 || rotate.0 > rotate.1 || translate.0 > translate.1 || scale.0 > scale.1
    {
        return Err(DriftError::InvalidArgument(
            "degradation ranges must be ordered (low, high)".into(),
        ));
    }
    if !(noise >= 0.0 && noise.is_finite()) {
        return Err(DriftError::InvalidArgument(format!(
            "noise must be a non-negative standard deviation, got {noise}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let rotation = match dim {
        2 => Rotation::Planar {
            angle: rng.gen_range(rotate.0..=rotate.1),
        },
        3 => {
            let angle = rng.gen_range(rotate.0..=rotate.1);
            let unit = Uniform::new(0.0, 1.0);
            let mut axis = [rng.sample(unit), rng.sample(unit), rng.sample(unit)];
            let norm = axis.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm <= f64::EPSILON {
                axis = [0.0, 0.0, 1.0];
            } else {
                axis.iter_mut().for_each(|v| *v /= norm);
            }
            Rotation::Spatial { angle, axis }
        }
        _ => {
            return Err(DriftError::NotImplemented(format!(
                "degradations are only implemented for D = 2 or 3, got D = {dim}"
            )))
        }
    };

    let translation = DVector::from_fn(dim, |_, _| rng.gen_range(translate.0..=translate.1));
    let scale = rng.gen_range(scale.0..=scale.1);
    let drop = rand::seq::index::sample(&mut rng, points, drop).into_vec();
    let duplications: Vec<usize> = (0..points - drop.len())
        .map(|_| rng.gen_range(duplicate.0..=duplicate.1))
        .collect();
    let total: usize = duplications.iter().sum();
    let noise = PointSet::from_fn(total, dim, |_, _| {
        noise * rng.sample::<f64, _>(StandardNormal)
    });

    Ok(Degradation {
        rotation,
        translation,
        scale,
        drop,
        duplications,
        noise,
    })
}
