//! Core shared types.
//!
//! Point sets are plain `nalgebra` matrices with one point per row, so an
//! `N x D` matrix holds `N` points of dimension `D`. Two sets taking part in
//! one registration may differ in `N` but must agree on `D`.

use nalgebra::DMatrix;

/// Dynamic row-major view of a point set: rows are points, columns are
/// coordinates.
pub type PointSet = DMatrix<f64>;
