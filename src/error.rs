//! Error type shared by every registration routine.

pub type Result<T> = std::result::Result<T, DriftError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriftError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Dimension mismatch: expected {expected}-dimensional points, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Computation error: {0}")]
    Computation(String),
}

impl DriftError {
    /// Whether the error was raised while validating inputs, before any
    /// numeric work started.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            DriftError::InvalidArgument(_) | DriftError::DimensionMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::DriftError;

    #[test]
    fn dimension_mismatch_counts_as_invalid_argument() {
        let err = DriftError::DimensionMismatch {
            expected: 2,
            found: 3,
        };
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected 2-dimensional points, found 3"
        );
        assert!(!DriftError::Computation("svd".into()).is_invalid_argument());
    }
}
