//! Error handling and result types for the tree variants.
//!
//! Only construction can fail from a caller's point of view. Deleting an
//! absent key is reported through the operation trace, and structural
//! damage is surfaced by the validator as [`TreeError::InvariantViolation`].

use thiserror::Error;

use crate::types::{NodeId, Variant};

/// Error type for tree construction and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The minimum degree is below what the variant supports.
    #[error("invalid minimum degree {degree} for {variant} (minimum required: {minimum})")]
    InvalidDegree {
        variant: Variant,
        degree: usize,
        minimum: usize,
    },
    /// A structural invariant does not hold.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// A node id reachable from the tree does not refer to a live arena slot.
    #[error("node {0} is referenced but not allocated")]
    NodeMissing(NodeId),
}

impl TreeError {
    /// Create an InvalidDegree error
    pub fn invalid_degree(variant: Variant, degree: usize, minimum: usize) -> Self {
        Self::InvalidDegree {
            variant,
            degree,
            minimum,
        }
    }

    /// Create an InvariantViolation error with context
    pub fn invariant(context: &str, details: &str) -> Self {
        Self::InvariantViolation(format!("{}: {}", context, details))
    }

    /// Check if this error is a configuration error
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::InvalidDegree { .. })
    }
}

/// Result type for validation and other fallible tree queries
pub type TreeResult<T> = Result<T, TreeError>;

/// Result type for tree construction
pub type InitResult<T> = Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_degree_message() {
        let err = TreeError::invalid_degree(Variant::BStarTree, 2, 3);
        assert!(err.is_configuration_error());
        assert_eq!(
            err.to_string(),
            "invalid minimum degree 2 for B*-Tree (minimum required: 3)"
        );
    }

    #[test]
    fn test_invariant_context() {
        let err = TreeError::invariant("Leaf chain", "cycle detected");
        assert!(!err.is_configuration_error());
        assert_eq!(err.to_string(), "invariant violation: Leaf chain: cycle detected");
    }
}
