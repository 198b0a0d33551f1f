use super::dimension::Dimension;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("Cannot {operation} quantities with dimensions {left} and {right}")]
    Dimensionality {
        operation: &'static str,
        left: Dimension,
        right: Dimension,
    },

    #[error("Inconsistent units in collection: expected {expected}, found {found} at position {index}")]
    InconsistentUnits {
        expected: Dimension,
        found: Dimension,
        index: usize,
    },

    #[error("Unknown unit symbol '{0}'")]
    UnknownUnit(String),

    #[error("Invalid unit expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Invalid numeric value '{0}'")]
    InvalidNumber(String),

    #[error("Shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Expected a dimensionless quantity, found {0}")]
    NotDimensionless(Dimension),

    #[error("Dimension exponent out of range: {dimension} {operation}")]
    ExponentOverflow { dimension: Dimension, operation: String },

    #[error("Cannot take root {root} of a quantity with dimension {dimension}")]
    OddExponent { dimension: Dimension, root: i8 },

    #[error("Cannot stack an empty collection of quantities")]
    EmptyCollection,
}

impl UnitError {
    pub(crate) fn dimensionality(operation: &'static str, left: Dimension, right: Dimension) -> Self {
        Self::Dimensionality {
            operation,
            left,
            right,
        }
    }
}
