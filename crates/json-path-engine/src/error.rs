//! Evaluation errors.

use thiserror::Error;

use crate::path::Path;

/// Broad category of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A broken invariant inside the engine.
    Internal,
    /// Malformed plan or invalid data handed in by the caller.
    Misuse,
    /// The query cannot serve the requested entry point.
    Capability,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Unexpected end of data")]
    UnexpectedEndOfData,
    #[error("Invalid data event at {actual}, expected {expected}")]
    InvalidDataEvent { expected: Path, actual: Path },
    #[error("Value not found at inner index {0}")]
    ValueNotFound(usize),
    #[error("Outer index not found for inner index {0}")]
    OuterIndexNotFound(usize),
    #[error("Value list has {values} values but {indexes} map entries")]
    ValueListMismatch { values: usize, indexes: usize },
    #[error("Literal is not a scalar: {0}")]
    NonScalarData(String),
    #[error("Unknown aggregator: {0}")]
    UnknownAggregator(String),
    #[error("Invalid regular expression {pattern}: {reason}")]
    InvalidRegExp { pattern: String, reason: String },
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
    #[error("Aggregate function {0} failed")]
    AggregateFunctionFailed(String),
    #[error("Query is not definite")]
    IndefiniteQuery,
    #[error("Query results are not addressable by path")]
    PathNotSelectable,
}

impl EngineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnexpectedEndOfData
            | Self::InvalidDataEvent { .. }
            | Self::AggregateFunctionFailed(_) => ErrorClass::Internal,
            Self::IndefiniteQuery | Self::PathNotSelectable => ErrorClass::Capability,
            Self::ValueNotFound(_)
            | Self::OuterIndexNotFound(_)
            | Self::ValueListMismatch { .. }
            | Self::NonScalarData(_)
            | Self::UnknownAggregator(_)
            | Self::InvalidRegExp { .. }
            | Self::InvalidPlan(_) => ErrorClass::Misuse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(EngineError::UnexpectedEndOfData.class(), ErrorClass::Internal);
        assert_eq!(EngineError::ValueNotFound(3).class(), ErrorClass::Misuse);
        assert_eq!(EngineError::IndefiniteQuery.class(), ErrorClass::Capability);
        assert_eq!(EngineError::PathNotSelectable.class(), ErrorClass::Capability);
    }

    #[test]
    fn test_error_messages() {
        let err = EngineError::InvalidDataEvent {
            expected: Path::root().with_property("a"),
            actual: Path::root(),
        };
        assert_eq!(err.to_string(), "Invalid data event at $, expected $['a']");
        assert_eq!(
            EngineError::UnknownAggregator("sum".into()).to_string(),
            "Unknown aggregator: sum"
        );
    }
}
