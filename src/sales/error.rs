/// Failures reported by the summary engine.
///
/// Every operation either returns a complete result or one of these; there
/// are no partial results and nothing is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("{operation} requires at least {required} observation(s), received {actual}")]
    EmptyInput {
        operation: &'static str,
        required: usize,
        actual: usize,
    },
    #[error("field '{field}' is not present in the dataset")]
    FieldNotFound { field: String },
    #[error("invalid {name} {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl StatsError {
    pub(crate) fn empty(operation: &'static str, required: usize, actual: usize) -> Self {
        Self::EmptyInput {
            operation,
            required,
            actual,
        }
    }

    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

pub type StatsResult<T> = Result<T, StatsError>;

/// Raised when records cannot form a [`Dataset`](super::Dataset).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    #[error("row {row}: expected field '{field}' to match the schema of the first record")]
    SchemaMismatch { row: usize, field: &'static str },
    #[error("row {row}: {field} must be finite and non-negative (found {value})")]
    InvalidValue {
        row: usize,
        field: &'static str,
        value: f64,
    },
}
