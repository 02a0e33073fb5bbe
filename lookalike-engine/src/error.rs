use thiserror::Error;

use crate::embedding::Method;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding is empty")]
    EmptyEmbedding,

    #[error("embedding value at index {index} is not finite")]
    NonFinite { index: usize },

    #[error("invalid metric parameter: {0}")]
    InvalidMetric(String),

    #[error("catalog already contains an entry with id {0:?}")]
    DuplicateId(String),

    #[error("query has no {0} embedding")]
    MissingQuery(Method),
}

pub type Result<T> = std::result::Result<T, MatchError>;
