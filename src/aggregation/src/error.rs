//! Error types for the aggregation routines

use thiserror::Error;

/// Aggregation errors
///
/// Like the decision layer, reads degrade to empty result sets;
/// `Forbidden` only ever comes out of mutations.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Mutation rejected by the access decision engine
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Decision or audit layer failure
    #[error(transparent)]
    Authz(#[from] incentive_authz::AuthzError),

    /// Underlying store failure
    #[error(transparent)]
    Core(#[from] incentive_core::CoreError),
}

/// Result type for aggregation operations
pub type Result<T> = std::result::Result<T, AggregationError>;
