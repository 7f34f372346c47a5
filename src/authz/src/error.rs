//! Error types for the authorization engine

use thiserror::Error;

/// Authorization errors
///
/// Read paths never surface `Forbidden`; they degrade to empty result
/// sets. Write paths must propagate it so callers can reject loudly.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested identity or resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Mutation rejected by the access decision engine
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Underlying store failure
    #[error(transparent)]
    Core(#[from] incentive_core::CoreError),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
