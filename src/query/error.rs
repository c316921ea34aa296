//! Query error types
//!
//! Errors raised by a query executor while running a logical plan.

use thiserror::Error;

/// Errors that can occur while executing a query plan
#[derive(Error, Debug)]
pub enum QueryError {
    /// The plan references an entity the executor does not know
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Query execution failed
    #[error("Execution error: {0}")]
    Execution(String),

    /// The aggregate cannot be applied to the projected values
    #[error("Invalid aggregate: {0}")]
    InvalidAggregate(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
