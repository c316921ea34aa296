//! Grid error types
//!
//! Only configuration and programming anomalies surface here. Bad user
//! input (an unsupported operator, unparsable filter text) never becomes
//! an error; it degrades to "no constraint" inside the filter strategies.

use crate::filtering::FilterOperator;
use crate::query::QueryError;
use crate::types::ValueKind;
use thiserror::Error;

/// Errors raised by grid processing
#[derive(Error, Debug)]
pub enum GridError {
    /// An operator reached predicate construction outside the kind's legal set
    #[error("Illegal operator {operator:?} for {kind} column")]
    IllegalOperator {
        operator: FilterOperator,
        kind: ValueKind,
    },

    /// An operator ordinal or code that maps to no operator
    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),

    /// Two columns registered under the same name
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// A column name that is not part of the grid
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Invalid grid definition
    #[error("Invalid grid definition: {0}")]
    Definition(String),

    /// Query executor failure
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
}

/// Result type alias for grid operations
pub type GridResult<T> = Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridError::IllegalOperator {
            operator: FilterOperator::Contains,
            kind: ValueKind::Int,
        };
        assert_eq!(err.to_string(), "Illegal operator Contains for int column");

        let err = GridError::DuplicateColumn("freight".to_string());
        assert_eq!(err.to_string(), "Duplicate column: freight");
    }

    #[test]
    fn test_query_error_conversion() {
        let query_err = QueryError::UnknownEntity("orders".to_string());
        let grid_err: GridError = query_err.into();
        assert!(matches!(grid_err, GridError::Query(_)));
    }
}
