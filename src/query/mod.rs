//! Tabula Query Layer
//!
//! The logical query model every other subsystem compiles into:
//!
//! - **Plan**: predicates, correlated counts, ordering and aggregate queries
//! - **Context**: constructors bound to a grid's base query
//! - **Executor**: the `QueryExecutor` boundary and an in-memory implementation
//!
//! # Example
//!
//! ```rust
//! use tabula::query::{MemoryExecutor, QueryContext, QueryExecutor};
//! use tabula::types::{Value, ValueKind};
//! use serde_json::json;
//!
//! let executor = MemoryExecutor::from_json(&json!({
//!     "orders": [ { "freight": 12.5 }, { "freight": 3.0 } ]
//! })).unwrap();
//!
//! let ctx = QueryContext::new("orders");
//! let heavy = ctx.greater_than(ctx.path("freight").unwrap(), ValueKind::Double, Value::Int(10));
//! let rows = executor.fetch(&ctx.filtered(Some(&heavy))).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

mod context;
mod error;
mod executor;
mod plan;

pub use context::QueryContext;
pub use error::{QueryError, QueryResult};
pub use executor::{MemoryExecutor, QueryExecutor, Record};
pub use plan::{
    AggregateFunction, AggregateQuery, Comparison, CorrelatedCount, FieldPath, OrderClause,
    Predicate, Projection, QuerySpec, TextMatch, TOTAL_COLUMN,
};
