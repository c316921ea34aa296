//! # Tabula
//!
//! Declarative tabular-data engine. A grid is a collection of named, typed
//! columns over a queryable entity; each request compiles the columns'
//! filter settings, sort state and totals into one logical query.
//!
//! ## Modules
//!
//! - [`columns`]: column model
//! - [`filtering`]: per-kind filter strategies and the filter composer
//! - [`sorting`]: sort directions and orderer chains
//! - [`totals`]: aggregate dispatch and total values
//! - [`query`]: logical query plan and executors
//! - [`grid`]: request pipeline over one grid
//! - [`definition`]: TOML grid definitions
//!
//! ## Quick Start
//!
//! ```rust
//! use tabula::prelude::*;
//! use serde_json::json;
//!
//! let executor = MemoryExecutor::from_json(&json!({
//!     "orders": [
//!         { "id": 1, "freight": 10, "ship_city": "Berlin" },
//!         { "id": 2, "freight": 20, "ship_city": "Paris" },
//!         { "id": 3, "freight": 30, "ship_city": "Berlin" }
//!     ]
//! })).unwrap();
//!
//! let mut columns = ColumnCollection::new();
//! columns.add(Column::from_expression("ship_city", ValueKind::Text).filterable(true)).unwrap();
//! columns.add(Column::from_expression("freight", ValueKind::Int)).unwrap().set_sum(true);
//!
//! let mut grid = Grid::new(QueryContext::new("orders"), columns);
//! let settings = RequestFilterSettings::from_query("grid-filter=ship_city__1__Berlin");
//! let view = grid.process(settings, &executor).unwrap();
//!
//! assert_eq!(view.rows.len(), 2);
//! let sum = grid.columns().get("freight").unwrap().sum_value().unwrap();
//! assert_eq!(sum.render(Some("%.1f")).as_deref(), Some("40.0"));
//! ```

pub mod columns;
pub mod config;
pub mod definition;
pub mod error;
pub mod filtering;
pub mod grid;
pub mod query;
pub mod sorting;
pub mod totals;
pub mod types;

// Re-export top-level types for convenience
pub use columns::{Calculation, Column, ColumnCollection, RelatedCollection};
pub use config::{Config, ConfigError, GridConfig, LoggingConfig, PagingConfig, PagingType};
pub use definition::GridDefinition;
pub use error::{GridError, GridResult};
pub use filtering::{
    strategy_for, FilterComposer, FilterOperator, FilterOption, FilterSettings, FilterStrategy,
    Parsed, RequestFilterSettings,
};
pub use grid::{Grid, GridView, RenderedTotal};
pub use query::{MemoryExecutor, QueryContext, QueryError, QueryExecutor, QueryResult, Record};
pub use sorting::{OrdererChain, SortDirection, SortMode};
pub use totals::{Total, TotalsDispatcher};
pub use types::{Temporal, Value, ValueKind};

/// Everything needed to define and process a grid
pub mod prelude {
    pub use crate::columns::{Column, ColumnCollection, RelatedCollection};
    pub use crate::filtering::{FilterOperator, RequestFilterSettings};
    pub use crate::grid::Grid;
    pub use crate::query::{MemoryExecutor, QueryContext, QueryExecutor};
    pub use crate::sorting::SortDirection;
    pub use crate::totals::Total;
    pub use crate::types::{Value, ValueKind};
}
