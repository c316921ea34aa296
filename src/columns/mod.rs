//! Tabula Column Model
//!
//! Per-column configuration (expression, value kind, filter, sort and
//! totals settings) and the insertion-ordered collection a grid owns.

mod collection;
mod column;

pub use collection::ColumnCollection;
pub use column::{Calculation, Column, RelatedCollection};
