//! Tabula Filtering
//!
//! - **Operator**: the filter operators and their stable ordinal codes
//! - **Strategy**: one strategy per value kind validating, parsing and
//!   building predicates
//! - **Composer**: ANDs every column's predicate into one
//! - **Settings**: where requested options come from

mod composer;
pub mod datetime;
mod operator;
mod settings;
mod strategy;

pub use composer::{ComposeHook, FilterComposer};
pub use operator::FilterOperator;
pub use settings::{
    FilterOption, FilterSettings, RequestFilterSettings, CLEAR_INIT_FILTER_KEY, FILTER_KEY,
};
pub use strategy::{
    parse_value, strategy_for, FilterStrategy, Parsed, EQUALITY_OPERATORS, ORDERED_OPERATORS,
    TEXT_OPERATORS,
};
