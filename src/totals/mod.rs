//! Tabula Totals
//!
//! - **Total**: a computed aggregate with pattern-based rendering
//! - **Dispatcher**: runs sum/average/max/min per column according to its
//!   value kind, then evaluates user calculations

mod dispatcher;
mod format;
mod total;

pub use dispatcher::{TotalsDispatcher, TotalsHook, COUNT_SUFFIX};
pub use total::Total;
