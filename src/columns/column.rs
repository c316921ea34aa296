//! A single grid column
//!
//! The expression and value kind are fixed by the builder methods before a
//! column joins a collection. Filter, sort and totals flags and computed
//! totals are per-request state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::columns::ColumnCollection;
use crate::filtering::{FilterOperator, FilterOption};
use crate::sorting::{OrdererChain, SortDirection, SortMode, ThenBy};
use crate::totals::Total;
use crate::types::{Value, ValueKind};

/// Pure function over the whole column set, evaluated after totals
pub type Calculation = Arc<dyn Fn(&ColumnCollection) -> Value + Send + Sync>;

/// To-many relation counted by a related-count column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedCollection {
    /// Entity holding the related rows
    pub entity: String,
    /// `(outer_key, inner_key)` pairs matching a root row to its related rows
    pub keys: Vec<(String, String)>,
}

impl RelatedCollection {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            keys: Vec::new(),
        }
    }

    pub fn key(mut self, outer: impl Into<String>, inner: impl Into<String>) -> Self {
        self.keys.push((outer.into(), inner.into()));
        self
    }
}

#[derive(Clone)]
struct NamedCalculation {
    name: String,
    function: Calculation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TotalFlags {
    sum: bool,
    average: bool,
    max: bool,
    min: bool,
    calculation: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct TotalValues {
    sum: Option<Total>,
    average: Option<Total>,
    max: Option<Total>,
    min: Option<Total>,
    calculations: Vec<(String, Total)>,
}

/// One named, typed column of a grid
#[derive(Clone)]
pub struct Column {
    name: String,
    title: Option<String>,
    expression: Option<String>,
    kind: ValueKind,
    hidden: bool,
    format: Option<String>,
    related: Option<RelatedCollection>,

    filter_enabled: bool,
    initial_filter: Option<FilterOption>,

    sort_enabled: bool,
    sort_defined: bool,
    sort_mode: SortMode,
    direction: Option<SortDirection>,
    initial_direction: Option<SortDirection>,
    orderers: OrdererChain,

    flags: TotalFlags,
    values: TotalValues,
    calculations: Vec<NamedCalculation>,
}

impl Column {
    /// Synthetic column with no expression until one is set
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            title: None,
            expression: None,
            kind,
            hidden: false,
            format: None,
            related: None,
            filter_enabled: false,
            initial_filter: None,
            sort_enabled: false,
            sort_defined: false,
            sort_mode: SortMode::default(),
            direction: None,
            initial_direction: None,
            orderers: OrdererChain::default(),
            flags: TotalFlags::default(),
            values: TotalValues::default(),
            calculations: Vec::new(),
        }
    }

    /// Column named after its expression
    pub fn from_expression(expression: impl Into<String>, kind: ValueKind) -> Self {
        let expression = expression.into();
        Self::new(expression.clone(), kind).with_expression(expression)
    }

    /// Builder method: set the field-access expression
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        let expression = expression.into();
        self.orderers.set_primary(Some(expression.clone()));
        self.expression = Some(expression);
        self
    }

    /// Builder method: set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method: set the totals format pattern
    pub fn with_format(mut self, pattern: impl Into<String>) -> Self {
        self.format = Some(pattern.into());
        self
    }

    /// Builder method: describe the relation a related-count column counts
    pub fn with_related(mut self, related: RelatedCollection) -> Self {
        self.related = Some(related);
        self
    }

    /// Builder method: set the filter that applies while the column is in initial state
    pub fn with_initial_filter(mut self, operator: FilterOperator, value: impl Into<String>) -> Self {
        self.set_initial_filter(operator, value);
        self
    }

    /// Builder method: enable or disable filtering
    pub fn filterable(mut self, enabled: bool) -> Self {
        self.enable_filter(enabled);
        self
    }

    /// Builder method: enable or disable sorting with the default mode
    pub fn sortable(mut self, enabled: bool) -> Self {
        self.enable_sort(enabled, SortMode::default());
        self
    }

    /// Builder method: hide from rendering
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Builder method: register an ascending tie-breaker
    pub fn then_sort_by(mut self, expression: impl Into<String>) -> Self {
        self.orderers.push(ThenBy::new(expression, SortDirection::Ascending));
        self
    }

    /// Builder method: register a descending tie-breaker
    pub fn then_sort_by_descending(mut self, expression: impl Into<String>) -> Self {
        self.orderers.push(ThenBy::new(expression, SortDirection::Descending));
        self
    }

    /// Builder method: sort direction the grid starts with
    pub fn sort_initial_direction(mut self, direction: SortDirection) -> Self {
        self.initial_direction = Some(direction);
        self
    }

    /// Builder method: register a named calculation
    pub fn calculation(
        mut self,
        name: impl Into<String>,
        function: impl Fn(&ColumnCollection) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.add_calculation(name, Arc::new(function));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display title, defaulting to the name
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn related(&self) -> Option<&RelatedCollection> {
        self.related.as_ref()
    }

    // Filtering

    /// Turn filtering on or off; returns whether it is now on
    ///
    /// Refused without an expression.
    pub fn enable_filter(&mut self, enabled: bool) -> bool {
        if enabled && self.expression.is_none() {
            tracing::debug!(column = %self.name, "Filtering needs an expression");
            self.filter_enabled = false;
        } else {
            self.filter_enabled = enabled;
        }
        self.filter_enabled
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }

    pub fn set_initial_filter(&mut self, operator: FilterOperator, value: impl Into<String>) {
        self.initial_filter = Some(FilterOption::new(self.name.clone(), operator, value));
    }

    pub fn initial_filter(&self) -> Option<&FilterOption> {
        self.initial_filter.as_ref()
    }

    // Sorting

    /// Turn sorting on or off; returns whether it is now on
    ///
    /// Refused without an expression. Marks sorting as explicitly defined.
    pub fn enable_sort(&mut self, enabled: bool, mode: SortMode) -> bool {
        self.sort_defined = true;
        self.sort_mode = mode;
        if enabled && self.expression.is_none() {
            tracing::debug!(column = %self.name, "Sorting needs an expression");
            self.sort_enabled = false;
        } else {
            self.sort_enabled = enabled;
        }
        self.sort_enabled
    }

    /// Apply a grid-wide default unless the column defined sorting itself
    pub fn internal_sortable(&mut self, enabled: bool, mode: SortMode) -> bool {
        if !self.sort_defined {
            self.enable_sort(enabled, mode);
            self.sort_defined = false;
        }
        self.sort_enabled
    }

    pub fn sort_enabled(&self) -> bool {
        self.sort_enabled
    }

    pub fn sort_defined(&self) -> bool {
        self.sort_defined
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    /// Live sort direction; `None` when unsorted
    pub fn direction(&self) -> Option<SortDirection> {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Option<SortDirection>) {
        self.direction = direction;
    }

    pub fn is_sorted(&self) -> bool {
        self.direction.is_some()
    }

    pub fn initial_direction(&self) -> Option<SortDirection> {
        self.initial_direction
    }

    pub fn orderers(&self) -> &OrdererChain {
        &self.orderers
    }

    // Totals

    pub fn set_sum(&mut self, enabled: bool) {
        self.flags.sum = enabled;
    }

    pub fn set_average(&mut self, enabled: bool) {
        self.flags.average = enabled;
    }

    pub fn set_max(&mut self, enabled: bool) {
        self.flags.max = enabled;
    }

    pub fn set_min(&mut self, enabled: bool) {
        self.flags.min = enabled;
    }

    pub fn sum_enabled(&self) -> bool {
        self.flags.sum
    }

    pub fn average_enabled(&self) -> bool {
        self.flags.average
    }

    pub fn max_enabled(&self) -> bool {
        self.flags.max
    }

    pub fn min_enabled(&self) -> bool {
        self.flags.min
    }

    pub fn calculation_enabled(&self) -> bool {
        self.flags.calculation
    }

    /// Whether any aggregate or calculation is requested
    pub fn has_totals(&self) -> bool {
        let f = self.flags;
        f.sum || f.average || f.max || f.min || f.calculation
    }

    /// Force the four aggregate flags off
    pub fn disable_aggregates(&mut self) {
        self.flags.sum = false;
        self.flags.average = false;
        self.flags.max = false;
        self.flags.min = false;
    }

    pub fn add_calculation(&mut self, name: impl Into<String>, function: Calculation) {
        self.calculations.push(NamedCalculation {
            name: name.into(),
            function,
        });
        self.flags.calculation = true;
    }

    /// Registered calculations in registration order
    pub fn calculations(&self) -> impl Iterator<Item = (&str, &Calculation)> {
        self.calculations.iter().map(|c| (c.name.as_str(), &c.function))
    }

    pub fn sum_value(&self) -> Option<&Total> {
        self.values.sum.as_ref()
    }

    pub fn average_value(&self) -> Option<&Total> {
        self.values.average.as_ref()
    }

    pub fn max_value(&self) -> Option<&Total> {
        self.values.max.as_ref()
    }

    pub fn min_value(&self) -> Option<&Total> {
        self.values.min.as_ref()
    }

    /// Calculation results of the last totals run, in registration order
    pub fn calculation_values(&self) -> &[(String, Total)] {
        &self.values.calculations
    }

    pub fn calculation_value(&self, name: &str) -> Option<&Total> {
        self.values
            .calculations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub(crate) fn set_sum_value(&mut self, total: Total) {
        self.values.sum = Some(total);
    }

    pub(crate) fn set_average_value(&mut self, total: Total) {
        self.values.average = Some(total);
    }

    pub(crate) fn set_max_value(&mut self, total: Total) {
        self.values.max = Some(total);
    }

    pub(crate) fn set_min_value(&mut self, total: Total) {
        self.values.min = Some(total);
    }

    pub(crate) fn push_calculation_value(&mut self, name: String, total: Total) {
        self.values.calculations.push((name, total));
    }

    /// Drop totals computed by a previous request
    pub fn clear_totals(&mut self) {
        self.values = TotalValues::default();
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let calculations: Vec<&str> = self.calculations.iter().map(|c| c.name.as_str()).collect();
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("expression", &self.expression)
            .field("kind", &self.kind)
            .field("filter_enabled", &self.filter_enabled)
            .field("sort_enabled", &self.sort_enabled)
            .field("direction", &self.direction)
            .field("flags", &self.flags)
            .field("values", &self.values)
            .field("calculations", &calculations)
            .finish()
    }
}
