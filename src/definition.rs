//! Grid definitions
//!
//! A grid described in TOML:
//!
//! ```toml
//! entity = "orders"
//!
//! [[columns]]
//! name = "Freight"
//! expression = "freight"
//! kind = "double"
//! filterable = true
//! sortable = true
//! initial_direction = "desc"
//! sum = true
//! format = "%.2f"
//! then_by = [{ expression = "id" }]
//!
//! [[columns]]
//! name = "Lines"
//! expression = "order_details.count"
//! kind = "related_count"
//! sum = true
//! related = { entity = "order_details", keys = [["id", "order_id"]] }
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::columns::{Column, ColumnCollection, RelatedCollection};
use crate::config::Config;
use crate::error::{GridError, GridResult};
use crate::filtering::FilterOperator;
use crate::grid::Grid;
use crate::query::QueryContext;
use crate::sorting::{SortDirection, SortMode};
use crate::types::ValueKind;

/// A whole grid
#[derive(Debug, Clone, Deserialize)]
pub struct GridDefinition {
    /// Root entity the grid lists
    pub entity: String,

    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
}

/// One column of a grid definition
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDefinition {
    /// Defaults to the expression
    pub name: Option<String>,
    pub title: Option<String>,
    pub expression: Option<String>,
    pub kind: ValueKind,

    /// `None` takes the grid-wide default
    pub filterable: Option<bool>,
    pub initial_filter: Option<InitialFilterDefinition>,

    /// `None` takes the grid-wide default
    pub sortable: Option<bool>,
    pub sort_mode: Option<SortMode>,
    pub initial_direction: Option<SortDirection>,
    #[serde(default)]
    pub then_by: Vec<ThenByDefinition>,

    #[serde(default)]
    pub sum: bool,
    #[serde(default)]
    pub average: bool,
    #[serde(default)]
    pub max: bool,
    #[serde(default)]
    pub min: bool,
    pub format: Option<String>,

    pub related: Option<RelatedCollection>,

    #[serde(default)]
    pub hidden: bool,
}

/// Filter applied while a column is in its initial state
#[derive(Debug, Clone, Deserialize)]
pub struct InitialFilterDefinition {
    /// Operator name (`greater_than`) or legacy code (`5`)
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThenByDefinition {
    pub expression: String,
    pub direction: Option<SortDirection>,
}

impl GridDefinition {
    pub fn from_toml(content: &str) -> GridResult<Self> {
        toml::from_str(content).map_err(|e| GridError::Definition(e.to_string()))
    }

    pub fn load(path: &Path) -> GridResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GridError::Definition(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Build a grid, filling unset column options from `config`
    pub fn build(&self, config: &Config) -> GridResult<Grid> {
        if self.entity.trim().is_empty() {
            return Err(GridError::Definition("entity must not be empty".to_string()));
        }

        let mut columns = ColumnCollection::new();
        for definition in &self.columns {
            columns.add(definition.build(config)?)?;
        }

        tracing::debug!(entity = %self.entity, columns = columns.len(), "Grid definition built");

        Ok(Grid::new(QueryContext::new(self.entity.clone()), columns)
            .with_paging(config.paging.clone())
            .with_default_format(config.grid.default_format.clone()))
    }
}

impl ColumnDefinition {
    fn build(&self, config: &Config) -> GridResult<Column> {
        let name = self
            .name
            .as_ref()
            .or(self.expression.as_ref())
            .ok_or_else(|| GridError::Definition("column needs a name or an expression".to_string()))?;

        let mut column = Column::new(name.clone(), self.kind).hidden(self.hidden);
        if let Some(expression) = &self.expression {
            column = column.with_expression(expression.clone());
        }
        if let Some(title) = &self.title {
            column = column.with_title(title.clone());
        }
        if let Some(format) = &self.format {
            column = column.with_format(format.clone());
        }
        if let Some(related) = &self.related {
            column = column.with_related(related.clone());
        }
        if let Some(filter) = &self.initial_filter {
            let operator: FilterOperator = filter.operator.parse()?;
            column = column.with_initial_filter(operator, filter.value.clone());
        }
        if let Some(direction) = self.initial_direction {
            column = column.sort_initial_direction(direction);
        }
        for then_by in &self.then_by {
            column = match then_by.direction {
                Some(SortDirection::Descending) => column.then_sort_by_descending(then_by.expression.clone()),
                _ => column.then_sort_by(then_by.expression.clone()),
            };
        }

        column.enable_filter(self.filterable.unwrap_or(config.grid.filterable));

        let mode = self.sort_mode.unwrap_or(config.grid.sort_mode);
        match self.sortable {
            Some(sortable) => column.enable_sort(sortable, mode),
            None => column.internal_sortable(config.grid.sortable, mode),
        };

        column.set_sum(self.sum);
        column.set_average(self.average);
        column.set_max(self.max);
        column.set_min(self.min);

        Ok(column)
    }
}
