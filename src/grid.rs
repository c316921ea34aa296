//! Grid facade
//!
//! Owns one grid's columns and query context and runs a request through
//! filtering, totals, ordering and row fetching.

use serde::Serialize;

use crate::columns::{Column, ColumnCollection};
use crate::config::PagingConfig;
use crate::error::GridResult;
use crate::filtering::{ComposeHook, FilterComposer, FilterSettings};
use crate::query::{OrderClause, Predicate, QueryContext, QueryExecutor, Record};
use crate::sorting::SortDirection;
use crate::totals::{Total, TotalsDispatcher, TotalsHook};

/// Result of processing one request
#[derive(Debug, Clone)]
pub struct GridView {
    /// Combined filter, `None` when unfiltered
    pub predicate: Option<Predicate>,
    /// Ordering clauses, primary first
    pub order: Vec<OrderClause>,
    pub rows: Vec<Record>,
}

/// One rendered total, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedTotal {
    pub column: String,
    pub label: String,
    pub text: String,
}

/// A grid over one root entity
#[derive(Debug, Clone)]
pub struct Grid {
    ctx: QueryContext,
    columns: ColumnCollection,
    totals: TotalsDispatcher,
    default_format: Option<String>,
    compose_hook: Option<HookSlot>,
}

#[derive(Clone)]
struct HookSlot(ComposeHook);

impl std::fmt::Debug for HookSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ComposeHook")
    }
}

impl Grid {
    pub fn new(ctx: QueryContext, columns: ColumnCollection) -> Self {
        Self {
            ctx,
            columns,
            totals: TotalsDispatcher::new(),
            default_format: None,
            compose_hook: None,
        }
    }

    /// Builder method: paging settings, which decide whether totals run
    pub fn with_paging(mut self, paging: PagingConfig) -> Self {
        self.totals = self.totals.with_paging(paging);
        self
    }

    /// Builder method: totals pattern for columns without their own
    pub fn with_default_format(mut self, pattern: Option<String>) -> Self {
        self.default_format = pattern;
        self
    }

    pub fn with_compose_hook(mut self, hook: ComposeHook) -> Self {
        self.compose_hook = Some(HookSlot(hook));
        self
    }

    pub fn with_totals_hook(mut self, hook: TotalsHook) -> Self {
        self.totals = self.totals.with_hook(hook);
        self
    }

    pub fn context(&self) -> &QueryContext {
        &self.ctx
    }

    pub fn columns(&self) -> &ColumnCollection {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut ColumnCollection {
        &mut self.columns
    }

    /// Sort by one column; `None` clears sorting
    pub fn sort_by(&mut self, column: &str, direction: Option<SortDirection>) -> GridResult<()> {
        self.columns.sort_by(column, direction)
    }

    /// Ordering clauses from the sorted column's orderer chain
    pub fn order(&self) -> Vec<OrderClause> {
        match self.columns.sorted_column() {
            Some(column) => match column.direction() {
                Some(direction) => column.orderers().apply(&self.ctx, direction),
                None => Vec::new(),
            },
            None => Vec::new(),
        }
    }

    /// Run one request: filter, totals, order, fetch
    pub fn process<S: FilterSettings>(
        &mut self,
        settings: S,
        executor: &dyn QueryExecutor,
    ) -> GridResult<GridView> {
        let mut composer = FilterComposer::new(settings);
        if let Some(HookSlot(hook)) = &self.compose_hook {
            composer = composer.with_hook(hook.clone());
        }

        let predicate = composer.compose(&self.ctx, &self.columns, None)?;
        self.totals
            .process(&self.ctx, predicate.as_ref(), &mut self.columns, executor)?;

        let order = self.order();
        let query = self.ctx.filtered(predicate.as_ref()).ordered(order.clone());
        let rows = executor.fetch(&query)?;

        tracing::info!(
            entity = %self.ctx.entity(),
            rows = rows.len(),
            filtered = predicate.is_some(),
            "Grid processed"
        );

        Ok(GridView {
            predicate,
            order,
            rows,
        })
    }

    /// Pattern used to render a column's totals
    pub fn format_for<'a>(&'a self, column: &'a Column) -> Option<&'a str> {
        column.format().or(self.default_format.as_deref())
    }

    /// Every computed total rendered with its column's pattern
    pub fn rendered_totals(&self) -> Vec<RenderedTotal> {
        let mut rendered = Vec::new();
        for column in self.columns.iter() {
            let pattern = self.format_for(column);
            let aggregates = [
                ("sum", column.sum_value()),
                ("average", column.average_value()),
                ("max", column.max_value()),
                ("min", column.min_value()),
            ];

            let named = column
                .calculation_values()
                .iter()
                .map(|(name, total)| (name.as_str(), Some(total)));

            for (label, total) in aggregates.into_iter().chain(named) {
                if let Some(text) = total.and_then(|t: &Total| t.render(pattern)) {
                    rendered.push(RenderedTotal {
                        column: column.name().to_string(),
                        label: label.to_string(),
                        text,
                    });
                }
            }
        }
        rendered
    }
}
