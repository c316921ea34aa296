//! Totals dispatch
//!
//! Every aggregate runs over the same filtered query as the visible rows:
//!
//! ```text
//! SELECT <fn>(total_column) FROM (SELECT <expr> AS total_column FROM <entity> WHERE <filter>) AS totals
//! ```
//!
//! Which aggregates a column may have depends on its value kind family.
//! Unsupported flags are switched off so the column reports what was
//! actually computed.

use std::sync::Arc;

use crate::columns::{Calculation, Column, ColumnCollection};
use crate::config::PagingConfig;
use crate::error::GridResult;
use crate::query::{AggregateFunction, Predicate, Projection, QueryContext, QueryExecutor, QuerySpec};
use crate::totals::Total;
use crate::types::{KindFamily, Value};

/// Suffix a related-count expression must end with
pub const COUNT_SUFFIX: &str = ".count";

/// Replaces the whole totals pass with a caller-supplied routine
pub type TotalsHook = Arc<dyn Fn(Option<&Predicate>, &mut ColumnCollection) + Send + Sync>;

/// Computes column totals and calculations
#[derive(Clone, Default)]
pub struct TotalsDispatcher {
    paging: PagingConfig,
    hook: Option<TotalsHook>,
}

impl TotalsDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paging(mut self, paging: PagingConfig) -> Self {
        self.paging = paging;
        self
    }

    pub fn with_hook(mut self, hook: TotalsHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Compute totals for every column under `predicate`
    ///
    /// Previous totals are cleared first, even when the pass is skipped or
    /// replaced by the hook. Executor failures propagate.
    pub fn process(
        &self,
        ctx: &QueryContext,
        predicate: Option<&Predicate>,
        columns: &mut ColumnCollection,
        executor: &dyn QueryExecutor,
    ) -> GridResult<()> {
        columns.clear_totals();

        if self.paging.skips_totals() {
            tracing::debug!("Virtualized paging without totals, skipping totals");
            return Ok(());
        }

        if let Some(hook) = &self.hook {
            hook(predicate, columns);
            return Ok(());
        }

        let filtered = ctx.filtered(predicate);
        for column in columns.iter_mut() {
            aggregate_column(ctx, &filtered, column, executor)?;
        }

        calculate(columns);
        Ok(())
    }
}

impl std::fmt::Debug for TotalsDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotalsDispatcher")
            .field("paging", &self.paging)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

fn aggregate_column(
    ctx: &QueryContext,
    filtered: &QuerySpec,
    column: &mut Column,
    executor: &dyn QueryExecutor,
) -> GridResult<()> {
    let Some(expression) = column.expression().map(str::to_string) else {
        column.disable_aggregates();
        return Ok(());
    };

    let kind = column.kind();
    match kind.family() {
        KindFamily::Numeric => {
            let Some(path) = ctx.path(&expression) else {
                column.disable_aggregates();
                return Ok(());
            };
            numeric_totals(ctx, filtered, column, Projection::Field { path, kind }, executor)
        }
        KindFamily::Temporal | KindFamily::Text => {
            column.set_sum(false);
            column.set_average(false);
            let Some(path) = ctx.path(&expression) else {
                column.disable_aggregates();
                return Ok(());
            };
            let projection = Projection::Field { path, kind };

            if column.max_enabled() {
                let total = run(ctx, filtered, &projection, AggregateFunction::Greatest, executor)?;
                column.set_max_value(total);
            }
            if column.min_enabled() {
                let total = run(ctx, filtered, &projection, AggregateFunction::Least, executor)?;
                column.set_min_value(total);
            }
            Ok(())
        }
        KindFamily::RelatedCount => {
            let count = expression
                .ends_with(COUNT_SUFFIX)
                .then(|| column.related())
                .flatten()
                .and_then(|related| ctx.count_related(&related.entity, &related.keys));

            match count {
                Some(count) => {
                    numeric_totals(ctx, filtered, column, Projection::Count(count), executor)
                }
                None => {
                    if column.has_totals() {
                        tracing::warn!(
                            column = %column.name(),
                            expression = %expression,
                            "Related count needs a '.count' expression and a related collection"
                        );
                    }
                    column.disable_aggregates();
                    Ok(())
                }
            }
        }
        KindFamily::Boolean | KindFamily::Enumeration => {
            column.disable_aggregates();
            Ok(())
        }
    }
}

fn numeric_totals(
    ctx: &QueryContext,
    filtered: &QuerySpec,
    column: &mut Column,
    projection: Projection,
    executor: &dyn QueryExecutor,
) -> GridResult<()> {
    if column.sum_enabled() {
        let total = run(ctx, filtered, &projection, AggregateFunction::Sum, executor)?;
        column.set_sum_value(total);
    }
    if column.average_enabled() {
        let total = run(ctx, filtered, &projection, AggregateFunction::Avg, executor)?;
        column.set_average_value(total);
    }
    if column.max_enabled() {
        let total = run(ctx, filtered, &projection, AggregateFunction::Max, executor)?;
        column.set_max_value(total);
    }
    if column.min_enabled() {
        let total = run(ctx, filtered, &projection, AggregateFunction::Min, executor)?;
        column.set_min_value(total);
    }
    Ok(())
}

fn run(
    ctx: &QueryContext,
    filtered: &QuerySpec,
    projection: &Projection,
    function: AggregateFunction,
    executor: &dyn QueryExecutor,
) -> GridResult<Total> {
    let query = ctx.aggregate(filtered, projection.clone(), function);
    let value = executor.scalar(&query)?;
    tracing::debug!(query = %query, result = %value, "Totals query");

    Ok(match value {
        Value::Null => Total::Absent,
        other => Total::from_value(other).unwrap_or(Total::Absent),
    })
}

/// Evaluate calculations in column order, storing each result before the
/// next runs so later calculations can read earlier ones
fn calculate(columns: &mut ColumnCollection) {
    let names: Vec<String> = columns.names().map(str::to_string).collect();

    for name in names {
        let calculations: Vec<(String, Calculation)> = match columns.get(&name) {
            Some(column) => column
                .calculations()
                .map(|(calculation, function)| (calculation.to_string(), Arc::clone(function)))
                .collect(),
            None => continue,
        };

        for (calculation, function) in calculations {
            let value = function(&*columns);
            match (Total::from_value(value), columns.get_mut(&name)) {
                (Some(total), Some(column)) => column.push_calculation_value(calculation, total),
                _ => tracing::debug!(column = %name, calculation = %calculation, "Calculation result dropped"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::RelatedCollection;
    use crate::config::PagingType;
    use crate::query::{Comparison, MemoryExecutor};
    use crate::types::{Temporal, ValueKind};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn executor() -> MemoryExecutor {
        MemoryExecutor::from_json(&json!({
            "orders": [
                { "id": 1, "freight": 10, "ship_city": "Berlin", "shipped": "2024-01-05", "express": true },
                { "id": 2, "freight": 20, "ship_city": "Paris", "shipped": "2024-03-01", "express": false },
                { "id": 3, "freight": 30, "ship_city": "Amsterdam", "shipped": "2023-12-24", "express": true },
                { "id": 4, "freight": 500, "ship_city": null, "shipped": null, "express": false }
            ],
            "order_details": [
                { "order_id": 1 },
                { "order_id": 1 },
                { "order_id": 3 }
            ]
        }))
        .unwrap()
    }

    /// Restrict to the first three orders
    fn cheap_orders(ctx: &QueryContext) -> Predicate {
        ctx.compare(
            ctx.path("freight").unwrap(),
            ValueKind::Int,
            Comparison::LessThan,
            Value::Int(100),
        )
    }

    fn single(column: Column) -> ColumnCollection {
        let mut columns = ColumnCollection::new();
        columns.add(column).unwrap();
        columns
    }

    #[test]
    fn test_numeric_sum_respects_filter() {
        let ctx = QueryContext::new("orders");
        let mut freight = Column::from_expression("freight", ValueKind::Int);
        freight.set_sum(true);
        freight.set_average(true);
        freight.set_max(true);
        let mut columns = single(freight);

        TotalsDispatcher::new()
            .process(&ctx, Some(&cheap_orders(&ctx)), &mut columns, &executor())
            .unwrap();

        let freight = columns.get("freight").unwrap();
        assert_eq!(freight.sum_value(), Some(&Total::Number(Decimal::from(60))));
        assert_eq!(freight.average_value(), Some(&Total::Number(Decimal::from(20))));
        assert_eq!(freight.max_value(), Some(&Total::Number(Decimal::from(30))));
        assert_eq!(freight.min_value(), None);
    }

    #[test]
    fn test_text_max_and_disabled_sum() {
        let ctx = QueryContext::new("orders");
        let mut city = Column::from_expression("ship_city", ValueKind::Text);
        city.set_sum(true);
        city.set_average(true);
        city.set_max(true);
        city.set_min(true);
        let mut columns = single(city);

        TotalsDispatcher::new()
            .process(&ctx, None, &mut columns, &executor())
            .unwrap();

        let city = columns.get("ship_city").unwrap();
        assert!(!city.sum_enabled());
        assert!(!city.average_enabled());
        assert_eq!(city.sum_value(), None);
        assert_eq!(city.max_value(), Some(&Total::Text("Paris".into())));
        assert_eq!(city.min_value(), Some(&Total::Text("Amsterdam".into())));
    }

    #[test]
    fn test_temporal_max() {
        let ctx = QueryContext::new("orders");
        let mut shipped = Column::from_expression("shipped", ValueKind::Date);
        shipped.set_max(true);
        let mut columns = single(shipped);

        TotalsDispatcher::new()
            .process(&ctx, None, &mut columns, &executor())
            .unwrap();

        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            columns.get("shipped").unwrap().max_value(),
            Some(&Total::Temporal(Temporal::Date(expected)))
        );
    }

    #[test]
    fn test_unsupported_kind_keeps_flags_off() {
        let ctx = QueryContext::new("orders");
        let mut express = Column::from_expression("express", ValueKind::Bool);
        express.set_sum(true);
        express.set_max(true);
        let mut synthetic = Column::new("Synthetic", ValueKind::Int);
        synthetic.set_sum(true);

        let mut columns = ColumnCollection::new();
        columns.add(express).unwrap();
        columns.add(synthetic).unwrap();

        TotalsDispatcher::new()
            .process(&ctx, None, &mut columns, &executor())
            .unwrap();

        for column in columns.iter() {
            assert!(!column.sum_enabled(), "{}", column.name());
            assert!(!column.max_enabled(), "{}", column.name());
            assert_eq!(column.sum_value(), None);
            assert_eq!(column.max_value(), None);
        }
    }

    #[test]
    fn test_related_count_sum() {
        let ctx = QueryContext::new("orders");
        let mut lines = Column::new("Lines", ValueKind::RelatedCount)
            .with_expression("order_details.count")
            .with_related(RelatedCollection::new("order_details").key("id", "order_id"));
        lines.set_sum(true);
        lines.set_max(true);
        let mut columns = single(lines);

        TotalsDispatcher::new()
            .process(&ctx, None, &mut columns, &executor())
            .unwrap();

        let lines = columns.get("Lines").unwrap();
        assert_eq!(lines.sum_value(), Some(&Total::Number(Decimal::from(3))));
        assert_eq!(lines.max_value(), Some(&Total::Number(Decimal::from(2))));
    }

    #[test]
    fn test_related_count_needs_count_suffix() {
        let ctx = QueryContext::new("orders");
        let mut lines = Column::new("Lines", ValueKind::RelatedCount)
            .with_expression("order_details")
            .with_related(RelatedCollection::new("order_details").key("id", "order_id"));
        lines.set_sum(true);
        let mut columns = single(lines);

        TotalsDispatcher::new()
            .process(&ctx, None, &mut columns, &executor())
            .unwrap();

        let lines = columns.get("Lines").unwrap();
        assert!(!lines.sum_enabled());
        assert_eq!(lines.sum_value(), None);
    }

    #[test]
    fn test_empty_filter_result_is_absent() {
        let ctx = QueryContext::new("orders");
        let mut freight = Column::from_expression("freight", ValueKind::Int);
        freight.set_sum(true);
        let mut columns = single(freight);
        let none = ctx.compare(
            ctx.path("freight").unwrap(),
            ValueKind::Int,
            Comparison::GreaterThan,
            Value::Int(10_000),
        );

        TotalsDispatcher::new()
            .process(&ctx, Some(&none), &mut columns, &executor())
            .unwrap();

        assert_eq!(columns.get("freight").unwrap().sum_value(), Some(&Total::Absent));
    }

    #[test]
    fn test_calculations_see_aggregates() {
        let ctx = QueryContext::new("orders");
        let mut freight = Column::from_expression("freight", ValueKind::Int);
        freight.set_sum(true);

        let share = Column::new("Share", ValueKind::Double)
            .calculation("half", |columns| {
                let sum = columns
                    .get("freight")
                    .and_then(|c| c.sum_value())
                    .and_then(|t| t.as_f64())
                    .unwrap_or(0.0);
                Value::Float(sum / 2.0)
            })
            .calculation("label", |_| Value::Text("freight".into()))
            .calculation("flag", |_| Value::Bool(true));

        let mut columns = ColumnCollection::new();
        columns.add(freight).unwrap();
        columns.add(share).unwrap();

        TotalsDispatcher::new()
            .process(&ctx, Some(&cheap_orders(&ctx)), &mut columns, &executor())
            .unwrap();

        let share = columns.get("Share").unwrap();
        assert_eq!(share.calculation_value("half"), Some(&Total::Number(Decimal::from(30))));
        assert_eq!(share.calculation_value("label"), Some(&Total::Text("freight".into())));
        assert_eq!(share.calculation_value("flag"), None);
        assert_eq!(share.calculation_values().len(), 2);
    }

    #[test]
    fn test_calculations_read_earlier_results() {
        let ctx = QueryContext::new("orders");
        let base = Column::new("Base", ValueKind::Int).calculation("x", |_| Value::Int(5));
        let derived = Column::new("Derived", ValueKind::Int)
            .calculation("y", |columns| {
                match columns.get("Base").and_then(|c| c.calculation_value("x")) {
                    Some(Total::Number(x)) => Value::Decimal(*x * Decimal::from(2)),
                    _ => Value::Null,
                }
            })
            .calculation("z", |columns| {
                match columns.get("Derived").and_then(|c| c.calculation_value("y")) {
                    Some(Total::Number(y)) => Value::Decimal(*y + Decimal::ONE),
                    _ => Value::Null,
                }
            });

        let mut columns = ColumnCollection::new();
        columns.add(base).unwrap();
        columns.add(derived).unwrap();

        TotalsDispatcher::new()
            .process(&ctx, None, &mut columns, &executor())
            .unwrap();

        let derived = columns.get("Derived").unwrap();
        assert_eq!(derived.calculation_value("y"), Some(&Total::Number(Decimal::from(10))));
        assert_eq!(derived.calculation_value("z"), Some(&Total::Number(Decimal::from(11))));
    }

    #[test]
    fn test_decimal_sum_is_exact() {
        let ctx = QueryContext::new("payments");
        let executor = MemoryExecutor::from_json(&json!({
            "payments": [
                { "amount": "0.1", "units": 9007199254740993i64 },
                { "amount": "0.2", "units": 0 }
            ]
        }))
        .unwrap();

        let mut amount = Column::from_expression("amount", ValueKind::Decimal);
        amount.set_sum(true);
        let mut units = Column::from_expression("units", ValueKind::Long);
        units.set_sum(true);
        let mut columns = ColumnCollection::new();
        columns.add(amount).unwrap();
        columns.add(units).unwrap();

        TotalsDispatcher::new()
            .process(&ctx, None, &mut columns, &executor)
            .unwrap();

        let amount = columns.get("amount").unwrap().sum_value().unwrap();
        assert_eq!(amount.render(None).as_deref(), Some("0.3"));
        let units = columns.get("units").unwrap().sum_value().unwrap();
        assert_eq!(units.render(None).as_deref(), Some("9007199254740993"));
        assert_eq!(units.render(Some("%d")).as_deref(), Some("9007199254740993"));
    }

    #[test]
    fn test_virtualized_paging_skips_totals() {
        let ctx = QueryContext::new("orders");
        let mut freight = Column::from_expression("freight", ValueKind::Int);
        freight.set_sum(true);
        let mut columns = single(freight);

        let paging = PagingConfig {
            kind: PagingType::Virtualization,
            no_totals: true,
        };
        TotalsDispatcher::new()
            .with_paging(paging)
            .process(&ctx, None, &mut columns, &executor())
            .unwrap();

        let freight = columns.get("freight").unwrap();
        assert!(freight.sum_enabled());
        assert_eq!(freight.sum_value(), None);
    }

    #[test]
    fn test_hook_replaces_dispatch() {
        let ctx = QueryContext::new("orders");
        let mut freight = Column::from_expression("freight", ValueKind::Int);
        freight.set_sum(true);
        let mut columns = single(freight);

        let hook: TotalsHook = Arc::new(|_: Option<&Predicate>, columns: &mut ColumnCollection| {
            if let Some(c) = columns.get_mut("freight") {
                c.set_sum(false);
            }
        });
        TotalsDispatcher::new()
            .with_hook(hook)
            .process(&ctx, None, &mut columns, &executor())
            .unwrap();

        assert!(!columns.get("freight").unwrap().sum_enabled());
    }

    #[test]
    fn test_hook_starts_from_cleared_totals() {
        let ctx = QueryContext::new("orders");
        let mut freight = Column::from_expression("freight", ValueKind::Int);
        freight.set_sum(true);
        let mut columns = single(freight);

        TotalsDispatcher::new()
            .process(&ctx, None, &mut columns, &executor())
            .unwrap();
        assert_eq!(
            columns.get("freight").unwrap().sum_value(),
            Some(&Total::Number(Decimal::from(560)))
        );

        let hook: TotalsHook = Arc::new(|_: Option<&Predicate>, _: &mut ColumnCollection| {});
        TotalsDispatcher::new()
            .with_hook(hook)
            .process(&ctx, None, &mut columns, &executor())
            .unwrap();
        assert_eq!(columns.get("freight").unwrap().sum_value(), None);
    }

    #[test]
    fn test_executor_error_propagates() {
        let ctx = QueryContext::new("missing");
        let mut freight = Column::from_expression("freight", ValueKind::Int);
        freight.set_sum(true);
        let mut columns = single(freight);

        let result = TotalsDispatcher::new().process(&ctx, None, &mut columns, &executor());
        assert!(result.is_err());
    }
}
