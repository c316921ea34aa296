//! Query Context
//!
//! Builds plan nodes against one grid's base query: path navigation,
//! comparison and text predicates, correlated counts and aggregate queries.

use crate::query::plan::*;
use crate::types::{Value, ValueKind};

/// Predicate and sub-query constructors bound to a base query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    base: QuerySpec,
}

impl QueryContext {
    /// Context over every row of an entity
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            base: QuerySpec::new(entity),
        }
    }

    /// Context over a pre-filtered base query
    pub fn with_base(base: QuerySpec) -> Self {
        Self { base }
    }

    /// The grid's base query, before any column filters
    pub fn base(&self) -> &QuerySpec {
        &self.base
    }

    pub fn entity(&self) -> &str {
        &self.base.entity
    }

    /// Navigate from the root by a dot-separated expression
    pub fn path(&self, expression: &str) -> Option<FieldPath> {
        FieldPath::parse(expression)
    }

    pub fn compare(&self, path: FieldPath, kind: ValueKind, op: Comparison, value: Value) -> Predicate {
        Predicate::Compare {
            path,
            kind,
            op,
            value,
        }
    }

    pub fn equal(&self, path: FieldPath, kind: ValueKind, value: Value) -> Predicate {
        self.compare(path, kind, Comparison::Equal, value)
    }

    pub fn not_equal(&self, path: FieldPath, kind: ValueKind, value: Value) -> Predicate {
        self.compare(path, kind, Comparison::NotEqual, value)
    }

    pub fn less_than(&self, path: FieldPath, kind: ValueKind, value: Value) -> Predicate {
        self.compare(path, kind, Comparison::LessThan, value)
    }

    pub fn less_or_equal(&self, path: FieldPath, kind: ValueKind, value: Value) -> Predicate {
        self.compare(path, kind, Comparison::LessOrEqual, value)
    }

    pub fn greater_than(&self, path: FieldPath, kind: ValueKind, value: Value) -> Predicate {
        self.compare(path, kind, Comparison::GreaterThan, value)
    }

    pub fn greater_or_equal(&self, path: FieldPath, kind: ValueKind, value: Value) -> Predicate {
        self.compare(path, kind, Comparison::GreaterOrEqual, value)
    }

    pub fn text(&self, path: FieldPath, op: TextMatch, pattern: impl Into<String>) -> Predicate {
        Predicate::Text {
            path,
            op,
            pattern: pattern.into(),
        }
    }

    /// Logical AND
    pub fn and(&self, left: Predicate, right: Predicate) -> Predicate {
        left.and(right)
    }

    /// Rows of the base query sharing the outer row's value at `path`
    pub fn count_same_value(&self, path: &FieldPath) -> CorrelatedCount {
        CorrelatedCount {
            source: self.base.clone(),
            correlations: vec![(path.clone(), path.clone())],
        }
    }

    /// Rows of `entity` related to the outer row through `(outer_key, inner_key)` pairs
    ///
    /// `None` if any key is not a valid path.
    pub fn count_related(&self, entity: &str, keys: &[(String, String)]) -> Option<CorrelatedCount> {
        let correlations = keys
            .iter()
            .map(|(outer, inner)| Some((FieldPath::parse(inner)?, FieldPath::parse(outer)?)))
            .collect::<Option<Vec<_>>>()?;

        Some(CorrelatedCount {
            source: QuerySpec::new(entity),
            correlations,
        })
    }

    /// Correlated count compared against a constant
    pub fn count_compare(&self, count: CorrelatedCount, op: Comparison, value: i64) -> Predicate {
        Predicate::Count {
            count: Box::new(count),
            op,
            value,
        }
    }

    /// A copy of the base query restricted by `predicate`
    pub fn filtered(&self, predicate: Option<&Predicate>) -> QuerySpec {
        self.base.filtered(predicate)
    }

    /// Aggregate over the single-column projection of a filtered query
    pub fn aggregate(
        &self,
        filtered: &QuerySpec,
        projection: Projection,
        function: AggregateFunction,
    ) -> AggregateQuery {
        AggregateQuery {
            source: filtered.clone(),
            projection,
            alias: TOTAL_COLUMN.to_string(),
            function,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_same_value_uses_base_query() {
        let base = QuerySpec::new("orders").filtered(Some(&Predicate::Text {
            path: FieldPath::parse("ship_country").unwrap(),
            op: TextMatch::StartsWith,
            pattern: "Ger".into(),
        }));
        let ctx = QueryContext::with_base(base);
        let path = ctx.path("ship_city").unwrap();

        let predicate = ctx.count_compare(ctx.count_same_value(&path), Comparison::GreaterThan, 1);
        assert_eq!(
            predicate.to_string(),
            "(SELECT COUNT(*) FROM orders AS sub WHERE ship_country LIKE 'Ger%' AND sub.ship_city = ship_city) > 1"
        );
    }

    #[test]
    fn test_count_related() {
        let ctx = QueryContext::new("customers");
        let keys = vec![("id".to_string(), "customer_id".to_string())];
        let count = ctx.count_related("orders", &keys).unwrap();

        assert_eq!(count.source.entity, "orders");
        assert_eq!(count.correlations.len(), 1);
        assert_eq!(count.correlations[0].0.to_string(), "customer_id");
        assert_eq!(count.correlations[0].1.to_string(), "id");

        let bad = vec![("".to_string(), "customer_id".to_string())];
        assert!(ctx.count_related("orders", &bad).is_none());
    }

    #[test]
    fn test_filtered_keeps_base_predicate() {
        let ctx = QueryContext::with_base(QuerySpec::new("orders").filtered(Some(
            &Predicate::Compare {
                path: FieldPath::parse("freight").unwrap(),
                kind: ValueKind::Double,
                op: Comparison::GreaterThan,
                value: Value::Int(0),
            },
        )));
        let extra = ctx.equal(
            ctx.path("ship_country").unwrap(),
            ValueKind::Text,
            Value::Text("France".into()),
        );

        let filtered = ctx.filtered(Some(&extra));
        assert_eq!(
            filtered.to_string(),
            "orders WHERE freight > 0 AND ship_country = 'France'"
        );
        assert_eq!(ctx.filtered(None), *ctx.base());
    }
}
