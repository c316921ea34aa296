//! Query Executor
//!
//! The `QueryExecutor` trait is the boundary between the engine and the
//! system that actually stores rows. `MemoryExecutor` is the reference
//! implementation: named entities of JSON records, evaluated with SQL
//! semantics (nulls never compare, aggregates skip nulls).
//!
//! # Execution Pipeline
//!
//! ```text
//! QuerySpec      → Rows → Filter → Order → Records
//! AggregateQuery → Rows → Filter → Project → Aggregate → Value
//! ```

use crate::filtering::parse_value;
use crate::query::error::{QueryError, QueryResult};
use crate::query::plan::*;
use crate::sorting::SortDirection;
use crate::types::{Value, ValueKind};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A stored row
pub type Record = serde_json::Map<String, JsonValue>;

/// Runs plans against a data source
pub trait QueryExecutor {
    /// Rows matching the query, in its order
    fn fetch(&self, query: &QuerySpec) -> QueryResult<Vec<Record>>;

    /// Single scalar produced by an aggregate query; `Value::Null` over no rows
    fn scalar(&self, query: &AggregateQuery) -> QueryResult<Value>;
}

/// In-memory executor over JSON records
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    entities: HashMap<String, Vec<Record>>,
}

impl MemoryExecutor {
    /// Create an executor with no entities
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: register an entity's rows
    pub fn with_entity(mut self, entity: impl Into<String>, rows: Vec<Record>) -> Self {
        self.insert(entity, rows);
        self
    }

    /// Register (or replace) an entity's rows
    pub fn insert(&mut self, entity: impl Into<String>, rows: Vec<Record>) {
        self.entities.insert(entity.into(), rows);
    }

    /// Load from a JSON document of the form `{ "entity": [ {..}, {..} ], ... }`
    pub fn from_json(document: &JsonValue) -> QueryResult<Self> {
        let object = document.as_object().ok_or_else(|| {
            QueryError::Execution("data document must be an object of entity arrays".to_string())
        })?;

        let mut executor = Self::new();
        for (entity, rows) in object {
            let rows = rows.as_array().ok_or_else(|| {
                QueryError::Execution(format!("entity '{}' must be an array of records", entity))
            })?;

            let records = rows
                .iter()
                .map(|row| {
                    row.as_object().cloned().ok_or_else(|| {
                        QueryError::Execution(format!("entity '{}' contains a non-object row", entity))
                    })
                })
                .collect::<QueryResult<Vec<Record>>>()?;

            executor.insert(entity.clone(), records);
        }

        Ok(executor)
    }

    /// Number of rows stored for an entity
    pub fn len(&self, entity: &str) -> usize {
        self.entities.get(entity).map(Vec::len).unwrap_or(0)
    }

    fn rows(&self, entity: &str) -> QueryResult<&[Record]> {
        self.entities
            .get(entity)
            .map(Vec::as_slice)
            .ok_or_else(|| QueryError::UnknownEntity(entity.to_string()))
    }

    /// Rows of a query's entity that satisfy its predicate
    fn select(&self, query: &QuerySpec) -> QueryResult<Vec<&Record>> {
        let mut selected = Vec::new();
        for row in self.rows(&query.entity)? {
            let keep = match &query.predicate {
                Some(predicate) => self.eval(predicate, row)?,
                None => true,
            };
            if keep {
                selected.push(row);
            }
        }
        Ok(selected)
    }

    /// Evaluate a predicate against one row
    fn eval(&self, predicate: &Predicate, row: &Record) -> QueryResult<bool> {
        match predicate {
            Predicate::Compare {
                path,
                kind,
                op,
                value,
            } => {
                let stored = coerce(lookup(row, path), *kind);
                Ok(op.holds(stored.compare(value)))
            }
            Predicate::Text { path, op, pattern } => Ok(match lookup(row, path) {
                Some(JsonValue::String(s)) => op.matches(s, pattern),
                _ => false,
            }),
            Predicate::Count { count, op, value } => {
                let n = self.count(count, row)?;
                Ok(op.holds(Some(n.cmp(value))))
            }
            Predicate::And(parts) => {
                for part in parts {
                    if !self.eval(part, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Evaluate a correlated count for one outer row
    fn count(&self, count: &CorrelatedCount, outer: &Record) -> QueryResult<i64> {
        let mut n = 0;
        for inner in self.select(&count.source)? {
            let correlated = count.correlations.iter().all(|(inner_path, outer_path)| {
                match (lookup(inner, inner_path), lookup(outer, outer_path)) {
                    (Some(a), Some(b)) => !a.is_null() && json_equal(a, b),
                    _ => false,
                }
            });
            if correlated {
                n += 1;
            }
        }
        Ok(n)
    }

    fn project(&self, projection: &Projection, row: &Record) -> QueryResult<Value> {
        match projection {
            Projection::Field { path, kind } => Ok(coerce(lookup(row, path), *kind)),
            Projection::Count(count) => Ok(Value::Int(self.count(count, row)?)),
        }
    }
}

impl QueryExecutor for MemoryExecutor {
    fn fetch(&self, query: &QuerySpec) -> QueryResult<Vec<Record>> {
        let mut rows = self.select(query)?;

        rows.sort_by(|a, b| {
            for clause in &query.order {
                let ordering = compare_json(lookup(a, &clause.path), lookup(b, &clause.path));
                let ordering = match clause.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        Ok(rows.into_iter().cloned().collect())
    }

    fn scalar(&self, query: &AggregateQuery) -> QueryResult<Value> {
        let mut values = Vec::new();
        for row in self.select(&query.source)? {
            let value = self.project(&query.projection, row)?;
            if !value.is_null() {
                values.push(value);
            }
        }

        aggregate(query.function, &values)
    }
}

/// Apply an aggregate to non-null projected values
fn aggregate(function: AggregateFunction, values: &[Value]) -> QueryResult<Value> {
    if values.is_empty() && function != AggregateFunction::Count {
        return Ok(Value::Null);
    }

    match function {
        AggregateFunction::Count => Ok(Value::Int(values.len() as i64)),
        AggregateFunction::Sum | AggregateFunction::Avg => {
            let mut int_sum: Option<i64> = Some(0);
            let mut float_sum = 0.0;
            // Exact running total; `None` once it overflows or meets a non-finite float
            let mut decimal_sum = Some(Decimal::ZERO);
            let mut saw_float = false;
            let mut saw_decimal = false;

            for value in values {
                match value {
                    Value::Int(i) => {
                        int_sum = int_sum.and_then(|acc| acc.checked_add(*i));
                        float_sum += *i as f64;
                    }
                    Value::Float(x) => {
                        float_sum += x;
                        saw_float = true;
                    }
                    Value::Decimal(d) => {
                        float_sum += d.to_f64().unwrap_or(0.0);
                        saw_decimal = true;
                    }
                    other => {
                        return Err(QueryError::InvalidAggregate(format!(
                            "{} over non-numeric value {}",
                            function, other
                        )))
                    }
                }
                decimal_sum = decimal_sum
                    .zip(value.as_decimal())
                    .and_then(|(acc, d)| acc.checked_add(d));
            }

            let count = Decimal::from(values.len() as u64);
            match (function, saw_decimal, saw_float) {
                (AggregateFunction::Avg, true, _) => Ok(decimal_sum
                    .and_then(|sum| sum.checked_div(count))
                    .map(Value::Decimal)
                    .unwrap_or(Value::Float(float_sum / values.len() as f64))),
                (AggregateFunction::Avg, false, _) => Ok(Value::Float(float_sum / values.len() as f64)),
                (_, true, _) => Ok(decimal_sum.map(Value::Decimal).unwrap_or(Value::Float(float_sum))),
                (_, false, true) => Ok(Value::Float(float_sum)),
                // Integer overflow widens to an exact decimal before falling back to floats
                (_, false, false) => Ok(int_sum
                    .map(Value::Int)
                    .or_else(|| decimal_sum.map(Value::Decimal))
                    .unwrap_or(Value::Float(float_sum))),
            }
        }
        AggregateFunction::Max | AggregateFunction::Greatest => Ok(extreme(values, Ordering::Greater)),
        AggregateFunction::Min | AggregateFunction::Least => Ok(extreme(values, Ordering::Less)),
    }
}

/// The value that wins every comparison in direction `wins`
fn extreme(values: &[Value], wins: Ordering) -> Value {
    let mut best = values[0].clone();
    for value in &values[1..] {
        if value.compare(&best) == Some(wins) {
            best = value.clone();
        }
    }
    best
}

/// Follow a field path through nested objects
fn lookup<'a>(row: &'a Record, path: &FieldPath) -> Option<&'a JsonValue> {
    let mut segments = path.segments().iter();
    let mut current = row.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Read a stored JSON value as a value of `kind`; unreadable values become `Null`
fn coerce(json: Option<&JsonValue>, kind: ValueKind) -> Value {
    let Some(json) = json else {
        return Value::Null;
    };

    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => match kind {
            ValueKind::Bool => Value::Bool(*b),
            ValueKind::Text | ValueKind::Enum => Value::Text(b.to_string()),
            _ => Value::Null,
        },
        JsonValue::Number(n) => {
            if kind.is_integral() {
                match n.as_i64() {
                    Some(i) => Value::Int(i),
                    None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
                }
            } else if kind == ValueKind::Decimal {
                // From the literal digits, never through f64
                parse_value(kind, &n.to_string()).unwrap_or(Value::Null)
            } else if kind.is_numeric() {
                n.as_f64().map(Value::Float).unwrap_or(Value::Null)
            } else if matches!(kind, ValueKind::Text | ValueKind::Enum) {
                Value::Text(n.to_string())
            } else {
                Value::Null
            }
        }
        JsonValue::String(s) => parse_value(kind, s).unwrap_or(Value::Null),
        JsonValue::Array(_) | JsonValue::Object(_) => Value::Null,
    }
}

/// Equality used for correlations (nulls are handled by the caller)
fn json_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering used for sorting: missing and null first, then by JSON type
fn compare_json(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.unwrap_or(&JsonValue::Null);
    let b = b.unwrap_or(&JsonValue::Null);
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
        (JsonValue::Null, _) => Ordering::Less,
        (_, JsonValue::Null) => Ordering::Greater,
        (JsonValue::Number(x), JsonValue::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
