//! Logical Query Plan
//!
//! The plan model the engine compiles column settings into. It is a
//! deliberately small relational shape: one root entity, one optional
//! predicate, ordering clauses, correlated counting sub-queries and a
//! single-column aggregate over a filtered projection.
//!
//! Every node renders to SQL-like text through `Display`, which is what the
//! engine logs and what tests assert query shapes against.
//!
//! ```text
//! orders WHERE freight > 10 AND (SELECT COUNT(*) FROM orders AS sub WHERE sub.ship_city = ship_city) > 1
//! SELECT SUM(total_column) FROM (SELECT freight AS total_column FROM orders WHERE ...) AS totals
//! ```

use crate::sorting::SortDirection;
use crate::types::{Value, ValueKind};

/// Alias given to the single projected column of an aggregate sub-query
pub const TOTAL_COLUMN: &str = "total_column";

/// A dot-separated field access path from a row (`customer.company_name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse a dot-separated expression; `None` for blank expressions or empty segments
    pub fn parse(expression: &str) -> Option<Self> {
        let expression = expression.trim();
        if expression.is_empty() {
            return None;
        }

        let segments: Vec<String> = expression
            .split('.')
            .map(|s| s.trim().to_string())
            .collect();

        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        Some(Self(segments))
    }

    /// Path segments, root first
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment of the path
    pub fn leaf(&self) -> &str {
        // Construction guarantees at least one segment
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// The path without its last segment, if any remains
    pub fn parent(&self) -> Option<FieldPath> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Binary comparison primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl Comparison {
    /// Evaluate against an ordering; `None` (unordered) is always false
    pub fn holds(&self, ordering: Option<std::cmp::Ordering>) -> bool {
        use std::cmp::Ordering::*;
        match (self, ordering) {
            (_, None) => false,
            (Self::Equal, Some(o)) => o == Equal,
            (Self::NotEqual, Some(o)) => o != Equal,
            (Self::LessThan, Some(o)) => o == Less,
            (Self::LessOrEqual, Some(o)) => o != Greater,
            (Self::GreaterThan, Some(o)) => o == Greater,
            (Self::GreaterOrEqual, Some(o)) => o != Less,
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "<>"),
            Self::LessThan => write!(f, "<"),
            Self::LessOrEqual => write!(f, "<="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterOrEqual => write!(f, ">="),
        }
    }
}

/// Text matching primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Contains,
    StartsWith,
    EndsWith,
}

impl TextMatch {
    pub fn matches(&self, haystack: &str, needle: &str) -> bool {
        match self {
            Self::Contains => haystack.contains(needle),
            Self::StartsWith => haystack.starts_with(needle),
            Self::EndsWith => haystack.ends_with(needle),
        }
    }

    fn like_pattern(&self, needle: &str) -> String {
        let escaped = needle.replace('\'', "''");
        match self {
            Self::Contains => format!("'%{}%'", escaped),
            Self::StartsWith => format!("'{}%'", escaped),
            Self::EndsWith => format!("'%{}'", escaped),
        }
    }
}

/// Correlated sub-query counting inner rows that match the outer row
///
/// Each correlation pair `(inner, outer)` requires `sub.inner = outer`.
/// Serves both duplicate detection (inner and outer are the same field of
/// the same entity) and related-collection counts (key pairs across two
/// entities).
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedCount {
    /// Rows counted by the sub-query
    pub source: QuerySpec,
    /// `(inner path, outer path)` equality pairs
    pub correlations: Vec<(FieldPath, FieldPath)>,
}

impl std::fmt::Display for CorrelatedCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(SELECT COUNT(*) FROM {} AS sub WHERE ", self.source.entity)?;
        let mut first = true;
        if let Some(predicate) = &self.source.predicate {
            write!(f, "{}", predicate)?;
            first = false;
        }
        for (inner, outer) in &self.correlations {
            if !first {
                write!(f, " AND ")?;
            }
            write!(f, "sub.{} = {}", inner, outer)?;
            first = false;
        }
        write!(f, ")")
    }
}

/// A boolean condition over one row
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `path op value`, with the stored field read as `kind`
    Compare {
        path: FieldPath,
        kind: ValueKind,
        op: Comparison,
        value: Value,
    },
    /// Substring, prefix or suffix test on a text field
    Text {
        path: FieldPath,
        op: TextMatch,
        pattern: String,
    },
    /// Correlated count compared against a constant
    Count {
        count: Box<CorrelatedCount>,
        op: Comparison,
        value: i64,
    },
    /// Logical conjunction
    And(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction of two predicates, flattening nested `And`s
    pub fn and(self, other: Predicate) -> Predicate {
        let mut parts = match self {
            Predicate::And(parts) => parts,
            single => vec![single],
        };
        match other {
            Predicate::And(more) => parts.extend(more),
            single => parts.push(single),
        }
        Predicate::And(parts)
    }

    /// Conjunction of two optional predicates
    pub fn and_opt(left: Option<Predicate>, right: Option<Predicate>) -> Option<Predicate> {
        match (left, right) {
            (Some(l), Some(r)) => Some(l.and(r)),
            (l, r) => l.or(r),
        }
    }

    /// Conjunction of any number of predicates; `None` if there are none
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        predicates
            .into_iter()
            .fold(None, |acc, p| Predicate::and_opt(acc, Some(p)))
    }

    /// The conjuncts of this predicate (itself unless it is an `And`)
    pub fn conjuncts(&self) -> Vec<&Predicate> {
        match self {
            Predicate::And(parts) => parts.iter().flat_map(|p| p.conjuncts()).collect(),
            single => vec![single],
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Compare { path, op, value, .. } => write!(f, "{} {} {}", path, op, value),
            Predicate::Text { path, op, pattern } => {
                write!(f, "{} LIKE {}", path, op.like_pattern(pattern))
            }
            Predicate::Count { count, op, value } => write!(f, "{} {} {}", count, op, value),
            Predicate::And(parts) => {
                let rendered: Vec<String> = parts
                    .iter()
                    .map(|p| match p {
                        Predicate::And(_) => format!("({})", p),
                        _ => p.to_string(),
                    })
                    .collect();
                write!(f, "{}", rendered.join(" AND "))
            }
        }
    }
}

/// One ordering clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub path: FieldPath,
    pub direction: SortDirection,
}

impl OrderClause {
    pub fn new(path: FieldPath, direction: SortDirection) -> Self {
        Self { path, direction }
    }
}

impl std::fmt::Display for OrderClause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{} ASC", self.path),
            SortDirection::Descending => write!(f, "{} DESC", self.path),
        }
    }
}

/// A query over one root entity
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Root entity (table or collection name)
    pub entity: String,
    /// Optional row filter
    pub predicate: Option<Predicate>,
    /// Ordering clauses, primary first
    pub order: Vec<OrderClause>,
}

impl QuerySpec {
    /// Unfiltered, unordered query over an entity
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            predicate: None,
            order: Vec::new(),
        }
    }

    /// A copy of this query with `predicate` AND-ed onto its own
    pub fn filtered(&self, predicate: Option<&Predicate>) -> Self {
        let mut copy = self.clone();
        copy.predicate = Predicate::and_opt(copy.predicate.take(), predicate.cloned());
        copy
    }

    /// A copy of this query with the given ordering
    pub fn ordered(&self, order: Vec<OrderClause>) -> Self {
        let mut copy = self.clone();
        copy.order = order;
        copy
    }
}

impl std::fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.entity)?;
        if let Some(predicate) = &self.predicate {
            write!(f, " WHERE {}", predicate)?;
        }
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(|o| o.to_string()).collect();
            write!(f, " ORDER BY {}", order.join(", "))?;
        }
        Ok(())
    }
}

/// The single value projected by an aggregate sub-query
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// A field of the root row, read as `kind`
    Field { path: FieldPath, kind: ValueKind },
    /// A correlated count per root row
    Count(CorrelatedCount),
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Projection::Field { path, .. } => write!(f, "{}", path),
            Projection::Count(count) => write!(f, "{}", count),
        }
    }
}

/// Aggregate constructors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Avg,
    Max,
    Min,
    /// Comparison maximum for non-numeric values
    Greatest,
    /// Comparison minimum for non-numeric values
    Least,
    Count,
}

impl std::fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sum => write!(f, "SUM"),
            Self::Avg => write!(f, "AVG"),
            Self::Max => write!(f, "MAX"),
            Self::Min => write!(f, "MIN"),
            Self::Greatest => write!(f, "GREATEST"),
            Self::Least => write!(f, "LEAST"),
            Self::Count => write!(f, "COUNT"),
        }
    }
}

/// `SELECT fn(total_column) FROM (SELECT projection AS total_column FROM source)`
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    /// Copy of the filtered grid query
    pub source: QuerySpec,
    /// The one projected column
    pub projection: Projection,
    /// Alias of the projected column
    pub alias: String,
    /// Outer aggregate
    pub function: AggregateFunction,
}

impl std::fmt::Display for AggregateQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SELECT {}({}) FROM (SELECT {} AS {} FROM {}",
            self.function, self.alias, self.projection, self.alias, self.source.entity
        )?;
        if let Some(predicate) = &self.source.predicate {
            write!(f, " WHERE {}", predicate)?;
        }
        write!(f, ") AS totals")
    }
}
