//! Filter strategies, one per value kind
//!
//! Turning a filter option into a predicate takes three steps:
//!
//! ```text
//! requested operator → valid_operator → parse(raw) → build_predicate → Option<Predicate>
//! ```
//!
//! The first two never fail: illegal operators are remapped to `Equals`
//! and unparsable text becomes `Parsed::Invalid`, which drops the
//! constraint. Only an operator that reaches `build_predicate` outside the
//! legal set is an error, since that means a caller skipped validation.

use crate::columns::Column;
use crate::error::{GridError, GridResult};
use crate::filtering::datetime;
use crate::filtering::{FilterOperator, FilterOption};
use crate::query::{Comparison, Predicate, QueryContext, TextMatch};
use crate::types::{Value, ValueKind};
use rust_decimal::Decimal;
use std::str::FromStr;

use FilterOperator::{
    Contains, EndsWith, Equals, GreaterThan, GreaterThanOrEquals, IsDuplicated, IsNotDuplicated,
    LessThan, LessThanOrEquals, NotEquals, StartsWith,
};

/// Legal operators for numeric and temporal kinds
pub const ORDERED_OPERATORS: &[FilterOperator] = &[
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    IsDuplicated,
    IsNotDuplicated,
];

/// Legal operators for text
pub const TEXT_OPERATORS: &[FilterOperator] = &[
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEquals,
    GreaterThan,
    GreaterThanOrEquals,
    IsDuplicated,
    IsNotDuplicated,
    Contains,
    StartsWith,
    EndsWith,
];

/// Legal operators for booleans and enumerations
pub const EQUALITY_OPERATORS: &[FilterOperator] = &[Equals, NotEquals];

/// Result of parsing raw filter text
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Valid(Value),
    Invalid,
}

impl Parsed {
    pub fn is_valid(&self) -> bool {
        matches!(self, Parsed::Valid(_))
    }
}

impl From<Option<Value>> for Parsed {
    fn from(value: Option<Value>) -> Self {
        value.map(Parsed::Valid).unwrap_or(Parsed::Invalid)
    }
}

/// Per-kind filter rules
pub trait FilterStrategy: Send + Sync {
    /// The value kind this strategy serves
    fn kind(&self) -> ValueKind;

    /// Operators this kind accepts
    fn legal_operators(&self) -> &'static [FilterOperator];

    /// Map any requested operator to a legal one, defaulting to `Equals`
    fn valid_operator(&self, requested: FilterOperator) -> FilterOperator {
        if self.legal_operators().contains(&requested) {
            requested
        } else {
            Equals
        }
    }

    /// Parse raw filter text into this kind
    fn parse(&self, raw: &str) -> Parsed {
        parse_value(self.kind(), raw).into()
    }

    /// Build the predicate for an already validated operator
    ///
    /// `Ok(None)` when the value is invalid (outside duplicate checks) or
    /// the column has no usable expression.
    fn build_predicate(
        &self,
        ctx: &QueryContext,
        column: &Column,
        value: &Parsed,
        operator: FilterOperator,
    ) -> GridResult<Option<Predicate>> {
        let kind = self.kind();
        if !self.legal_operators().contains(&operator) {
            return Err(GridError::IllegalOperator { operator, kind });
        }

        let value = match value {
            Parsed::Valid(v) => Some(v.clone()),
            Parsed::Invalid if operator.is_duplicate_check() => None,
            Parsed::Invalid => return Ok(None),
        };

        let Some(path) = column.expression().and_then(|e| ctx.path(e)) else {
            tracing::debug!(column = %column.name(), "Column has no field path, filter ignored");
            return Ok(None);
        };

        let predicate = match (operator, value) {
            (IsDuplicated, _) => {
                ctx.count_compare(ctx.count_same_value(&path), Comparison::GreaterThan, 1)
            }
            (IsNotDuplicated, _) => {
                ctx.count_compare(ctx.count_same_value(&path), Comparison::LessOrEqual, 1)
            }
            (Equals, Some(v)) => ctx.equal(path, kind, v),
            (NotEquals, Some(v)) => ctx.not_equal(path, kind, v),
            (LessThan, Some(v)) => ctx.less_than(path, kind, v),
            (LessThanOrEquals, Some(v)) => ctx.less_or_equal(path, kind, v),
            (GreaterThan, Some(v)) => ctx.greater_than(path, kind, v),
            (GreaterThanOrEquals, Some(v)) => ctx.greater_or_equal(path, kind, v),
            (Contains, Some(Value::Text(t))) => ctx.text(path, TextMatch::Contains, t),
            (StartsWith, Some(Value::Text(t))) => ctx.text(path, TextMatch::StartsWith, t),
            (EndsWith, Some(Value::Text(t))) => ctx.text(path, TextMatch::EndsWith, t),
            _ => return Err(GridError::IllegalOperator { operator, kind }),
        };

        Ok(Some(predicate))
    }

    /// Validate, parse and build one filter option
    fn apply(
        &self,
        ctx: &QueryContext,
        column: &Column,
        option: &FilterOption,
    ) -> GridResult<Option<Predicate>> {
        let operator = self.valid_operator(option.operator);
        let parsed = self.parse(&option.value);
        if !parsed.is_valid() {
            tracing::debug!(
                column = %column.name(),
                value = %option.value,
                "Unparsable filter value"
            );
        }
        self.build_predicate(ctx, column, &parsed, operator)
    }
}

/// Numeric kinds
#[derive(Debug)]
pub struct NumericFilter {
    kind: ValueKind,
}

impl FilterStrategy for NumericFilter {
    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn legal_operators(&self) -> &'static [FilterOperator] {
        ORDERED_OPERATORS
    }
}

/// Temporal kinds
#[derive(Debug)]
pub struct TemporalFilter {
    kind: ValueKind,
}

impl FilterStrategy for TemporalFilter {
    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn legal_operators(&self) -> &'static [FilterOperator] {
        ORDERED_OPERATORS
    }
}

/// Free text
#[derive(Debug)]
pub struct TextFilter;

impl FilterStrategy for TextFilter {
    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn legal_operators(&self) -> &'static [FilterOperator] {
        TEXT_OPERATORS
    }
}

/// Booleans and enumerations
#[derive(Debug)]
pub struct EqualityFilter {
    kind: ValueKind,
}

impl FilterStrategy for EqualityFilter {
    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn legal_operators(&self) -> &'static [FilterOperator] {
        EQUALITY_OPERATORS
    }
}

static BYTE: NumericFilter = NumericFilter { kind: ValueKind::Byte };
static SHORT: NumericFilter = NumericFilter { kind: ValueKind::Short };
static INT: NumericFilter = NumericFilter { kind: ValueKind::Int };
static LONG: NumericFilter = NumericFilter { kind: ValueKind::Long };
static DECIMAL: NumericFilter = NumericFilter { kind: ValueKind::Decimal };
static FLOAT: NumericFilter = NumericFilter { kind: ValueKind::Float };
static DOUBLE: NumericFilter = NumericFilter { kind: ValueKind::Double };
static DATE: TemporalFilter = TemporalFilter { kind: ValueKind::Date };
static TIME: TemporalFilter = TemporalFilter { kind: ValueKind::Time };
static TIMESTAMP: TemporalFilter = TemporalFilter { kind: ValueKind::Timestamp };
static INSTANT: TemporalFilter = TemporalFilter { kind: ValueKind::Instant };
static OFFSET_TIME: TemporalFilter = TemporalFilter { kind: ValueKind::OffsetTime };
static OFFSET_DATE_TIME: TemporalFilter = TemporalFilter { kind: ValueKind::OffsetDateTime };
static ZONED_DATE_TIME: TemporalFilter = TemporalFilter { kind: ValueKind::ZonedDateTime };
static CALENDAR: TemporalFilter = TemporalFilter { kind: ValueKind::Calendar };
static TEXT: TextFilter = TextFilter;
static BOOL: EqualityFilter = EqualityFilter { kind: ValueKind::Bool };
static ENUM: EqualityFilter = EqualityFilter { kind: ValueKind::Enum };

/// The strategy registered for a value kind
///
/// Related-collection counts have no field to compare and get no strategy.
pub fn strategy_for(kind: ValueKind) -> Option<&'static dyn FilterStrategy> {
    let strategy: &'static dyn FilterStrategy = match kind {
        ValueKind::Byte => &BYTE,
        ValueKind::Short => &SHORT,
        ValueKind::Int => &INT,
        ValueKind::Long => &LONG,
        ValueKind::Decimal => &DECIMAL,
        ValueKind::Float => &FLOAT,
        ValueKind::Double => &DOUBLE,
        ValueKind::Date => &DATE,
        ValueKind::Time => &TIME,
        ValueKind::Timestamp => &TIMESTAMP,
        ValueKind::Instant => &INSTANT,
        ValueKind::OffsetTime => &OFFSET_TIME,
        ValueKind::OffsetDateTime => &OFFSET_DATE_TIME,
        ValueKind::ZonedDateTime => &ZONED_DATE_TIME,
        ValueKind::Calendar => &CALENDAR,
        ValueKind::Text => &TEXT,
        ValueKind::Bool => &BOOL,
        ValueKind::Enum => &ENUM,
        ValueKind::RelatedCount => return None,
    };
    Some(strategy)
}

/// Parse raw text as a value of `kind`
///
/// Shared by the filter strategies and by executors reading stored text.
pub fn parse_value(kind: ValueKind, raw: &str) -> Option<Value> {
    let s = raw.trim();
    match kind {
        ValueKind::Byte => s.parse::<i8>().ok().map(|v| Value::Int(v as i64)),
        ValueKind::Short => s.parse::<i16>().ok().map(|v| Value::Int(v as i64)),
        ValueKind::Int => s.parse::<i32>().ok().map(|v| Value::Int(v as i64)),
        ValueKind::Long | ValueKind::RelatedCount => s.parse::<i64>().ok().map(Value::Int),
        ValueKind::Decimal => parse_decimal(s).map(Value::Decimal),
        ValueKind::Double => s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Value::Float),
        ValueKind::Float => s
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .and_then(|_| s.parse::<f64>().ok())
            .map(Value::Float),
        ValueKind::Date => datetime::parse_date(s).map(Value::Date),
        ValueKind::Time => datetime::parse_time(s).map(Value::Time),
        ValueKind::Timestamp => datetime::parse_local_datetime(s).map(Value::DateTime),
        ValueKind::Instant => datetime::parse_instant(s).map(Value::Zoned),
        ValueKind::OffsetTime => datetime::parse_offset_time(s).map(Value::Time),
        ValueKind::OffsetDateTime => datetime::parse_offset_datetime(s).map(Value::Zoned),
        ValueKind::ZonedDateTime => datetime::parse_zoned_datetime(s).map(Value::Zoned),
        ValueKind::Calendar => datetime::parse_calendar(s).map(Value::Zoned),
        ValueKind::Text => Some(Value::Text(raw.to_string())),
        ValueKind::Bool => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        ValueKind::Enum => (!s.is_empty()).then(|| Value::Text(s.to_string())),
    }
}

/// Plain (`12.50`) or scientific (`1.5e3`) decimal text
fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
