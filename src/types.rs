//! Core value types shared by every layer of the engine
//!
//! - `ValueKind`: the closed semantic category of a column's values
//! - `Value`: a dynamically typed scalar flowing through query plans
//! - `Temporal`: the temporal payload of a computed total

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Semantic category of a column's values
///
/// Fixed when a column is defined; drives which filter operators and
/// which aggregates are legal for that column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// 8-bit signed integer
    Byte,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// Exact decimal
    Decimal,
    /// Single precision float
    Float,
    /// Double precision float
    Double,
    /// Calendar date without time
    Date,
    /// Wall-clock time without date
    Time,
    /// Local date and time
    Timestamp,
    /// Point on the UTC time line
    Instant,
    /// Time of day with a UTC offset
    OffsetTime,
    /// Date and time with a UTC offset
    OffsetDateTime,
    /// Date and time in a named zone
    ZonedDateTime,
    /// Legacy calendar value (date and time with offset)
    Calendar,
    /// Free text
    Text,
    /// Boolean flag
    Bool,
    /// Named enumeration constant
    Enum,
    /// Count of related rows over a to-many relation (`orders.count`)
    RelatedCount,
}

/// Coarse grouping of value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFamily {
    Numeric,
    Temporal,
    Text,
    Boolean,
    Enumeration,
    RelatedCount,
}

impl ValueKind {
    /// Every value kind, for iteration
    pub fn all() -> &'static [ValueKind] {
        &[
            ValueKind::Byte,
            ValueKind::Short,
            ValueKind::Int,
            ValueKind::Long,
            ValueKind::Decimal,
            ValueKind::Float,
            ValueKind::Double,
            ValueKind::Date,
            ValueKind::Time,
            ValueKind::Timestamp,
            ValueKind::Instant,
            ValueKind::OffsetTime,
            ValueKind::OffsetDateTime,
            ValueKind::ZonedDateTime,
            ValueKind::Calendar,
            ValueKind::Text,
            ValueKind::Bool,
            ValueKind::Enum,
            ValueKind::RelatedCount,
        ]
    }

    /// The family this kind belongs to
    pub fn family(&self) -> KindFamily {
        match self {
            Self::Byte
            | Self::Short
            | Self::Int
            | Self::Long
            | Self::Decimal
            | Self::Float
            | Self::Double => KindFamily::Numeric,
            Self::Date
            | Self::Time
            | Self::Timestamp
            | Self::Instant
            | Self::OffsetTime
            | Self::OffsetDateTime
            | Self::ZonedDateTime
            | Self::Calendar => KindFamily::Temporal,
            Self::Text => KindFamily::Text,
            Self::Bool => KindFamily::Boolean,
            Self::Enum => KindFamily::Enumeration,
            Self::RelatedCount => KindFamily::RelatedCount,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.family() == KindFamily::Numeric
    }

    pub fn is_temporal(&self) -> bool {
        self.family() == KindFamily::Temporal
    }

    /// Whether stored values of this kind are whole numbers
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Int | Self::Long | Self::RelatedCount
        )
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Double => "double",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::Instant => "instant",
            Self::OffsetTime => "offset_time",
            Self::OffsetDateTime => "offset_date_time",
            Self::ZonedDateTime => "zoned_date_time",
            Self::Calendar => "calendar",
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Enum => "enum",
            Self::RelatedCount => "related_count",
        };
        write!(f, "{}", name)
    }
}

/// A dynamically typed scalar
///
/// Comparison follows SQL semantics: `Null` never equals or orders against
/// anything, the numeric variants compare numerically (exactly whenever a
/// `Decimal` is involved), and other mixed variants are unordered.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of this value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Exact numeric view; `None` for non-numeric and non-finite values
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Float(f) => Decimal::try_from(*f).ok(),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Text view of this value, if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Temporal view of this value, if it is temporal
    pub fn as_temporal(&self) -> Option<Temporal> {
        match self {
            Value::Date(d) => Some(Temporal::Date(*d)),
            Value::Time(t) => Some(Temporal::Time(*t)),
            Value::DateTime(dt) => Some(Temporal::DateTime(*dt)),
            Value::Zoned(z) => Some(Temporal::Zoned(*z)),
            _ => None,
        }
    }

    /// Three-valued comparison; `None` when the values are unordered
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Decimal(_), Value::Int(_) | Value::Float(_) | Value::Decimal(_))
            | (Value::Int(_) | Value::Float(_), Value::Decimal(_)) => {
                Some(self.as_decimal()?.cmp(&other.as_decimal()?))
            }
            (Value::Int(_), Value::Float(_))
            | (Value::Float(_), Value::Int(_))
            | (Value::Float(_), Value::Float(_)) => self.as_f64()?.partial_cmp(&other.as_f64()?),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Zoned(a), Value::Zoned(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// SQL equality: false whenever either side is null
    pub fn sql_eq(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Date(d) => write!(f, "DATE '{}'", d),
            Value::Time(t) => write!(f, "TIME '{}'", t),
            Value::DateTime(dt) => write!(f, "TIMESTAMP '{}'", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Zoned(z) => write!(f, "TIMESTAMP '{}'", z.to_rfc3339()),
        }
    }
}

/// Temporal payload of a computed total, kept at its native precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Temporal {
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl Temporal {
    /// Format with a strftime pattern; `None` if the pattern cannot be applied
    pub fn format(&self, pattern: &str) -> Option<String> {
        use chrono::format::{Item, StrftimeItems};
        use std::fmt::Write;

        let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return None;
        }

        let mut out = String::new();
        let written = match self {
            Temporal::Date(d) => write!(out, "{}", d.format_with_items(items.into_iter())),
            Temporal::Time(t) => write!(out, "{}", t.format_with_items(items.into_iter())),
            Temporal::DateTime(dt) => write!(out, "{}", dt.format_with_items(items.into_iter())),
            Temporal::Zoned(z) => write!(out, "{}", z.format_with_items(items.into_iter())),
        };
        written.ok().map(|_| out)
    }
}

impl std::fmt::Display for Temporal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Temporal::Date(d) => write!(f, "{}", d),
            Temporal::Time(t) => write!(f, "{}", t),
            Temporal::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Temporal::Zoned(z) => write!(f, "{}", z.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_families() {
        assert_eq!(ValueKind::Byte.family(), KindFamily::Numeric);
        assert_eq!(ValueKind::Calendar.family(), KindFamily::Temporal);
        assert_eq!(ValueKind::Text.family(), KindFamily::Text);
        assert_eq!(ValueKind::Enum.family(), KindFamily::Enumeration);
        assert_eq!(ValueKind::RelatedCount.family(), KindFamily::RelatedCount);
        assert_eq!(ValueKind::all().len(), 19);
    }

    #[test]
    fn test_null_is_never_equal() {
        assert!(!Value::Null.sql_eq(&Value::Null));
        assert!(!Value::Int(1).sql_eq(&Value::Null));
        assert_eq!(Value::Null.compare(&Value::Int(1)), None);
    }

    #[test]
    fn test_mixed_numeric_compare() {
        assert!(Value::Int(2).sql_eq(&Value::Float(2.0)));
        assert_eq!(
            Value::Int(2).compare(&Value::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Int(2).compare(&Value::Text("2".into())), None);
    }

    #[test]
    fn test_decimal_compare_is_exact() {
        let tenth = Value::Decimal(Decimal::new(1, 1));
        assert!(tenth.sql_eq(&Value::Decimal(Decimal::new(10, 2))));
        assert!(Value::Decimal(Decimal::from(2)).sql_eq(&Value::Int(2)));
        assert_eq!(
            Value::Decimal(Decimal::new(25, 1)).compare(&Value::Float(2.4)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Decimal(Decimal::new(1250, 2)).to_string(), "12.50");
        assert_eq!(Value::Float(f64::NAN).as_decimal(), None);
    }

    #[test]
    fn test_temporal_format() {
        let date = Temporal::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(date.format("%d/%m/%Y").as_deref(), Some("09/03/2024"));
        assert_eq!(date.to_string(), "2024-03-09");

        // Time-of-day fields cannot be rendered from a bare date
        assert_eq!(date.format("%H:%M"), None);
    }
}
