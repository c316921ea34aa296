//! Computed totals and their rendering

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::totals::format::{printf, Arg};
use crate::types::{Temporal, Value};

/// A computed aggregate or calculation result
#[derive(Debug, Clone, PartialEq)]
pub enum Total {
    /// The aggregate ran over no values
    Absent,
    /// Exact; integers and floats are widened on the way in
    Number(Decimal),
    Temporal(Temporal),
    Text(String),
}

impl Total {
    /// Wrap a scalar by its runtime kind
    ///
    /// `Null` and booleans have no total form, nor do floats that are not
    /// finite or lie outside the decimal range.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(_) | Value::Float(_) | Value::Decimal(_) => {
                value.as_decimal().map(Self::Number)
            }
            Value::Text(s) => Some(Self::Text(s)),
            other => other.as_temporal().map(Self::Temporal),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_decimal().and_then(|x| x.to_f64())
    }

    /// Default text form; `None` when absent
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Absent => None,
            Self::Number(x) => Some(x.normalize().to_string()),
            Self::Temporal(t) => Some(t.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }

    /// Render with an optional pattern
    ///
    /// Numbers and text take printf-style patterns, temporal values take
    /// strftime patterns. A blank pattern, or one that cannot be applied,
    /// yields the default text form.
    pub fn render(&self, pattern: Option<&str>) -> Option<String> {
        let default = self.text()?;
        let Some(pattern) = pattern.filter(|p| !p.trim().is_empty()) else {
            return Some(default);
        };

        let formatted = match self {
            Self::Absent => None,
            Self::Number(x) => printf(pattern, Arg::Number(*x)),
            Self::Temporal(t) => t.format(pattern),
            Self::Text(s) => printf(pattern, Arg::Text(s)),
        };
        Some(formatted.unwrap_or(default))
    }
}

impl std::fmt::Display for Total {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text().unwrap_or_default())
    }
}
