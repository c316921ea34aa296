//! Filter operators and their wire encoding
//!
//! Each operator has a stable ordinal. Ordinals 0 to 12 are the legacy
//! codes carried in query strings; the duplicate-detection operators were
//! appended after them so old codes keep their meaning.

use crate::error::{GridError, GridResult};
use serde::{Deserialize, Serialize};

/// A requested comparison between a column and a filter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FilterOperator {
    None,
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    GreaterThanOrEquals,
    LessThanOrEquals,
    Condition,
    NotEquals,
    IsNull,
    IsNotNull,
    IsDuplicated,
    IsNotDuplicated,
}

impl FilterOperator {
    /// Every operator in ordinal order
    pub fn all() -> &'static [FilterOperator] {
        &[
            Self::None,
            Self::Equals,
            Self::Contains,
            Self::StartsWith,
            Self::EndsWith,
            Self::GreaterThan,
            Self::LessThan,
            Self::GreaterThanOrEquals,
            Self::LessThanOrEquals,
            Self::Condition,
            Self::NotEquals,
            Self::IsNull,
            Self::IsNotNull,
            Self::IsDuplicated,
            Self::IsNotDuplicated,
        ]
    }

    /// Stable ordinal used for external serialization
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Equals => 1,
            Self::Contains => 2,
            Self::StartsWith => 3,
            Self::EndsWith => 4,
            Self::GreaterThan => 5,
            Self::LessThan => 6,
            Self::GreaterThanOrEquals => 7,
            Self::LessThanOrEquals => 8,
            Self::Condition => 9,
            Self::NotEquals => 10,
            Self::IsNull => 11,
            Self::IsNotNull => 12,
            Self::IsDuplicated => 13,
            Self::IsNotDuplicated => 14,
        }
    }

    /// Decode an ordinal; out-of-range ordinals are an error
    pub fn from_ordinal(ordinal: u8) -> GridResult<Self> {
        Self::all()
            .get(ordinal as usize)
            .copied()
            .ok_or_else(|| GridError::UnknownOperator(ordinal.to_string()))
    }

    /// Decimal text code, as carried in query strings
    pub fn code(&self) -> String {
        self.ordinal().to_string()
    }

    /// Decode a text code
    ///
    /// Non-numeric text decodes to `None`, as legacy clients rely on;
    /// a numeric code outside the ordinal range is an error.
    pub fn from_code(code: &str) -> GridResult<Self> {
        match code.trim().parse::<i64>() {
            Ok(n) => u8::try_from(n)
                .map_err(|_| GridError::UnknownOperator(code.to_string()))
                .and_then(Self::from_ordinal),
            Err(_) => Ok(Self::None),
        }
    }

    /// Snake-case name used in grid definitions
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::GreaterThanOrEquals => "greater_than_or_equals",
            Self::LessThanOrEquals => "less_than_or_equals",
            Self::Condition => "condition",
            Self::NotEquals => "not_equals",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
            Self::IsDuplicated => "is_duplicated",
            Self::IsNotDuplicated => "is_not_duplicated",
        }
    }

    pub fn is_duplicate_check(&self) -> bool {
        matches!(self, Self::IsDuplicated | Self::IsNotDuplicated)
    }
}

impl std::str::FromStr for FilterOperator {
    type Err = GridError;

    /// Accepts a snake-case name or a numeric code
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(op) = Self::all().iter().find(|op| op.name().eq_ignore_ascii_case(s)) {
            return Ok(*op);
        }
        if s.parse::<i64>().is_ok() {
            return Self::from_code(s);
        }
        Err(GridError::UnknownOperator(s.to_string()))
    }
}

impl TryFrom<u8> for FilterOperator {
    type Error = GridError;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(ordinal)
    }
}

impl From<FilterOperator> for u8 {
    fn from(op: FilterOperator) -> Self {
        op.ordinal()
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
