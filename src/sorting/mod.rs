//! Tabula Sorting
//!
//! Sort directions, sort modes and the orderer chain that turns a
//! column's sort state into ordering clauses.

mod orderer;

pub use orderer::{OrdererChain, ThenBy};

use serde::{Deserialize, Serialize};

/// Direction of one ordering clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn reverse(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("Unknown sort direction: {}", other)),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// How repeated sort requests on one column cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Unsorted, ascending, descending, unsorted
    #[default]
    ThreeState,
    /// Ascending and descending only
    TwoState,
}

impl SortMode {
    /// The direction a column moves to when its header is activated again
    pub fn next(self, current: Option<SortDirection>) -> Option<SortDirection> {
        match (self, current) {
            (_, None) => Some(SortDirection::Ascending),
            (_, Some(SortDirection::Ascending)) => Some(SortDirection::Descending),
            (Self::ThreeState, Some(SortDirection::Descending)) => None,
            (Self::TwoState, Some(SortDirection::Descending)) => Some(SortDirection::Ascending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Ascending);
        assert_eq!("descending".parse::<SortDirection>().unwrap(), SortDirection::Descending);
        assert!("up".parse::<SortDirection>().is_err());

        let dir: SortDirection = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(dir, SortDirection::Descending);
    }

    #[test]
    fn test_sort_mode_cycles() {
        let three = SortMode::ThreeState;
        assert_eq!(three.next(None), Some(SortDirection::Ascending));
        assert_eq!(three.next(Some(SortDirection::Ascending)), Some(SortDirection::Descending));
        assert_eq!(three.next(Some(SortDirection::Descending)), None);

        let two = SortMode::TwoState;
        assert_eq!(two.next(Some(SortDirection::Descending)), Some(SortDirection::Ascending));
        assert_eq!(SortMode::default(), SortMode::ThreeState);
    }
}
