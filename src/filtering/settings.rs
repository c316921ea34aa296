//! Filter settings sources
//!
//! A settings source tells the composer which options a request carries
//! for each column and whether a column still shows its initial filter.
//! `RequestFilterSettings` reads both from a URL query string:
//!
//! ```text
//! grid-filter=ShipCity__1__Berlin&grid-filter=Freight__5__10&grid-clearinitfilter=Status
//! ```

use std::collections::{HashMap, HashSet};

use nom::{
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::char,
    combinator::{opt, rest},
    multi::separated_list0,
    sequence::{pair, preceded, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::columns::Column;
use crate::filtering::FilterOperator;

/// Query-string key carrying one filter option
pub const FILTER_KEY: &str = "grid-filter";

/// Query-string key clearing a column's initial filter
pub const CLEAR_INIT_FILTER_KEY: &str = "grid-clearinitfilter";

const SEPARATOR: &str = "__";

/// One requested filter condition on a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterOption {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// Render in query-string form, `<Column>__<code>__<value>`
    pub fn to_query_value(&self) -> String {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.column,
            self.operator.code(),
            self.value
        )
    }
}

/// Source of requested filter options
pub trait FilterSettings {
    /// Whether the column's configured initial filter applies verbatim
    fn is_init_state(&self, column: &Column) -> bool;

    /// Requested options for one column, in request order
    fn options_for(&self, column: &str) -> Vec<FilterOption>;
}

/// Filter settings decoded from a request query string
#[derive(Debug, Clone, Default)]
pub struct RequestFilterSettings {
    options: HashMap<String, Vec<FilterOption>>,
    cleared: HashSet<String>,
}

impl RequestFilterSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `grid-filter` and `grid-clearinitfilter` entries
    ///
    /// Other keys and malformed filter entries are skipped.
    pub fn from_query(query: &str) -> Self {
        let mut settings = Self::new();
        let query = query.trim().trim_start_matches('?');

        let pairs = match query_pairs(query) {
            Ok((_, pairs)) => pairs,
            Err(e) => {
                tracing::debug!(error = ?e, "Unreadable query string");
                return settings;
            }
        };

        for (key, value) in pairs {
            let key = decode(key);
            let value = value.map(decode).unwrap_or_default();
            match key.as_str() {
                FILTER_KEY => match parse_filter_value(&value) {
                    Some(option) => settings.push(option),
                    None => tracing::debug!(value = %value, "Malformed filter entry skipped"),
                },
                CLEAR_INIT_FILTER_KEY if !value.is_empty() => {
                    settings.cleared.insert(value);
                }
                _ => {}
            }
        }

        settings
    }

    /// Add one option
    pub fn push(&mut self, option: FilterOption) {
        self.options.entry(option.column.clone()).or_default().push(option);
    }

    /// Mark a column's initial filter as cleared
    pub fn clear_initial(&mut self, column: impl Into<String>) {
        self.cleared.insert(column.into());
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.cleared.is_empty()
    }

    /// Columns carrying at least one option
    pub fn filtered_columns(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }
}

impl FilterSettings for RequestFilterSettings {
    fn is_init_state(&self, column: &Column) -> bool {
        column.initial_filter().is_some()
            && !self.options.contains_key(column.name())
            && !self.cleared.contains(column.name())
    }

    fn options_for(&self, column: &str) -> Vec<FilterOption> {
        self.options.get(column).cloned().unwrap_or_default()
    }
}

fn decode(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .map(|s| s.into_owned())
        .unwrap_or(raw)
}

/// `key[=value]` pairs separated by `&`
fn query_pairs(input: &str) -> IResult<&str, Vec<(&str, Option<&str>)>> {
    separated_list0(
        char('&'),
        pair(
            take_while(|c: char| c != '=' && c != '&'),
            opt(preceded(char('='), take_while(|c: char| c != '&'))),
        ),
    )(input)
}

/// `<Column>__<code>__<value>`
fn filter_parts(input: &str) -> IResult<&str, (&str, &str, &str)> {
    let (input, (column, _, code, _)) = tuple((
        take_until(SEPARATOR),
        tag(SEPARATOR),
        take_while1(|c: char| c != '_'),
        tag(SEPARATOR),
    ))(input)?;
    let (input, value) = rest(input)?;
    Ok((input, (column, code, value)))
}

fn parse_filter_value(raw: &str) -> Option<FilterOption> {
    let (_, (column, code, value)) = filter_parts(raw).ok()?;
    if column.is_empty() {
        return None;
    }
    let operator = FilterOperator::from_code(code).ok()?;
    Some(FilterOption::new(column, operator, value))
}
