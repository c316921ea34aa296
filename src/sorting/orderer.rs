//! Orderer chains: a column's live primary orderer plus fixed then-by orderers

use serde::{Deserialize, Serialize};

use crate::query::{OrderClause, QueryContext};
use crate::sorting::SortDirection;

/// A fixed tie-breaker registered when the grid is defined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThenBy {
    pub expression: String,
    pub direction: SortDirection,
}

impl ThenBy {
    pub fn new(expression: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            expression: expression.into(),
            direction,
        }
    }
}

/// Primary orderer plus then-by tie-breakers
///
/// The primary follows the live sort direction; then-by orderers keep the
/// direction they were registered with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdererChain {
    primary: Option<String>,
    then_by: Vec<ThenBy>,
}

impl OrdererChain {
    pub fn new(primary: Option<String>) -> Self {
        Self {
            primary,
            then_by: Vec::new(),
        }
    }

    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    pub(crate) fn set_primary(&mut self, expression: Option<String>) {
        self.primary = expression;
    }

    pub fn then_by(&self) -> &[ThenBy] {
        &self.then_by
    }

    pub fn push(&mut self, then_by: ThenBy) {
        self.then_by.push(then_by);
    }

    pub fn len(&self) -> usize {
        self.primary.iter().count() + self.then_by.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordering clauses, primary first
    ///
    /// Expressions that are not valid paths are skipped.
    pub fn apply(&self, ctx: &QueryContext, direction: SortDirection) -> Vec<OrderClause> {
        let primary = self.primary.iter().map(|e| (e.as_str(), direction));
        let then_by = self.then_by.iter().map(|t| (t.expression.as_str(), t.direction));

        primary
            .chain(then_by)
            .filter_map(|(expression, direction)| match ctx.path(expression) {
                Some(path) => Some(OrderClause::new(path, direction)),
                None => {
                    tracing::debug!(expression = %expression, "Skipping invalid sort expression");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_then_by() {
        let ctx = QueryContext::new("orders");
        let mut chain = OrdererChain::new(Some("freight".to_string()));
        chain.push(ThenBy::new("id", SortDirection::Ascending));

        let clauses = chain.apply(&ctx, SortDirection::Descending);
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].to_string(), "freight DESC");
        assert_eq!(clauses[1].to_string(), "id ASC");
    }

    #[test]
    fn test_then_by_direction_is_fixed() {
        let ctx = QueryContext::new("orders");
        let mut chain = OrdererChain::new(Some("ship_city".to_string()));
        chain.push(ThenBy::new("freight", SortDirection::Descending));
        chain.push(ThenBy::new("id", SortDirection::Ascending));

        let asc: Vec<String> = chain
            .apply(&ctx, SortDirection::Ascending)
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(asc, vec!["ship_city ASC", "freight DESC", "id ASC"]);
    }

    #[test]
    fn test_chain_without_primary() {
        let ctx = QueryContext::new("orders");
        let mut chain = OrdererChain::default();
        assert!(chain.is_empty());
        chain.push(ThenBy::new("id", SortDirection::Ascending));
        chain.push(ThenBy::new("bad..path", SortDirection::Ascending));

        let clauses = chain.apply(&ctx, SortDirection::Descending);
        assert_eq!(clauses.len(), 1);
        assert_eq!(chain.len(), 2);
    }
}
