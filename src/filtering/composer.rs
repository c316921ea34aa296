//! Filter composition
//!
//! Folds the predicates of every filterable column into one conjunction.

use std::sync::Arc;

use crate::columns::ColumnCollection;
use crate::error::GridResult;
use crate::filtering::settings::{FilterOption, FilterSettings};
use crate::filtering::strategy::strategy_for;
use crate::query::{Predicate, QueryContext};

/// Replaces the whole composition with a caller-supplied transform
pub type ComposeHook = Arc<dyn Fn(Option<Predicate>) -> Option<Predicate> + Send + Sync>;

/// Combines per-column filter predicates
pub struct FilterComposer<S: FilterSettings> {
    settings: S,
    hook: Option<ComposeHook>,
}

impl<S: FilterSettings> FilterComposer<S> {
    pub fn new(settings: S) -> Self {
        Self {
            settings,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: ComposeHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Swap in the settings of a new request
    pub fn update_settings(&mut self, settings: S) {
        self.settings = settings;
    }

    /// AND `base` with every column predicate
    ///
    /// Returns `None` when neither `base` nor any column contributes.
    pub fn compose(
        &self,
        ctx: &QueryContext,
        columns: &ColumnCollection,
        base: Option<Predicate>,
    ) -> GridResult<Option<Predicate>> {
        if let Some(hook) = &self.hook {
            return Ok(hook(base));
        }

        let mut predicate = base;
        for column in columns.iter().filter(|c| c.filter_enabled()) {
            let Some(strategy) = strategy_for(column.kind()) else {
                tracing::debug!(column = %column.name(), kind = %column.kind(), "No filter strategy");
                continue;
            };

            let options: Vec<FilterOption> = if self.settings.is_init_state(column) {
                column.initial_filter().cloned().into_iter().collect()
            } else {
                self.settings.options_for(column.name())
            };

            for option in &options {
                if let Some(p) = strategy.apply(ctx, column, option)? {
                    tracing::debug!(column = %column.name(), predicate = %p, "Filter applied");
                    predicate = Some(match predicate {
                        Some(acc) => acc.and(p),
                        None => p,
                    });
                }
            }
        }

        Ok(predicate)
    }
}

impl<S: FilterSettings + std::fmt::Debug> std::fmt::Debug for FilterComposer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterComposer")
            .field("settings", &self.settings)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::Column;
    use crate::filtering::settings::RequestFilterSettings;
    use crate::filtering::FilterOperator;
    use crate::query::{Comparison, QueryContext};
    use crate::types::{Value, ValueKind};

    fn columns() -> ColumnCollection {
        let mut columns = ColumnCollection::new();
        columns
            .add(Column::new("City", ValueKind::Text).with_expression("ship_city").filterable(true))
            .unwrap();
        columns
            .add(Column::new("Freight", ValueKind::Double).with_expression("freight").filterable(true))
            .unwrap();
        columns
            .add(
                Column::new("Status", ValueKind::Enum)
                    .with_expression("status")
                    .filterable(true)
                    .with_initial_filter(FilterOperator::Equals, "Open"),
            )
            .unwrap();
        columns
            .add(Column::new("Note", ValueKind::Text).with_expression("note"))
            .unwrap();
        columns
    }

    #[test]
    fn test_no_active_filters_yields_none() {
        let mut cols = columns();
        cols.get_mut("Status").unwrap().enable_filter(false);

        let composer = FilterComposer::new(RequestFilterSettings::new());
        let ctx = QueryContext::new("orders");
        assert!(composer.compose(&ctx, &cols, None).unwrap().is_none());
    }

    #[test]
    fn test_initial_filter_applies_in_init_state() {
        let composer = FilterComposer::new(RequestFilterSettings::new());
        let ctx = QueryContext::new("orders");
        let predicate = composer.compose(&ctx, &columns(), None).unwrap().unwrap();
        assert_eq!(predicate.to_string(), "status = 'Open'");
    }

    #[test]
    fn test_request_options_are_and_combined() {
        let settings = RequestFilterSettings::from_query(
            "grid-filter=City__3__Ber&grid-filter=Freight__5__10&grid-filter=Freight__6__abc\
             &grid-filter=Note__1__x&grid-clearinitfilter=Status",
        );
        let composer = FilterComposer::new(settings);
        let ctx = QueryContext::new("orders");

        let predicate = composer.compose(&ctx, &columns(), None).unwrap().unwrap();
        // Unparsable freight bound and the non-filterable note are dropped
        assert_eq!(predicate.conjuncts().len(), 2);
        assert_eq!(predicate.to_string(), "ship_city LIKE 'Ber%' AND freight > 10");
    }

    #[test]
    fn test_base_predicate_is_kept() {
        let ctx = QueryContext::new("orders");
        let base = ctx.compare(
            ctx.path("freight").unwrap(),
            ValueKind::Double,
            Comparison::GreaterThan,
            Value::Int(0),
        );
        let composer = FilterComposer::new(RequestFilterSettings::from_query("grid-clearinitfilter=Status"));

        let predicate = composer.compose(&ctx, &columns(), Some(base.clone())).unwrap();
        assert_eq!(predicate, Some(base));
    }

    #[test]
    fn test_hook_overrides_composition() {
        let composer = FilterComposer::new(RequestFilterSettings::from_query("grid-filter=City__1__Paris"))
            .with_hook(Arc::new(|_: Option<Predicate>| None));
        let ctx = QueryContext::new("orders");
        assert!(composer.compose(&ctx, &columns(), None).unwrap().is_none());
    }

    #[test]
    fn test_update_settings() {
        let mut composer = FilterComposer::new(RequestFilterSettings::from_query("grid-filter=City__1__Paris"));
        composer.update_settings(RequestFilterSettings::from_query("grid-filter=City__1__Rome"));
        let ctx = QueryContext::new("orders");

        let predicate = composer.compose(&ctx, &columns(), None).unwrap().unwrap();
        assert_eq!(predicate.to_string(), "ship_city = 'Rome' AND status = 'Open'");
    }
}
