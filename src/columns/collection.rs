//! Ordered collection of a grid's columns

use crate::columns::Column;
use crate::error::{GridError, GridResult};
use crate::sorting::SortDirection;

/// Columns of one grid in insertion order, unique by name
#[derive(Debug, Clone, Default)]
pub struct ColumnCollection {
    columns: Vec<Column>,
}

impl ColumnCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    ///
    /// A column with an initial sort direction becomes the sorted column
    /// unless another column already is.
    pub fn add(&mut self, mut column: Column) -> GridResult<&mut Column> {
        if self.contains(column.name()) {
            return Err(GridError::DuplicateColumn(column.name().to_string()));
        }

        if let Some(direction) = column.initial_direction() {
            if self.sorted_column().is_none() {
                column.set_direction(Some(direction));
            }
        }

        self.columns.push(column);
        let index = self.columns.len() - 1;
        Ok(&mut self.columns[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Column> {
        self.columns.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    /// First column with a live sort direction
    pub fn sorted_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_sorted())
    }

    /// Make `name` the only sorted column
    ///
    /// `None` clears sorting on every column. Columns that are not sortable
    /// keep their state and the request is ignored.
    pub fn sort_by(&mut self, name: &str, direction: Option<SortDirection>) -> GridResult<()> {
        let column = self
            .get(name)
            .ok_or_else(|| GridError::UnknownColumn(name.to_string()))?;
        if !column.sort_enabled() {
            tracing::debug!(column = %name, "Column is not sortable, sort request ignored");
            return Ok(());
        }

        for column in self.columns.iter_mut() {
            let live = if column.name() == name { direction } else { None };
            column.set_direction(live);
        }
        Ok(())
    }

    /// Drop every column's computed totals
    pub fn clear_totals(&mut self) {
        for column in self.columns.iter_mut() {
            column.clear_totals();
        }
    }
}

impl<'a> IntoIterator for &'a ColumnCollection {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueKind;

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut columns = ColumnCollection::new();
        columns.add(Column::from_expression("freight", ValueKind::Double)).unwrap();
        let err = columns
            .add(Column::from_expression("freight", ValueKind::Int))
            .unwrap_err();
        assert!(matches!(err, GridError::DuplicateColumn(name) if name == "freight"));
        assert_eq!(columns.len(), 1);
    }

    #[test]
    fn test_insertion_order() {
        let mut columns = ColumnCollection::new();
        for name in ["c", "a", "b"] {
            columns.add(Column::from_expression(name, ValueKind::Text)).unwrap();
        }
        assert_eq!(columns.names().collect::<Vec<_>>(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_first_initial_direction_wins() {
        let mut columns = ColumnCollection::new();
        columns
            .add(Column::from_expression("a", ValueKind::Int).sort_initial_direction(SortDirection::Descending))
            .unwrap();
        columns
            .add(Column::from_expression("b", ValueKind::Int).sort_initial_direction(SortDirection::Ascending))
            .unwrap();

        let sorted = columns.sorted_column().unwrap();
        assert_eq!(sorted.name(), "a");
        assert_eq!(sorted.direction(), Some(SortDirection::Descending));
        assert_eq!(columns.get("b").unwrap().direction(), None);
    }

    #[test]
    fn test_sort_by() {
        let mut columns = ColumnCollection::new();
        columns
            .add(
                Column::from_expression("a", ValueKind::Int)
                    .sortable(true)
                    .sort_initial_direction(SortDirection::Ascending),
            )
            .unwrap();
        columns.add(Column::from_expression("b", ValueKind::Int).sortable(true)).unwrap();
        columns.add(Column::from_expression("c", ValueKind::Int)).unwrap();

        columns.sort_by("b", Some(SortDirection::Descending)).unwrap();
        assert_eq!(columns.sorted_column().unwrap().name(), "b");
        assert!(!columns.get("a").unwrap().is_sorted());

        columns.sort_by("c", Some(SortDirection::Ascending)).unwrap();
        assert_eq!(columns.sorted_column().unwrap().name(), "b");

        assert!(matches!(
            columns.sort_by("zzz", None),
            Err(GridError::UnknownColumn(_))
        ));
    }
}
