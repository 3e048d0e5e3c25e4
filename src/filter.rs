//! Deriving the filter options of a table and applying a `FilterSelection` to it.

use crate::error::{Error, ErrorType};
use crate::model::{Transaction, TransactionTable};
use crate::Result;
use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

/// The values a user can choose from: the span of dates in the table and its distinct items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Earliest transaction date, `None` for an empty table.
    pub min_date: Option<NaiveDate>,
    /// Latest transaction date, `None` for an empty table.
    pub max_date: Option<NaiveDate>,
    /// Distinct item labels in order of first appearance.
    pub items: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &TransactionTable) -> Self {
        let mut seen = HashSet::new();
        let mut items = Vec::new();
        let mut min_date: Option<NaiveDate> = None;
        let mut max_date: Option<NaiveDate> = None;
        for t in table.transactions() {
            let d = t.date();
            min_date = Some(min_date.map_or(d, |m| m.min(d)));
            max_date = Some(max_date.map_or(d, |m| m.max(d)));
            if seen.insert(t.item()) {
                items.push(t.item().to_string());
            }
        }
        Self {
            min_date,
            max_date,
            items,
        }
    }
}

/// The two endpoints of the date picker. Either may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSelection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateSelection {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// The inclusive interval to filter by. Only a complete pair of endpoints restricts dates: a
    /// single endpoint is treated the same as no date filter.
    ///
    /// # Errors
    /// `ErrorType::Filter` if both endpoints are set and `start` is after `end`.
    pub fn interval(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                if start > end {
                    return Err(Error::new(
                        ErrorType::Filter,
                        anyhow!("The start date {start} is after the end date {end}"),
                    ));
                }
                Ok(Some((start, end)))
            }
            (None, None) => Ok(None),
            (start, end) => {
                warn!(
                    "Only one end of the date range is set (start: {start:?}, end: {end:?}); \
                    dates are not filtered"
                );
                Ok(None)
            }
        }
    }
}

/// Which items are selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSelection {
    /// Every item in the table. This is the default.
    #[default]
    All,
    /// Only these items. An empty set selects nothing.
    Only(BTreeSet<String>),
}

impl ItemSelection {
    pub fn only<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        ItemSelection::Only(items.into_iter().map(Into::into).collect())
    }

    pub fn none() -> Self {
        ItemSelection::Only(BTreeSet::new())
    }

    pub fn contains(&self, item: &str) -> bool {
        match self {
            ItemSelection::All => true,
            ItemSelection::Only(items) => items.contains(item),
        }
    }

    /// The number of selected items out of `options`.
    pub fn count(&self, options: &FilterOptions) -> usize {
        options.items.iter().filter(|i| self.contains(i)).count()
    }
}

/// The user's current choice of dates and items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub dates: DateSelection,
    pub items: ItemSelection,
}

impl FilterSelection {
    pub fn new(dates: DateSelection, items: ItemSelection) -> Self {
        Self { dates, items }
    }
}

/// The rows of a table that satisfy a `FilterSelection`, in table order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a TransactionTable,
    rows: Vec<&'a Transaction>,
    interval: Option<(NaiveDate, NaiveDate)>,
}

impl<'a> FilteredView<'a> {
    pub fn table(&self) -> &'a TransactionTable {
        self.table
    }

    pub fn rows(&self) -> &[&'a Transaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The date interval that was applied, if any.
    pub fn interval(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.interval
    }
}

/// Applies `selection` to `table`.
///
/// # Errors
/// `ErrorType::Filter` if the date selection is inverted.
pub fn filter<'a>(
    table: &'a TransactionTable,
    selection: &FilterSelection,
) -> Result<FilteredView<'a>> {
    let interval = selection.dates.interval()?;
    if let ItemSelection::Only(items) = &selection.items {
        let known: HashSet<&str> = table.transactions().iter().map(|t| t.item()).collect();
        for unknown in items.iter().filter(|i| !known.contains(i.as_str())) {
            warn!("Ignoring selected item '{unknown}' which does not appear in the data");
        }
    }

    let rows: Vec<&Transaction> = table
        .transactions()
        .iter()
        .filter(|t| match interval {
            Some((start, end)) => (start..=end).contains(&t.date()),
            None => true,
        })
        .filter(|t| selection.items.contains(t.item()))
        .collect();

    if rows.is_empty() && !table.is_empty() {
        warn!("The selection matches none of the {} transactions", table.len());
    }

    Ok(FilteredView {
        table,
        rows,
        interval,
    })
}

/// Fails with `ErrorType::Filter` when the selection could never be produced by the picker.
pub fn validate(selection: &FilterSelection) -> Result<()> {
    selection.dates.interval().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::sample_table;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_options() {
        let table = sample_table();
        let options = FilterOptions::from_table(&table);
        assert_eq!(options.min_date, Some(date(2024, 1, 1)));
        assert_eq!(options.max_date, Some(date(2024, 1, 3)));
        assert_eq!(options.items, vec!["Coffee", "Tea", "Cake"]);
    }

    #[test]
    fn test_options_empty_table() {
        let options = FilterOptions::from_table(&TransactionTable::default());
        assert_eq!(options, FilterOptions::default());
    }

    #[test]
    fn test_default_selection_keeps_everything() {
        let table = sample_table();
        let view = filter(&table, &FilterSelection::default()).unwrap();
        assert_eq!(view.len(), table.len());
        assert!(view.interval().is_none());
    }

    #[test]
    fn test_rows_satisfy_both_predicates() {
        let table = sample_table();
        let selection = FilterSelection::new(
            DateSelection::between(date(2024, 1, 2), date(2024, 1, 3)),
            ItemSelection::only(["Coffee", "Cake"]),
        );
        let view = filter(&table, &selection).unwrap();
        assert!(!view.is_empty());
        for t in view.rows() {
            assert!(t.date() >= date(2024, 1, 2) && t.date() <= date(2024, 1, 3));
            assert!(t.item() == "Coffee" || t.item() == "Cake");
        }
        let expected = table
            .transactions()
            .iter()
            .filter(|t| t.date() >= date(2024, 1, 2))
            .filter(|t| t.item() != "Tea")
            .count();
        assert_eq!(view.len(), expected);
    }

    #[test]
    fn test_single_endpoint_ignores_dates() {
        let table = sample_table();
        let selection = FilterSelection::new(
            DateSelection::new(Some(date(2030, 1, 1)), None),
            ItemSelection::only(["Tea"]),
        );
        let view = filter(&table, &selection).unwrap();
        let teas = table
            .transactions()
            .iter()
            .filter(|t| t.item() == "Tea")
            .count();
        assert_eq!(view.len(), teas);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let table = sample_table();
        let selection = FilterSelection::new(
            DateSelection::between(date(2024, 1, 3), date(2024, 1, 1)),
            ItemSelection::All,
        );
        let err = filter(&table, &selection).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Filter);
        assert!(validate(&selection).is_err());
    }

    #[test]
    fn test_empty_item_selection_is_empty_view() {
        let table = sample_table();
        let selection = FilterSelection::new(DateSelection::default(), ItemSelection::none());
        let view = filter(&table, &selection).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn test_range_excluding_everything() {
        let table = sample_table();
        let selection = FilterSelection::new(
            DateSelection::between(date(2020, 1, 1), date(2020, 12, 31)),
            ItemSelection::All,
        );
        assert!(filter(&table, &selection).unwrap().is_empty());
    }

    #[test]
    fn test_item_selection_count() {
        let table = sample_table();
        let options = FilterOptions::from_table(&table);
        assert_eq!(ItemSelection::All.count(&options), 3);
        assert_eq!(ItemSelection::only(["Tea", "Nope"]).count(&options), 1);
    }
}
