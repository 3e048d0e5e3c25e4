//! KPIs and grouped totals computed from a `FilteredView`.
//!
//! All functions here are pure and accept an empty view. Missing `Quantity` or `Total Spent` cells
//! are skipped by sums and by the average.

use crate::filter::FilteredView;
use crate::model::Amount;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// The four headline numbers of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total_revenue: Amount,
    /// Sum of `Quantity`, truncated toward zero.
    pub total_items_sold: i64,
    /// Mean `Total Spent` per transaction. Zero when there is nothing to average.
    pub avg_transaction: Amount,
    pub total_transactions: usize,
    /// Transactions with a `Total Spent` value, i.e. the ones the average is taken over.
    pub spent_values: usize,
}

impl Kpis {
    /// Whether the average was computed from at least one value.
    pub fn has_data(&self) -> bool {
        self.spent_values > 0
    }
}

/// A summed value for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemTotal {
    pub item: String,
    pub total: Decimal,
}

/// Summed `Total Spent` for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Amount,
}

/// Everything the charts and KPI widgets need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregates {
    pub kpis: Kpis,
    /// Descending by total, ties by item.
    pub sales_by_item: Vec<ItemTotal>,
    /// Ordered by item.
    pub quantity_by_item: Vec<ItemTotal>,
    /// Ascending by date.
    pub daily_sales: Vec<DailyTotal>,
}

impl Aggregates {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        Self {
            kpis: kpis(view),
            sales_by_item: sales_by_item(view),
            quantity_by_item: quantity_by_item(view),
            daily_sales: daily_sales(view),
        }
    }
}

pub fn kpis(view: &FilteredView<'_>) -> Kpis {
    let spent: Vec<Amount> = view.rows().iter().filter_map(|t| t.total_spent()).collect();
    let total_revenue: Amount = spent.iter().sum();
    let quantity: Decimal = view.rows().iter().filter_map(|t| t.quantity()).sum();
    Kpis {
        total_revenue,
        total_items_sold: items_sold(quantity),
        avg_transaction: Amount::mean(total_revenue, spent.len()),
        total_transactions: view.len(),
        spent_values: spent.len(),
    }
}

/// Truncates toward zero, saturating at the bounds of `i64`.
fn items_sold(quantity: Decimal) -> i64 {
    quantity.trunc().to_i64().unwrap_or(if quantity.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

pub fn sales_by_item(view: &FilteredView<'_>) -> Vec<ItemTotal> {
    let mut totals: Vec<ItemTotal> = group_by_item(view, |t| {
        t.total_spent().map(|a| a.value()).unwrap_or_default()
    });
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.item.cmp(&b.item)));
    totals
}

pub fn quantity_by_item(view: &FilteredView<'_>) -> Vec<ItemTotal> {
    group_by_item(view, |t| t.quantity().unwrap_or_default())
}

pub fn daily_sales(view: &FilteredView<'_>) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<NaiveDate, Amount> = BTreeMap::new();
    for t in view.rows() {
        let entry = by_date.entry(t.date()).or_default();
        *entry = *entry + t.total_spent().unwrap_or_default();
    }
    by_date
        .into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}

/// Sums `value` per item; the result is ordered by item.
fn group_by_item(
    view: &FilteredView<'_>,
    value: impl Fn(&crate::model::Transaction) -> Decimal,
) -> Vec<ItemTotal> {
    let mut groups: BTreeMap<&str, Decimal> = BTreeMap::new();
    for t in view.rows() {
        *groups.entry(t.item()).or_default() += value(*t);
    }
    groups
        .into_iter()
        .map(|(item, total)| ItemTotal {
            item: item.to_string(),
            total,
        })
        .collect()
}
