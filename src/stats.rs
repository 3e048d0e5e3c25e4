//! Descriptive statistics and the head-of-table preview for the detail panel.

use crate::filter::FilteredView;
use crate::model::{
    Transaction, TransactionTable, QUANTITY_STR, TOTAL_SPENT_STR, TRANSACTION_DATE_STR,
};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

/// Summary statistics of one numeric column. Values that are undefined for the data, such as the
/// standard deviation of a single value, are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    pub fn from_values(column: impl Into<String>, mut values: Vec<f64>) -> Self {
        let column = column.into();
        let count = values.len();
        if count == 0 {
            return Self {
                column,
                ..Self::default()
            };
        }
        values.sort_by(f64::total_cmp);
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });
        Self {
            column,
            count,
            mean: Some(mean),
            std,
            min: values.first().copied(),
            q25: Some(quantile(&values, 0.25)),
            median: Some(quantile(&values, 0.5)),
            q75: Some(quantile(&values, 0.75)),
            max: values.last().copied(),
        }
    }
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty and ascending.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Statistics for every numeric column of `view`: `Quantity`, `Total Spent`, then every other
/// column whose non-empty cells in the whole table are all numbers, in header order.
pub fn describe(view: &FilteredView<'_>) -> Vec<ColumnStats> {
    let table = view.table();
    let mut stats = vec![
        ColumnStats::from_values(
            QUANTITY_STR,
            view.rows()
                .iter()
                .filter_map(|t| t.quantity())
                .filter_map(|q| q.to_f64())
                .collect(),
        ),
        ColumnStats::from_values(
            TOTAL_SPENT_STR,
            view.rows()
                .iter()
                .filter_map(|t| t.total_spent())
                .map(|a| a.to_f64())
                .collect(),
        ),
    ];
    for ix in passthrough_numeric_columns(table) {
        let values = view
            .rows()
            .iter()
            .filter_map(|t| parse_number(t.raw(ix)))
            .collect();
        stats.push(ColumnStats::from_values(&table.headers()[ix], values));
    }
    stats
}

fn passthrough_numeric_columns(table: &TransactionTable) -> Vec<usize> {
    let known = [TRANSACTION_DATE_STR, QUANTITY_STR, TOTAL_SPENT_STR];
    table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| !known.contains(&h.as_str()))
        .filter(|(ix, _)| is_numeric_column(table.transactions(), *ix))
        .map(|(ix, _)| ix)
        .collect()
}

fn is_numeric_column(rows: &[Transaction], ix: usize) -> bool {
    let mut any = false;
    for t in rows {
        let cell = t.raw(ix).trim();
        if cell.is_empty() {
            continue;
        }
        if parse_number(cell).is_none() {
            return false;
        }
        any = true;
    }
    any
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// The first `n` rows of the view as display strings, in header order. The date column is shown in
/// its parsed form.
pub fn preview(view: &FilteredView<'_>, n: usize) -> Vec<Vec<String>> {
    let table = view.table();
    let date_ix = table.column_index(TRANSACTION_DATE_STR);
    view.rows()
        .iter()
        .take(n)
        .map(|t| {
            (0..table.headers().len())
                .map(|ix| {
                    if Some(ix) == date_ix {
                        t.date_time().format("%Y-%m-%d %H:%M:%S").to_string()
                    } else {
                        t.raw(ix).to_string()
                    }
                })
                .collect()
        })
        .collect()
}
