use crate::error::Res;
use crate::model::{Amount, Mapping};
use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The transaction table: the header mapping of the source and one `Transaction` per data row, in
/// source order.
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct TransactionTable {
    #[serde(skip)]
    mapping: Mapping,
    data: Vec<Transaction>,
}

impl TransactionTable {
    /// Build a table from a header row and data rows. Every row must have a parseable
    /// `Transaction Date`, and `Quantity` and `Total Spent` must be numeric or empty.
    ///
    /// The absolute values of each numeric column must sum without overflowing `Decimal`, so any
    /// sum over a subset of rows is representable.
    pub fn new<S, R>(header: R, rows: impl IntoIterator<Item = R>) -> Res<Self>
    where
        S: AsRef<str>,
        R: IntoIterator<Item = S>,
    {
        let mapping = Mapping::new(header)?;
        let columns = mapping.require(REQUIRED_COLUMNS)?;

        let mut data = Vec::new();
        let mut quantity_bound = Decimal::ZERO;
        let mut spent_bound = Amount::ZERO;
        for (row_ix, row) in rows.into_iter().enumerate() {
            let values: Vec<String> = row.into_iter().map(|s| s.as_ref().to_string()).collect();
            // Header is line 1 in the source.
            let line = row_ix + 2;
            if values.len() > mapping.len() {
                bail!("A row longer than the header was encountered at line {line}");
            }
            let transaction = Transaction::from_row(columns, values)
                .with_context(|| format!("Invalid data at line {line}"))?;
            if let Some(q) = transaction.quantity {
                quantity_bound = quantity_bound
                    .checked_add(q.abs())
                    .with_context(|| column_overflow(QUANTITY_STR, line))?;
            }
            if let Some(t) = transaction.total_spent {
                spent_bound = spent_bound
                    .checked_add(t.abs())
                    .with_context(|| column_overflow(TOTAL_SPENT_STR, line))?;
            }
            data.push(transaction);
        }
        Ok(Self { mapping, data })
    }

    pub fn headers(&self) -> &[String] {
        self.mapping.headers()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of the named column in the header row.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.mapping.index(header)
    }
}

/// Represents a single row of the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    date: NaiveDateTime,
    item: String,
    /// `None` when the cell was empty.
    quantity: Option<Decimal>,
    /// `None` when the cell was empty.
    total_spent: Option<Amount>,
    /// Every cell of the row, in header order, as it appeared in the source.
    raw: Vec<String>,
}

impl Transaction {
    fn from_row(columns: [usize; 4], values: Vec<String>) -> Res<Self> {
        let [date_ix, item_ix, quantity_ix, total_ix] = columns;
        let cell = |ix: usize| values.get(ix).map(String::as_str).unwrap_or_default();

        let date = parse_date_time(cell(date_ix))
            .with_context(|| format!("Unable to parse column '{TRANSACTION_DATE_STR}'"))?;
        let item = cell(item_ix).trim().to_string();
        let quantity = parse_optional(cell(quantity_ix), parse_quantity)
            .with_context(|| format!("Unable to parse column '{QUANTITY_STR}'"))?;
        let total_spent = parse_optional(cell(total_ix), |s| Ok(Amount::from_str(s)?))
            .with_context(|| format!("Unable to parse column '{TOTAL_SPENT_STR}'"))?;

        Ok(Self {
            date,
            item,
            quantity,
            total_spent,
            raw: values,
        })
    }

    pub fn date_time(&self) -> NaiveDateTime {
        self.date
    }

    /// The calendar date of the transaction, used for filtering and daily grouping.
    pub fn date(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn quantity(&self) -> Option<Decimal> {
        self.quantity
    }

    pub fn total_spent(&self) -> Option<Amount> {
        self.total_spent
    }

    /// The raw cell at `ix`, or an empty string for a short row.
    pub fn raw(&self, ix: usize) -> &str {
        self.raw.get(ix).map(String::as_str).unwrap_or_default()
    }
}

fn column_overflow(column: &str, line: usize) -> String {
    format!("The values of column '{column}' are too large to sum at line {line}")
}

fn parse_optional<T>(s: &str, parse: impl FnOnce(&str) -> Res<T>) -> Res<Option<T>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse(trimmed).map(Some)
}

fn parse_quantity(s: &str) -> Res<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .with_context(|| format!("'{s}' is not a number"))
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a `Transaction Date` value. Date-only values are placed at midnight.
pub fn parse_date_time(s: &str) -> Res<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        bail!("The date is empty");
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Ok(d.and_time(chrono::NaiveTime::MIN));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    bail!("'{s}' is not a recognized date")
}

/// The columns a source must provide, in the order `Transaction::from_row` expects them.
pub(crate) const REQUIRED_COLUMNS: [&str; 4] =
    [TRANSACTION_DATE_STR, ITEM_STR, QUANTITY_STR, TOTAL_SPENT_STR];

pub const TRANSACTION_DATE_STR: &str = "Transaction Date";
pub const ITEM_STR: &str = "Item";
pub const QUANTITY_STR: &str = "Quantity";
pub const TOTAL_SPENT_STR: &str = "Total Spent";
