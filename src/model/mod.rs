//! Types that represent the core data model: the `TransactionTable` and its `Transaction` rows.
mod amount;
mod mapping;
mod transaction;

pub use amount::{Amount, AmountError};
pub use mapping::{Mapping, MappingError};
pub use transaction::{
    parse_date_time, Transaction, TransactionTable, ITEM_STR, QUANTITY_STR, TOTAL_SPENT_STR,
    TRANSACTION_DATE_STR,
};
pub(crate) use transaction::REQUIRED_COLUMNS;
