//! Types that represent the core data model, such as `Transaction` and `Amount`.
mod amount;
mod flow;
mod transaction;

pub use amount::{Amount, AmountError};
pub use flow::{Flow, EXPENSE_LABEL, INCOME_LABEL, OTHER_CATEGORY};
pub use transaction::{
    parse_date, Column, RowAction, RowIssue, Transaction, Transactions, DATE_FORMAT, HEADER,
};
