//! Implements the `Ledger` trait on top of any `Sheet`.

use crate::api::{Ledger, Sheet};
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Transaction, Transactions, HEADER};
use crate::Result;
use anyhow::anyhow;
use tracing::{debug, info};

/// Implements the `Ledger` trait by reading and writing rows through a dynamically-dispatched
/// `Sheet`.
pub(super) struct LedgerImpl {
    sheet: Box<dyn Sheet + Send>,
}

impl LedgerImpl {
    pub(super) fn new(sheet: Box<dyn Sheet + Send>) -> Self {
        Self { sheet }
    }
}

#[async_trait::async_trait]
impl Ledger for LedgerImpl {
    async fn load(&mut self) -> Result<Transactions> {
        let rows = self
            .sheet
            .read_all()
            .await
            .pub_result(ErrorType::Connection)?;
        debug!("Read {} rows from the sheet", rows.len());
        Transactions::parse(rows).pub_result(ErrorType::Parse)
    }

    async fn insert(&mut self, transaction: &Transaction) -> Result<()> {
        transaction.validate().pub_result(ErrorType::Validation)?;

        let rows = self
            .sheet
            .read_all()
            .await
            .pub_result(ErrorType::Connection)?;
        let row = transaction.to_row();

        if rows.is_empty() {
            info!("The sheet is empty, writing the header");
            self.sheet
                .append_row(&header())
                .await
                .pub_result(ErrorType::Connection)?;
        } else {
            let first = trimmed(&rows[0]);
            if first != HEADER {
                return Err(Error::new(
                    ErrorType::Parse,
                    anyhow!(
                        "Refusing to append to a sheet whose first row is [{}] instead of the \
                        ledger header [{}]",
                        first.join(", "),
                        HEADER.join(", ")
                    ),
                ));
            }
        }

        self.sheet
            .append_row(&row)
            .await
            .pub_result(ErrorType::Connection)
    }

    async fn replace(&mut self, transactions: &[Transaction]) -> Result<()> {
        let rows: Vec<Vec<String>> = transactions.iter().map(Transaction::to_row).collect();
        debug!("Replacing the sheet with {} rows", rows.len());
        self.sheet
            .replace_all(&header(), &rows)
            .await
            .pub_result(ErrorType::Connection)
    }
}

fn header() -> Vec<String> {
    HEADER.iter().map(|s| s.to_string()).collect()
}

/// The row with surrounding whitespace and trailing empty cells removed.
fn trimmed(row: &[String]) -> Vec<&str> {
    let mut cells: Vec<&str> = row.iter().map(|s| s.trim()).collect();
    while cells.last().is_some_and(|s| s.is_empty()) {
        cells.pop();
    }
    cells
}
