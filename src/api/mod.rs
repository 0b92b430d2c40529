//! The `api` module provides the traits that interact with the ledger sheet: `Sheet`, a minimal
//! adapter over one tab of a spreadsheet, and `Ledger`, which maps the rows of that tab to
//! `Transaction` values.
//!
//! Both are used through dynamic dispatch so that the in-memory `TestSheet` can stand in for
//! Google Sheets when `LEDGER_IN_TEST_MODE` is set.

mod files;
mod ledger;
mod oauth;
mod sheet;
mod sheet_test_client;

use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{Transaction, Transactions};
use crate::{Config, Result};
use ledger::LedgerImpl;
use sheet::GoogleSheet;
use tracing::debug;

pub(crate) use oauth::TokenProvider;
pub(crate) use sheet_test_client::TestSheet;
#[cfg(test)]
pub(crate) use sheet_test_client::TestSheetState;

/// OAuth scopes the token must have been granted.
const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

/// When this environment variable is set to anything other than `0` or `false`, the in-memory
/// test sheet is used instead of Google Sheets.
pub const LEDGER_IN_TEST_MODE: &str = "LEDGER_IN_TEST_MODE";

/// Chooses the backing store for the ledger.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    /// Reads `LEDGER_IN_TEST_MODE`.
    pub fn from_env() -> Self {
        match std::env::var(LEDGER_IN_TEST_MODE) {
            Ok(value) if !matches!(value.trim(), "" | "0" | "false") => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// The operations on one tab of a spreadsheet that the ledger needs.
#[async_trait::async_trait]
pub(crate) trait Sheet {
    /// Returns every row of the tab, the first being the header. Trailing empty cells of a row may
    /// be missing. Returns an empty vector when the tab has no rows.
    async fn read_all(&mut self) -> Res<Vec<Vec<String>>>;

    /// Appends one row after the existing content of the tab.
    async fn append_row(&mut self, values: &[String]) -> Res<()>;

    /// Clears the tab then writes `header` followed by `rows`. This is not atomic.
    async fn replace_all(&mut self, header: &[String], rows: &[Vec<String>]) -> Res<()>;
}

/// Typed access to the transactions stored in the ledger sheet.
#[async_trait::async_trait]
pub trait Ledger {
    /// Reads and parses the whole sheet. Rows that cannot be read are reported in
    /// `Transactions::issues` rather than failing the load.
    async fn load(&mut self) -> Result<Transactions>;

    /// Validates and appends a single transaction, writing the header first if the sheet is empty.
    async fn insert(&mut self, transaction: &Transaction) -> Result<()>;

    /// Overwrites the sheet with the header followed by `transactions`, in order.
    async fn replace(&mut self, transactions: &[Transaction]) -> Result<()>;
}

/// Creates the `Ledger` for the spreadsheet in `config`, backed either by Google Sheets or by the
/// in-memory test sheet.
pub async fn ledger(config: &Config, mode: Mode) -> Result<Box<dyn Ledger + Send>> {
    let sheet = sheet(config, mode).await?;
    Ok(Box::new(LedgerImpl::new(sheet)))
}

async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    match mode {
        Mode::Google => {
            debug!("Using Google Sheets for {}", config.spreadsheet_id());
            let token_provider =
                TokenProvider::load(config.client_secret_path(), config.token_path())
                    .await
                    .pub_result(ErrorType::Connection)?;
            let sheet = GoogleSheet::new(config.clone(), token_provider)
                .await
                .pub_result(ErrorType::Connection)?;
            Ok(Box::new(sheet))
        }
        Mode::Test => {
            debug!("Using the test sheet for {}", config.spreadsheet_id());
            Ok(Box::new(TestSheet::new(config.spreadsheet_id())))
        }
    }
}
