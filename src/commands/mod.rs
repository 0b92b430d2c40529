//! Command handlers for the ledger CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod add;
mod categories;
mod delete;
mod init;
mod list;
mod report;
mod update;

use crate::api::{self, Ledger, Mode};
use crate::backup::PRE_REPLACE;
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Transaction, Transactions};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info, warn};

pub use add::add;
pub use categories::categories;
pub use delete::delete;
pub use init::init;
pub use list::{list, Listed};
pub use report::report;
pub use update::update;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Loads the configuration from the ledger home directory.
pub async fn load_config(home: &Path) -> Result<Config> {
    Config::load(home).await.pub_result(ErrorType::Config)
}

/// Opens the ledger and loads the current snapshot.
async fn open(config: &Config, mode: Mode) -> Result<(Box<dyn Ledger + Send>, Transactions)> {
    let mut ledger = api::ledger(config, mode).await?;
    let transactions = ledger.load().await?;
    Ok((ledger, transactions))
}

/// Saves a backup of `snapshot` and then overwrites the sheet with `replacement`.
///
/// Rewriting the sheet loses any row that could not be read, so this refuses unless there are no
/// rejected rows or `drop_rejected` is set.
async fn replace(
    config: &Config,
    ledger: &mut (dyn Ledger + Send),
    snapshot: &Transactions,
    replacement: &[Transaction],
    drop_rejected: bool,
) -> Result<()> {
    check_rejected(snapshot, drop_rejected)?;
    let path = config
        .backup()
        .save_json(PRE_REPLACE, snapshot)
        .await
        .pub_result(ErrorType::Io)?;
    debug!("Saved backup to {}", path.display());
    ledger.replace(replacement).await
}

fn check_rejected(snapshot: &Transactions, drop_rejected: bool) -> Result<()> {
    let rejected: Vec<String> = snapshot.rejected().map(|i| i.to_string()).collect();
    if rejected.is_empty() {
        return Ok(());
    }
    if drop_rejected {
        warn!(
            "Dropping {} rows that could not be read:\n{}",
            rejected.len(),
            rejected.join("\n")
        );
        return Ok(());
    }
    Err(Error::validation(format!(
        "Rewriting the sheet would erase {} rows that could not be read. Fix them in the sheet or \
        pass --drop-rejected:\n{}",
        rejected.len(),
        rejected.join("\n")
    )))
}

/// Converts a 1-based index as shown by `list` into a position in `transactions`.
fn position(index: usize, transactions: &Transactions) -> Result<usize> {
    if index == 0 || index > transactions.len() {
        return Err(Error::validation(format!(
            "There is no transaction {index}, the index must be between 1 and {}",
            transactions.len()
        )));
    }
    Ok(index - 1)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}
