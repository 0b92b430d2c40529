use crate::args::InitArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file using the sheet URL along with default settings
/// - Copies the client secret and token files into their default locations in the data dir.
///
/// # Arguments
/// - `ledger_home` - The directory that will be the root of data directory, e.g. `$HOME/ledger`
/// - `args` - The sheet URL, the credential files, and optionally the worksheet name.
///
/// # Errors
/// - Returns an error if the sheet URL is invalid or if any file operations fail.
pub async fn init(ledger_home: &Path, args: &InitArgs) -> Result<Out<()>> {
    let config = Config::create(
        ledger_home,
        args.client_secret(),
        args.token(),
        args.sheet_url(),
        args.worksheet(),
    )
    .await
    .context("Unable to create the data directory and configs")
    .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the ledger directory and config at {}",
        config.root().display()
    )
    .into())
}
