//! These structs provide the CLI interface for the ledger CLI.

use crate::model::{parse_date, Amount, Flow};
use crate::report::Preset;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// ledger: A command-line tool for keeping a personal expense and income ledger in a Google sheet.
///
/// Every transaction is a row of the sheet with the columns 日期 (date), 類型 (flow), 類別
/// (category), 金額 (amount) and 備註 (note). You can add transactions, list them, see a report
/// of income and expenses by category for a time window, and edit or delete existing entries.
///
/// You will need Google OAuth credentials for this: the client secret downloaded from the Google
/// Cloud Console and a token file with the spreadsheets scope. Pass both to `ledger init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need to get a few things ready beforehand.
    ///
    /// - Decide what directory you want to store configuration in and pass this as
    ///   --ledger-home. By default, it will be $HOME/ledger.
    ///
    /// - Get the URL of your Google Sheet and pass it as --sheet-url.
    ///
    /// - Get your OAuth client secret and token files and pass them as --client-secret and
    ///   --token. They are copied into the data directory.
    Init(InitArgs),
    /// Record a new expense or income.
    Add(AddArgs),
    /// List the transactions in a time window, with the index used by `update` and `delete`.
    List(WindowArgs),
    /// Show income, expense and net totals, and the breakdown by category, for a time window.
    Report(WindowArgs),
    /// Change fields of one transaction. The whole sheet is rewritten.
    Update(UpdateArgs),
    /// Delete transactions. The whole sheet is rewritten.
    Delete(DeleteArgs),
    /// Show the suggested categories.
    Categories(CategoriesArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the ledger configuration is held. Defaults to ~/ledger
    #[arg(long, env = "LEDGER_HOME", default_value_t = default_ledger_home())]
    ledger_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, ledger_home: PathBuf) -> Self {
        Self {
            log_level,
            ledger_home: ledger_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn ledger_home(&self) -> &DisplayPath {
        &self.ledger_home
    }
}

/// Args for the `ledger init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to your Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The path to your downloaded OAuth client credentials.
    #[arg(long)]
    client_secret: PathBuf,

    /// The path to the OAuth token file. It must have been granted the spreadsheets scope.
    #[arg(long)]
    token: PathBuf,

    /// The name of the tab that holds the ledger. Defaults to the first tab.
    #[arg(long)]
    worksheet: Option<String>,
}

impl InitArgs {
    pub fn new(
        sheet_url: impl Into<String>,
        client_secret: impl Into<PathBuf>,
        token: impl Into<PathBuf>,
        worksheet: Option<String>,
    ) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            client_secret: client_secret.into(),
            token: token.into(),
            worksheet,
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn client_secret(&self) -> &Path {
        &self.client_secret
    }

    pub fn token(&self) -> &Path {
        &self.token
    }

    pub fn worksheet(&self) -> Option<&str> {
        self.worksheet.as_deref()
    }
}

/// Args for the `ledger add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// Whether this is an expense or an income.
    #[arg(long, value_enum)]
    pub flow: Flow,

    /// The date of the transaction, e.g. 2025-10-31. Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// The category. Defaults to 其他. Use `ledger categories` to see the suggestions.
    #[arg(long)]
    pub category: Option<String>,

    /// The amount, greater than zero, e.g. 120 or 1,250.50
    #[arg(long)]
    pub amount: Amount,

    /// A free-text note.
    #[arg(long)]
    pub note: Option<String>,
}

/// Args for the `ledger list` and `ledger report` commands.
#[derive(Debug, Default, Parser, Clone)]
pub struct WindowArgs {
    /// The time window. Defaults to this-month, or to custom when --start or --end is given.
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// The first day of a custom window, e.g. 2025-01-01
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// The last day of a custom window, inclusive.
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,
}

impl WindowArgs {
    /// The explicit preset, otherwise `Custom` if a date bound was given, otherwise `ThisMonth`.
    pub fn preset(&self) -> Preset {
        match self.preset {
            Some(preset) => preset,
            None if self.start.is_some() || self.end.is_some() => Preset::Custom,
            None => Preset::ThisMonth,
        }
    }
}

/// Args for the `ledger update` command. Fields that are not given keep their current value.
#[derive(Debug, Default, Parser, Clone)]
pub struct UpdateArgs {
    /// The index of the transaction as shown by `ledger list --preset all`.
    pub index: usize,

    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    #[arg(long, value_enum)]
    pub flow: Option<Flow>,

    #[arg(long)]
    pub category: Option<String>,

    /// The new amount, greater than zero.
    #[arg(long)]
    pub amount: Option<Amount>,

    /// The new note. Pass an empty string to remove the note.
    #[arg(long)]
    pub note: Option<String>,

    /// Rewrite the sheet even though some rows could not be read. Those rows will be lost.
    #[arg(long)]
    pub drop_rejected: bool,
}

/// Args for the `ledger delete` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct DeleteArgs {
    /// The indexes of the transactions as shown by `ledger list --preset all`.
    #[arg(conflicts_with = "all")]
    pub indexes: Vec<usize>,

    /// Delete every transaction, leaving only the header.
    #[arg(long)]
    pub all: bool,

    /// Rewrite the sheet even though some rows could not be read. Those rows will be lost.
    #[arg(long)]
    pub drop_rejected: bool,
}

/// Args for the `ledger categories` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct CategoriesArgs {
    /// Only show the categories for this flow.
    #[arg(long, value_enum)]
    pub flow: Option<Flow>,
}

fn default_ledger_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledger"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --ledger-home or LEDGER_HOME instead of relying on the default \
                ledger home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("ledger")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        <Args as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from([
            "ledger",
            "--ledger-home",
            "/tmp/x",
            "add",
            "--flow",
            "expense",
            "--amount",
            "1,250",
            "--date",
            "2025/10/31",
        ])
        .unwrap();
        assert_eq!(args.common().ledger_home().path(), Path::new("/tmp/x"));
        match args.command() {
            Command::Add(add) => {
                assert_eq!(add.flow, Flow::Expense);
                assert_eq!(add.amount, Amount::from_str("1250").unwrap());
                assert_eq!(add.date, NaiveDate::from_ymd_opt(2025, 10, 31));
                assert_eq!(add.category, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_report_preset() {
        let args = Args::try_parse_from(["ledger", "report", "--preset", "last-90-days"]).unwrap();
        match args.command() {
            Command::Report(window) => assert_eq!(window.preset(), Preset::Last90Days),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_window_preset_defaults() {
        assert_eq!(WindowArgs::default().preset(), Preset::ThisMonth);
        let with_start = WindowArgs {
            start: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..WindowArgs::default()
        };
        assert_eq!(with_start.preset(), Preset::Custom);
    }

    #[test]
    fn test_parse_delete_conflict() {
        let result = Args::try_parse_from(["ledger", "delete", "1", "--all"]);
        assert!(result.is_err());
        let args = Args::try_parse_from(["ledger", "delete", "3", "1"]).unwrap();
        match args.command() {
            Command::Delete(delete) => assert_eq!(delete.indexes, vec![3, 1]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_bad_amount() {
        let result = Args::try_parse_from(["ledger", "add", "--flow", "income", "--amount", "x"]);
        assert!(result.is_err());
    }
}
