//! The ledger home directory and the settings in its `config.json`.
//!
//! ```text
//! $LEDGER_HOME/
//!   config.json
//!   .secrets/client_secret.json
//!   .secrets/token.json
//!   .backups/pre-replace.YYYY-MM-DD-NNN.json
//! ```

use crate::backup::Backup;
use crate::error::Res;
use crate::model::Flow;
use crate::utils;
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "ledger";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const CURRENCY_SYMBOL: &str = "NT$";
const SECRETS: &str = ".secrets";
const BACKUPS: &str = ".backups";
const CLIENT_SECRET_JSON: &str = "client_secret.json";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";

/// Everything a command needs to know about where the ledger lives: the home directory, the
/// settings read from it, and the spreadsheet id taken from the sheet URL.
#[derive(Debug, Clone)]
pub struct Config {
    home: Home,
    settings: Settings,
    spreadsheet_id: String,
}

impl Config {
    /// Sets up a new ledger home at `dir` for the sheet at `sheet_url`.
    ///
    /// The OAuth client secret and token are copied (not moved) into `.secrets/` and made readable
    /// by the owner only. `worksheet` names the tab holding the ledger, `None` meaning the first
    /// tab. The URL is checked before anything is written, so a bad URL leaves no directory
    /// behind.
    pub async fn create(
        dir: impl Into<PathBuf>,
        secret_file: &Path,
        token_file: &Path,
        sheet_url: &str,
        worksheet: Option<&str>,
    ) -> Res<Self> {
        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?;
        let settings = Settings {
            sheet_url: sheet_url.to_string(),
            worksheet: worksheet.map(String::from),
            ..Settings::default()
        };
        settings.check()?;

        let home = Home::create(dir.into()).await?;
        install_secret(secret_file, &home.secrets().join(CLIENT_SECRET_JSON)).await?;
        install_secret(token_file, &home.secrets().join(TOKEN_JSON)).await?;
        settings.write(&home.config_json()).await?;

        Ok(Self {
            home,
            settings,
            spreadsheet_id,
        })
    }

    /// Opens an existing ledger home created by `ledger init`.
    pub async fn load(ledger_home: impl Into<PathBuf>) -> Res<Self> {
        let home = Home::open(ledger_home.into()).await?;
        let settings = Settings::read(&home.config_json()).await?;
        let spreadsheet_id = extract_spreadsheet_id(&settings.sheet_url).with_context(|| {
            format!("The sheet_url in {} is invalid", home.config_json().display())
        })?;
        Ok(Self {
            home,
            settings,
            spreadsheet_id,
        })
    }

    pub fn root(&self) -> &Path {
        &self.home.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.config_json()
    }

    pub fn backups(&self) -> PathBuf {
        self.home.backups()
    }

    pub fn secrets(&self) -> PathBuf {
        self.home.secrets()
    }

    pub fn sheet_url(&self) -> &str {
        &self.settings.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// The worksheet (tab) name, `None` meaning the first tab of the spreadsheet.
    pub fn worksheet(&self) -> Option<&str> {
        self.settings.worksheet.as_deref()
    }

    pub fn backup_copies(&self) -> u32 {
        self.settings.backup_copies
    }

    pub fn currency_symbol(&self) -> &str {
        &self.settings.currency_symbol
    }

    /// The categories offered for `flow`: the list from the config file if there is one, otherwise
    /// the built-in list.
    pub fn suggested_categories(&self, flow: Flow) -> Vec<String> {
        let configured = match flow {
            Flow::Expense => self.settings.expense_categories.as_ref(),
            Flow::Income => self.settings.income_categories.as_ref(),
        };
        match configured {
            Some(categories) => categories.clone(),
            None => flow
                .suggested_categories()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    pub fn client_secret_path(&self) -> PathBuf {
        self.home
            .credential(self.settings.client_secret_path.as_deref(), CLIENT_SECRET_JSON)
    }

    pub fn token_path(&self) -> PathBuf {
        self.home
            .credential(self.settings.token_path.as_deref(), TOKEN_JSON)
    }
}

/// The canonical path of a ledger home directory.
#[derive(Debug, Clone)]
struct Home {
    root: PathBuf,
}

impl Home {
    async fn create(dir: PathBuf) -> Res<Self> {
        utils::make_dir(&dir)
            .await
            .context("Unable to create the ledger home directory")?;
        let home = Self {
            root: utils::canonicalize(&dir).await?,
        };
        utils::make_dir(home.backups()).await?;
        utils::make_dir(home.secrets()).await?;
        Ok(home)
    }

    async fn open(dir: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&dir)
            .await
            .context("The ledger home directory is missing, run 'ledger init' first")?;
        let home = Self { root };
        if !home.config_json().is_file() {
            bail!(
                "The config file is missing '{}', run 'ledger init' first",
                home.config_json().display()
            )
        }
        for required in [home.backups(), home.secrets()] {
            ensure!(
                required.is_dir(),
                "The directory '{}' is missing",
                required.display()
            );
        }
        Ok(home)
    }

    fn config_json(&self) -> PathBuf {
        self.root.join(CONFIG_JSON)
    }

    fn backups(&self) -> PathBuf {
        self.root.join(BACKUPS)
    }

    fn secrets(&self) -> PathBuf {
        self.root.join(SECRETS)
    }

    /// A credential file: the configured path, relative to the home or absolute, or else
    /// `file_name` in `.secrets/`.
    fn credential(&self, configured: Option<&Path>, file_name: &str) -> PathBuf {
        match configured {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.root.join(path),
            None => self.secrets().join(file_name),
        }
    }
}

async fn install_secret(from: &Path, to: &Path) -> Res<()> {
    utils::copy(from, to).await?;
    utils::restrict_permissions(to)
}

/// The contents of `config.json`. Only `app_name`, `config_version` and `sheet_url` are required.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct Settings {
    app_name: String,
    config_version: u8,
    sheet_url: String,

    /// Absent means the first tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    worksheet: Option<String>,

    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Shown before amounts in `list` and `report` output, may be empty.
    #[serde(default = "default_currency_symbol")]
    currency_symbol: String,

    /// Replace the built-in suggestions for `add`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expense_categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    income_categories: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

fn default_currency_symbol() -> String {
    CURRENCY_SYMBOL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            worksheet: None,
            backup_copies: BACKUP_COPIES,
            currency_symbol: default_currency_symbol(),
            expense_categories: None,
            income_categories: None,
            client_secret_path: None,
            token_path: None,
        }
    }
}

impl Settings {
    async fn read(path: &Path) -> Res<Self> {
        let settings: Settings = utils::deserialize(path).await?;
        settings
            .check()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    async fn write(&self, path: &Path) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    fn check(&self) -> Res<()> {
        ensure!(
            self.app_name == APP_NAME,
            "Invalid app_name: expected '{APP_NAME}', got '{}'",
            self.app_name
        );
        ensure!(
            self.config_version <= CONFIG_VERSION,
            "config_version {} is newer than this version of ledger understands ({CONFIG_VERSION})",
            self.config_version
        );
        if let Some(worksheet) = &self.worksheet {
            ensure!(
                !worksheet.trim().is_empty(),
                "The worksheet must not be blank, remove it to use the first tab"
            );
        }
        ensure!(
            self.backup_copies > 0,
            "backup_copies must be at least 1"
        );
        let lists = [&self.expense_categories, &self.income_categories];
        for category in lists.into_iter().flatten().flatten() {
            ensure!(
                !category.trim().is_empty(),
                "Category lists must not contain blank names"
            );
        }
        Ok(())
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL of the form
/// `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...`. Query strings and fragments are
/// ignored.
fn extract_spreadsheet_id(sheet_url: &str) -> Res<String> {
    let url = Url::parse(sheet_url).with_context(|| format!("'{sheet_url}' is not a URL"))?;
    let mut segments = url
        .path_segments()
        .with_context(|| format!("'{sheet_url}' has no path"))?;
    while let Some(segment) = segments.next() {
        if segment == "d" {
            if let Some(id) = segments.next().filter(|id| !id.is_empty()) {
                return Ok(id.to_string());
            }
        }
    }
    bail!(
        "Invalid Google Sheets URL format '{sheet_url}'. Expected: \
        https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}
