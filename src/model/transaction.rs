use crate::error::Res;
use crate::model::{Amount, Flow};
use anyhow::{bail, ensure};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// The header row of the ledger sheet, in column order.
pub const HEADER: [&str; COLUMN_COUNT] = [DATE_STR, FLOW_STR, CATEGORY_STR, AMOUNT_STR, NOTE_STR];

/// The date format used when writing to the sheet.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date renderings accepted when reading. The sheet may render dates according to its locale.
const READ_DATE_FORMATS: &[&str] = &[DATE_FORMAT, "%Y/%m/%d", "%m/%d/%Y"];

/// The transaction data from the ledger sheet: the parsed rows and anything that went wrong while
/// parsing them.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transactions {
    data: Vec<Transaction>,
    issues: Vec<RowIssue>,
}

impl Transactions {
    /// Parses the rows of the sheet. The first non-blank row must be the ledger header.
    ///
    /// A header that does not match `HEADER` is an error. Problems with individual rows are not:
    /// the row is either rejected or its amount is coerced to zero, and a `RowIssue` is recorded.
    pub fn parse<S, R>(sheet_data: impl IntoIterator<Item = R>) -> Res<Self>
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
    {
        let mut rows = sheet_data
            .into_iter()
            .map(|row| row.into_iter().map(|s| s.into()).collect::<Vec<String>>())
            .enumerate()
            .filter(|(_, values)| !is_blank(values));

        let (header_ix, header) = match rows.next() {
            Some(first) => first,
            None => return Ok(Self::default()),
        };
        ensure!(
            header_ix == 0,
            "The ledger header must be in row 1, but the first non-blank row is row {}",
            header_ix + 1
        );
        validate_header(&header)?;

        let mut transactions = Self::default();
        for (ix, values) in rows {
            let row = ix + 1;
            if let Some(transaction) = parse_row(row, values, &mut transactions.issues) {
                transactions.data.push(transaction);
            }
        }

        for issue in &transactions.issues {
            warn!("{issue}");
        }
        Ok(transactions)
    }

    /// Creates a collection from transactions that did not come from the sheet.
    pub fn from_data(data: Vec<Transaction>) -> Self {
        Self {
            data,
            issues: Vec::new(),
        }
    }

    pub fn data(&self) -> &[Transaction] {
        &self.data
    }

    pub fn into_data(self) -> Vec<Transaction> {
        self.data
    }

    pub fn issues(&self) -> &[RowIssue] {
        &self.issues
    }

    /// Returns the issues for rows that were left out of `data`.
    pub fn rejected(&self) -> impl Iterator<Item = &RowIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.action == RowAction::Rejected)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Represents a single row from the ledger sheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub date: NaiveDate,
    pub flow: Flow,
    pub category: String,
    pub amount: Amount,
    /// Free text. An empty string means there is no note.
    pub note: String,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        flow: Flow,
        category: impl Into<String>,
        amount: Amount,
        note: impl Into<String>,
    ) -> Self {
        Self {
            date,
            flow,
            category: category.into(),
            amount,
            note: note.into(),
        }
    }

    /// Checks the rules for a user-entered transaction: the amount must be greater than zero.
    pub fn validate(&self) -> Res<()> {
        if self.amount.is_zero() {
            bail!("The amount is required and must not be zero");
        }
        if !self.amount.is_positive() {
            bail!("The amount must not be negative, got {}", self.amount);
        }
        Ok(())
    }

    /// The values of this transaction in sheet column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.format(DATE_FORMAT).to_string(),
            self.flow.label().to_string(),
            self.category.clone(),
            self.amount.to_string(),
            self.note.clone(),
        ]
    }
}

/// The columns of the ledger sheet.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Date,
    Flow,
    Category,
    Amount,
    Note,
}

serde_plain::derive_display_from_serialize!(Column);
serde_plain::derive_fromstr_from_deserialize!(Column);

impl Column {
    pub fn header(&self) -> &'static str {
        HEADER[self.index()]
    }

    pub fn index(&self) -> usize {
        match self {
            Column::Date => DATE_IDX,
            Column::Flow => FLOW_IDX,
            Column::Category => CATEGORY_IDX,
            Column::Amount => AMOUNT_IDX,
            Column::Note => NOTE_IDX,
        }
    }
}

/// What happened to a row that could not be read cleanly.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    /// The row was left out of the loaded data.
    Rejected,
    /// The row was loaded with a default value in place of the unreadable one.
    Coerced,
}

/// A problem found in one row of the sheet while loading.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RowIssue {
    /// The 1-based row number in the sheet.
    pub row: usize,
    /// The column that could not be read, `None` when the row as a whole has the wrong shape.
    pub column: Option<Column>,
    /// The offending cell value, or the whole row joined by commas when `column` is `None`.
    pub value: String,
    pub action: RowAction,
    pub reason: String,
}

impl std::fmt::Display for RowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self.action {
            RowAction::Rejected => "rejected",
            RowAction::Coerced => "coerced",
        };
        match self.column {
            Some(column) => write!(f, "Row {} {action} ({column}): {}", self.row, self.reason),
            None => write!(f, "Row {} {action}: {}", self.row, self.reason),
        }
    }
}

/// Parses a date cell, ignoring any time-of-day part.
pub fn parse_date(s: &str) -> Res<NaiveDate> {
    let day = s
        .trim()
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or_default();
    if day.is_empty() {
        bail!("The date is empty");
    }
    for format in READ_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(day, format) {
            return Ok(date);
        }
    }
    bail!("'{s}' is not a recognized date")
}

fn is_blank(values: &[String]) -> bool {
    values.iter().all(|v| v.trim().is_empty())
}

fn validate_header(header: &[String]) -> Res<()> {
    let mut found: Vec<&str> = header.iter().map(|s| s.trim()).collect();
    while found.last().is_some_and(|s| s.is_empty()) {
        found.pop();
    }
    if found != HEADER {
        bail!(
            "The sheet header is [{}] but the ledger expects [{}]",
            found.join(", "),
            HEADER.join(", ")
        );
    }
    Ok(())
}

fn parse_row(row: usize, mut values: Vec<String>, issues: &mut Vec<RowIssue>) -> Option<Transaction> {
    let mut reject = |column: Option<Column>, value: &str, reason: String| {
        issues.push(RowIssue {
            row,
            column,
            value: value.to_string(),
            action: RowAction::Rejected,
            reason,
        });
    };

    if values.len() > COLUMN_COUNT && !is_blank(&values[COLUMN_COUNT..]) {
        reject(
            None,
            &values.join(","),
            format!(
                "The row has values beyond the {COLUMN_COUNT} ledger columns ({} cells)",
                values.len()
            ),
        );
        return None;
    }
    // The Sheets API leaves out trailing empty cells
    values.resize(COLUMN_COUNT, String::new());
    let mut values = values.into_iter();
    let mut next = || values.next().unwrap_or_default();
    let (date, flow, category, amount, note) = (next(), next(), next(), next(), next());

    let date = match parse_date(&date) {
        Ok(date) => date,
        Err(e) => {
            reject(Some(Column::Date), &date, e.to_string());
            return None;
        }
    };

    let flow = match Flow::from_label(&flow) {
        Some(flow) => flow,
        None => {
            reject(
                Some(Column::Flow),
                &flow,
                format!("'{flow}' is not one of the flow labels"),
            );
            return None;
        }
    };

    let amount = match Amount::from_str(&amount) {
        Ok(amount) => amount,
        Err(e) => {
            issues.push(RowIssue {
                row,
                column: Some(Column::Amount),
                value: amount.clone(),
                action: RowAction::Coerced,
                reason: format!("{e}, using 0"),
            });
            Amount::ZERO
        }
    };

    Some(Transaction {
        date,
        flow,
        category,
        amount,
        note,
    })
}

pub(super) const DATE_STR: &str = "日期";
pub(super) const DATE_IDX: usize = 0;

pub(super) const FLOW_STR: &str = "類型";
pub(super) const FLOW_IDX: usize = 1;

pub(super) const CATEGORY_STR: &str = "類別";
pub(super) const CATEGORY_IDX: usize = 2;

pub(super) const AMOUNT_STR: &str = "金額";
pub(super) const AMOUNT_IDX: usize = 3;

pub(super) const NOTE_STR: &str = "備註";
pub(super) const NOTE_IDX: usize = 4;

pub(super) const COLUMN_COUNT: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_empty_sheet() {
        let transactions = Transactions::parse(Vec::<Vec<&str>>::new()).unwrap();
        assert!(transactions.is_empty());
        assert!(transactions.issues().is_empty());
    }

    #[test]
    fn test_parse_header_only() {
        let transactions = Transactions::parse(vec![HEADER.to_vec()]).unwrap();
        assert!(transactions.is_empty());
    }

    #[test]
    fn test_parse_rows() {
        let transactions = Transactions::parse(vec![
            HEADER.to_vec(),
            vec!["2024-01-01", "支出", "餐飲", "100", "午餐"],
            vec!["2024-01-02", "收入", "薪資", "5,000", ""],
        ])
        .unwrap();
        assert_eq!(transactions.len(), 2);
        assert!(transactions.issues().is_empty());
        let first = &transactions.data()[0];
        assert_eq!(first.date, date("2024-01-01"));
        assert_eq!(first.flow, Flow::Expense);
        assert_eq!(first.category, "餐飲");
        assert_eq!(first.amount, amount("100"));
        assert_eq!(first.note, "午餐");
        assert_eq!(transactions.data()[1].amount, amount("5000"));
    }

    #[test]
    fn test_parse_short_row_is_padded() {
        let transactions = Transactions::parse(vec![
            HEADER.to_vec(),
            vec!["2024-01-01", "支出", "交通", "30"],
        ])
        .unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions.data()[0].note, "");
    }

    #[test]
    fn test_parse_wrong_header() {
        let result = Transactions::parse(vec![
            vec!["Date", "Type", "Category", "Amount", "Note"],
            vec!["2024-01-01", "支出", "餐飲", "100", ""],
        ]);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("header"), "{message}");
    }

    #[test]
    fn test_parse_header_with_extra_column() {
        let mut header = HEADER.to_vec();
        header.push("刪除");
        assert!(Transactions::parse(vec![header]).is_err());
    }

    #[test]
    fn test_parse_header_trailing_blank_cells() {
        let mut header = HEADER.to_vec();
        header.push("");
        let transactions = Transactions::parse(vec![header]).unwrap();
        assert!(transactions.is_empty());
    }

    #[test]
    fn test_parse_header_not_first_row() {
        let result = Transactions::parse(vec![vec![""], HEADER.to_vec()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_bad_date_rejects_row() {
        let transactions = Transactions::parse(vec![
            HEADER.to_vec(),
            vec!["yesterday", "支出", "餐飲", "100", ""],
            vec!["2024-01-02", "支出", "餐飲", "80", ""],
        ])
        .unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions.data()[0].date, date("2024-01-02"));
        let issue = &transactions.issues()[0];
        assert_eq!(issue.row, 2);
        assert_eq!(issue.column, Some(Column::Date));
        assert_eq!(issue.value, "yesterday");
        assert_eq!(issue.action, RowAction::Rejected);
        assert_eq!(transactions.rejected().count(), 1);
    }

    #[test]
    fn test_parse_missing_date_rejects_row() {
        let transactions =
            Transactions::parse(vec![HEADER.to_vec(), vec!["", "支出", "餐飲", "100", ""]])
                .unwrap();
        assert!(transactions.is_empty());
        assert_eq!(transactions.rejected().count(), 1);
    }

    #[test]
    fn test_parse_unknown_flow_rejects_row() {
        let transactions = Transactions::parse(vec![
            HEADER.to_vec(),
            vec!["2024-01-01", "轉帳", "其他", "100", ""],
        ])
        .unwrap();
        assert!(transactions.is_empty());
        assert_eq!(transactions.issues()[0].column, Some(Column::Flow));
    }

    #[test]
    fn test_parse_bad_amount_is_coerced() {
        let transactions = Transactions::parse(vec![
            HEADER.to_vec(),
            vec!["2024-01-01", "支出", "餐飲", "lots", ""],
            vec!["2024-01-02", "支出", "餐飲", "", ""],
        ])
        .unwrap();
        assert_eq!(transactions.len(), 2);
        assert!(transactions.data().iter().all(|t| t.amount.is_zero()));
        assert_eq!(transactions.issues().len(), 2);
        assert!(transactions
            .issues()
            .iter()
            .all(|i| i.action == RowAction::Coerced && i.column == Some(Column::Amount)));
        assert_eq!(transactions.rejected().count(), 0);
    }

    #[test]
    fn test_parse_too_many_cells_rejects_row() {
        let transactions = Transactions::parse(vec![
            HEADER.to_vec(),
            vec!["2024-01-01", "支出", "餐飲", "100", "", "true"],
            vec!["2024-01-02", "支出", "餐飲", "100", "", ""],
        ])
        .unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions.issues()[0].row, 2);
        assert_eq!(transactions.issues()[0].column, None);
    }

    #[test]
    fn test_parse_skips_blank_rows() {
        let transactions = Transactions::parse(vec![
            HEADER.to_vec(),
            vec![],
            vec!["", "  "],
            vec!["2024-01-02", "收入", "獎金", "1000", ""],
        ])
        .unwrap();
        assert_eq!(transactions.len(), 1);
        assert!(transactions.issues().is_empty());
    }

    #[test]
    fn test_parse_date_renderings() {
        let expected = date("2024-03-05");
        assert_eq!(parse_date("2024-03-05").unwrap(), expected);
        assert_eq!(parse_date("2024/3/5").unwrap(), expected);
        assert_eq!(parse_date("3/5/2024").unwrap(), expected);
        assert_eq!(parse_date("2024-03-05 00:00:00").unwrap(), expected);
        assert_eq!(parse_date("2024-03-05T12:30:00").unwrap(), expected);
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_to_row() {
        let transaction = Transaction::new(
            date("2024-01-05"),
            Flow::Income,
            "薪資",
            amount("5000.00"),
            "",
        );
        assert_eq!(
            transaction.to_row(),
            vec!["2024-01-05", "收入", "薪資", "5000", ""]
        );
    }

    #[test]
    fn test_row_round_trip() {
        let transaction = Transaction::new(
            date("2024-02-29"),
            Flow::Expense,
            "寵物",
            amount("12.5"),
            "cat food",
        );
        let transactions =
            Transactions::parse(vec![HEADER.map(String::from).to_vec(), transaction.to_row()])
                .unwrap();
        assert_eq!(transactions.data(), &[transaction]);
    }

    #[test]
    fn test_validate() {
        let mut transaction =
            Transaction::new(date("2024-01-01"), Flow::Expense, "餐飲", amount("1"), "");
        assert!(transaction.validate().is_ok());
        transaction.amount = Amount::ZERO;
        assert!(transaction.validate().is_err());
        transaction.amount = amount("-5");
        assert!(transaction.validate().is_err());
    }

    #[test]
    fn test_column_headers() {
        assert_eq!(Column::Date.header(), "日期");
        assert_eq!(Column::Note.header(), "備註");
        assert_eq!(Column::Amount.index(), 3);
        assert_eq!(Column::Flow.to_string(), "flow");
    }
}
