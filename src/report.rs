//! Time-window reporting over loaded transactions.
//!
//! A report is computed in four steps: resolve a `Window` from a `Preset`, `filter` the
//! transactions into it, `summarize` them, and break them down by category for each flow.

use crate::error::Error;
use crate::model::{Amount, Flow, Transaction};
use crate::Result;
use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of days covered by `Preset::Last90Days`, counting back from today.
const LAST_DAYS: u64 = 90;

/// The named time windows a report can cover.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum Preset {
    /// From the first day of the current month through today.
    #[default]
    #[serde(rename = "this-month")]
    #[value(name = "this-month")]
    ThisMonth,
    /// The 90 days before today, through today.
    #[serde(rename = "last-90-days")]
    #[value(name = "last-90-days")]
    Last90Days,
    /// From January 1 of the current year through today.
    #[serde(rename = "this-year")]
    #[value(name = "this-year")]
    ThisYear,
    /// From the earliest through the latest transaction.
    #[serde(rename = "all")]
    #[value(name = "all")]
    All,
    /// From `--start` through `--end`, both inclusive.
    #[serde(rename = "custom")]
    #[value(name = "custom")]
    Custom,
}

serde_plain::derive_display_from_serialize!(Preset);
serde_plain::derive_fromstr_from_deserialize!(Preset);

/// A half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// The last day included in the window.
    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.end)
    }
}

/// Turns a preset into a concrete window.
///
/// `custom_start` and `custom_end` are only used by `Preset::Custom`, where both are required and
/// inclusive. An end before the start gives a window that contains nothing. `transactions` is only used by `Preset::All`, which resolves to `None` when there are
/// no transactions.
pub fn resolve_window(
    preset: Preset,
    today: NaiveDate,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
    transactions: &[Transaction],
) -> Result<Option<Window>> {
    let tomorrow = next_day(today);
    let window = match preset {
        Preset::ThisMonth => Window {
            start: today.with_day(1).unwrap_or(today),
            end: tomorrow,
        },
        Preset::Last90Days => Window {
            start: today
                .checked_sub_days(Days::new(LAST_DAYS))
                .unwrap_or(NaiveDate::MIN),
            end: tomorrow,
        },
        Preset::ThisYear => Window {
            start: NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
            end: tomorrow,
        },
        Preset::All => {
            let dates = transactions.iter().map(|t| t.date);
            match (dates.clone().min(), dates.max()) {
                (Some(start), Some(last)) => Window {
                    start,
                    end: next_day(last),
                },
                _ => return Ok(None),
            }
        }
        Preset::Custom => {
            let (start, last) = match (custom_start, custom_end) {
                (Some(start), Some(last)) => (start, last),
                _ => {
                    return Err(Error::validation(
                        "A custom window needs both a start and an end date",
                    ))
                }
            };
            Window {
                start,
                end: next_day(last),
            }
        }
    };
    Ok(Some(window))
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(NaiveDate::MAX)
}

/// The transactions whose date falls in `window`, in their original order.
pub fn filter<'a>(transactions: &'a [Transaction], window: &Window) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| window.contains(t.date))
        .collect()
}

/// Income and expense totals.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_income: Amount,
    pub total_expense: Amount,
    /// `total_income - total_expense`
    pub net: Amount,
}

impl Summary {
    /// True when more came in than went out.
    pub fn is_surplus(&self) -> bool {
        self.net.is_positive()
    }
}

pub fn summarize<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Summary {
    let (mut total_income, mut total_expense) = (Amount::ZERO, Amount::ZERO);
    for t in transactions {
        match t.flow {
            Flow::Income => total_income = total_income + t.amount,
            Flow::Expense => total_expense = total_expense + t.amount,
        }
    }
    Summary {
        total_income,
        total_expense,
        net: total_income - total_expense,
    }
}

/// Sums the amounts of `flow` transactions per category. Categories without any such transaction
/// are absent.
pub fn breakdown_by_category<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    flow: Flow,
) -> BTreeMap<String, Amount> {
    let mut breakdown = BTreeMap::new();
    for t in transactions.into_iter().filter(|t| t.flow == flow) {
        let total = breakdown.entry(t.category.clone()).or_insert(Amount::ZERO);
        *total = *total + t.amount;
    }
    breakdown
}

/// One category's part of a breakdown.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Amount,
    /// Percentage of the breakdown total, rounded to one decimal place.
    pub percent: Decimal,
}

/// The categories of a breakdown with their share of its total, largest amount first. Ties keep
/// category order.
pub fn shares(breakdown: &BTreeMap<String, Amount>) -> Vec<CategoryShare> {
    let total: Amount = breakdown.values().sum();
    let mut shares: Vec<CategoryShare> = breakdown
        .iter()
        .map(|(category, amount)| CategoryShare {
            category: category.clone(),
            amount: *amount,
            percent: if total.is_zero() {
                Decimal::ZERO
            } else {
                (amount.value() * Decimal::ONE_HUNDRED / total.value()).round_dp(1)
            },
        })
        .collect();
    shares.sort_by(|a, b| b.amount.cmp(&a.amount));
    shares
}

/// Everything shown for one time window.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub preset: Preset,
    /// `None` when there was nothing to cover, i.e. `Preset::All` over an empty ledger.
    pub window: Option<Window>,
    /// Number of transactions in the window.
    pub count: usize,
    pub summary: Summary,
    pub expenses: Vec<CategoryShare>,
    pub income: Vec<CategoryShare>,
}

impl Report {
    pub fn build(
        transactions: &[Transaction],
        preset: Preset,
        today: NaiveDate,
        custom_start: Option<NaiveDate>,
        custom_end: Option<NaiveDate>,
    ) -> Result<Self> {
        let window = resolve_window(preset, today, custom_start, custom_end, transactions)?;
        let filtered = match &window {
            Some(window) => filter(transactions, window),
            None => Vec::new(),
        };
        Ok(Self {
            preset,
            window,
            count: filtered.len(),
            summary: summarize(filtered.iter().copied()),
            expenses: shares(&breakdown_by_category(
                filtered.iter().copied(),
                Flow::Expense,
            )),
            income: shares(&breakdown_by_category(filtered.iter().copied(), Flow::Income)),
        })
    }
}
