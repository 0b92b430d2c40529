use crate::api::Mode;
use crate::args::WindowArgs;
use crate::commands::{open, plural, Out};
use crate::model::{Transaction, DATE_FORMAT};
use crate::report::resolve_window;
use crate::{Config, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A transaction along with the 1-based index that `update` and `delete` use to refer to it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Listed {
    pub index: usize,
    #[serde(flatten)]
    pub transaction: Transaction,
}

/// Lists the transactions that fall in the requested window, in sheet order.
///
/// The index of each transaction is its position in the whole ledger, not in the window, so it can
/// be passed to `update` or `delete` whatever window was listed.
pub async fn list(
    config: &Config,
    mode: Mode,
    args: &WindowArgs,
    today: NaiveDate,
) -> Result<Out<Vec<Listed>>> {
    let (_, transactions) = open(config, mode).await?;
    let window = resolve_window(
        args.preset(),
        today,
        args.start,
        args.end,
        transactions.data(),
    )?;

    let listed: Vec<Listed> = match window {
        Some(window) => transactions
            .data()
            .iter()
            .enumerate()
            .filter(|(_, t)| window.contains(t.date))
            .map(|(ix, t)| Listed {
                index: ix + 1,
                transaction: t.clone(),
            })
            .collect(),
        None => Vec::new(),
    };

    let symbol = config.currency_symbol();
    let mut lines = vec![format!(
        "{} ({})",
        plural(listed.len(), "transaction"),
        args.preset()
    )];
    for l in &listed {
        let t = &l.transaction;
        let mut line = format!(
            "{:>4}  {}  {}  {}  {}",
            l.index,
            t.date.format(DATE_FORMAT),
            t.flow,
            t.category,
            t.amount.display_with(symbol)
        );
        if !t.note.is_empty() {
            line.push_str(&format!("  {}", t.note));
        }
        lines.push(line);
    }
    let issues = transactions.issues().len();
    if issues > 0 {
        lines.push(format!(
            "{} in the sheet could not be read cleanly, see the warnings above",
            plural(issues, "row")
        ));
    }

    Ok(Out::new(lines.join("\n"), listed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Preset;
    use crate::test::TestEnv;
    use crate::ErrorType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    const ROWS: &[&[&str]] = &[
        &["2024-02-28", "支出", "餐飲", "100", ""],
        &["2024-03-01", "收入", "薪資", "5000", "March"],
        &["2024-03-10", "支出", "交通", "30", ""],
    ];

    #[tokio::test]
    async fn test_list_this_month_keeps_ledger_indexes() {
        let env = TestEnv::with_rows(ROWS).await;
        let out = list(&env.config(), Mode::Test, &WindowArgs::default(), today())
            .await
            .unwrap();
        let listed = out.structure().unwrap();
        let indexes: Vec<usize> = listed.iter().map(|l| l.index).collect();
        assert_eq!(indexes, vec![2, 3]);
        assert!(out.message().starts_with("2 transactions (this-month)"));
        assert!(out.message().contains("NT$ 5,000  March"), "{}", out.message());
    }

    #[tokio::test]
    async fn test_list_all() {
        let env = TestEnv::with_rows(ROWS).await;
        let args = WindowArgs {
            preset: Some(Preset::All),
            ..WindowArgs::default()
        };
        let out = list(&env.config(), Mode::Test, &args, today()).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_all_empty_sheet() {
        let env = TestEnv::with_rows(&[]).await;
        let args = WindowArgs {
            preset: Some(Preset::All),
            ..WindowArgs::default()
        };
        let out = list(&env.config(), Mode::Test, &args, today()).await.unwrap();
        assert!(out.structure().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_custom_missing_end() {
        let env = TestEnv::with_rows(ROWS).await;
        let args = WindowArgs {
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..WindowArgs::default()
        };
        let err = list(&env.config(), Mode::Test, &args, today())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
    }

    #[tokio::test]
    async fn test_list_mentions_unreadable_rows() {
        let mut with_bad = ROWS.to_vec();
        with_bad.push(&["someday", "支出", "餐飲", "1", ""]);
        let env = TestEnv::with_rows(&with_bad).await;
        let out = list(&env.config(), Mode::Test, &WindowArgs::default(), today())
            .await
            .unwrap();
        assert!(out.message().contains("1 row in the sheet"));
    }
}
