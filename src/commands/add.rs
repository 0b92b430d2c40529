//! The `add` command, which records one transaction.

use crate::api::{self, Mode};
use crate::args::AddArgs;
use crate::commands::Out;
use crate::model::{Transaction, OTHER_CATEGORY};
use crate::{Config, Result};
use chrono::NaiveDate;
use tracing::warn;

/// Appends a new transaction to the sheet.
///
/// `date` defaults to `today` and `category` to 其他. A category that is not among the suggested
/// categories is accepted with a warning.
///
/// # Errors
/// - A `Validation` error, before anything is written, if the amount is not greater than zero.
/// - A `Parse` error if the sheet does not start with the ledger header.
/// - A `Connection` error if the sheet cannot be reached.
pub async fn add(
    config: &Config,
    mode: Mode,
    args: &AddArgs,
    today: NaiveDate,
) -> Result<Out<Transaction>> {
    let category = args
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(OTHER_CATEGORY);
    let transaction = Transaction::new(
        args.date.unwrap_or(today),
        args.flow,
        category,
        args.amount,
        args.note.clone().unwrap_or_default(),
    );

    let suggested = config.suggested_categories(args.flow);
    if !suggested.iter().any(|c| c == category) {
        warn!(
            "'{category}' is not one of the suggested {} categories: {}",
            args.flow,
            suggested.join(", ")
        );
    }

    let mut ledger = api::ledger(config, mode).await?;
    ledger.insert(&transaction).await?;

    let mut message = format!(
        "Added {} {} {} on {}",
        transaction.flow,
        transaction.category,
        transaction.amount.display_with(config.currency_symbol()),
        transaction.date,
    );
    if !transaction.note.is_empty() {
        message.push_str(&format!(" ({})", transaction.note));
    }
    Ok(Out::new(message, transaction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestSheetState;
    use crate::model::{Amount, Flow, HEADER};
    use crate::test::TestEnv;
    use crate::ErrorType;
    use std::str::FromStr;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 31).unwrap()
    }

    fn args(flow: Flow, amount: &str) -> AddArgs {
        AddArgs {
            flow,
            date: None,
            category: None,
            amount: Amount::from_str(amount).unwrap(),
            note: None,
        }
    }

    #[tokio::test]
    async fn test_add_defaults() {
        let env = TestEnv::with_rows(&[]).await;
        let out = add(&env.config(), Mode::Test, &args(Flow::Expense, "120"), today())
            .await
            .unwrap();
        assert!(out.message().contains("NT$ 120"), "{}", out.message());
        assert_eq!(
            env.data_rows(),
            vec![vec!["2025-10-31", "支出", "其他", "120", ""]]
        );
    }

    #[tokio::test]
    async fn test_add_all_fields() {
        let env = TestEnv::with_rows(&[&["2025-10-01", "收入", "薪資", "52000", ""]]).await;
        let add_args = AddArgs {
            date: NaiveDate::from_ymd_opt(2025, 10, 2),
            category: Some("餐飲".to_string()),
            note: Some("午餐".to_string()),
            ..args(Flow::Expense, "1,280.5")
        };
        let out = add(&env.config(), Mode::Test, &add_args, today())
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().note, "午餐");
        let rows = env.data_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["2025-10-02", "支出", "餐飲", "1280.5", "午餐"]);
    }

    #[tokio::test]
    async fn test_add_to_empty_sheet_writes_header() {
        let env = TestEnv::new().await;
        env.set_state(TestSheetState::default());
        add(&env.config(), Mode::Test, &args(Flow::Income, "10"), today())
            .await
            .unwrap();
        let rows = env.get_state().rows;
        assert_eq!(rows[0], HEADER.to_vec());
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_add_zero_is_rejected() {
        let env = TestEnv::with_rows(&[]).await;
        let before = env.get_state();
        let err = add(&env.config(), Mode::Test, &args(Flow::Expense, "0"), today())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert_eq!(env.get_state(), before);
    }

    #[tokio::test]
    async fn test_add_unsuggested_category_is_accepted() {
        let env = TestEnv::with_rows(&[]).await;
        let add_args = AddArgs {
            category: Some("Gadgets".to_string()),
            ..args(Flow::Expense, "5")
        };
        add(&env.config(), Mode::Test, &add_args, today())
            .await
            .unwrap();
        assert_eq!(env.data_rows()[0][2], "Gadgets");
    }

    #[tokio::test]
    async fn test_add_offline() {
        let env = TestEnv::with_rows(&[]).await;
        let mut state = env.get_state();
        state.offline = true;
        env.set_state(state);
        let err = add(&env.config(), Mode::Test, &args(Flow::Expense, "5"), today())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Connection);
    }
}
