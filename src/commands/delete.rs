//! The `delete` command, which removes transactions and rewrites the sheet.

use crate::api::Mode;
use crate::args::DeleteArgs;
use crate::commands::{open, plural, position, replace, Out};
use crate::error::Error;
use crate::model::Transaction;
use crate::{Config, Result};
use std::collections::BTreeSet;

/// Deletes the transactions at `args.indexes` (1-based, as shown by `list`), or all of them when
/// `args.all` is set, and writes the remaining ledger back. Repeated indexes are deleted once.
///
/// # Errors
/// - A `Validation` error if nothing is selected, if an index is out of range, or if the sheet has
///   unreadable rows and `drop_rejected` is not set. Nothing is written.
pub async fn delete(config: &Config, mode: Mode, args: &DeleteArgs) -> Result<Out<Vec<Transaction>>> {
    if !args.all && args.indexes.is_empty() {
        return Err(Error::validation(
            "Nothing to delete, give the indexes of the transactions or --all",
        ));
    }

    let (mut ledger, snapshot) = open(config, mode).await?;
    let selected: BTreeSet<usize> = if args.all {
        (0..snapshot.len()).collect()
    } else {
        args.indexes
            .iter()
            .map(|&index| position(index, &snapshot))
            .collect::<Result<_>>()?
    };

    let (deleted, kept): (Vec<_>, Vec<_>) = snapshot
        .data()
        .iter()
        .cloned()
        .enumerate()
        .partition(|(ix, _)| selected.contains(ix));
    let deleted: Vec<Transaction> = deleted.into_iter().map(|(_, t)| t).collect();
    let kept: Vec<Transaction> = kept.into_iter().map(|(_, t)| t).collect();

    if deleted.is_empty() {
        return Ok(Out::new("The ledger is already empty", deleted));
    }

    replace(config, ledger.as_mut(), &snapshot, &kept, args.drop_rejected).await?;
    Ok(Out::new(
        format!(
            "Deleted {}, {} left",
            plural(deleted.len(), "transaction"),
            kept.len()
        ),
        deleted,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use crate::ErrorType;

    const ROWS: &[&[&str]] = &[
        &["2024-01-01", "支出", "A", "1", ""],
        &["2024-01-02", "支出", "B", "2", ""],
        &["2024-01-03", "支出", "C", "3", ""],
    ];

    fn categories(env: &TestEnv) -> Vec<String> {
        env.data_rows().into_iter().map(|r| r[2].clone()).collect()
    }

    #[tokio::test]
    async fn test_delete_indexes() {
        let env = TestEnv::with_rows(ROWS).await;
        let args = DeleteArgs {
            indexes: vec![3, 1, 3],
            ..DeleteArgs::default()
        };
        let out = delete(&env.config(), Mode::Test, &args).await.unwrap();
        assert_eq!(out.message(), "Deleted 2 transactions, 1 left");
        let deleted: Vec<&str> = out
            .structure()
            .unwrap()
            .iter()
            .map(|t| t.category.as_str())
            .collect();
        assert_eq!(deleted, vec!["A", "C"]);
        assert_eq!(categories(&env), vec!["B"]);
        assert_eq!(env.backup_files().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_all_leaves_header() {
        let env = TestEnv::with_rows(ROWS).await;
        let args = DeleteArgs {
            all: true,
            ..DeleteArgs::default()
        };
        delete(&env.config(), Mode::Test, &args).await.unwrap();
        let state = env.get_state();
        assert_eq!(state.rows.len(), 1);
        assert!(env.data_rows().is_empty());
    }

    #[tokio::test]
    async fn test_delete_empty_selection() {
        let env = TestEnv::with_rows(ROWS).await;
        let err = delete(&env.config(), Mode::Test, &DeleteArgs::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert_eq!(categories(&env), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_delete_out_of_range_deletes_nothing() {
        let env = TestEnv::with_rows(ROWS).await;
        let args = DeleteArgs {
            indexes: vec![1, 4],
            ..DeleteArgs::default()
        };
        let err = delete(&env.config(), Mode::Test, &args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert_eq!(categories(&env), vec!["A", "B", "C"]);
        assert!(env.backup_files().is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_on_empty_ledger() {
        let env = TestEnv::with_rows(&[]).await;
        let args = DeleteArgs {
            all: true,
            ..DeleteArgs::default()
        };
        let out = delete(&env.config(), Mode::Test, &args).await.unwrap();
        assert!(out.structure().unwrap().is_empty());
        assert!(env.backup_files().is_empty());
    }

    #[tokio::test]
    async fn test_delete_refuses_with_rejected_rows() {
        let env = TestEnv::with_rows(&[
            &["2024-01-01", "支出", "A", "1", ""],
            &["2024-01-02", "轉帳", "B", "2", ""],
        ])
        .await;
        let args = DeleteArgs {
            all: true,
            ..DeleteArgs::default()
        };
        let err = delete(&env.config(), Mode::Test, &args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        assert_eq!(env.data_rows().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_offline() {
        let env = TestEnv::with_rows(ROWS).await;
        let mut state = env.get_state();
        state.offline = true;
        env.set_state(state);
        let args = DeleteArgs {
            indexes: vec![1],
            ..DeleteArgs::default()
        };
        let err = delete(&env.config(), Mode::Test, &args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Connection);
    }
}
