//! The `update` command, which edits one transaction and rewrites the sheet.

use crate::api::Mode;
use crate::args::UpdateArgs;
use crate::commands::{open, position, replace, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Transaction;
use crate::{Config, Result};
use tracing::debug;

/// Changes the fields given in `args` on the transaction at `args.index` (1-based, as shown by
/// `list`) and writes the whole ledger back.
///
/// # Errors
/// - A `Validation` error if the index is out of range, if a new amount is not greater than zero,
///   or if the sheet has unreadable rows and `drop_rejected` is not set. Nothing is written.
pub async fn update(config: &Config, mode: Mode, args: &UpdateArgs) -> Result<Out<Transaction>> {
    let (mut ledger, snapshot) = open(config, mode).await?;
    let ix = position(args.index, &snapshot)?;

    let mut transactions = snapshot.data().to_vec();
    let before = transactions[ix].clone();
    let edited = &mut transactions[ix];
    if let Some(date) = args.date {
        edited.date = date;
    }
    if let Some(flow) = args.flow {
        edited.flow = flow;
    }
    if let Some(category) = &args.category {
        edited.category = category.trim().to_string();
    }
    if let Some(amount) = args.amount {
        edited.amount = amount;
        edited.validate().pub_result(ErrorType::Validation)?;
    }
    if let Some(note) = &args.note {
        edited.note = note.clone();
    }
    let edited = edited.clone();

    if edited == before {
        return Ok(Out::new(
            format!("Transaction {} is unchanged", args.index),
            edited,
        ));
    }
    debug!("Updating transaction {}: {before:?} -> {edited:?}", args.index);

    replace(
        config,
        ledger.as_mut(),
        &snapshot,
        &transactions,
        args.drop_rejected,
    )
    .await?;
    Ok(Out::new(
        format!(
            "Updated transaction {}: {} {} {} on {}",
            args.index,
            edited.flow,
            edited.category,
            edited.amount.display_with(config.currency_symbol()),
            edited.date
        ),
        edited,
    ))
}
