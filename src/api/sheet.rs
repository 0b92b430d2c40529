//! Implements the `Sheet` trait using the `sheets::Client` to interact with a Google sheet.

use crate::api::{Sheet, TokenProvider};
use crate::error::Res;
use crate::model::Column;
use crate::Config;
use anyhow::Context;
use sheets::types::{
    BatchClearValuesRequest, BatchUpdateValuesRequest, DateTimeRenderOption, Dimension,
    ValueInputOption, ValueRange, ValueRenderOption,
};
use sheets::ClientError;
use tracing::trace;

/// The ledger only ever uses the first five columns.
const COLUMNS: &str = "A:E";

/// Implements the `Sheet` trait using the `sheets::Client` to interact with a Google sheet. It
/// takes a `TokenProvider`, on which it calls refresh to keep the token up-to-date.
pub(super) struct GoogleSheet {
    config: Config,
    token_provider: TokenProvider,
    client: sheets::Client,
}

impl GoogleSheet {
    pub(super) async fn new(config: Config, mut token_provider: TokenProvider) -> Res<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            config,
            token_provider,
            client,
        })
    }

    /// Refreshes the sheets client with a new access token if needed
    async fn refresh_client(&mut self) -> Res<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }

    fn range(&self, cells: &str) -> String {
        range(self.config.worksheet(), cells)
    }

    async fn write(&mut self, range: String, values: Vec<Vec<String>>) -> Res<()> {
        let request = BatchUpdateValuesRequest {
            data: vec![ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: range.clone(),
                values: values.iter().map(|row| user_entered(row)).collect(),
            }],
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            // Amounts become numbers, every other cell is protected by `user_entered`
            value_input_option: Some(ValueInputOption::UserEntered),
        };

        self.client
            .spreadsheets()
            .values_batch_update(self.config.spreadsheet_id(), &request)
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to write {range}"))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn read_all(&mut self) -> Res<Vec<Vec<String>>> {
        let range = self.range(COLUMNS);
        trace!("read_all for {range}");
        self.refresh_client().await?;
        let response = self
            .client
            .spreadsheets()
            .values_get(
                self.config.spreadsheet_id(),
                &range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch sheet data for {range}"))?;
        Ok(response.body.values)
    }

    async fn append_row(&mut self, values: &[String]) -> Res<()> {
        // The values API trims trailing empty rows, so the row count is the last used row
        let used_rows = self.read_all().await?.len();
        let row = used_rows + 1;
        let range = self.range(&format!("A{row}"));
        trace!("append_row at {range}");
        self.write(range, vec![values.to_vec()]).await
    }

    async fn replace_all(&mut self, header: &[String], rows: &[Vec<String>]) -> Res<()> {
        self.refresh_client().await?;
        let clear_range = self.range(COLUMNS);
        let request = BatchClearValuesRequest {
            ranges: vec![clear_range.clone()],
        };
        self.client
            .spreadsheets()
            .values_batch_clear(self.config.spreadsheet_id(), &request)
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to clear {clear_range}"))?;

        let mut values = Vec::with_capacity(rows.len() + 1);
        values.push(header.to_vec());
        values.extend(rows.iter().cloned());
        let range = self.range("A1");
        trace!("replace_all writing {} rows to {range}", values.len());
        self.write(range, values).await
    }
}

/// Prepares a row for a `USER_ENTERED` write. Only the amount column is left for the sheet to
/// interpret. Every other non-empty cell gets a leading apostrophe so that the sheet stores it as
/// literal text: otherwise `2024-01-05` turns into a locale-formatted date, `0912345678` loses its
/// leading zero and `=1+1` becomes a formula. The apostrophe is not part of the formatted value
/// that `read_all` gets back.
fn user_entered(row: &[String]) -> Vec<String> {
    row.iter()
        .enumerate()
        .map(|(ix, cell)| {
            if ix == Column::Amount.index() || cell.is_empty() {
                cell.clone()
            } else {
                format!("'{cell}")
            }
        })
        .collect()
}

/// Builds an A1-notation range, prefixed with the quoted worksheet name when there is one.
fn range(worksheet: Option<&str>, cells: &str) -> String {
    match worksheet {
        Some(name) => format!("'{}'!{cells}", name.replace('\'', "''")),
        None => cells.to_string(),
    }
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Res<sheets::Client> {
    let access_token = token_provider.token_with_refresh().await?;

    // Only the access token is used for API calls, refresh is handled by the TokenProvider
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token.to_string(),
        String::new(),
    ))
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let kind = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        _ => "ClientError".to_string(),
    };
    anyhow::Error::new(e).context(kind)
}
