//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets (see `LEDGER_IN_TEST_MODE`).
//!
//! The data lives in process-wide state keyed by spreadsheet id, so every `TestSheet` created for
//! the same id, e.g. by successive commands, sees the same rows. A spreadsheet id that has never
//! been used starts out with the seed data from this module.

use crate::api::Sheet;
use crate::error::Res;
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard, OnceLock};

static STATE: OnceLock<Mutex<HashMap<String, TestSheetState>>> = OnceLock::new();

/// The contents of one in-memory spreadsheet tab.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct TestSheetState {
    pub(crate) rows: Vec<Vec<String>>,
    /// When true, every call fails the way an unreachable sheet would.
    pub(crate) offline: bool,
}

impl TestSheetState {
    pub(crate) fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            offline: false,
        }
    }

    /// The seed data from this module.
    pub(crate) fn seeded() -> Self {
        Self::new(load_csv(SEED_DATA).unwrap_or_default())
    }
}

/// An implementation of the `Sheet` trait that does not use Google sheets.
pub(crate) struct TestSheet {
    id: String,
}

impl TestSheet {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Returns a copy of the current state of the sheet with `id`.
    pub(crate) fn get_state(id: &str) -> TestSheetState {
        let mut map = lock();
        map.entry(id.to_string())
            .or_insert_with(TestSheetState::seeded)
            .clone()
    }

    /// Overwrites the state of the sheet with `id`.
    pub(crate) fn set_state(id: &str, state: TestSheetState) {
        lock().insert(id.to_string(), state);
    }

    /// Runs `f` on the state of this sheet, failing if the sheet has been set offline.
    fn with_state<T>(&self, f: impl FnOnce(&mut TestSheetState) -> T) -> Res<T> {
        let mut map = lock();
        let state = map
            .entry(self.id.clone())
            .or_insert_with(TestSheetState::seeded);
        if state.offline {
            bail!("The test sheet '{}' is offline", self.id);
        }
        Ok(f(state))
    }
}

fn lock() -> MutexGuard<'static, HashMap<String, TestSheetState>> {
    STATE
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        // A panicking test must not break the others
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn read_all(&mut self) -> Res<Vec<Vec<String>>> {
        self.with_state(|state| state.rows.clone())
    }

    async fn append_row(&mut self, values: &[String]) -> Res<()> {
        self.with_state(|state| state.rows.push(values.to_vec()))
    }

    async fn replace_all(&mut self, header: &[String], rows: &[Vec<String>]) -> Res<()> {
        self.with_state(|state| {
            state.rows = std::iter::once(header.to_vec())
                .chain(rows.iter().cloned())
                .collect();
        })
    }
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Res<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.context("Unable to read the seed CSV data")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed ledger data. Amounts are formatted the way the sheet renders them.
const SEED_DATA: &str = r##"日期,類型,類別,金額,備註
2025-10-01,收入,薪資,"52,000",十月薪資
2025-10-01,支出,房租,"15,000",
2025-10-02,支出,餐飲,120,早餐
2025-10-03,支出,交通,"1,280",月票
2025-10-05,支出,購物,890,日用品
2025-10-08,支出,餐飲,450,朋友聚餐
2025-10-10,收入,兼職,"3,500",翻譯案
2025-10-12,支出,娛樂,320,電影
2025-10-15,支出,醫療,200,掛號費
2025-10-18,支出,寵物,650,貓砂
2025-10-20,支出,社交,"1,200",婚禮紅包
2025-10-22,收入,投資,"1,850",股利
2025-10-25,支出,美容,800,剪髮
2025-10-28,支出,其他,99,
"##;
