//! A personal expense and income ledger kept in a Google sheet.
//!
//! The sheet is the only store. [`Ledger`] loads and rewrites it, [`report`] turns a snapshot of
//! transactions into totals and category breakdowns for a time window, and [`commands`] holds the
//! handlers behind the `ledger` CLI.

mod api;
pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod report;
mod utils;


pub use api::{ledger, Ledger, Mode, LEDGER_IN_TEST_MODE};
pub use config::Config;
pub use error::{Error, ErrorType, Result};
