use clap::Parser;
use sheet_ledger::args::{Args, Command};
use sheet_ledger::{commands, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().ledger_home().path();

    // When LEDGER_IN_TEST_MODE is set to anything but "", "0" or "false", the ledger is kept in an
    // in-memory sheet seeded with sample data instead of Google Sheets.
    let mode = Mode::from_env();
    let today = chrono::Local::now().date_naive();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args).await?.print(),

        Command::Add(add_args) => {
            let config = commands::load_config(home).await?;
            commands::add(&config, mode, add_args, today).await?.print()
        }

        Command::List(window_args) => {
            let config = commands::load_config(home).await?;
            commands::list(&config, mode, window_args, today)
                .await?
                .print()
        }

        Command::Report(window_args) => {
            let config = commands::load_config(home).await?;
            commands::report(&config, mode, window_args, today)
                .await?
                .print()
        }

        Command::Update(update_args) => {
            let config = commands::load_config(home).await?;
            commands::update(&config, mode, update_args).await?.print()
        }

        Command::Delete(delete_args) => {
            let config = commands::load_config(home).await?;
            commands::delete(&config, mode, delete_args).await?.print()
        }

        Command::Categories(categories_args) => {
            let config = commands::load_config(home).await?;
            commands::categories(&config, categories_args).print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the given level for the library and binary only.
            EnvFilter::new(format!(
                "sheet_ledger={},{}={}",
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
