use crate::api::Mode;
use crate::args::WindowArgs;
use crate::commands::{open, plural, Out};
use crate::report::{CategoryShare, Report};
use crate::{Config, Result};
use chrono::NaiveDate;

/// Builds the report for the requested window: totals, net, and the breakdown by category.
pub async fn report(
    config: &Config,
    mode: Mode,
    args: &WindowArgs,
    today: NaiveDate,
) -> Result<Out<Report>> {
    let (_, transactions) = open(config, mode).await?;
    let report = Report::build(
        transactions.data(),
        args.preset(),
        today,
        args.start,
        args.end,
    )?;
    let message = render(&report, config.currency_symbol());
    Ok(Out::new(message, report))
}

fn render(report: &Report, symbol: &str) -> String {
    let window = match &report.window {
        Some(window) => format!("{} to {}", window.start, window.last_day()),
        None => "no transactions".to_string(),
    };
    let summary = &report.summary;
    let badge = if summary.is_surplus() {
        "saved"
    } else {
        "overdrawn"
    };
    let mut lines = vec![
        format!(
            "Report for {window} ({}), {}",
            report.preset,
            plural(report.count, "transaction")
        ),
        format!("Income:  {}", summary.total_income.display_with(symbol)),
        format!("Expense: {}", summary.total_expense.display_with(symbol)),
        format!("Net:     {} ({badge})", summary.net.display_with(symbol)),
    ];
    render_shares(&mut lines, "Expenses by category", &report.expenses, symbol);
    render_shares(&mut lines, "Income by category", &report.income, symbol);
    lines.join("\n")
}

fn render_shares(lines: &mut Vec<String>, title: &str, shares: &[CategoryShare], symbol: &str) {
    if shares.is_empty() {
        return;
    }
    lines.push(format!("{title}:"));
    for share in shares {
        lines.push(format!(
            "  {}  {}  {}%",
            share.category,
            share.amount.display_with(symbol),
            share.percent.normalize()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use crate::report::Preset;
    use crate::test::TestEnv;
    use std::str::FromStr;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
    }

    #[tokio::test]
    async fn test_report_example() {
        let env = TestEnv::with_rows(&[
            &["2024-01-01", "支出", "Food", "100", ""],
            &["2024-01-05", "收入", "Salary", "5,000", ""],
        ])
        .await;
        let out = report(&env.config(), Mode::Test, &WindowArgs::default(), today())
            .await
            .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.summary.net, Amount::from_str("4900").unwrap());
        assert_eq!(report.expenses[0].category, "Food");

        let message = out.message();
        assert!(message.contains("2024-01-01 to 2024-01-20"), "{message}");
        assert!(message.contains("Income:  NT$ 5,000"), "{message}");
        assert!(message.contains("Net:     NT$ 4,900 (saved)"), "{message}");
        assert!(message.contains("  Food  NT$ 100  100%"), "{message}");
    }

    #[tokio::test]
    async fn test_report_overdrawn() {
        let env = TestEnv::with_rows(&[&["2024-01-02", "支出", "Rent", "900", ""]]).await;
        let out = report(&env.config(), Mode::Test, &WindowArgs::default(), today())
            .await
            .unwrap();
        assert!(out.message().contains("-NT$ 900 (overdrawn)"), "{}", out.message());
        assert!(!out.message().contains("Income by category"));
    }

    #[tokio::test]
    async fn test_report_all_on_empty_ledger() {
        let env = TestEnv::with_rows(&[]).await;
        let args = WindowArgs {
            preset: Some(Preset::All),
            ..WindowArgs::default()
        };
        let out = report(&env.config(), Mode::Test, &args, today())
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().count, 0);
        assert!(out.message().starts_with("Report for no transactions (all), 0 transactions"));
    }

    #[tokio::test]
    async fn test_report_seed_data() {
        let env = TestEnv::new().await;
        let args = WindowArgs {
            preset: Some(Preset::All),
            ..WindowArgs::default()
        };
        let out = report(&env.config(), Mode::Test, &args, today())
            .await
            .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.count, 14);
        assert_eq!(report.expenses[0].category, "房租");
        assert_eq!(
            report.summary.total_income,
            Amount::from_str("57350").unwrap()
        );
    }
}
