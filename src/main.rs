//! Sheetledger main entry point

use anyhow::{bail, Context};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sheetledger_config::{Config, ConfigError};
use sheetledger_core::{AccountSnapshot, CoreError, Direction, Ledger, TransactionDraft};
use sheetledger_utils::{format_amount, format_liters};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "sheetledger")]
#[command(version = "0.1.0")]
#[command(about = "Month balances for a spreadsheet expense ledger", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Balance snapshot for a month
    Snapshot {
        #[arg(short, long)]
        month: Option<u32>,
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Transactions dated in a month
    List {
        #[arg(short, long)]
        month: Option<u32>,
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Expenses by category for a month
    Breakdown {
        #[arg(short, long)]
        month: Option<u32>,
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Monthly income and expenses for a year
    Year {
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Append a transaction
    Add {
        #[arg(long)]
        date: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: Decimal,
        /// income or expense
        #[arg(long, default_value = "expense")]
        direction: Direction,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        sub_category: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long)]
        payment_method: Option<String>,
        #[arg(long)]
        receipt: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Clear the transaction at a sheet row
    Delete {
        #[arg(long)]
        row: usize,
    },
    /// Write the default configuration file
    InitConfig {
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Load the config file, falling back to defaults when it does not exist
fn load_config(path: &PathBuf) -> anyhow::Result<(Config, bool)> {
    match Config::load(path.clone()) {
        Ok(config) => Ok((config, true)),
        Err(ConfigError::FileNotFound { .. }) => Ok((Config::default(), false)),
        Err(e) => Err(e).with_context(|| format!("Failed to load configuration from {}", path.display())),
    }
}

fn resolve_period(month: Option<u32>, year: Option<i32>) -> (u32, i32) {
    let today = Utc::now().date_naive();
    (month.unwrap_or(today.month()), year.unwrap_or(today.year()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_snapshot(snapshot: &AccountSnapshot, currency: &str) {
    println!("Snapshot {:02}/{}", snapshot.month, snapshot.year);
    println!("  Beginning balance   {}", format_amount(snapshot.beginning_balance, currency));
    println!("  Advanced (account)  {}", format_amount(snapshot.total_advanced_account, currency));
    println!("  Advanced (cash)     {}", format_amount(snapshot.total_advanced_cash, currency));
    println!("  Account expenses    {}", format_amount(snapshot.account_expenses, currency));
    println!("  Cash expenses       {}", format_amount(snapshot.cash_expenses, currency));
    println!("  Current balance     {}", format_amount(snapshot.current_balance, currency));
    println!("  Cash remaining      {}", format_amount(snapshot.cash_remaining, currency));
    println!("  Total expense       {}", format_amount(snapshot.total_expense, currency));
    println!("  Fuel                {}", format_liters(snapshot.total_fuel_liters));
    println!("  Transactions        {}", snapshot.transaction_count);
}

fn init_config(output: &PathBuf, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    std::fs::write(output, Config::generate_default())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}

async fn run(command: Command, config: Config, json: bool) -> anyhow::Result<()> {
    let currency = config.currency.default_currency.clone();
    let ledger = Ledger::from_config(config);

    match command {
        Command::Snapshot { month, year } => {
            let (month, year) = resolve_period(month, year);
            let snapshot = ledger.compute_snapshot(month, year).await;
            if json {
                print_json(&snapshot)?;
            } else {
                print_snapshot(&snapshot, &currency);
            }
        }
        Command::List { month, year } => {
            let (month, year) = resolve_period(month, year);
            let transactions = ledger
                .transactions_for_month(month, year)
                .await
                .context("Failed to read transactions")?;
            if json {
                print_json(&*transactions)?;
            } else {
                for tx in transactions.iter() {
                    println!("{:>5}  {:<8} {}", tx.row_position, tx.ledger.to_string(), tx.summary());
                }
                println!("{} transaction(s)", transactions.len());
            }
        }
        Command::Breakdown { month, year } => {
            let (month, year) = resolve_period(month, year);
            let report = ledger
                .category_breakdown(month, year)
                .await
                .context("Failed to build category breakdown")?;
            if json {
                print_json(&report)?;
            } else {
                for entry in &report.entries {
                    println!(
                        "{:<24} {:>20} {:>6.1}% ({})",
                        entry.category,
                        format_amount(entry.amount, &report.currency),
                        entry.percentage,
                        entry.count
                    );
                }
                println!("{:<24} {:>20}", "Total", format_amount(report.total, &report.currency));
            }
        }
        Command::Year { year } => {
            let (_, year) = resolve_period(None, year);
            let overview = ledger.year_overview(year).await.context("Failed to build year overview")?;
            if json {
                print_json(&overview)?;
            } else {
                for summary in &overview.summaries {
                    println!(
                        "{:02}/{}  in {:>20}  out {:>20}  net {:>20}",
                        summary.month,
                        overview.year,
                        format_amount(summary.income, &currency),
                        format_amount(summary.expenses, &currency),
                        format_amount(summary.net_income, &currency)
                    );
                }
                println!("Net for {}: {}", overview.year, format_amount(overview.net_income, &currency));
            }
        }
        Command::Add {
            date,
            category,
            amount,
            direction,
            description,
            sub_category,
            quantity,
            payment_method,
            receipt,
            note,
        } => {
            let draft = TransactionDraft {
                date,
                category,
                sub_category,
                description,
                amount,
                direction,
                receipt_ref: receipt,
                quantity,
                payment_method,
                note,
            };
            let position = ledger.add_transaction(draft).await.context("Failed to add transaction")?;
            println!("Added at row {}", position);
        }
        Command::Delete { row } => {
            ledger
                .delete_transaction(row)
                .await
                .with_context(|| format!("Failed to delete row {}", row))?;
            println!("Cleared row {}", row);
        }
        Command::InitConfig { output, force } => init_config(&output, force)?,
    }

    Ok(())
}

/// Failure text for stderr, with code and hints when the cause is a known error
fn failure_report(error: &anyhow::Error) -> String {
    let details = if let Some(core) = error.downcast_ref::<CoreError>() {
        Some(core.to_details().to_string())
    } else {
        error.downcast_ref::<ConfigError>().map(|config| config.to_details().to_string())
    };
    match details {
        Some(details) => format!("Error: {}\n{}", error, details),
        None => format!("Error: {:#}", error),
    }
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_report(&e));
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Command::InitConfig { output, force } = &args.command {
        return init_config(output, *force);
    }

    let (config, found) = load_config(&args.config)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str()))
        .init();
    if found {
        log::info!("Config loaded: sheet={}", config.data.path.display());
    } else {
        log::warn!("Config file {} not found, using defaults", args.config.display());
    }

    let rt = Runtime::new()?;
    rt.block_on(run(args.command, config, args.json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_report_shows_core_details() {
        let error = anyhow::Error::new(CoreError::InvalidPeriod { month: 13, year: 2025 })
            .context("Failed to build category breakdown");
        let report = failure_report(&error);
        assert!(report.starts_with("Error: Failed to build category breakdown"));
        assert!(report.contains("[INVALID_PERIOD]"));
        assert!(report.contains("Months are numbered 1 to 12."));
    }

    #[test]
    fn test_failure_report_shows_config_hints() {
        let error = anyhow::Error::new(ConfigError::InvalidYaml { message: "bad indent".to_string() })
            .context("Failed to load configuration from config.yaml");
        let report = failure_report(&error);
        assert!(report.contains("[INVALID_YAML]"));
        assert!(report.contains("hint: "));
    }

    #[test]
    fn test_failure_report_plain_error() {
        let error = anyhow::anyhow!("config.yaml already exists");
        assert_eq!(failure_report(&error), "Error: config.yaml already exists");
    }
}
