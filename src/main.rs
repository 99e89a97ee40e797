//! Finboard command line entry point

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use finboard_config::Config;
use finboard_core::{Dashboard, MoneyFormatter, ReportPeriod, Snapshot};
use finboard_utils::format_number;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "finboard")]
#[command(version = "0.1.0")]
#[command(about = "Multi-currency reports for a personal-finance dashboard", long_about = None)]
struct Args {
    /// Configuration file path; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snapshot file, overriding data.snapshot_path
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Display currency, overriding currency.default_currency
    #[arg(long)]
    currency: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a single amount
    Convert { amount: f64, from: String, to: String },
    /// System-wide totals
    Overview,
    /// One user's all-time totals
    User { user_id: String },
    /// Current month against the previous one
    Monthly {
        user_id: String,
        /// Any day in the month to report (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Budget progress, for everyone or one user
    Budgets {
        user_id: Option<String>,
        /// Totals over the user's active budgets
        #[arg(long, requires = "user_id")]
        summary: bool,
    },
    /// Savings goal progress, for everyone or one user
    Savings {
        user_id: Option<String>,
        #[arg(long, requires = "user_id")]
        summary: bool,
    },
    /// Largest expense categories
    Categories {
        user_id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Most recent transactions
    Activity {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Amounts to store after a currency change
    Rebase { user_id: String, currency: String },
    /// Every transaction with a running balance
    Ledger,
    /// Allocated against spent for every budget
    Variance,
    /// Income statement over a period
    Financials {
        /// all, month, quarter or year
        #[arg(long, default_value_t = ReportPeriod::All)]
        period: ReportPeriod,
        /// Day the period ends on (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Configuration {}: {}", err.severity(), err.to_details());
                bail!("Failed to load configuration from {}", path.display());
            }
        },
        None => Config::default(),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level)).init();

    let Some(command) = args.command else {
        bail!("No command given; run with --help for the list");
    };

    let formatter = MoneyFormatter::new(&config.currency);

    let snapshot = if matches!(command, Command::Convert { .. }) {
        Snapshot::default()
    } else {
        let path = args.snapshot.clone().unwrap_or_else(|| config.data.snapshot_path.clone());
        log::info!("Loading snapshot from {}", path.display());
        let snapshot = Snapshot::load(&path)
            .with_context(|| format!("Failed to load snapshot from {}", path.display()))?;
        if !snapshot.rejected.is_empty() {
            log::warn!("{} records were rejected while loading", snapshot.rejected.len());
        }
        snapshot
    };

    let mut dashboard = Dashboard::from_config(&config, snapshot)?;
    if let Some(code) = &args.currency {
        dashboard.set_display_currency(code);
    }

    match command {
        Command::Convert { amount, from, to } => {
            let result = dashboard
                .rates()
                .convert_for_display(amount, &from.to_uppercase(), &to.to_uppercase());
            match args.format {
                OutputFormat::Json => print_json(&result),
                OutputFormat::Text => {
                    println!(
                        "{} = {} ({})",
                        formatter.money(result.original_amount, &result.original_currency),
                        formatter.converted(&result),
                        result.label
                    );
                    Ok(())
                }
            }
        }
        Command::Overview => {
            let overview = dashboard.admin_overview();
            match args.format {
                OutputFormat::Json => print_json(&overview),
                OutputFormat::Text => {
                    let code = overview.currency.as_str();
                    println!(
                        "Users: {}  Transactions: {}",
                        format_number(overview.user_count),
                        format_number(overview.transaction_count)
                    );
                    println!(
                        "Active budgets: {}  Savings goals: {}",
                        format_number(overview.active_budget_count),
                        format_number(overview.savings_goal_count)
                    );
                    println!("Income:   {}", formatter.money(overview.income.total, code));
                    println!("          {}", formatter.breakdown_text(&overview.income.breakdown));
                    println!("Expenses: {}", formatter.money(overview.expenses.total, code));
                    println!("          {}", formatter.breakdown_text(&overview.expenses.breakdown));
                    println!("Net:      {}", formatter.money(overview.net_balance, code));
                    Ok(())
                }
            }
        }
        Command::User { user_id } => {
            let summary = dashboard.user_summary(&user_id)?;
            match args.format {
                OutputFormat::Json => print_json(&summary),
                OutputFormat::Text => {
                    println!("{} <{}> ({})", summary.name, summary.email, summary.currency);
                    println!("Income:   {}", formatter.converted(&summary.income));
                    println!("Expenses: {}", formatter.converted(&summary.expenses));
                    println!("Net:      {}", formatter.converted(&summary.net));
                    Ok(())
                }
            }
        }
        Command::Monthly { user_id, date } => {
            let reference = date.unwrap_or_else(|| Utc::now().date_naive());
            let summary = dashboard.monthly_summary(&user_id, reference)?;
            match args.format {
                OutputFormat::Json => print_json(&summary),
                OutputFormat::Text => {
                    println!("{}", summary.month);
                    println!(
                        "Income:   {} ({:+.1}%)",
                        formatter.converted(&summary.income),
                        summary.income_change
                    );
                    println!(
                        "Expenses: {} ({:+.1}%)",
                        formatter.converted(&summary.expenses),
                        summary.expenses_change
                    );
                    println!("Balance:  {}", formatter.converted(&summary.balance));
                    Ok(())
                }
            }
        }
        Command::Budgets { user_id, summary } => match (user_id, summary) {
            (Some(user_id), true) => {
                let overview = dashboard.budget_overview(&user_id)?;
                match args.format {
                    OutputFormat::Json => print_json(&overview),
                    OutputFormat::Text => {
                        let code = overview.currency.as_str();
                        println!(
                            "Active budgets: {}  Spent {} of {} ({}%)",
                            overview.active_count,
                            formatter.money(overview.total_spent, code),
                            formatter.money(overview.total_allocated, code),
                            overview.percentage
                        );
                        println!(
                            "On track: {}  At risk: {}  Over budget: {}",
                            overview.on_track, overview.at_risk, overview.over_budget
                        );
                        Ok(())
                    }
                }
            }
            (user_id, _) => {
                let progress = dashboard.budget_progress(user_id.as_deref());
                match args.format {
                    OutputFormat::Json => print_json(&progress),
                    OutputFormat::Text => {
                        for budget in &progress {
                            println!(
                                "{:<24} {} / {} ({}%, {})",
                                budget.budget_name,
                                formatter.converted(&budget.spent),
                                formatter.converted(&budget.total),
                                budget.percentage,
                                budget.status
                            );
                        }
                        Ok(())
                    }
                }
            }
        },
        Command::Savings { user_id, summary } => match (user_id, summary) {
            (Some(user_id), true) => {
                let overview = dashboard.savings_overview(&user_id)?;
                match args.format {
                    OutputFormat::Json => print_json(&overview),
                    OutputFormat::Text => {
                        let code = overview.currency.as_str();
                        println!(
                            "Saved {} of {} ({}%)",
                            formatter.money(overview.total_saved, code),
                            formatter.money(overview.total_target, code),
                            overview.percentage
                        );
                        println!("Active: {}  Completed: {}", overview.active_count, overview.completed_count);
                        Ok(())
                    }
                }
            }
            (user_id, _) => {
                let progress = dashboard.savings_progress(user_id.as_deref());
                match args.format {
                    OutputFormat::Json => print_json(&progress),
                    OutputFormat::Text => {
                        for goal in &progress {
                            println!(
                                "{:<24} {} / {} ({}%){}",
                                goal.goal_name,
                                formatter.converted(&goal.current),
                                formatter.converted(&goal.target),
                                goal.percentage,
                                if goal.is_completed { " done" } else { "" }
                            );
                        }
                        Ok(())
                    }
                }
            }
        },
        Command::Categories { user_id, limit } => {
            let limit = limit.unwrap_or(dashboard.settings().top_categories_count);
            let spending = dashboard.category_spending(&user_id, limit)?;
            match args.format {
                OutputFormat::Json => print_json(&spending),
                OutputFormat::Text => {
                    for category in &spending {
                        println!("{:<24} {}", category.category, formatter.converted(&category.amount));
                    }
                    Ok(())
                }
            }
        }
        Command::Activity { limit } => {
            let limit = limit.unwrap_or(dashboard.settings().recent_activity_count);
            let activity = dashboard.recent_activity(limit);
            match args.format {
                OutputFormat::Json => print_json(&activity),
                OutputFormat::Text => {
                    for entry in &activity {
                        println!(
                            "{:<10} {:<20} {:<8} {} ({})",
                            format_date(entry.date),
                            entry.user_name,
                            entry.transaction_type,
                            formatter.converted(&entry.amount),
                            entry.amount.label
                        );
                    }
                    Ok(())
                }
            }
        }
        Command::Rebase { user_id, currency } => {
            let plan = dashboard.currency_rebase(&user_id, &currency)?;
            match args.format {
                OutputFormat::Json => print_json(&plan),
                OutputFormat::Text => {
                    println!("{}: {} -> {}", plan.user_id, plan.from_currency, plan.to_currency);
                    if plan.is_noop() {
                        println!("Currency unchanged; nothing to update");
                        return Ok(());
                    }
                    let (from, to) = (plan.from_currency.as_str(), plan.to_currency.as_str());
                    for tx in &plan.transactions {
                        println!(
                            "transaction {:<12} {} -> {}",
                            tx.transaction_id,
                            formatter.money(tx.amount.before, from),
                            formatter.money(tx.amount.after, to)
                        );
                    }
                    for budget in &plan.budgets {
                        println!(
                            "budget      {:<12} {} -> {}",
                            budget.budget_id,
                            formatter.money(budget.total_amount.before, from),
                            formatter.money(budget.total_amount.after, to)
                        );
                    }
                    for goal in &plan.savings_goals {
                        println!(
                            "goal        {:<12} {} -> {}",
                            goal.goal_id,
                            formatter.money(goal.target_amount.before, from),
                            formatter.money(goal.target_amount.after, to)
                        );
                    }
                    println!("{} records", plan.record_count());
                    Ok(())
                }
            }
        }
        Command::Ledger => {
            let ledger = dashboard.general_ledger();
            match args.format {
                OutputFormat::Json => print_json(&ledger),
                OutputFormat::Text => {
                    let code = ledger.currency.as_str();
                    for entry in &ledger.entries {
                        println!(
                            "{:<10} {:<24} {:>16} {:>16} {:>16}",
                            format_date(entry.date),
                            entry.description,
                            formatter.money(entry.debit, code),
                            formatter.money(entry.credit, code),
                            formatter.money(entry.balance, code)
                        );
                    }
                    println!(
                        "Debits: {}  Credits: {}  Balance: {}",
                        formatter.money(ledger.total_debits, code),
                        formatter.money(ledger.total_credits, code),
                        formatter.money(ledger.closing_balance, code)
                    );
                    Ok(())
                }
            }
        }
        Command::Variance => {
            let rows = dashboard.budget_variance();
            match args.format {
                OutputFormat::Json => print_json(&rows),
                OutputFormat::Text => {
                    for row in &rows {
                        println!(
                            "{:<24} {:<20} {} / {} {:+.2} {} ({}%)",
                            row.budget_name,
                            row.user_name,
                            formatter.converted(&row.spent),
                            formatter.converted(&row.allocated),
                            row.variance,
                            row.status,
                            row.percent_used
                        );
                    }
                    Ok(())
                }
            }
        }
        Command::Financials { period, date } => {
            let today = date.unwrap_or_else(|| Utc::now().date_naive());
            let report = dashboard.financials(period, today);
            match args.format {
                OutputFormat::Json => print_json(&report),
                OutputFormat::Text => {
                    let code = report.currency.as_str();
                    println!("Period: {} ({} transactions)", report.period, format_number(report.transaction_count));
                    println!("Income:          {}", formatter.money(report.total_income, code));
                    println!("Expenses:        {}", formatter.money(report.total_expense, code));
                    println!("Net position:    {}", formatter.money(report.net_position, code));
                    println!("Monthly average: {}", formatter.money(report.monthly_average, code));
                    for month in &report.monthly {
                        println!(
                            "  {:<9} in {} out {} net {}",
                            month.month,
                            formatter.money(month.income, code),
                            formatter.money(month.expense, code),
                            formatter.money(month.net, code)
                        );
                    }
                    for (title, rows) in [("Top income", &report.top_income), ("Top expenses", &report.top_expenses)] {
                        println!("{}:", title);
                        for row in rows {
                            println!("  {:<24} {:>4} {}", row.description, row.count, formatter.money(row.amount, code));
                        }
                    }
                    let aging = &report.aging;
                    println!(
                        "Aging: 0-30 {}  31-60 {}  61-90 {}  90+ {}",
                        formatter.money(aging.current, code),
                        formatter.money(aging.days_31_60, code),
                        formatter.money(aging.days_61_90, code),
                        formatter.money(aging.over_90, code)
                    );
                    Ok(())
                }
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    println!("{}", rendered);
    Ok(())
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_format_parses_for_every_report() {
        let commands: [&[&str]; 11] = [
            &["overview"],
            &["user", "u1"],
            &["monthly", "u1", "--date", "2024-03-20"],
            &["budgets", "u1", "--summary"],
            &["savings"],
            &["categories", "u1", "--limit", "3"],
            &["activity"],
            &["rebase", "u1", "USD"],
            &["ledger"],
            &["variance"],
            &["financials", "--period", "quarter"],
        ];
        for command in commands {
            let argv = ["finboard", "--format", "text"].iter().chain(command.iter());
            let args = Args::try_parse_from(argv).unwrap();
            assert_eq!(args.format, OutputFormat::Text, "{:?}", command);
            assert!(args.command.is_some());
        }
    }

    #[test]
    fn test_financials_period_argument() {
        let args = Args::try_parse_from(["finboard", "financials"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Financials { period: ReportPeriod::All, date: None })
        ));
        assert!(Args::try_parse_from(["finboard", "financials", "--period", "week"]).is_err());
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 3, 1)), "2024-03-01");
        assert_eq!(format_date(None), "-");
    }
}
