//! Prepayment Analyzer CLI
//!
//! Compares shorten-term and reduce-payment prepayments for an
//! equal-installment and an equal-principal loan.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use prepayment_analyzer::{
    dates, scenario::parse_key, AnalysisConfig, HistoryRecord, HistoryStore, LoanInput, Metric, NewTerm,
    ScenarioAnalyzer, ScenarioResult, ScenarioSet,
};

const DEFAULT_HISTORY_FILE: &str = "prepayment_history.json";
const TEN_THOUSAND: f64 = 10_000.0;

#[derive(Parser)]
#[command(name = "prepay", version, about = "Loan prepayment analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a prepayment under every repayment method and strategy
    Analyze(AnalyzeArgs),
    /// List stored analyses
    History {
        #[arg(long, default_value = DEFAULT_HISTORY_FILE)]
        history: PathBuf,
        /// Print the stored records as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Original loan amount
    #[arg(long)]
    amount: f64,

    /// Original term in years
    #[arg(long, required_unless_present = "term_months", conflicts_with = "term_months")]
    term_years: Option<u32>,

    /// Original term in months
    #[arg(long)]
    term_months: Option<u32>,

    /// Annual interest rate in percent, e.g. 3.95
    #[arg(long)]
    annual_rate: f64,

    /// Payments already made
    #[arg(long, conflicts_with = "start_date")]
    months_paid: Option<u32>,

    /// First payment date (YYYY-MM-DD); months paid are counted from here
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Planned prepayment date (YYYY-MM-DD), defaults to today
    #[arg(long, requires = "start_date")]
    prepayment_date: Option<NaiveDate>,

    /// Lump sum to prepay
    #[arg(long)]
    prepayment: f64,

    /// Amounts are given in units of 10,000
    #[arg(long)]
    in_ten_thousands: bool,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Also print the schedule of one scenario, e.g. AC_shortenTerm
    #[arg(long, value_name = "KEY")]
    schedule: Option<String>,

    /// Append this analysis to a history file
    #[arg(long)]
    history: Option<PathBuf>,
}

impl AnalyzeArgs {
    fn loan_input(&self) -> Result<LoanInput> {
        let scale = if self.in_ten_thousands { TEN_THOUSAND } else { 1.0 };

        let loan_term = term_in_months(self.term_months, self.term_years)?;

        let months_paid = match (self.months_paid, self.start_date) {
            (Some(months), _) => months,
            (None, Some(start)) => {
                let prepayment_date = self.prepayment_date.unwrap_or_else(|| Local::now().date_naive());
                dates::months_paid(start, prepayment_date)?
            }
            (None, None) => bail!("either --months-paid or --start-date is required"),
        };

        Ok(LoanInput::from_annual_terms(
            self.amount * scale,
            loan_term,
            self.annual_rate,
            months_paid,
            self.prepayment * scale,
        ))
    }
}

fn term_in_months(term_months: Option<u32>, term_years: Option<u32>) -> Result<u32> {
    match (term_months, term_years) {
        (Some(months), _) => Ok(months),
        (None, Some(years)) => match years.checked_mul(12) {
            Some(months) => Ok(months),
            None => bail!("--term-years {} is too long to count in months", years),
        },
        (None, None) => bail!("either --term-years or --term-months is required"),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => run_analyze(&args),
        Command::History { history, json } => run_history(&history, json),
    }
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let input = args.loan_input()?;
    let analyzer = ScenarioAnalyzer::with_config(AnalysisConfig::from_env());
    let scenarios = analyzer.analyze(&input).context("Analysis failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&scenarios)?);
    } else {
        print_scenarios(&input, &scenarios);
    }

    if let Some(key) = &args.schedule {
        let key = parse_key(key)?;
        if let Some(result) = scenarios.get(&key) {
            print_schedule(result);
        }
    }

    if let Some(path) = &args.history {
        let mut store = HistoryStore::load(path)
            .with_context(|| format!("Unable to read history file {}", path.display()))?;
        store.push(HistoryRecord::new(input, scenarios));
        store
            .save(path)
            .with_context(|| format!("Unable to write history file {}", path.display()))?;
        log::info!("history saved to {} ({} records)", path.display(), store.len());
    }

    Ok(())
}

fn run_history(path: &Path, json: bool) -> Result<()> {
    let store = HistoryStore::load(path).with_context(|| format!("Unable to read history file {}", path.display()))?;

    if json {
        let records: Vec<&HistoryRecord> = store.iter().collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if store.is_empty() {
        println!("No stored analyses in {}", path.display());
        return Ok(());
    }

    println!("{:>14} {:>17} {:>14} {:>6} {:>7} {:>6} {:>14} {:>16}",
        "Id", "Recorded", "Amount", "Term", "Rate%", "Paid", "Prepayment", "Best saving");
    println!("{}", "-".repeat(102));
    for record in store.iter() {
        let best = record
            .scenarios
            .recommended()
            .map(|r| format!("{:.2}", r.interest_saved))
            .unwrap_or_else(|| "-".to_string());
        println!("{:>14} {:>17} {:>14.2} {:>6} {:>7.3} {:>6} {:>14.2} {:>16}",
            record.id,
            record.recorded_at.format("%Y-%m-%d %H:%M"),
            record.input.total_amount,
            record.input.loan_term,
            record.input.rate * 1200.0,
            record.input.months_paid,
            record.input.prepayment_amount,
            best,
        );
    }

    Ok(())
}

fn print_scenarios(input: &LoanInput, scenarios: &ScenarioSet) {
    println!("Loan: {:.2} over {} months at {:.3}% p.a., {} months paid, prepaying {:.2}",
        input.total_amount, input.loan_term, input.rate * 1200.0, input.months_paid, input.prepayment_amount);
    println!();

    println!("  {:<38} {:>14} {:>12} {:>9} {:>8} {:>9} {:>10}",
        "Scenario", "InterestSaved", "NewPayment", "NewTerm", "Saved", "IRR%", "Leverage");
    println!("{}", "-".repeat(108));

    let recommended = scenarios.recommended().map(|r| r.key);
    for (key, result) in scenarios.iter() {
        let marker = if Some(*key) == recommended { "*" } else { " " };
        println!("{} {:<38} {:>14.2} {:>12} {:>9} {:>8} {:>9} {:>10}",
            marker,
            format!("{} ({})", result.name, key),
            result.interest_saved,
            result.new_monthly_payment.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "0.00".to_string()),
            format_term(result.new_term),
            result.term_saved.map(|t| t.to_string()).unwrap_or_else(|| "N/A".to_string()),
            format_metric(result.irr),
            format_metric(result.leverage),
        );
    }

    println!();
    println!("* recommended: largest interest saved");
}

fn print_schedule(result: &ScenarioResult) {
    println!();
    println!("Schedule: {} ({} periods)", result.name, result.schedule.len());
    if result.schedule.is_empty() {
        println!("  (no remaining payments)");
        return;
    }

    println!("{:>6} {:>14} {:>14} {:>14} {:>16}", "Period", "Principal", "Interest", "Total", "Remaining");
    for entry in &result.schedule {
        println!("{:>6} {:>14.2} {:>14.2} {:>14.2} {:>16.2}",
            entry.period, entry.principal, entry.interest, entry.total, entry.remaining);
    }
}

fn format_metric(metric: Metric) -> String {
    match metric {
        Metric::Applicable(v) => format!("{:.2}", v),
        Metric::NotApplicable => "N/A".to_string(),
    }
}

fn format_term(term: NewTerm) -> String {
    match term {
        NewTerm::Periods(n) => n.to_string(),
        NewTerm::NotRepresentable => "N/A".to_string(),
    }
}
