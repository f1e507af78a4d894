//! Analyze every loan in a CSV file
//!
//! Usage: analyze_batch <loans.csv> [output.csv]
//!
//! Input columns: LoanId,TotalAmount,LoanTermMonths,AnnualRatePct,MonthsPaid,PrepaymentAmount
//! Writes one row per (loan, scenario). Invalid loans are reported and skipped.

use anyhow::{Context, Result};
use prepayment_analyzer::{
    loan::{load_loans, LoanRecord},
    AnalysisConfig, Metric, ScenarioAnalyzer, ScenarioSet,
};
use rayon::prelude::*;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

const DEFAULT_OUTPUT: &str = "prepayment_batch_output.csv";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(input_path) = args.get(1) else {
        eprintln!("Usage: analyze_batch <loans.csv> [output.csv]");
        std::process::exit(2);
    };
    let output_path = args.get(2).map(String::as_str).unwrap_or(DEFAULT_OUTPUT);

    let start = Instant::now();
    println!("Loading loans from {}...", input_path);
    let loans = load_loans(input_path).with_context(|| format!("Failed to load loans from {}", input_path))?;
    println!("Loaded {} loans in {:?}", loans.len(), start.elapsed());

    let analyzer = ScenarioAnalyzer::with_config(AnalysisConfig::from_env());

    println!("Analyzing...");
    let run_start = Instant::now();

    // Loans are independent; analyze in parallel
    let results: Vec<(&LoanRecord, Result<ScenarioSet, String>)> = loans
        .par_iter()
        .map(|loan| (loan, analyzer.analyze(&loan.input).map_err(|e| e.to_string())))
        .collect();

    println!("Analysis complete in {:?}", run_start.elapsed());

    let file = File::create(output_path).with_context(|| format!("Failed to create {}", output_path))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "LoanId,Scenario,FullPayoff,InterestSaved,NewMonthlyPayment,NewTerm,TermSaved,IRRPct,Leverage,OriginalFuturePayment,NewFuturePayment,Recommended")?;

    let mut analyzed = 0usize;
    let mut failed = 0usize;
    let mut total_saved_best = 0.0;

    for (loan, result) in &results {
        let scenarios = match result {
            Ok(scenarios) => scenarios,
            Err(e) => {
                eprintln!("  Loan {}: skipped ({})", loan.loan_id, e);
                failed += 1;
                continue;
            }
        };
        analyzed += 1;

        let recommended = scenarios.recommended().map(|r| r.key);
        if let Some(best) = scenarios.recommended() {
            total_saved_best += best.interest_saved;
        }

        for (key, r) in scenarios.iter() {
            writeln!(
                out,
                "{},{},{},{:.2},{},{},{},{},{},{:.2},{:.2},{}",
                loan.loan_id,
                key,
                r.full_payoff,
                r.interest_saved,
                r.new_monthly_payment.map(|p| format!("{:.2}", p)).unwrap_or_default(),
                r.new_term.periods().map(|n| n.to_string()).unwrap_or_default(),
                r.term_saved.map(|n| n.to_string()).unwrap_or_default(),
                csv_metric(r.irr),
                csv_metric(r.leverage),
                r.original_future_payment,
                r.new_future_payment,
                Some(*key) == recommended,
            )?;
        }
    }

    out.flush()?;
    println!("Output written to {}", output_path);

    println!("\nBatch Summary:");
    println!("  Loans analyzed: {}", analyzed);
    println!("  Loans skipped:  {}", failed);
    println!("  Interest saved (best scenario per loan): {:.2}", total_saved_best);
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}

fn csv_metric(metric: Metric) -> String {
    metric.value().map(|v| format!("{:.4}", v)).unwrap_or_default()
}
