//! Load loan records from CSV for batch analysis

use super::LoanInput;
use crate::error::{AnalysisError, Result};
use csv::Reader;
use serde::Serialize;
use std::path::Path;

/// Raw CSV row. Rates are annual percentages, as entered by a borrower.
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "LoanId")]
    loan_id: u32,
    #[serde(rename = "TotalAmount")]
    total_amount: f64,
    #[serde(rename = "LoanTermMonths")]
    loan_term_months: u32,
    #[serde(rename = "AnnualRatePct")]
    annual_rate_pct: f64,
    #[serde(rename = "MonthsPaid")]
    months_paid: u32,
    #[serde(rename = "PrepaymentAmount")]
    prepayment_amount: f64,
}

/// A loan tagged with the identifier it carried in the input file
#[derive(Debug, Clone, Serialize)]
pub struct LoanRecord {
    pub loan_id: u32,
    pub input: LoanInput,
}

impl CsvRow {
    fn to_record(self, line: usize) -> Result<LoanRecord> {
        if !self.annual_rate_pct.is_finite() || self.annual_rate_pct < 0.0 {
            return Err(AnalysisError::InvalidRecord(format!(
                "line {}: loan {} has annual rate {}",
                line, self.loan_id, self.annual_rate_pct
            )));
        }

        Ok(LoanRecord {
            loan_id: self.loan_id,
            input: LoanInput::from_annual_terms(
                self.total_amount,
                self.loan_term_months,
                self.annual_rate_pct,
                self.months_paid,
                self.prepayment_amount,
            ),
        })
    }
}

/// Load all loans from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P) -> Result<Vec<LoanRecord>> {
    let reader = Reader::from_path(path)?;
    collect_records(reader)
}

/// Load loans from any reader (e.g., string buffer, stdin)
pub fn load_loans_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<LoanRecord>> {
    collect_records(Reader::from_reader(reader))
}

fn collect_records<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<LoanRecord>> {
    let mut loans = Vec::new();

    // Header is line 1
    for (idx, result) in reader.deserialize().enumerate() {
        let row: CsvRow = result?;
        loans.push(row.to_record(idx + 2)?);
    }

    Ok(loans)
}
