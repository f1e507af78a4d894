//! Prepayment Analyzer - what a lump-sum loan prepayment is worth
//!
//! This library provides:
//! - Original amortization for equal-installment and equal-principal loans
//! - Prepayment projection under shorten-term and reduce-payment strategies
//! - Annualized IRR of the prepayment via Newton-Raphson
//! - A scenario analyzer covering all four method/strategy combinations
//! - Batch loading of loans and a bounded analysis history

pub mod config;
pub mod error;
pub mod loan;
pub mod projection;
pub mod scenario;
pub mod dates;
pub mod history;

// Re-export commonly used types
pub use config::{AnalysisConfig, IrrConfig};
pub use error::{AnalysisError, Result};
pub use loan::{LoanInput, RepaymentMethod, PrepaymentStrategy};
pub use projection::{AmortizationEntry, NewTerm};
pub use scenario::{analyze, Metric, ScenarioAnalyzer, ScenarioKey, ScenarioResult, ScenarioSet};
pub use history::{HistoryRecord, HistoryStore};
