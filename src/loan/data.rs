//! Loan input and the repayment/prepayment variants

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AnalysisError, Result};

/// Repayment convention of the loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RepaymentMethod {
    /// Equal installment (AC): fixed total payment per period
    EqualInstallment,
    /// Equal principal (AP): fixed principal per period, declining interest
    EqualPrincipal,
}

impl RepaymentMethod {
    pub const ALL: [RepaymentMethod; 2] = [RepaymentMethod::EqualInstallment, RepaymentMethod::EqualPrincipal];

    /// Short code used in scenario keys
    pub fn code(&self) -> &'static str {
        match self {
            RepaymentMethod::EqualInstallment => "AC",
            RepaymentMethod::EqualPrincipal => "AP",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RepaymentMethod::EqualInstallment => "Equal installment",
            RepaymentMethod::EqualPrincipal => "Equal principal",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "AC" => Some(RepaymentMethod::EqualInstallment),
            "AP" => Some(RepaymentMethod::EqualPrincipal),
            _ => None,
        }
    }
}

/// How the prepayment is applied to the remaining loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrepaymentStrategy {
    /// Keep the payment shape, solve for a shorter term
    ShortenTerm,
    /// Keep the remaining term, solve for a smaller payment
    ReducePayment,
}

impl PrepaymentStrategy {
    pub const ALL: [PrepaymentStrategy; 2] = [PrepaymentStrategy::ShortenTerm, PrepaymentStrategy::ReducePayment];

    pub fn code(&self) -> &'static str {
        match self {
            PrepaymentStrategy::ShortenTerm => "shortenTerm",
            PrepaymentStrategy::ReducePayment => "reducePayment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrepaymentStrategy::ShortenTerm => "Shorten term",
            PrepaymentStrategy::ReducePayment => "Reduce payment",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "shortenTerm" => Some(PrepaymentStrategy::ShortenTerm),
            "reducePayment" => Some(PrepaymentStrategy::ReducePayment),
            _ => None,
        }
    }
}

impl fmt::Display for RepaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for PrepaymentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Caller-supplied loan parameters, in engine units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    /// Original principal (currency units)
    pub total_amount: f64,

    /// Original term in months
    pub loan_term: u32,

    /// Periodic (monthly) interest rate as a decimal
    pub rate: f64,

    /// Months already paid at the time of prepayment
    pub months_paid: u32,

    /// Lump sum applied after `months_paid` payments (currency units)
    pub prepayment_amount: f64,
}

impl LoanInput {
    pub fn new(total_amount: f64, loan_term: u32, rate: f64, months_paid: u32, prepayment_amount: f64) -> Self {
        Self {
            total_amount,
            loan_term,
            rate,
            months_paid,
            prepayment_amount,
        }
    }

    /// Build from an annual percentage rate, e.g. `3.95` for 3.95% p.a.
    pub fn from_annual_terms(
        total_amount: f64,
        loan_term: u32,
        annual_rate_pct: f64,
        months_paid: u32,
        prepayment_amount: f64,
    ) -> Self {
        Self::new(total_amount, loan_term, annual_rate_pct / 100.0 / 12.0, months_paid, prepayment_amount)
    }

    /// Months left on the original schedule
    pub fn remaining_term(&self) -> u32 {
        self.loan_term.saturating_sub(self.months_paid)
    }

    /// Reject structurally impossible parameters before any computation
    pub fn validate(&self) -> Result<()> {
        if !self.total_amount.is_finite() || self.total_amount <= 0.0 {
            return Err(AnalysisError::invalid(
                "total_amount",
                format!("must be a positive amount, got {}", self.total_amount),
            ));
        }
        if self.loan_term == 0 {
            return Err(AnalysisError::invalid("loan_term", "must be at least one month"));
        }
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(AnalysisError::invalid(
                "rate",
                format!("must be a non-negative periodic rate, got {}", self.rate),
            ));
        }
        if !(self.loan_term as f64 * self.rate.ln_1p()).exp().is_finite() {
            return Err(AnalysisError::invalid(
                "rate",
                format!("compounding {} over {} months overflows", self.rate, self.loan_term),
            ));
        }
        if self.months_paid >= self.loan_term {
            return Err(AnalysisError::invalid(
                "months_paid",
                format!("{} months paid on a {}-month loan", self.months_paid, self.loan_term),
            ));
        }
        if !self.prepayment_amount.is_finite() || self.prepayment_amount < 0.0 {
            return Err(AnalysisError::invalid(
                "prepayment_amount",
                format!("must be non-negative, got {}", self.prepayment_amount),
            ));
        }
        Ok(())
    }
}
