//! Original (no-prepayment) amortization of the loan
//!
//! Derives the payment stream still owed after `months_paid` periods, the
//! lifetime interest of the original schedule, and the interest already paid.

use log::debug;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::loan::{LoanInput, RepaymentMethod};
use super::schedule::PaymentRule;

/// The original loan as seen at the prepayment date
#[derive(Debug, Clone)]
pub struct OriginalLoan {
    pub method: RepaymentMethod,

    /// Level payment (equal installment) or fixed principal (equal principal)
    pub payment_rule: PaymentRule,

    /// Payments still owed under the original schedule, one per month
    pub future_cash_flow: Vec<f64>,

    /// Interest over the full original term
    pub total_interest: f64,

    /// Principal outstanding after `months_paid` payments
    pub remaining_principal: f64,

    /// Interest paid during the first `months_paid` payments
    pub already_paid_interest: f64,

    /// Months left on the original schedule
    pub remaining_term: u32,
}

impl OriginalLoan {
    /// Interest the borrower would still pay without prepaying
    pub fn future_interest(&self) -> f64 {
        self.total_interest - self.already_paid_interest
    }

    /// Sum of the remaining original payments
    pub fn future_payment_total(&self) -> f64 {
        self.future_cash_flow.iter().sum()
    }
}

/// Annuity payment that amortizes `principal` over `periods` at `rate`.
/// Zero rates degenerate to straight-line repayment.
pub fn level_payment(principal: f64, rate: f64, periods: u32, config: &AnalysisConfig) -> f64 {
    if periods == 0 {
        return principal;
    }
    if config.is_zero_rate(rate) {
        return principal / periods as f64;
    }
    // 1 - (1+r)^-n, written so neither a long term nor a tiny rate loses precision
    let discount = -(-(periods as f64) * rate.ln_1p()).exp_m1();
    principal * rate / discount
}


/// Amortize the original loan under `method` and split it at `months_paid`
pub fn compute_original(input: &LoanInput, method: RepaymentMethod, config: &AnalysisConfig) -> Result<OriginalLoan> {
    input.validate()?;

    let loan = match method {
        RepaymentMethod::EqualInstallment => equal_installment(input, config),
        RepaymentMethod::EqualPrincipal => equal_principal(input),
    };

    debug!(
        "{:?}: remaining principal {:.2}, total interest {:.2}, already paid interest {:.2}",
        method, loan.remaining_principal, loan.total_interest, loan.already_paid_interest
    );

    Ok(loan)
}

fn equal_installment(input: &LoanInput, config: &AnalysisConfig) -> OriginalLoan {
    let principal = input.total_amount;
    let n = input.loan_term;
    let k = input.months_paid;
    let r = input.rate;
    let remaining_term = input.remaining_term();

    let payment = level_payment(principal, r, n, config);

    let (total_interest, remaining_principal, already_paid_interest) = if config.is_zero_rate(r) {
        debug!("zero rate: equal installment repays {:.2} per month without interest", payment);
        (0.0, principal - payment * k as f64, 0.0)
    } else {
        // P·((1+r)^n - (1+r)^k) / ((1+r)^n - 1), scaled by (1+r)^-n
        let log_growth = r.ln_1p();
        let unpaid = -((k as f64 - n as f64) * log_growth).exp_m1();
        let whole = -(-(n as f64) * log_growth).exp_m1();
        let remaining = principal * unpaid / whole;
        let total = payment * n as f64 - principal;
        let paid = payment * k as f64 - (principal - remaining);
        (total, remaining, paid)
    };

    OriginalLoan {
        method: RepaymentMethod::EqualInstallment,
        payment_rule: PaymentRule::Level(payment),
        future_cash_flow: vec![payment; remaining_term as usize],
        total_interest,
        remaining_principal,
        already_paid_interest,
        remaining_term,
    }
}

fn equal_principal(input: &LoanInput) -> OriginalLoan {
    let principal = input.total_amount;
    let n = input.loan_term;
    let k = input.months_paid;
    let r = input.rate;
    let per_period = principal / n as f64;

    let mut total_interest = 0.0;
    let mut already_paid_interest = 0.0;
    let mut future_cash_flow = Vec::with_capacity(input.remaining_term() as usize);

    for period in 1..=n {
        let balance_before = principal - (period - 1) as f64 * per_period;
        let interest = balance_before * r;
        total_interest += interest;

        if period <= k {
            already_paid_interest += interest;
        } else {
            future_cash_flow.push(per_period + interest);
        }
    }

    OriginalLoan {
        method: RepaymentMethod::EqualPrincipal,
        payment_rule: PaymentRule::FixedPrincipal(per_period),
        future_cash_flow,
        total_interest,
        remaining_principal: principal - k as f64 * per_period,
        already_paid_interest,
        remaining_term: input.remaining_term(),
    }
}
