//! Prepayment projection
//!
//! Applies a lump-sum prepayment to the remaining principal and rebuilds the
//! repayment stream under the chosen strategy:
//! - **Shorten term**: keep the payment (or the fixed principal) and solve
//!   for the number of periods still needed
//! - **Reduce payment**: keep the remaining term and re-amortize
//!
//! A prepayment covering the whole remaining principal settles the loan and
//! short-circuits before any rate-dependent math.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::loan::PrepaymentStrategy;
use super::original::{level_payment, OriginalLoan};
use super::schedule::{generate_schedule, AmortizationEntry, PaymentRule};

/// Term after prepayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NewTerm {
    /// Periods still to pay (0 once the loan is paid off)
    Periods(u32),
    /// The payment no longer covers interest, so no finite term exists
    NotRepresentable,
}

impl NewTerm {
    pub fn periods(&self) -> Option<u32> {
        match *self {
            NewTerm::Periods(n) => Some(n),
            NewTerm::NotRepresentable => None,
        }
    }
}

/// Post-prepayment loan figures for one (method, strategy) pair
#[derive(Debug, Clone)]
pub struct Projection {
    /// Prepayment settled the whole remaining principal
    pub full_payoff: bool,

    /// Principal left after the prepayment (0 on full payoff)
    pub new_principal: f64,

    pub new_term: NewTerm,

    /// First post-prepayment payment; None when nothing is left to pay
    pub new_monthly_payment: Option<f64>,

    pub schedule: Vec<AmortizationEntry>,

    /// Total payment per period of `schedule`
    pub new_future_cash_flow: Vec<f64>,

    /// Original lifetime interest minus lifetime interest with prepayment
    pub interest_saved: f64,

    pub original_future_payment: f64,
    pub new_future_payment: f64,

    /// Original remaining term minus new term
    pub term_saved: Option<u32>,
}

/// Project the loan after applying `prepayment_amount` under `strategy`
pub fn project(
    original: &OriginalLoan,
    prepayment_amount: f64,
    rate: f64,
    strategy: PrepaymentStrategy,
    config: &AnalysisConfig,
) -> Projection {
    let original_future_payment = original.future_payment_total();

    if prepayment_amount >= original.remaining_principal {
        debug!(
            "{:?}/{:?}: prepayment {:.2} settles remaining principal {:.2}",
            original.method, strategy, prepayment_amount, original.remaining_principal
        );
        return Projection {
            full_payoff: true,
            new_principal: 0.0,
            new_term: NewTerm::Periods(0),
            new_monthly_payment: None,
            schedule: Vec::new(),
            new_future_cash_flow: Vec::new(),
            interest_saved: original.future_interest(),
            original_future_payment,
            new_future_payment: 0.0,
            term_saved: Some(original.remaining_term),
        };
    }

    let new_principal = original.remaining_principal - prepayment_amount;

    let (nominal_term, rule) = match (strategy, original.payment_rule) {
        (PrepaymentStrategy::ShortenTerm, PaymentRule::Level(payment)) => {
            match shortened_level_term(new_principal, payment, rate, config) {
                Some(term) => (term, PaymentRule::Level(payment)),
                None => {
                    warn!(
                        "{:?}/shorten term: payment {:.2} does not cover interest on {:.2}, term not representable",
                        original.method, payment, new_principal
                    );
                    return not_representable(new_principal, original_future_payment);
                }
            }
        }
        (PrepaymentStrategy::ShortenTerm, PaymentRule::FixedPrincipal(per_period)) => {
            match ceil_periods(new_principal / per_period) {
                Some(term) => (term, PaymentRule::FixedPrincipal(per_period)),
                None => return not_representable(new_principal, original_future_payment),
            }
        }
        (PrepaymentStrategy::ReducePayment, PaymentRule::Level(_)) => {
            let term = original.remaining_term;
            (term, PaymentRule::Level(level_payment(new_principal, rate, term, config)))
        }
        (PrepaymentStrategy::ReducePayment, PaymentRule::FixedPrincipal(_)) => {
            let term = original.remaining_term;
            (term, PaymentRule::FixedPrincipal(new_principal / term as f64))
        }
    };

    let schedule = generate_schedule(new_principal, rate, nominal_term, rule, config.balance_epsilon);
    let new_term = schedule.len() as u32;
    if new_term < nominal_term {
        debug!("schedule settled after {} of {} nominal periods", new_term, nominal_term);
    }

    let new_future_cash_flow: Vec<f64> = schedule.iter().map(|e| e.total).collect();
    let new_future_interest: f64 = schedule.iter().map(|e| e.interest).sum();
    let new_future_payment: f64 = new_future_cash_flow.iter().sum();
    let interest_saved = original.future_interest() - new_future_interest;

    debug!(
        "{:?}/{:?}: new principal {:.2}, new term {}, interest saved {:.2}",
        original.method, strategy, new_principal, new_term, interest_saved
    );

    Projection {
        full_payoff: false,
        new_principal,
        new_term: NewTerm::Periods(new_term),
        new_monthly_payment: new_future_cash_flow.first().copied(),
        schedule,
        new_future_cash_flow,
        interest_saved,
        original_future_payment,
        new_future_payment,
        term_saved: Some(original.remaining_term.saturating_sub(new_term)),
    }
}

/// Periods needed to repay `principal` with a level `payment`:
/// `ceil(ln(M / (M - P·r)) / ln(1 + r))`.
/// None when the payment does not exceed one period of interest.
fn shortened_level_term(principal: f64, payment: f64, rate: f64, config: &AnalysisConfig) -> Option<u32> {
    if config.is_zero_rate(rate) {
        return ceil_periods(principal / payment);
    }

    let covered = payment - principal * rate;
    if covered <= 0.0 {
        return None;
    }
    ceil_periods((payment / covered).ln() / (1.0 + rate).ln())
}

fn ceil_periods(raw: f64) -> Option<u32> {
    let periods = raw.ceil();
    if periods.is_finite() && periods >= 1.0 && periods <= u32::MAX as f64 {
        Some(periods as u32)
    } else {
        None
    }
}

fn not_representable(new_principal: f64, original_future_payment: f64) -> Projection {
    Projection {
        full_payoff: false,
        new_principal,
        new_term: NewTerm::NotRepresentable,
        new_monthly_payment: None,
        schedule: Vec::new(),
        new_future_cash_flow: Vec::new(),
        interest_saved: 0.0,
        original_future_payment,
        new_future_payment: 0.0,
        term_saved: None,
    }
}
