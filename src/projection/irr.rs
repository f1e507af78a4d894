//! Internal Rate of Return (IRR) of a prepayment
//!
//! The prepayment is an outlay at t=0; the difference between the original and
//! the post-prepayment payment streams is its monthly return.

use log::{debug, warn};

use crate::config::IrrConfig;

/// Calculate the annualized IRR of `cashflows` using Newton-Raphson.
///
/// # Arguments
/// * `cashflows` - Periodic cash flows, outlay first (negative)
/// * `config` - Initial guess, tolerances, iteration cap, periods per year
///
/// # Returns
/// * `Option<f64>` - Annualized IRR as a percentage (e.g., 4.2 for 4.2%), or
///   None when the iteration does not converge to a finite rate
pub fn solve_irr(cashflows: &[f64], config: &IrrConfig) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }

    // Without a sign change there is no rate that zeroes NPV
    let has_positive = cashflows.iter().any(|&cf| cf > 1e-10);
    let has_negative = cashflows.iter().any(|&cf| cf < -1e-10);
    if !has_positive || !has_negative {
        debug!("IRR: cash flows have no sign change");
        return None;
    }

    let mut rate = config.initial_guess;

    for iteration in 0..config.max_iterations {
        let (npv, dnpv) = npv_and_derivative(cashflows, rate);

        if !dnpv.is_finite() || dnpv.abs() < config.derivative_floor {
            warn!("IRR: derivative {:e} at rate {:e} after {} iterations", dnpv, rate, iteration);
            return None;
        }

        let new_rate = rate - npv / dnpv;

        // Discounting is undefined at or below -100% per period
        if !new_rate.is_finite() || new_rate <= -1.0 {
            warn!("IRR: iterate left the valid domain ({:e}) after {} iterations", new_rate, iteration);
            return None;
        }

        if (new_rate - rate).abs() < config.tolerance {
            let annual_pct = annualize(new_rate, config.periods_per_year) * 100.0;
            debug!("IRR: converged to {:.6}% p.a. in {} iterations", annual_pct, iteration + 1);
            return annual_pct.is_finite().then_some(annual_pct);
        }

        rate = new_rate;
    }

    warn!("IRR: no convergence within {} iterations", config.max_iterations);
    None
}

/// Compound a periodic rate over one year
pub fn annualize(periodic_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + periodic_rate).powi(periods_per_year as i32) - 1.0
}

/// Cash flows of the prepayment decision: `[-prepayment, d_1, ..., d_m]`
/// where `d_t` is the original payment minus the new payment in month `t`,
/// the shorter stream padded with zeros.
pub fn prepayment_cashflows(prepayment_amount: f64, original: &[f64], new: &[f64]) -> Vec<f64> {
    let months = original.len().max(new.len());
    let mut flows = Vec::with_capacity(months + 1);
    flows.push(-prepayment_amount);

    for t in 0..months {
        let before = original.get(t).copied().unwrap_or(0.0);
        let after = new.get(t).copied().unwrap_or(0.0);
        flows.push(before - after);
    }

    flows
}

/// Calculate NPV and its derivative with respect to rate
fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        let discount = (1.0 + rate).powi(t as i32);
        npv += cf / discount;
        if t > 0 {
            dnpv -= (t as f64) * cf / (discount * (1.0 + rate));
        }
    }

    (npv, dnpv)
}

/// Calculate NPV at a given periodic rate
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}
