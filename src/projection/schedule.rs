//! Amortization schedule rows and the schedule generator

use serde::{Deserialize, Serialize};

use super::state::ScheduleState;

/// A single period of a repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    /// Period index, 1-based from the prepayment date
    pub period: u32,
    pub principal: f64,
    pub interest: f64,
    /// principal + interest
    pub total: f64,
    /// Balance after this payment
    pub remaining: f64,
}

/// How each period's payment is determined
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaymentRule {
    /// Same total payment every period (equal installment)
    Level(f64),
    /// Same principal every period, interest on top (equal principal)
    FixedPrincipal(f64),
}

/// Generate up to `nominal_term` periods starting from `principal`.
///
/// Generation stops as soon as the balance is settled, so the returned
/// length is the actual term.
pub fn generate_schedule(
    principal: f64,
    rate: f64,
    nominal_term: u32,
    rule: PaymentRule,
    epsilon: f64,
) -> Vec<AmortizationEntry> {
    let mut state = ScheduleState::opening(principal);
    if let PaymentRule::Level(payment) = rule {
        state = state.with_level_principal(first_level_principal(principal, rate, payment, nominal_term));
    }
    let mut entries = Vec::with_capacity(nominal_term as usize);

    for period in 1..=nominal_term {
        let entry = state.pay_period(rule, rate, period == nominal_term, epsilon);
        entries.push(entry);

        if state.is_settled() {
            break;
        }
    }

    entries
}

/// Below this fraction of the payment, `payment - balance·r` is mostly
/// rounding noise
const SHARE_NOISE_FLOOR: f64 = 1e-8;

/// Principal share of the first level payment on `balance`.
///
/// When interest dominates the payment the direct difference cancels, and the
/// annuity share `balance·r / ((1+r)^n - 1)` is used instead.
fn first_level_principal(balance: f64, rate: f64, payment: f64, periods: u32) -> f64 {
    let direct = payment - balance * rate;
    if rate <= 0.0 || periods == 0 || direct > payment * SHARE_NOISE_FLOOR {
        return direct;
    }
    let growth_minus_one = (periods as f64 * rate.ln_1p()).exp_m1();
    balance * rate / growth_minus_one
}

/// Totals over a schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub periods: u32,
    pub total_principal: f64,
    pub total_interest: f64,
    pub total_paid: f64,
    pub final_balance: f64,
}

impl ScheduleSummary {
    pub fn from_entries(entries: &[AmortizationEntry]) -> Self {
        Self {
            periods: entries.len() as u32,
            total_principal: entries.iter().map(|e| e.principal).sum(),
            total_interest: entries.iter().map(|e| e.interest).sum(),
            total_paid: entries.iter().map(|e| e.total).sum(),
            final_balance: entries.last().map(|e| e.remaining).unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn assert_closed(entries: &[AmortizationEntry], principal: f64) {
        let summary = ScheduleSummary::from_entries(entries);
        assert_abs_diff_eq!(summary.total_principal, principal, epsilon = 0.01);
        assert_abs_diff_eq!(summary.final_balance, 0.0, epsilon = 0.01);

        let mut previous = principal;
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.period as usize, i + 1);
            assert_abs_diff_eq!(entry.principal + entry.interest, entry.total, epsilon = 1e-9);
            assert_abs_diff_eq!(previous - entry.principal, entry.remaining, epsilon = 1e-6);
            assert!(entry.remaining >= 0.0);
            previous = entry.remaining;
        }
    }

    #[test]
    fn test_level_schedule_closes() {
        // 10,000 over 12 months at 1% per month: payment 888.49
        let payment = 888.4878867834168;
        let entries = generate_schedule(10_000.0, 0.01, 12, PaymentRule::Level(payment), 0.01);
        assert_eq!(entries.len(), 12);
        assert_closed(&entries, 10_000.0);
        assert!(entries.windows(2).all(|w| w[1].interest < w[0].interest));
    }

    #[test]
    fn test_fixed_principal_schedule_closes() {
        let entries = generate_schedule(12_000.0, 0.005, 12, PaymentRule::FixedPrincipal(1_000.0), 0.01);
        assert_eq!(entries.len(), 12);
        assert_closed(&entries, 12_000.0);
        assert_abs_diff_eq!(entries[0].interest, 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(entries[11].interest, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_partial_last_period() {
        // 2,500 at 1,000 per period: 3 periods, the last one for 500
        let entries = generate_schedule(2_500.0, 0.0, 3, PaymentRule::FixedPrincipal(1_000.0), 0.01);
        assert_eq!(entries.len(), 3);
        assert_abs_diff_eq!(entries[2].principal, 500.0, epsilon = 1e-9);
        assert_closed(&entries, 2_500.0);
    }

    #[test]
    fn test_early_termination_truncates_term() {
        // Nominal term overstated: balance is gone after 2 periods
        let entries = generate_schedule(2_000.0, 0.0, 5, PaymentRule::FixedPrincipal(1_000.0), 0.01);
        assert_eq!(entries.len(), 2);
        assert_closed(&entries, 2_000.0);
    }

    #[test]
    fn test_interest_dominated_level_schedule_amortizes() {
        // 990,000 over 480 months at 10% per month: the first principal share
        // is ~1e-15 and doubles roughly every 7 periods
        let (principal, rate, n) = (990_000.0, 0.1, 480);
        let growth = 1.1f64.powf(n as f64);
        let payment = principal * rate * growth / (growth - 1.0);
        let entries = generate_schedule(principal, rate, n, PaymentRule::Level(payment), 0.01);

        assert_eq!(entries.len(), 480);
        assert_closed(&entries, principal);
        // No lump repayment at the end: the last period pays a regular installment
        let last = entries.last().unwrap();
        assert!(last.principal < payment, "last principal {}", last.principal);
        assert_abs_diff_eq!(last.total, payment, epsilon = 0.01);

        let summary = ScheduleSummary::from_entries(&entries);
        assert_relative_eq!(summary.total_interest, payment * n as f64 - principal, max_relative = 1e-9);
    }

    #[test]
    fn test_zero_term_is_empty() {
        assert!(generate_schedule(1_000.0, 0.01, 0, PaymentRule::Level(100.0), 0.01).is_empty());
        let summary = ScheduleSummary::from_entries(&[]);
        assert_eq!(summary.periods, 0);
        assert_eq!(summary.final_balance, 0.0);
    }
}
