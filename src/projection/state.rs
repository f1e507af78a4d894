//! Running balance state while a repayment schedule is generated

use super::schedule::{AmortizationEntry, PaymentRule};

/// State of the loan between two payments
#[derive(Debug, Clone)]
pub struct ScheduleState {
    /// Last period paid (0 before the first payment)
    pub period: u32,

    /// Outstanding principal after the last payment
    pub balance: f64,

    /// Principal share of the next level payment. Grows by `1 + r` per period,
    /// which keeps it exact when interest dominates the payment.
    level_principal: Option<f64>,
}

impl ScheduleState {
    /// State right after the prepayment, before any new payment
    pub fn opening(principal: f64) -> Self {
        Self {
            period: 0,
            balance: principal,
            level_principal: None,
        }
    }

    /// Seed the principal share of the first level payment.
    /// Without a seed it is taken as `payment - balance·r`.
    pub fn with_level_principal(mut self, principal_share: f64) -> Self {
        self.level_principal = Some(principal_share);
        self
    }

    /// Pay one period and advance.
    ///
    /// Principal never exceeds the balance. On the final nominal period the
    /// whole balance is repaid, and a residual below `epsilon` is folded into
    /// the current payment so the balance lands exactly on zero.
    pub fn pay_period(&mut self, rule: PaymentRule, rate: f64, final_period: bool, epsilon: f64) -> AmortizationEntry {
        self.period += 1;

        let interest = self.balance * rate;
        let scheduled = match rule {
            PaymentRule::Level(payment) => {
                let share = self.level_principal.unwrap_or(payment - interest);
                self.level_principal = Some(share * (1.0 + rate));
                share
            }
            PaymentRule::FixedPrincipal(amount) => amount,
        };

        let mut principal = if final_period {
            self.balance
        } else {
            scheduled.max(0.0).min(self.balance)
        };

        let mut remaining = self.balance - principal;
        if remaining < epsilon {
            principal += remaining;
            remaining = 0.0;
        }

        self.balance = remaining;

        AmortizationEntry {
            period: self.period,
            principal,
            interest,
            total: principal + interest,
            remaining,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.balance <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_level_payment_split() {
        let mut state = ScheduleState::opening(1000.0);
        let entry = state.pay_period(PaymentRule::Level(110.0), 0.01, false, 0.01);

        assert_eq!(entry.period, 1);
        assert_relative_eq!(entry.interest, 10.0, epsilon = 1e-12);
        assert_relative_eq!(entry.principal, 100.0, epsilon = 1e-12);
        assert_relative_eq!(entry.total, 110.0, epsilon = 1e-12);
        assert_relative_eq!(state.balance, 900.0, epsilon = 1e-12);
        assert!(!state.is_settled());
    }

    #[test]
    fn test_final_period_clears_balance() {
        let mut state = ScheduleState::opening(50.0);
        let entry = state.pay_period(PaymentRule::FixedPrincipal(30.0), 0.0, true, 0.01);
        assert_eq!(entry.principal, 50.0);
        assert_eq!(entry.remaining, 0.0);
        assert!(state.is_settled());
    }

    #[test]
    fn test_overshoot_is_clamped_to_balance() {
        let mut state = ScheduleState::opening(20.0);
        let entry = state.pay_period(PaymentRule::FixedPrincipal(30.0), 0.01, false, 0.01);
        assert_eq!(entry.principal, 20.0);
        assert_relative_eq!(entry.total, 20.2, epsilon = 1e-12);
        assert_eq!(entry.remaining, 0.0);
    }

    #[test]
    fn test_dust_below_epsilon_is_absorbed() {
        let mut state = ScheduleState::opening(100.004);
        let entry = state.pay_period(PaymentRule::FixedPrincipal(100.0), 0.0, false, 0.01);
        assert_relative_eq!(entry.principal, 100.004, epsilon = 1e-12);
        assert_eq!(entry.remaining, 0.0);
        assert!(state.is_settled());
    }

    #[test]
    fn test_level_principal_share_compounds() {
        // Payment 110 on 1000 at 1%: principal 100, then 101, then 102.01
        let mut state = ScheduleState::opening(1000.0);
        let shares: Vec<f64> = (0..3)
            .map(|_| state.pay_period(PaymentRule::Level(110.0), 0.01, false, 0.01).principal)
            .collect();
        assert_relative_eq!(shares[0], 100.0, epsilon = 1e-12);
        assert_relative_eq!(shares[1], 101.0, epsilon = 1e-12);
        assert_relative_eq!(shares[2], 102.01, epsilon = 1e-12);
        assert_relative_eq!(state.balance, 1000.0 - 303.01, epsilon = 1e-9);
    }

    #[test]
    fn test_seeded_share_survives_interest_dominated_payment() {
        // The share is below one ulp of the 99,000 interest, so the payment
        // rounds to the interest and payment - interest would be zero
        let share = 1e-12;
        let payment = 99_000.0 + share;
        assert_eq!(payment - 990_000.0 * 0.1, 0.0);
        let mut state = ScheduleState::opening(990_000.0).with_level_principal(share);

        let first = state.pay_period(PaymentRule::Level(payment), 0.1, false, 0.01);
        let second = state.pay_period(PaymentRule::Level(payment), 0.1, false, 0.01);
        assert_eq!(first.principal, share);
        assert_relative_eq!(second.principal, share * 1.1, max_relative = 1e-12);
    }
}
