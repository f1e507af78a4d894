//! Scenario analyzer
//!
//! Runs every (repayment method, prepayment strategy) combination for one loan
//! and collects the results into a [`ScenarioSet`].

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::loan::{LoanInput, PrepaymentStrategy, RepaymentMethod};
use crate::projection::{
    compute_original, prepayment_cashflows, project, solve_irr, AmortizationEntry, NewTerm, OriginalLoan,
};

/// A figure that may not be defined for a scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Applicable(f64),
    NotApplicable,
}

impl Metric {
    pub fn value(&self) -> Option<f64> {
        match *self {
            Metric::Applicable(v) => Some(v),
            Metric::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Metric::Applicable(_))
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Metric::Applicable(v),
            _ => Metric::NotApplicable,
        }
    }
}

/// Identifies one scenario, e.g. `AC_shortenTerm`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ScenarioKey {
    pub method: RepaymentMethod,
    pub strategy: PrepaymentStrategy,
}

impl ScenarioKey {
    pub fn new(method: RepaymentMethod, strategy: PrepaymentStrategy) -> Self {
        Self { method, strategy }
    }

    /// All four keys in analysis order
    pub fn all() -> impl Iterator<Item = ScenarioKey> {
        RepaymentMethod::ALL
            .into_iter()
            .flat_map(|method| PrepaymentStrategy::ALL.into_iter().map(move |strategy| ScenarioKey::new(method, strategy)))
    }

    /// Human-readable name, e.g. "Equal installment · Shorten term"
    pub fn display_name(&self) -> String {
        format!("{} · {}", self.method.label(), self.strategy.label())
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.method.code(), self.strategy.code())
    }
}

impl FromStr for ScenarioKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (method, strategy) = s.split_once('_').ok_or_else(|| format!("malformed scenario key: {}", s))?;
        let method = RepaymentMethod::from_code(method).ok_or_else(|| format!("unknown repayment method: {}", method))?;
        let strategy =
            PrepaymentStrategy::from_code(strategy).ok_or_else(|| format!("unknown prepayment strategy: {}", strategy))?;
        Ok(ScenarioKey::new(method, strategy))
    }
}

impl From<ScenarioKey> for String {
    fn from(key: ScenarioKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for ScenarioKey {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// Outcome of one (method, strategy) scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub key: ScenarioKey,
    pub name: String,

    /// Lifetime interest saved by prepaying
    pub interest_saved: f64,

    /// First payment after prepayment; None if nothing is left to pay
    pub new_monthly_payment: Option<f64>,

    pub new_term: NewTerm,

    /// Annualized IRR of the prepayment, percent
    pub irr: Metric,

    /// Interest saved per `leverage_unit` of prepayment
    pub leverage: Metric,

    pub schedule: Vec<AmortizationEntry>,

    pub original_future_payment: f64,
    pub new_future_payment: f64,
    pub term_saved: Option<u32>,
    pub full_payoff: bool,
}

/// Results for all four scenarios of one loan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioSet {
    scenarios: BTreeMap<ScenarioKey, ScenarioResult>,
}

impl ScenarioSet {
    pub fn get(&self, key: &ScenarioKey) -> Option<&ScenarioResult> {
        self.scenarios.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScenarioKey, &ScenarioResult)> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Scenario with the largest interest saved; ties go to the earlier key
    pub fn recommended(&self) -> Option<&ScenarioResult> {
        self.scenarios.values().fold(None, |best: Option<&ScenarioResult>, candidate| match best {
            Some(current) if current.interest_saved >= candidate.interest_saved => Some(current),
            _ => Some(candidate),
        })
    }
}

/// Analyzer holding the numerical settings; cheap to clone and share
#[derive(Debug, Clone, Default)]
pub struct ScenarioAnalyzer {
    config: AnalysisConfig,
}

impl ScenarioAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyze all four scenarios. Fails only on invalid input; numerical
    /// trouble is reported inside the affected scenario.
    pub fn analyze(&self, input: &LoanInput) -> Result<ScenarioSet> {
        input.validate()?;

        let mut scenarios = BTreeMap::new();

        for method in RepaymentMethod::ALL {
            let original = compute_original(input, method, &self.config)?;

            for strategy in PrepaymentStrategy::ALL {
                let key = ScenarioKey::new(method, strategy);
                let result = self.run_scenario(key, input, &original);
                scenarios.insert(key, result);
            }
        }

        info!(
            "analyzed loan of {:.2} over {} months, {} paid, prepaying {:.2}",
            input.total_amount, input.loan_term, input.months_paid, input.prepayment_amount
        );

        Ok(ScenarioSet { scenarios })
    }

    fn run_scenario(&self, key: ScenarioKey, input: &LoanInput, original: &OriginalLoan) -> ScenarioResult {
        let projection = project(original, input.prepayment_amount, input.rate, key.strategy, &self.config);

        // No outlay, nothing settled by it, or no finite new term: no IRR
        let irr = if input.prepayment_amount <= 0.0
            || projection.full_payoff
            || projection.new_term == NewTerm::NotRepresentable
        {
            Metric::NotApplicable
        } else {
            let flows = prepayment_cashflows(
                input.prepayment_amount,
                &original.future_cash_flow,
                &projection.new_future_cash_flow,
            );
            Metric::from(solve_irr(&flows, &self.config.irr))
        };

        let leverage = self.leverage(projection.interest_saved, input.prepayment_amount);

        debug!("{}: irr {:?}, leverage {:?}", key, irr, leverage);

        ScenarioResult {
            key,
            name: key.display_name(),
            interest_saved: projection.interest_saved,
            new_monthly_payment: projection.new_monthly_payment,
            new_term: projection.new_term,
            irr,
            leverage,
            schedule: projection.schedule,
            original_future_payment: projection.original_future_payment,
            new_future_payment: projection.new_future_payment,
            term_saved: projection.term_saved,
            full_payoff: projection.full_payoff,
        }
    }

    fn leverage(&self, interest_saved: f64, prepayment_amount: f64) -> Metric {
        if prepayment_amount > 0.0 {
            Metric::from(Some(interest_saved / (prepayment_amount / self.config.leverage_unit)))
        } else {
            Metric::NotApplicable
        }
    }
}

/// Analyze with default settings
pub fn analyze(input: &LoanInput) -> Result<ScenarioSet> {
    ScenarioAnalyzer::new().analyze(input)
}

/// Parse a scenario key, mapping failures to an input error
pub fn parse_key(s: &str) -> Result<ScenarioKey> {
    s.parse().map_err(|reason| AnalysisError::InvalidInput { field: "scenario", reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ScheduleSummary;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn reference_loan(prepayment: f64) -> LoanInput {
        LoanInput::new(1_000_000.0, 360, 0.0032917, 12, prepayment)
    }

    const AC_SHORTEN: ScenarioKey = ScenarioKey {
        method: RepaymentMethod::EqualInstallment,
        strategy: PrepaymentStrategy::ShortenTerm,
    };

    #[test]
    fn test_four_scenarios() {
        let set = analyze(&reference_loan(100_000.0)).unwrap();
        assert_eq!(set.len(), 4);
        for key in ScenarioKey::all() {
            let result = set.get(&key).unwrap();
            assert_eq!(result.key, key);
        }
    }

    #[test]
    fn test_reference_shorten_term_scenario() {
        let set = analyze(&reference_loan(100_000.0)).unwrap();
        let result = set.get(&AC_SHORTEN).unwrap();

        let term = result.new_term.periods().unwrap();
        assert!(term < 348);
        assert!(result.interest_saved > 0.0);
        assert_eq!(result.schedule.len() as u32, term);

        // Prepaying a ~3.95% loan returns about the loan rate
        let irr = result.irr.value().unwrap();
        assert!(irr.is_finite());
        assert!(irr > 3.0 && irr < 5.0, "irr {}", irr);
        assert!(result.leverage.is_applicable());
    }

    #[test]
    fn test_all_scenarios_have_finite_irr() {
        let set = analyze(&reference_loan(100_000.0)).unwrap();
        for (key, result) in set.iter() {
            assert!(result.irr.value().map_or(false, f64::is_finite), "{} irr {:?}", key, result.irr);
            assert!(result.interest_saved > 0.0, "{}", key);
        }
    }

    #[test]
    fn test_full_payoff_scenarios() {
        let config = AnalysisConfig::default();
        for method in RepaymentMethod::ALL {
            let remaining = compute_original(&reference_loan(0.0), method, &config).unwrap().remaining_principal;
            let set = analyze(&reference_loan(remaining)).unwrap();

            for strategy in PrepaymentStrategy::ALL {
                let result = set.get(&ScenarioKey::new(method, strategy)).unwrap();
                assert!(result.full_payoff);
                assert_eq!(result.new_term, NewTerm::Periods(0));
                assert!(result.schedule.is_empty());
                assert_eq!(result.irr, Metric::NotApplicable);
                assert_eq!(result.new_monthly_payment, None);
                assert!(result.leverage.is_applicable());
            }
        }
    }

    #[test]
    fn test_schedules_close() {
        let set = analyze(&reference_loan(250_000.0)).unwrap();
        for (_, result) in set.iter() {
            let summary = ScheduleSummary::from_entries(&result.schedule);
            assert_abs_diff_eq!(summary.final_balance, 0.0, epsilon = 0.01);
            assert_abs_diff_eq!(summary.total_paid, result.new_future_payment, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_interest_dominated_loan_still_saves_interest() {
        // 10% per month over 40 years: each level payment is almost all interest
        let input = LoanInput::new(1_000_000.0, 480, 0.1, 0, 10_000.0);
        let set = analyze(&input).unwrap();

        for (key, result) in set.iter() {
            assert!(result.interest_saved >= 0.0, "{} saved {}", key, result.interest_saved);
            let summary = ScheduleSummary::from_entries(&result.schedule);
            assert_abs_diff_eq!(summary.final_balance, 0.0, epsilon = 0.01);
        }

        let reduce = set
            .get(&ScenarioKey::new(RepaymentMethod::EqualInstallment, PrepaymentStrategy::ReducePayment))
            .unwrap();
        assert_eq!(reduce.new_term, NewTerm::Periods(480));
        // Saves 1% of every payment, less the 10,000 of principal prepaid
        let payment = reduce.original_future_payment / 480.0;
        assert_relative_eq!(reduce.interest_saved, 0.01 * payment * 480.0 - 10_000.0, max_relative = 1e-6);
        // The prepayment earns the loan rate
        let irr = reduce.irr.value().unwrap();
        assert_abs_diff_eq!(irr, crate::projection::annualize(0.1, 12) * 100.0, epsilon = 0.05);
    }

    #[test]
    fn test_zero_rate_saves_no_interest() {
        let input = LoanInput::new(120_000.0, 120, 0.0, 24, 10_000.0);
        let set = analyze(&input).unwrap();
        assert_eq!(set.len(), 4);
        for (_, result) in set.iter() {
            assert_eq!(result.interest_saved, 0.0);
            assert_eq!(result.leverage, Metric::Applicable(0.0));
        }
    }

    #[test]
    fn test_zero_prepayment_leverage_not_applicable() {
        let set = analyze(&reference_loan(0.0)).unwrap();
        for (_, result) in set.iter() {
            assert_eq!(result.leverage, Metric::NotApplicable);
            assert_eq!(result.irr, Metric::NotApplicable);
            assert_abs_diff_eq!(result.interest_saved, 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_invalid_input_fails_whole_call() {
        let input = LoanInput::new(1_000_000.0, 360, 0.0032917, 360, 1.0);
        assert!(matches!(analyze(&input), Err(AnalysisError::InvalidInput { .. })));
    }

    #[test]
    fn test_recommended_is_max_interest_saved() {
        let set = analyze(&reference_loan(100_000.0)).unwrap();
        let best = set.recommended().unwrap();
        assert!(set.iter().all(|(_, r)| r.interest_saved <= best.interest_saved));
        // Shortening the term of an equal-installment loan saves the most interest
        assert_eq!(best.key, AC_SHORTEN);
    }

    #[test]
    fn test_scenario_key_round_trip() {
        for key in ScenarioKey::all() {
            assert_eq!(key.to_string().parse::<ScenarioKey>().unwrap(), key);
        }
        assert_eq!(AC_SHORTEN.to_string(), "AC_shortenTerm");
        assert!(parse_key("AC").is_err());
        assert!(parse_key("XX_shortenTerm").is_err());
    }

    #[test]
    fn test_json_keys_and_sentinels() {
        let set = analyze(&reference_loan(0.0)).unwrap();
        let json = serde_json::to_value(&set).unwrap();
        let entry = &json["AP_reducePayment"];
        assert!(entry["leverage"].is_null());
        assert!(entry["irr"].is_null());
        assert_eq!(entry["new_term"], 348);

        let back: ScenarioSet = serde_json::from_value(json).unwrap();
        assert_eq!(back.len(), 4);
    }
}
