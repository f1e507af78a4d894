//! Analysis configuration
//!
//! Defaults reproduce the reference calculator. Binaries may override any
//! field through environment variables (see [`AnalysisConfig::from_env`]).

use serde::{Deserialize, Serialize};
use std::env;

/// Newton-Raphson settings for the IRR solver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrConfig {
    /// Starting periodic (monthly) rate
    #[serde(default = "default_initial_guess")]
    pub initial_guess: f64,

    /// Step size below which the iteration is considered converged
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// |dNPV/dg| below this aborts the iteration as non-convergent
    #[serde(default = "default_tolerance")]
    pub derivative_floor: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Compounding periods used to annualize the periodic rate
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
}

fn default_initial_guess() -> f64 { 0.005 }
fn default_tolerance() -> f64 { 1e-7 }
fn default_max_iterations() -> u32 { 1000 }
fn default_periods_per_year() -> u32 { 12 }
fn default_balance_epsilon() -> f64 { 0.01 }
fn default_zero_rate_threshold() -> f64 { 1e-12 }
fn default_leverage_unit() -> f64 { 10_000.0 }

impl Default for IrrConfig {
    fn default() -> Self {
        Self {
            initial_guess: default_initial_guess(),
            tolerance: default_tolerance(),
            derivative_floor: default_tolerance(),
            max_iterations: default_max_iterations(),
            periods_per_year: default_periods_per_year(),
        }
    }
}

/// Configuration for a scenario analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub irr: IrrConfig,

    /// Running balance below which schedule generation stops (currency units)
    #[serde(default = "default_balance_epsilon")]
    pub balance_epsilon: f64,

    /// Periodic rates at or below this use the zero-rate formulas
    #[serde(default = "default_zero_rate_threshold")]
    pub zero_rate_threshold: f64,

    /// Capital unit for the leverage metric (interest saved per 10,000)
    #[serde(default = "default_leverage_unit")]
    pub leverage_unit: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            irr: IrrConfig::default(),
            balance_epsilon: default_balance_epsilon(),
            zero_rate_threshold: default_zero_rate_threshold(),
            leverage_unit: default_leverage_unit(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults, overridden by IRR_INITIAL_GUESS, IRR_TOLERANCE,
    /// IRR_MAX_ITERATIONS, BALANCE_EPSILON and LEVERAGE_UNIT when set.
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("IRR_INITIAL_GUESS") {
            config.irr.initial_guess = v;
        }
        if let Some(v) = env_parse("IRR_TOLERANCE") {
            config.irr.tolerance = v;
        }
        if let Some(v) = env_parse("IRR_MAX_ITERATIONS") {
            config.irr.max_iterations = v;
        }
        if let Some(v) = env_parse("BALANCE_EPSILON") {
            config.balance_epsilon = v;
        }
        if let Some(v) = env_parse::<f64>("LEVERAGE_UNIT") {
            if v > 0.0 {
                config.leverage_unit = v;
            }
        }

        config
    }

    /// True when `rate` should be handled with the zero-rate fallbacks
    pub fn is_zero_rate(&self, rate: f64) -> bool {
        rate.abs() <= self.zero_rate_threshold
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_calculator() {
        let config = AnalysisConfig::default();
        assert_eq!(config.irr.initial_guess, 0.005);
        assert_eq!(config.irr.tolerance, 1e-7);
        assert_eq!(config.irr.max_iterations, 1000);
        assert_eq!(config.irr.periods_per_year, 12);
        assert_eq!(config.balance_epsilon, 0.01);
        assert_eq!(config.leverage_unit, 10_000.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"balance_epsilon": 0.5, "irr": {"max_iterations": 50}}"#).unwrap();
        assert_eq!(config.balance_epsilon, 0.5);
        assert_eq!(config.irr.max_iterations, 50);
        assert_eq!(config.irr.initial_guess, 0.005);
        assert_eq!(config.leverage_unit, 10_000.0);
    }

    #[test]
    fn test_zero_rate_detection() {
        let config = AnalysisConfig::default();
        assert!(config.is_zero_rate(0.0));
        assert!(config.is_zero_rate(1e-15));
        assert!(!config.is_zero_rate(0.0032917));
    }
}
