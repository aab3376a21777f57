//! Simulation configuration and validation

mod currency;

pub use currency::{Currency, CurrencyDisplay, DEFAULT_EXCHANGE_RATE};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::equilibrium::{PriceGrid, RecommendationRule};
use crate::error::{FieldIssue, Result, SimulationError};

/// Standing carbon stock of intact forest (tCO2 per hectare)
pub const DEFAULT_CARBON_STOCK: f64 = 569.0;

/// Annual sequestration of intact forest (tCO2 per hectare per year)
pub const DEFAULT_SEQUESTRATION_RATE: f64 = 9.5;

pub const DEFAULT_DISCOUNT_RATE: f64 = 0.08;
pub const DEFAULT_HORIZON_YEARS: u32 = 30;
pub const DEFAULT_TRIALS: usize = 100_000;
pub const DEFAULT_TARGET_PERCENTILE: f64 = 75.0;

/// Upper bound on trials per run, keeps a run interactive
pub const DEFAULT_MAX_TRIALS: usize = 200_000;

pub const MIN_HORIZON_YEARS: u32 = 10;
pub const MAX_HORIZON_YEARS: u32 = 50;

/// Carbon physical constants per hectare
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonConstants {
    /// tCO2 per hectare
    pub carbon_stock: f64,
    /// tCO2 per hectare per year
    pub sequestration_rate: f64,
}

impl Default for CarbonConstants {
    fn default() -> Self {
        Self {
            carbon_stock: DEFAULT_CARBON_STOCK,
            sequestration_rate: DEFAULT_SEQUESTRATION_RATE,
        }
    }
}

/// Parameters of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Annual discount rate as a decimal (0.08 = 8%)
    pub discount_rate: f64,

    /// Analysis horizon in years
    pub horizon_years: u32,

    /// Number of Monte Carlo trials
    pub trials: usize,

    /// Hard cap on `trials`
    pub max_trials: usize,

    /// Percentile of conventional NPV that conservation must match (0-100]
    pub target_percentile: f64,

    pub carbon: CarbonConstants,

    /// Search bounds for the equilibrium solver
    pub price_grid: PriceGrid,

    /// How a single recommended price pair is picked from the viable set
    pub recommendation: RecommendationRule,

    /// RNG seed; `None` draws a fresh seed from OS entropy
    pub seed: Option<u64>,

    /// Presentation currency; computation is always BRL
    pub display: CurrencyDisplay,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            discount_rate: DEFAULT_DISCOUNT_RATE,
            horizon_years: DEFAULT_HORIZON_YEARS,
            trials: DEFAULT_TRIALS,
            max_trials: DEFAULT_MAX_TRIALS,
            target_percentile: DEFAULT_TARGET_PERCENTILE,
            carbon: CarbonConstants::default(),
            price_grid: PriceGrid::default(),
            recommendation: RecommendationRule::default(),
            seed: None,
            display: CurrencyDisplay::default(),
        }
    }
}

impl SimulationConfig {
    /// Load a config from a JSON file; missing keys take defaults
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: SimulationConfig = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Every offending field, empty when the config is usable
    pub fn issues(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        if !self.discount_rate.is_finite() || self.discount_rate < 0.0 || self.discount_rate > 1.0 {
            issues.push(FieldIssue::new(
                "discount_rate",
                format!("must be between 0 and 1, got {}", self.discount_rate),
            ));
        }

        if !(MIN_HORIZON_YEARS..=MAX_HORIZON_YEARS).contains(&self.horizon_years) {
            issues.push(FieldIssue::new(
                "horizon_years",
                format!(
                    "must be between {} and {} years, got {}",
                    MIN_HORIZON_YEARS, MAX_HORIZON_YEARS, self.horizon_years
                ),
            ));
        }

        if self.trials == 0 {
            issues.push(FieldIssue::new("trials", "must be at least 1"));
        } else if self.trials > self.max_trials {
            issues.push(FieldIssue::new(
                "trials",
                format!("must not exceed {}, got {}", self.max_trials, self.trials),
            ));
        }

        if !self.target_percentile.is_finite()
            || self.target_percentile <= 0.0
            || self.target_percentile > 100.0
        {
            issues.push(FieldIssue::new(
                "target_percentile",
                format!("must be in (0, 100], got {}", self.target_percentile),
            ));
        }

        if !self.carbon.carbon_stock.is_finite() || self.carbon.carbon_stock < 0.0 {
            issues.push(FieldIssue::new(
                "carbon_stock",
                format!("must be a non-negative number, got {}", self.carbon.carbon_stock),
            ));
        }

        if !self.carbon.sequestration_rate.is_finite() || self.carbon.sequestration_rate < 0.0 {
            issues.push(FieldIssue::new(
                "sequestration_rate",
                format!(
                    "must be a non-negative number, got {}",
                    self.carbon.sequestration_rate
                ),
            ));
        }

        issues.extend(self.price_grid.issues());
        issues.extend(self.recommendation.issues());

        if self.display.currency == Currency::Usd
            && (!self.display.exchange_rate.is_finite() || self.display.exchange_rate <= 0.0)
        {
            issues.push(FieldIssue::new(
                "exchange_rate",
                format!("must be a positive number, got {}", self.display.exchange_rate),
            ));
        }

        issues
    }

    pub fn validate(&self) -> Result<()> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(SimulationError::InvalidInput(issues))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.carbon.carbon_stock, 569.0);
        assert_eq!(config.carbon.sequestration_rate, 9.5);
        assert_eq!(config.target_percentile, 75.0);
    }

    #[test]
    fn test_zero_rate_allowed() {
        let config = SimulationConfig {
            discount_rate: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_every_bad_field_reported() {
        let config = SimulationConfig {
            discount_rate: -0.05,
            horizon_years: 5,
            trials: 0,
            target_percentile: 120.0,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.invalid_fields(),
            vec!["discount_rate", "horizon_years", "trials", "target_percentile"]
        );
    }

    #[test]
    fn test_trial_cap_enforced() {
        let config = SimulationConfig {
            trials: 500_000,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().invalid_fields(), vec!["trials"]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "discount_rate": 0.1, "horizon_years": 20, "seed": 7 }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.discount_rate, 0.1);
        assert_eq!(config.horizon_years, 20);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.trials, DEFAULT_TRIALS);
        assert_eq!(config.recommendation, RecommendationRule::MinimumTotalPayment);
    }

    #[test]
    fn test_json_rule_and_currency() {
        let json = r#"{
            "recommendation": { "anchor_flow_price": 10.0 },
            "display": { "currency": "USD", "exchange_rate": 5.5 }
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.recommendation, RecommendationRule::AnchorFlowPrice(10.0));
        assert_eq!(config.display.currency, Currency::Usd);
        assert!(config.validate().is_ok());
    }
}
