//! Monte Carlo NPV distribution of conventional land use

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::generator::{generate_revenue_draws, TrialRevenue};
use super::stats::{percentile, DistributionStats};
use crate::assumptions::{Activity, RevenueAssumptions};
use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::projection::{npv, CashFlowSeries};

/// Per-trial NPVs of conventional use, in trial order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConventionalDistribution {
    npvs: Vec<f64>,
}

impl ConventionalDistribution {
    /// Wrap raw NPVs, rejecting empty or non-finite input
    pub fn from_npvs(npvs: Vec<f64>) -> Result<Self> {
        if npvs.is_empty() {
            return Err(SimulationError::invalid("distribution", "needs at least one trial"));
        }
        if let Some(bad) = npvs.iter().position(|v| !v.is_finite()) {
            return Err(SimulationError::invalid(
                "distribution",
                format!("trial {} has non-finite NPV {}", bad, npvs[bad]),
            ));
        }
        Ok(Self { npvs })
    }

    pub fn len(&self) -> usize {
        self.npvs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.npvs.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.npvs
    }

    pub fn mean(&self) -> f64 {
        self.npvs.iter().sum::<f64>() / self.npvs.len() as f64
    }

    /// Percentile in percent (75.0 = 75th)
    pub fn percentile(&self, p: f64) -> Result<f64> {
        percentile(&self.npvs, p)
    }

    pub fn stats(&self) -> Result<DistributionStats> {
        DistributionStats::from_values(&self.npvs)
    }
}

/// Cash flows of one trial: timber at year 0 plus the cattle/soy rotation
pub fn conventional_cash_flows(trial: &TrialRevenue, horizon_years: u32) -> CashFlowSeries {
    let mut series = CashFlowSeries::zeros(horizon_years);
    series.add(0, trial.timber);
    for year in 0..horizon_years {
        series.add(year, trial.for_activity(Activity::rotation_for_year(year)));
    }
    series
}

/// Simulator for conventional land use NPVs
#[derive(Debug, Clone)]
pub struct ConventionalSimulator {
    assumptions: RevenueAssumptions,
    discount_rate: f64,
    horizon_years: u32,
}

impl ConventionalSimulator {
    pub fn new(assumptions: RevenueAssumptions, discount_rate: f64, horizon_years: u32) -> Self {
        Self {
            assumptions,
            discount_rate,
            horizon_years,
        }
    }

    pub fn from_config(assumptions: RevenueAssumptions, config: &SimulationConfig) -> Self {
        Self::new(assumptions, config.discount_rate, config.horizon_years)
    }

    pub fn assumptions(&self) -> &RevenueAssumptions {
        &self.assumptions
    }

    /// NPV of a single trial's revenues
    pub fn trial_npv(&self, trial: &TrialRevenue) -> Result<f64> {
        npv(&conventional_cash_flows(trial, self.horizon_years), self.discount_rate)
    }

    /// Run `trials` trials drawing from `rng`
    pub fn simulate<R: Rng + ?Sized>(&self, trials: usize, rng: &mut R) -> Result<ConventionalDistribution> {
        let start = Instant::now();
        let draws = generate_revenue_draws(&self.assumptions, trials, rng)?;

        let mut npvs = Vec::with_capacity(trials);
        for trial in draws.iter() {
            npvs.push(self.trial_npv(&trial)?);
        }

        debug!(
            "simulated {} conventional trials over {} years at {:.2}% in {:?}",
            trials,
            self.horizon_years,
            self.discount_rate * 100.0,
            start.elapsed()
        );

        ConventionalDistribution::from_npvs(npvs)
    }
}

/// Simulate conventional use NPVs for `config`
pub fn simulate_conventional_use<R: Rng + ?Sized>(
    config: &SimulationConfig,
    assumptions: &RevenueAssumptions,
    rng: &mut R,
) -> Result<ConventionalDistribution> {
    config.validate()?;
    ConventionalSimulator::from_config(assumptions.clone(), config).simulate(config.trials, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::RevenueDistribution;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fixed_assumptions(timber: Option<f64>) -> RevenueAssumptions {
        RevenueAssumptions {
            timber: timber.map(RevenueDistribution::fixed),
            cattle: RevenueDistribution::fixed(5000.0),
            soy: RevenueDistribution::fixed(4000.0),
        }
    }

    #[test]
    fn test_cash_flow_layout() {
        let trial = TrialRevenue {
            timber: 7000.0,
            cattle: 5000.0,
            soy: 4000.0,
        };
        let series = conventional_cash_flows(&trial, 4);

        assert_eq!(series.horizon(), 4);
        assert_eq!(series.amount(0), 12_000.0); // timber + cattle
        assert_eq!(series.amount(1), 4000.0);
        assert_eq!(series.amount(2), 5000.0);
        assert_eq!(series.amount(3), 4000.0);
    }

    #[test]
    fn test_distribution_size_and_finite() {
        let config = SimulationConfig {
            trials: 2_000,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let dist = simulate_conventional_use(&config, &RevenueAssumptions::default(), &mut rng).unwrap();

        assert_eq!(dist.len(), 2_000);
        assert!(dist.values().iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_zero_rate_equals_undiscounted_sum() {
        let simulator = ConventionalSimulator::new(fixed_assumptions(Some(1000.0)), 0.0, 30);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let dist = simulator.simulate(3, &mut rng).unwrap();

        // 15 cattle years + 15 soy years + timber
        let expected = 15.0 * 5000.0 + 15.0 * 4000.0 + 1000.0;
        for &value in dist.values() {
            assert_relative_eq!(value, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_discounting_lowers_npv() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let undiscounted = ConventionalSimulator::new(fixed_assumptions(None), 0.0, 30)
            .simulate(1, &mut rng)
            .unwrap();
        let discounted = ConventionalSimulator::new(fixed_assumptions(None), 0.08, 30)
            .simulate(1, &mut rng)
            .unwrap();

        assert!(discounted.values()[0] < undiscounted.values()[0]);
    }

    #[test]
    fn test_same_seed_bit_identical() {
        let config = SimulationConfig {
            trials: 1_000,
            ..Default::default()
        };
        let assumptions = RevenueAssumptions::default();
        let a = simulate_conventional_use(&config, &assumptions, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let b = simulate_conventional_use(&config, &assumptions, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_rejected_before_drawing() {
        let config = SimulationConfig {
            discount_rate: -0.1,
            ..Default::default()
        };
        let err = simulate_conventional_use(&config, &RevenueAssumptions::default(), &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err.invalid_fields(), vec!["discount_rate"]);
    }

    #[test]
    fn test_from_npvs_rejects_nan() {
        assert!(ConventionalDistribution::from_npvs(vec![1.0, f64::NAN]).is_err());
        assert!(ConventionalDistribution::from_npvs(Vec::new()).is_err());
    }
}
