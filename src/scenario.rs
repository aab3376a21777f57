//! Run orchestration: generator → NPV → distribution → equilibrium
//!
//! A [`SimulationRunner`] holds the revenue assumptions and runs any number of
//! independent configurations against them. Every run owns its RNG, so runs
//! never share mutable state and can be executed in parallel.

use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::rngs::OsRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::RevenueAssumptions;
use crate::config::SimulationConfig;
use crate::equilibrium::{CarbonPriceRecommendation, EquilibriumSolution, EquilibriumSolver};
use crate::error::{Result, SimulationError};
use crate::projection::annual_equivalent;
use crate::simulation::{ConventionalDistribution, ConventionalSimulator, DistributionStats};

/// Result of the equilibrium search, including the unreachable case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EquilibriumOutcome {
    Viable(EquilibriumSolution),
    NoViableSolution {
        target_percentile: f64,
        target_npv: f64,
        max_conservation_npv: f64,
        message: String,
    },
}

impl EquilibriumOutcome {
    pub fn solution(&self) -> Option<&EquilibriumSolution> {
        match self {
            EquilibriumOutcome::Viable(solution) => Some(solution),
            EquilibriumOutcome::NoViableSolution { .. } => None,
        }
    }

    pub fn recommendation(&self) -> Option<&CarbonPriceRecommendation> {
        self.solution().map(|s| &s.recommendation)
    }

    pub fn is_viable(&self) -> bool {
        self.solution().is_some()
    }
}

/// Per-hectare comparison of the recommended carbon payments and conventional use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    /// Recommended stock price times carbon stock
    pub total_stock_value_per_ha: f64,
    /// Recommended flow price times sequestration rate
    pub annual_flow_value_per_ha: f64,
    /// Annualized stock payment plus the flow payment
    pub equivalent_annual_conservation_revenue: f64,
    /// Mean conventional NPV spread evenly (in PV terms) over the horizon
    pub equivalent_annual_conventional_revenue: f64,
    pub includes_timber: bool,
}

impl FinancialSummary {
    pub fn new(
        recommendation: &CarbonPriceRecommendation,
        stats: &DistributionStats,
        config: &SimulationConfig,
        includes_timber: bool,
    ) -> Result<Self> {
        Ok(Self {
            total_stock_value_per_ha: recommendation.stock_payment_per_ha,
            annual_flow_value_per_ha: recommendation.flow_payment_per_ha,
            equivalent_annual_conservation_revenue: recommendation.stock_payment_annualized_per_ha
                + recommendation.flow_payment_per_ha,
            equivalent_annual_conventional_revenue: annual_equivalent(
                stats.mean,
                config.discount_rate,
                config.horizon_years,
            )?,
            includes_timber,
        })
    }
}

/// Everything produced by one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    /// Seed actually used, for replaying the run
    pub seed: u64,
    pub config: SimulationConfig,
    pub assumptions: RevenueAssumptions,
    pub stats: DistributionStats,
    pub equilibrium: EquilibriumOutcome,
    /// Present when a recommendation exists
    pub summary: Option<FinancialSummary>,
    pub distribution: ConventionalDistribution,
}

/// Runs simulations against a fixed set of revenue assumptions
#[derive(Debug, Clone, Default)]
pub struct SimulationRunner {
    assumptions: RevenueAssumptions,
}

impl SimulationRunner {
    pub fn new(assumptions: RevenueAssumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &RevenueAssumptions {
        &self.assumptions
    }

    pub fn assumptions_mut(&mut self) -> &mut RevenueAssumptions {
        &mut self.assumptions
    }

    /// Run `config`, seeding from `config.seed` or OS entropy
    pub fn run(&self, config: &SimulationConfig) -> Result<RunReport> {
        let seed = config.seed.unwrap_or_else(|| OsRng.next_u64());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.run_with_rng(config, seed, &mut rng)
    }

    /// Run `config` drawing from a caller-supplied RNG; `seed` is only recorded
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        config: &SimulationConfig,
        seed: u64,
        rng: &mut R,
    ) -> Result<RunReport> {
        let start = Instant::now();

        let mut issues = config.issues();
        issues.extend(self.assumptions.issues());
        if !issues.is_empty() {
            return Err(SimulationError::InvalidInput(issues));
        }

        info!(
            "running {} trials: rate {:.2}%, horizon {} years, target p{}",
            config.trials,
            config.discount_rate * 100.0,
            config.horizon_years,
            config.target_percentile
        );

        let distribution =
            ConventionalSimulator::from_config(self.assumptions.clone(), config).simulate(config.trials, rng)?;
        let stats = distribution.stats()?;

        let solver = EquilibriumSolver::from_config(config)?;
        let equilibrium = match solver.solve(&distribution, config.target_percentile) {
            Ok(solution) => EquilibriumOutcome::Viable(solution),
            Err(SimulationError::NoViableSolution {
                target_npv,
                max_conservation_npv,
            }) => {
                warn!(
                    "no viable carbon price for p{} target {:.2}; best reachable {:.2}",
                    config.target_percentile, target_npv, max_conservation_npv
                );
                EquilibriumOutcome::NoViableSolution {
                    target_percentile: config.target_percentile,
                    target_npv,
                    max_conservation_npv,
                    message: format!(
                        "Conservation cannot match the {}th percentile of conventional NPV ({:.2}) at any price \
                         up to {:.2} (stock) / {:.2} (flow); the best reachable conservation NPV is {:.2}",
                        config.target_percentile,
                        target_npv,
                        config.price_grid.max_stock_price,
                        config.price_grid.max_flow_price,
                        max_conservation_npv
                    ),
                }
            }
            Err(err) => return Err(err),
        };

        let summary = match equilibrium.recommendation() {
            Some(rec) => Some(FinancialSummary::new(rec, &stats, config, self.assumptions.timber.is_some())?),
            None => None,
        };

        info!("run finished in {:?}", start.elapsed());

        Ok(RunReport {
            generated_at: Utc::now(),
            seed,
            config: config.clone(),
            assumptions: self.assumptions.clone(),
            stats,
            equilibrium,
            summary,
            distribution,
        })
    }

    /// Re-run `config` once per discount rate, in parallel
    ///
    /// All runs share one seed so differences come from the rate alone.
    /// Results keep the order of `rates`.
    pub fn run_rate_sweep(&self, config: &SimulationConfig, rates: &[f64]) -> Vec<Result<RunReport>> {
        let seed = config.seed.unwrap_or_else(|| OsRng.next_u64());

        rates
            .par_iter()
            .map(|&rate| {
                let run_config = SimulationConfig {
                    discount_rate: rate,
                    seed: Some(seed),
                    ..config.clone()
                };
                self.run(&run_config)
            })
            .collect()
    }
}
