//! Search for carbon credit prices that make conservation competitive
//!
//! Conservation NPV per hectare for a price pair:
//!
//! ```text
//! stock_price * carbon_stock
//!     + flow_price * sequestration_rate * annuity_factor(r, horizon)
//! ```
//!
//! with the stock credit paid once today and the flow credit paid at the end
//! of each year `1..=horizon`. One target NPV and two prices leave a line of
//! solutions, so the solver reports the whole viable grid plus one pair picked
//! by a [`RecommendationRule`].

use log::debug;

use super::types::{
    CarbonPriceRecommendation, EquilibriumSolution, PriceCombination, PriceGrid, RecommendationRule,
    DEFAULT_FRONTIER_SAMPLES,
};
use crate::config::{CarbonConstants, SimulationConfig};
use crate::error::{Result, SimulationError};
use crate::projection::{annual_equivalent, annuity_factor};
use crate::simulation::{percentile, ConventionalDistribution};

/// Equilibrium solver for a fixed rate, horizon and set of carbon constants
#[derive(Debug, Clone)]
pub struct EquilibriumSolver {
    carbon: CarbonConstants,
    discount_rate: f64,
    horizon_years: u32,
    grid: PriceGrid,
    rule: RecommendationRule,
    /// PV of 1 paid yearly over the horizon
    annuity: f64,
}

impl EquilibriumSolver {
    pub fn new(
        carbon: CarbonConstants,
        discount_rate: f64,
        horizon_years: u32,
        grid: PriceGrid,
        rule: RecommendationRule,
    ) -> Result<Self> {
        let mut issues = grid.issues();
        issues.extend(rule.issues());
        if !issues.is_empty() {
            return Err(SimulationError::InvalidInput(issues));
        }

        let annuity = annuity_factor(discount_rate, horizon_years)?;
        Ok(Self {
            carbon,
            discount_rate,
            horizon_years,
            grid,
            rule,
            annuity,
        })
    }

    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        Self::new(
            config.carbon,
            config.discount_rate,
            config.horizon_years,
            config.price_grid,
            config.recommendation,
        )
    }

    /// NPV per hectare of one stock payment now plus yearly flow payments
    pub fn conservation_npv(&self, stock_price: f64, flow_price: f64) -> f64 {
        stock_price * self.stock_value_per_price() + flow_price * self.flow_value_per_price()
    }

    /// NPV contributed by 1 BRL/tCO2 of stock price
    fn stock_value_per_price(&self) -> f64 {
        self.carbon.carbon_stock
    }

    /// NPV contributed by 1 BRL/tCO2/yr of flow price
    fn flow_value_per_price(&self) -> f64 {
        self.carbon.sequestration_rate * self.annuity
    }

    fn best_reachable_npv(&self) -> f64 {
        self.conservation_npv(self.grid.max_stock_price, self.grid.max_flow_price)
    }

    fn no_viable(&self, target_npv: f64, max_conservation_npv: f64) -> SimulationError {
        SimulationError::NoViableSolution {
            target_npv,
            max_conservation_npv,
        }
    }

    /// Solve against the `target_percentile` of `distribution`
    pub fn solve(
        &self,
        distribution: &ConventionalDistribution,
        target_percentile: f64,
    ) -> Result<EquilibriumSolution> {
        let target_npv = distribution.percentile(target_percentile)?;
        self.solve_for_target(target_percentile, target_npv)
    }

    /// Solve against an explicit target NPV
    pub fn solve_for_target(&self, target_percentile: f64, target_npv: f64) -> Result<EquilibriumSolution> {
        if !target_npv.is_finite() {
            return Err(SimulationError::invalid(
                "target_npv",
                format!("must be finite, got {}", target_npv),
            ));
        }

        let viable = self.viable_combinations(target_npv);
        if viable.is_empty() {
            return Err(self.no_viable(target_npv, self.best_reachable_npv()));
        }

        let min_stock_price = viable.iter().map(|c| c.stock_price).fold(f64::INFINITY, f64::min);
        let min_flow_price = viable.iter().map(|c| c.flow_price).fold(f64::INFINITY, f64::min);

        let (stock_price, flow_price) = self.pick(target_npv, &viable)?;
        let recommendation = self.recommend(stock_price, flow_price)?;

        debug!(
            "target NPV {:.2}: {} viable pairs, recommended stock {:.2} / flow {:.2}",
            target_npv,
            viable.len(),
            recommendation.stock_price,
            recommendation.flow_price
        );

        Ok(EquilibriumSolution {
            target_percentile,
            target_npv,
            min_stock_price,
            min_flow_price,
            stock_price_without_flow: self.required_stock_price(target_npv, 0.0),
            flow_price_without_stock: self.required_flow_price(target_npv, 0.0),
            frontier: self.frontier(target_npv, DEFAULT_FRONTIER_SAMPLES),
            viable,
            recommendation,
        })
    }

    /// Every grid pair whose conservation NPV reaches `target_npv`
    pub fn viable_combinations(&self, target_npv: f64) -> Vec<PriceCombination> {
        let flows = self.grid.flow_prices();
        let mut viable = Vec::new();

        for stock_price in self.grid.stock_prices() {
            for &flow_price in &flows {
                let conservation_npv = self.conservation_npv(stock_price, flow_price);
                if conservation_npv >= target_npv {
                    viable.push(PriceCombination {
                        stock_price,
                        flow_price,
                        conservation_npv,
                    });
                }
            }
        }

        viable
    }

    /// Smallest stock price reaching `target_npv` given `flow_price`
    ///
    /// `None` when no finite stock price can close the gap.
    pub fn required_stock_price(&self, target_npv: f64, flow_price: f64) -> Option<f64> {
        let gap = target_npv - flow_price * self.flow_value_per_price();
        let price = required_price(gap, self.stock_value_per_price())?;
        Some(raise_until(price, |p| self.conservation_npv(p, flow_price) >= target_npv))
    }

    /// Smallest flow price reaching `target_npv` given `stock_price`
    pub fn required_flow_price(&self, target_npv: f64, stock_price: f64) -> Option<f64> {
        let gap = target_npv - stock_price * self.stock_value_per_price();
        let price = required_price(gap, self.flow_value_per_price())?;
        Some(raise_until(price, |p| self.conservation_npv(stock_price, p) >= target_npv))
    }

    /// Exact frontier sampled at `samples` flow prices, from zero up to the
    /// flow price that reaches the target alone (capped by the grid)
    pub fn frontier(&self, target_npv: f64, samples: usize) -> Vec<PriceCombination> {
        let max_flow_price = self
            .required_flow_price(target_npv, 0.0)
            .map_or(self.grid.max_flow_price, |f| f.min(self.grid.max_flow_price));
        if max_flow_price <= 0.0 {
            // Target met with no credit at all
            return vec![PriceCombination {
                stock_price: 0.0,
                flow_price: 0.0,
                conservation_npv: 0.0,
            }];
        }
        let grid = PriceGrid {
            max_flow_price,
            steps: samples,
            ..self.grid
        };

        grid.flow_prices()
            .into_iter()
            .filter_map(|flow_price| {
                let stock_price = self.required_stock_price(target_npv, flow_price)?;
                (stock_price <= self.grid.max_stock_price).then(|| PriceCombination {
                    stock_price,
                    flow_price,
                    conservation_npv: self.conservation_npv(stock_price, flow_price),
                })
            })
            .collect()
    }

    fn pick(&self, target_npv: f64, viable: &[PriceCombination]) -> Result<(f64, f64)> {
        match self.rule {
            RecommendationRule::MinimumTotalPayment => {
                let mut best = viable[0];
                for candidate in &viable[1..] {
                    if candidate.conservation_npv < best.conservation_npv {
                        best = *candidate;
                    }
                }
                Ok((best.stock_price, best.flow_price))
            }
            RecommendationRule::AnchorFlowPrice(flow_price) => {
                let stock_price = self
                    .required_stock_price(target_npv, flow_price)
                    .filter(|&s| s <= self.grid.max_stock_price)
                    .ok_or_else(|| {
                        self.no_viable(target_npv, self.conservation_npv(self.grid.max_stock_price, flow_price))
                    })?;
                Ok((stock_price, flow_price))
            }
            RecommendationRule::AnchorStockPrice(stock_price) => {
                let flow_price = self
                    .required_flow_price(target_npv, stock_price)
                    .filter(|&f| f <= self.grid.max_flow_price)
                    .ok_or_else(|| {
                        self.no_viable(target_npv, self.conservation_npv(stock_price, self.grid.max_flow_price))
                    })?;
                Ok((stock_price, flow_price))
            }
            RecommendationRule::ViableMedian => {
                let stocks: Vec<f64> = viable.iter().map(|c| c.stock_price).collect();
                let flows: Vec<f64> = viable.iter().map(|c| c.flow_price).collect();
                let stock_price = percentile(&stocks, 50.0)?;
                let median_flow = percentile(&flows, 50.0)?;

                if self.conservation_npv(stock_price, median_flow) >= target_npv {
                    return Ok((stock_price, median_flow));
                }

                let flow_price = self
                    .required_flow_price(target_npv, stock_price)
                    .filter(|&f| f <= self.grid.max_flow_price)
                    .ok_or_else(|| {
                        self.no_viable(target_npv, self.conservation_npv(stock_price, self.grid.max_flow_price))
                    })?;
                Ok((stock_price, flow_price.max(median_flow)))
            }
        }
    }

    fn recommend(&self, stock_price: f64, flow_price: f64) -> Result<CarbonPriceRecommendation> {
        let stock_price_annualized = annual_equivalent(stock_price, self.discount_rate, self.horizon_years)?;
        let stock_payment_per_ha = stock_price * self.carbon.carbon_stock;

        Ok(CarbonPriceRecommendation {
            rule: self.rule,
            stock_price,
            flow_price,
            stock_price_annualized,
            stock_payment_per_ha,
            stock_payment_annualized_per_ha: stock_price_annualized * self.carbon.carbon_stock,
            flow_payment_per_ha: flow_price * self.carbon.sequestration_rate,
            conservation_npv: self.conservation_npv(stock_price, flow_price),
        })
    }
}

/// Price needed to cover `gap` when each unit of price is worth `value_per_price`
fn required_price(gap: f64, value_per_price: f64) -> Option<f64> {
    if gap <= 0.0 {
        Some(0.0)
    } else if value_per_price > 0.0 {
        Some(gap / value_per_price)
    } else {
        None
    }
}

/// Step `price` up by single ulps until `reached` holds; rounding in the
/// division can leave an exact frontier price a hair short of the target
fn raise_until(mut price: f64, reached: impl Fn(f64) -> bool) -> f64 {
    for _ in 0..16 {
        if reached(price) {
            break;
        }
        price = f64::from_bits(price.to_bits() + 1);
    }
    price
}

/// Solve the equilibrium for `config` against `distribution`
pub fn find_equilibrium_prices(
    config: &SimulationConfig,
    distribution: &ConventionalDistribution,
) -> Result<EquilibriumSolution> {
    EquilibriumSolver::from_config(config)?.solve(distribution, config.target_percentile)
}
