//! Carbon credit price equilibrium
//!
//! Finds (stock price, flow price) pairs whose conservation NPV reaches a chosen
//! percentile of the conventional-use NPV distribution.

mod solver;
mod types;

pub use solver::{find_equilibrium_prices, EquilibriumSolver};
pub use types::{
    CarbonPriceRecommendation, EquilibriumSolution, PriceCombination, PriceGrid, RecommendationRule,
    DEFAULT_FRONTIER_SAMPLES, DEFAULT_GRID_STEPS, DEFAULT_MAX_FLOW_PRICE, DEFAULT_MAX_STOCK_PRICE, MAX_GRID_STEPS,
};
