//! Monte Carlo simulation of conventional land-use revenues

mod conventional;
mod generator;
mod stats;

pub use conventional::{
    conventional_cash_flows, simulate_conventional_use, ConventionalDistribution, ConventionalSimulator,
};
pub use generator::{draw_floored, generate_revenue_draws, RevenueDraws, TrialRevenue};
pub use stats::{percentile, percentile_sorted, sorted_copy, DistributionStats};
