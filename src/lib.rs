//! Carbon Equilibrium - Monte Carlo carbon credit pricing for forest conservation
//!
//! This library provides:
//! - Normal revenue scenarios for timber, cattle and soybean land use
//! - NPV discounting and level-annuity conversions
//! - Conventional-use NPV distributions over many trials
//! - Equilibrium search for stock/flow carbon credit prices
//! - CSV/JSON export with display-only currency conversion

pub mod error;
pub mod config;
pub mod assumptions;
pub mod projection;
pub mod simulation;
pub mod equilibrium;
pub mod scenario;
pub mod export;

// Re-export commonly used types
pub use error::{FieldIssue, Result, SimulationError};
pub use config::{CarbonConstants, Currency, CurrencyDisplay, SimulationConfig};
pub use assumptions::{Activity, RevenueAssumptions, RevenueDistribution};
pub use projection::{CashFlowSeries, npv, annual_equivalent};
pub use simulation::{ConventionalDistribution, ConventionalSimulator, DistributionStats};
pub use equilibrium::{CarbonPriceRecommendation, EquilibriumSolution, EquilibriumSolver, PriceGrid, RecommendationRule};
pub use scenario::{EquilibriumOutcome, FinancialSummary, RunReport, SimulationRunner};
