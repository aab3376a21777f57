//! Types for the carbon price equilibrium search

use serde::{Deserialize, Serialize};

use crate::error::FieldIssue;

pub const DEFAULT_MAX_STOCK_PRICE: f64 = 1000.0;
pub const DEFAULT_MAX_FLOW_PRICE: f64 = 1000.0;
pub const DEFAULT_GRID_STEPS: usize = 100;
pub const MAX_GRID_STEPS: usize = 1000;

/// Points sampled along the exact frontier of a solution
pub const DEFAULT_FRONTIER_SAMPLES: usize = 50;

/// Evenly spaced search grid over (stock price, flow price), both ends included
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceGrid {
    /// Upper bound for the stock credit price (BRL/tCO2)
    pub max_stock_price: f64,
    /// Upper bound for the flow credit price (BRL/tCO2/yr)
    pub max_flow_price: f64,
    /// Points per axis
    pub steps: usize,
}

impl Default for PriceGrid {
    fn default() -> Self {
        Self {
            max_stock_price: DEFAULT_MAX_STOCK_PRICE,
            max_flow_price: DEFAULT_MAX_FLOW_PRICE,
            steps: DEFAULT_GRID_STEPS,
        }
    }
}

impl PriceGrid {
    pub fn stock_prices(&self) -> Vec<f64> {
        linspace(self.max_stock_price, self.steps)
    }

    pub fn flow_prices(&self) -> Vec<f64> {
        linspace(self.max_flow_price, self.steps)
    }

    pub fn issues(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        if !self.max_stock_price.is_finite() || self.max_stock_price <= 0.0 {
            issues.push(FieldIssue::new(
                "max_stock_price",
                format!("must be a positive number, got {}", self.max_stock_price),
            ));
        }
        if !self.max_flow_price.is_finite() || self.max_flow_price <= 0.0 {
            issues.push(FieldIssue::new(
                "max_flow_price",
                format!("must be a positive number, got {}", self.max_flow_price),
            ));
        }
        if self.steps < 2 || self.steps > MAX_GRID_STEPS {
            issues.push(FieldIssue::new(
                "grid_steps",
                format!("must be between 2 and {}, got {}", MAX_GRID_STEPS, self.steps),
            ));
        }
        issues
    }
}

/// `steps` evenly spaced values from 0 to `max` inclusive
fn linspace(max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let last = (steps - 1) as f64;
            (0..steps)
                .map(|i| if i == steps - 1 { max } else { max * i as f64 / last })
                .collect()
        }
    }
}

/// Rule for picking one recommended price pair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationRule {
    /// Viable grid point with the lowest conservation NPV (ties: lower stock price)
    #[default]
    MinimumTotalPayment,
    /// Flow price fixed; stock price set exactly on the frontier
    AnchorFlowPrice(f64),
    /// Stock price fixed; flow price set exactly on the frontier
    AnchorStockPrice(f64),
    /// Median viable stock price and median viable flow price, with the flow
    /// price raised to the frontier if the pair falls short
    ViableMedian,
}

impl RecommendationRule {
    pub fn issues(&self) -> Vec<FieldIssue> {
        match *self {
            RecommendationRule::AnchorFlowPrice(price) | RecommendationRule::AnchorStockPrice(price)
                if !price.is_finite() || price < 0.0 =>
            {
                vec![FieldIssue::new(
                    "recommendation",
                    format!("anchor price must be a non-negative number, got {}", price),
                )]
            }
            _ => Vec::new(),
        }
    }
}

/// One viable (stock, flow) price pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceCombination {
    pub stock_price: f64,
    pub flow_price: f64,
    pub conservation_npv: f64,
}

/// Recommended carbon prices with per-hectare and annualized equivalents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonPriceRecommendation {
    pub rule: RecommendationRule,
    /// One-time price per tCO2 of standing stock
    pub stock_price: f64,
    /// Annual price per tCO2 sequestered
    pub flow_price: f64,
    /// Level annual payment equivalent to `stock_price` over the horizon
    pub stock_price_annualized: f64,
    /// `stock_price * carbon_stock`
    pub stock_payment_per_ha: f64,
    pub stock_payment_annualized_per_ha: f64,
    /// `flow_price * sequestration_rate`
    pub flow_payment_per_ha: f64,
    pub conservation_npv: f64,
}

/// Everything the solver found for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumSolution {
    pub target_percentile: f64,
    /// Conventional NPV at `target_percentile`
    pub target_npv: f64,
    /// All viable grid points, stock-major order
    pub viable: Vec<PriceCombination>,
    pub min_stock_price: f64,
    pub min_flow_price: f64,
    /// Stock price that reaches the target with no flow credit, if any
    pub stock_price_without_flow: Option<f64>,
    /// Flow price that reaches the target with no stock credit, if any
    pub flow_price_without_stock: Option<f64>,
    /// Price pairs on which conservation NPV equals the target, by rising flow price
    pub frontier: Vec<PriceCombination>,
    pub recommendation: CarbonPriceRecommendation,
}
