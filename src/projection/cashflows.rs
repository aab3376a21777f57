//! Annual cash-flow series for a single hectare

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// A single year's cash flow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    /// Year index, 0 = today (undiscounted)
    pub year: u32,
    pub amount: f64,
}

/// Ordered cash flows covering years `0..horizon` with no gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSeries {
    flows: Vec<CashFlow>,
}

impl CashFlowSeries {
    /// Create a zero-filled series of `horizon` years
    pub fn zeros(horizon: u32) -> Self {
        Self {
            flows: (0..horizon).map(|year| CashFlow { year, amount: 0.0 }).collect(),
        }
    }

    /// Build a series from per-year amounts; index is the year
    pub fn from_amounts(amounts: &[f64]) -> Self {
        Self {
            flows: amounts
                .iter()
                .enumerate()
                .map(|(year, &amount)| CashFlow {
                    year: year as u32,
                    amount,
                })
                .collect(),
        }
    }

    /// Build a series from explicit `(year, amount)` pairs
    ///
    /// Years must start at 0 and be contiguous.
    pub fn from_pairs(pairs: &[(u32, f64)]) -> Result<Self> {
        for (expected, (year, _)) in pairs.iter().enumerate() {
            if *year != expected as u32 {
                return Err(SimulationError::invalid(
                    "cash_flows",
                    format!("expected year {} but found year {}", expected, year),
                ));
            }
        }

        Ok(Self {
            flows: pairs
                .iter()
                .map(|&(year, amount)| CashFlow { year, amount })
                .collect(),
        })
    }

    /// Add `amount` to the flow booked at `year`; years past the horizon are ignored
    pub fn add(&mut self, year: u32, amount: f64) {
        if let Some(flow) = self.flows.get_mut(year as usize) {
            flow.amount += amount;
        }
    }

    /// Number of years covered
    pub fn horizon(&self) -> u32 {
        self.flows.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn flows(&self) -> &[CashFlow] {
        &self.flows
    }

    pub fn amount(&self, year: u32) -> f64 {
        self.flows.get(year as usize).map(|f| f.amount).unwrap_or(0.0)
    }

    /// Undiscounted total
    pub fn total(&self) -> f64 {
        self.flows.iter().map(|f| f.amount).sum()
    }
}
