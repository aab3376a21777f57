//! Cash-flow series and present-value calculations

mod cashflows;
mod discount;

pub use cashflows::{CashFlow, CashFlowSeries};
pub use discount::{annual_equivalent, annuity_factor, npv, pv_level_annuity};
