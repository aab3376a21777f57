//! Discounting: NPV of a cash-flow series and level-annuity conversions
//!
//! Conventions:
//! - Series cash flows at year `t` are discounted by `(1 + r)^t`, so year 0 is
//!   taken at face value.
//! - Level annuities pay at the end of years `1..=horizon`.

use super::cashflows::CashFlowSeries;
use crate::error::{Result, SimulationError};

/// Rates below this are treated as zero to avoid dividing by ~0
const ZERO_RATE_EPSILON: f64 = 1e-12;

fn check_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() {
        return Err(SimulationError::invalid("discount_rate", "must be a finite number"));
    }
    if rate < 0.0 {
        return Err(SimulationError::invalid(
            "discount_rate",
            format!("must not be negative, got {}", rate),
        ));
    }
    Ok(())
}

fn check_horizon(horizon: u32) -> Result<()> {
    if horizon == 0 {
        return Err(SimulationError::invalid("horizon_years", "must be at least 1 year"));
    }
    Ok(())
}

fn check_finite(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimulationError::invalid(
            field,
            format!("computation produced a non-finite value ({})", value),
        ))
    }
}

/// Net present value of `series` at annual `rate`
pub fn npv(series: &CashFlowSeries, rate: f64) -> Result<f64> {
    check_rate(rate)?;
    check_horizon(series.horizon())?;

    if rate < ZERO_RATE_EPSILON {
        return check_finite("cash_flows", series.total());
    }

    let v = 1.0 / (1.0 + rate);
    let mut discount = 1.0;
    let mut total = 0.0;
    for flow in series.flows() {
        total += flow.amount * discount;
        discount *= v;
    }

    check_finite("cash_flows", total)
}

/// Present value of 1 paid at the end of each year `1..=horizon`
pub fn annuity_factor(rate: f64, horizon: u32) -> Result<f64> {
    check_rate(rate)?;
    check_horizon(horizon)?;

    if rate < ZERO_RATE_EPSILON {
        return Ok(horizon as f64);
    }

    let periods = i32::try_from(horizon).map_err(|_| {
        SimulationError::invalid("horizon_years", format!("too many years to discount, got {}", horizon))
    })?;
    let factor = (1.0 - (1.0 + rate).powi(-periods)) / rate;
    check_finite("discount_rate", factor)
}

/// Present value of a level payment of `amount` each year `1..=horizon`
pub fn pv_level_annuity(amount: f64, rate: f64, horizon: u32) -> Result<f64> {
    let pv = amount * annuity_factor(rate, horizon)?;
    check_finite("amount", pv)
}

/// Level annual payment over `horizon` years whose PV equals `lump_sum`
///
/// `lump_sum * r / (1 - (1+r)^-T)`, or `lump_sum / T` when `r = 0`.
pub fn annual_equivalent(lump_sum: f64, rate: f64, horizon: u32) -> Result<f64> {
    let payment = lump_sum / annuity_factor(rate, horizon)?;
    check_finite("amount", payment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_npv_zero_rate_is_plain_sum() {
        let series = CashFlowSeries::from_amounts(&[5000.0, 4000.0, 5000.0, 4000.0]);
        assert_eq!(npv(&series, 0.0).unwrap(), 18_000.0);
    }

    #[test]
    fn test_npv_year_zero_undiscounted() {
        let series = CashFlowSeries::from_amounts(&[100.0, 110.0]);
        // 100 + 110 / 1.1 = 200
        assert_relative_eq!(npv(&series, 0.10).unwrap(), 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_npv_strictly_decreasing_in_rate() {
        let series = CashFlowSeries::from_amounts(&[1000.0; 30]);
        let mut previous = npv(&series, 0.001).unwrap();
        for step in 1..=50 {
            let rate = 0.001 + step as f64 * 0.02;
            let current = npv(&series, rate).unwrap();
            assert!(current < previous, "NPV at {} not below previous", rate);
            previous = current;
        }
    }

    #[test]
    fn test_npv_rejects_bad_inputs() {
        let series = CashFlowSeries::from_amounts(&[1.0, 2.0]);
        assert_eq!(npv(&series, -0.01).unwrap_err().invalid_fields(), vec!["discount_rate"]);
        assert!(npv(&series, f64::NAN).is_err());
        assert_eq!(
            npv(&CashFlowSeries::zeros(0), 0.05).unwrap_err().invalid_fields(),
            vec!["horizon_years"]
        );
    }

    #[test]
    fn test_npv_surfaces_overflow_as_invalid_input() {
        let series = CashFlowSeries::from_amounts(&[f64::MAX, f64::MAX]);
        let err = npv(&series, 0.0).unwrap_err();
        assert_eq!(err.invalid_fields(), vec!["cash_flows"]);
    }

    #[test]
    fn test_annuity_factor_matches_direct_sum() {
        let rate = 0.08;
        let direct: f64 = (1..=30).map(|t| 1.0 / (1.0_f64 + rate).powi(t)).sum();
        assert_relative_eq!(annuity_factor(rate, 30).unwrap(), direct, epsilon = 1e-10);
        assert_eq!(annuity_factor(0.0, 30).unwrap(), 30.0);
    }

    #[test]
    fn test_annuity_factor_rejects_unrepresentable_horizon() {
        let err = annuity_factor(0.08, u32::MAX).unwrap_err();
        assert_eq!(err.invalid_fields(), vec!["horizon_years"]);

        // Still representable: tends to 1/r
        assert_relative_eq!(annuity_factor(0.08, i32::MAX as u32).unwrap(), 12.5, max_relative = 1e-12);
    }

    #[test]
    fn test_annual_equivalent_round_trip() {
        for &rate in &[0.0, 0.01, 0.08, 0.2, 1.0] {
            for &horizon in &[10, 30, 50] {
                let lump = 123_456.78;
                let annual = annual_equivalent(lump, rate, horizon).unwrap();
                let back = pv_level_annuity(annual, rate, horizon).unwrap();
                assert_relative_eq!(back, lump, max_relative = 1e-10);
            }
        }
    }

    #[test]
    fn test_annual_equivalent_zero_rate_divides_evenly() {
        assert_eq!(annual_equivalent(3000.0, 0.0, 30).unwrap(), 100.0);
    }

    #[test]
    fn test_annual_equivalent_known_value() {
        // Standard capital recovery factor at 8% over 30 years = 0.0888274...
        let annual = annual_equivalent(1.0, 0.08, 30).unwrap();
        assert!((annual - 0.088827).abs() < 1e-6);
    }
}
