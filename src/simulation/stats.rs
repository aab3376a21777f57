//! Summary statistics over simulated NPVs

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Percentile of `sorted` (ascending) with linear interpolation between ranks
///
/// `p` is in percent, `[0, 100]`. Rank is `p / 100 * (n - 1)`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Result<f64> {
    if sorted.is_empty() {
        return Err(SimulationError::invalid("distribution", "cannot take a percentile of no values"));
    }
    if !p.is_finite() || !(0.0..=100.0).contains(&p) {
        return Err(SimulationError::invalid(
            "target_percentile",
            format!("must be between 0 and 100, got {}", p),
        ));
    }

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Sorted copy of `values`
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Percentile of unsorted `values`
pub fn percentile(values: &[f64], p: f64) -> Result<f64> {
    percentile_sorted(&sorted_copy(values), p)
}

/// Distribution summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
}

impl DistributionStats {
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let sorted = sorted_copy(values);
        if sorted.is_empty() {
            return Err(SimulationError::invalid("distribution", "no values to summarize"));
        }

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Ok(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
            p5: percentile_sorted(&sorted, 5.0)?,
            p25: percentile_sorted(&sorted, 25.0)?,
            median: percentile_sorted(&sorted, 50.0)?,
            p75: percentile_sorted(&sorted, 75.0)?,
            p95: percentile_sorted(&sorted, 95.0)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        // rank = 0.75 * 3 = 2.25 -> 3 + 0.25
        assert_abs_diff_eq!(percentile(&values, 75.0).unwrap(), 3.25, epsilon = 1e-12);
        assert_eq!(percentile(&values, 0.0).unwrap(), 1.0);
        assert_eq!(percentile(&values, 100.0).unwrap(), 4.0);
        assert_abs_diff_eq!(percentile(&values, 50.0).unwrap(), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_unsorted_input() {
        let values = [10.0, 1.0, 5.0];
        assert_eq!(percentile(&values, 50.0).unwrap(), 5.0);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(percentile(&[42.0], 99.99).unwrap(), 42.0);
    }

    #[test]
    fn test_percentile_errors() {
        assert!(percentile(&[], 50.0).is_err());
        assert!(percentile(&[1.0], 101.0).is_err());
        assert!(percentile(&[1.0], f64::NAN).is_err());
    }

    #[test]
    fn test_stats() {
        let values: Vec<f64> = (1..=101).map(|v| v as f64).collect();
        let stats = DistributionStats::from_values(&values).unwrap();

        assert_eq!(stats.count, 101);
        assert_eq!(stats.mean, 51.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 101.0);
        assert_eq!(stats.median, 51.0);
        assert_eq!(stats.p25, 26.0);
        assert_eq!(stats.p75, 76.0);
        assert!(stats.std_dev > 29.0 && stats.std_dev < 29.3);
    }
}
