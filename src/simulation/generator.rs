//! Random revenue draws per land-use activity
//!
//! Each activity is drawn from `Normal(mean, std_dev)` and floored at zero.
//! The floor is a modelling policy: a landholder facing a loss-making year is
//! assumed to leave the land idle, so revenue cannot go negative.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::assumptions::{Activity, RevenueAssumptions, RevenueDistribution};
use crate::error::{Result, SimulationError};

/// Revenues of a single trial (BRL per hectare)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRevenue {
    /// One-time, year 0; zero when timber is disabled
    pub timber: f64,
    /// Paid every even year
    pub cattle: f64,
    /// Paid every odd year
    pub soy: f64,
}

impl TrialRevenue {
    /// Revenue booked for `activity` in this trial
    pub fn for_activity(&self, activity: Activity) -> f64 {
        match activity {
            Activity::Timber => self.timber,
            Activity::Cattle => self.cattle,
            Activity::Soy => self.soy,
        }
    }
}

/// Independent draws for all trials, stored per activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueDraws {
    pub timber: Option<Vec<f64>>,
    pub cattle: Vec<f64>,
    pub soy: Vec<f64>,
}

impl RevenueDraws {
    pub fn trials(&self) -> usize {
        self.cattle.len()
    }

    pub fn trial(&self, index: usize) -> Option<TrialRevenue> {
        Some(TrialRevenue {
            timber: match &self.timber {
                Some(values) => *values.get(index)?,
                None => 0.0,
            },
            cattle: *self.cattle.get(index)?,
            soy: *self.soy.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = TrialRevenue> + '_ {
        (0..self.trials()).filter_map(move |i| self.trial(i))
    }
}

/// Draw `count` zero-floored samples from `distribution`
pub fn draw_floored<R: Rng + ?Sized>(
    field: &'static str,
    distribution: &RevenueDistribution,
    count: usize,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let normal = Normal::new(distribution.mean, distribution.std_dev).map_err(|e| {
        SimulationError::invalid(
            field,
            format!(
                "cannot build normal distribution (mean {}, std dev {}): {}",
                distribution.mean, distribution.std_dev, e
            ),
        )
    })?;

    Ok((0..count).map(|_| normal.sample(rng).max(0.0)).collect())
}

/// Draw revenues for `trials` trials
///
/// Draw order is timber (if enabled), then cattle, then soy, so a seeded RNG
/// reproduces the same draws.
pub fn generate_revenue_draws<R: Rng + ?Sized>(
    assumptions: &RevenueAssumptions,
    trials: usize,
    rng: &mut R,
) -> Result<RevenueDraws> {
    let issues = assumptions.issues();
    if !issues.is_empty() {
        return Err(SimulationError::InvalidInput(issues));
    }
    if trials == 0 {
        return Err(SimulationError::invalid("trials", "must be at least 1"));
    }

    let timber = match &assumptions.timber {
        Some(distribution) => Some(draw_floored("timber", distribution, trials, rng)?),
        None => None,
    };
    let cattle = draw_floored("cattle", &assumptions.cattle, trials, rng)?;
    let soy = draw_floored("soy", &assumptions.soy, trials, rng)?;

    Ok(RevenueDraws { timber, cattle, soy })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_draw_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let draws = generate_revenue_draws(&RevenueAssumptions::default_pricing(), 250, &mut rng).unwrap();

        assert_eq!(draws.trials(), 250);
        assert_eq!(draws.soy.len(), 250);
        assert_eq!(draws.timber.as_ref().map(|t| t.len()), Some(250));
        assert_eq!(draws.iter().count(), 250);
    }

    #[test]
    fn test_draws_never_negative() {
        // Mean close to zero with a wide spread forces many negative raw samples
        let assumptions = RevenueAssumptions {
            timber: Some(RevenueDistribution::new(10.0, 500.0)),
            cattle: RevenueDistribution::new(50.0, 1000.0),
            soy: RevenueDistribution::new(0.0, 300.0),
        };

        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let draws = generate_revenue_draws(&assumptions, 500, &mut rng).unwrap();

            for trial in draws.iter() {
                assert!(trial.timber >= 0.0);
                assert!(trial.cattle >= 0.0);
                assert!(trial.soy >= 0.0);
            }
            assert!(draws.soy.iter().any(|&v| v == 0.0), "floor never hit for seed {}", seed);
        }
    }

    #[test]
    fn test_timber_disabled_gives_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let assumptions = RevenueAssumptions::default_pricing().without_timber();
        let draws = generate_revenue_draws(&assumptions, 10, &mut rng).unwrap();

        assert!(draws.timber.is_none());
        assert!(draws.iter().all(|t| t.timber == 0.0));
    }

    #[test]
    fn test_zero_std_dev_is_deterministic() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let draws = draw_floored("cattle", &RevenueDistribution::fixed(800.0), 5, &mut rng).unwrap();
        assert_eq!(draws, vec![800.0; 5]);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let assumptions = RevenueAssumptions::default_pricing();
        let a = generate_revenue_draws(&assumptions, 100, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = generate_revenue_draws(&assumptions, 100, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let c = generate_revenue_draws(&assumptions, 100, &mut ChaCha8Rng::seed_from_u64(43)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_invalid_assumptions_rejected() {
        let assumptions = RevenueAssumptions {
            cattle: RevenueDistribution::new(800.0, -1.0),
            ..RevenueAssumptions::default_pricing()
        };
        let err = generate_revenue_draws(&assumptions, 10, &mut ChaCha8Rng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err.invalid_fields(), vec!["cattle_std_dev"]);

        let err = generate_revenue_draws(&RevenueAssumptions::default(), 0, &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err.invalid_fields(), vec!["trials"]);
    }
}
