//! Revenue assumptions for the conventional land-use activities

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FieldIssue, Result};

/// Land-use activity competing with conservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// One-time timber extraction
    Timber,
    /// Cattle ranching (recurring)
    Cattle,
    /// Soybean farming (recurring)
    Soy,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Timber => "timber",
            Activity::Cattle => "cattle",
            Activity::Soy => "soy",
        }
    }

    /// Activity paid in year `t` of the cattle/soy rotation
    ///
    /// Even years (0, 2, 4, ...) are cattle, odd years are soy.
    pub fn rotation_for_year(year: u32) -> Activity {
        if year % 2 == 0 {
            Activity::Cattle
        } else {
            Activity::Soy
        }
    }
}

/// Normal revenue distribution per hectare
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueDistribution {
    pub mean: f64,
    pub std_dev: f64,
}

impl RevenueDistribution {
    pub fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }

    /// Zero-variance distribution
    pub fn fixed(value: f64) -> Self {
        Self { mean: value, std_dev: 0.0 }
    }

    fn collect_issues(
        &self,
        mean_field: &'static str,
        std_field: &'static str,
        issues: &mut Vec<FieldIssue>,
    ) {
        if !self.mean.is_finite() || self.mean < 0.0 {
            issues.push(FieldIssue::new(
                mean_field,
                format!("must be a non-negative number, got {}", self.mean),
            ));
        }
        if !self.std_dev.is_finite() || self.std_dev < 0.0 {
            issues.push(FieldIssue::new(
                std_field,
                format!("must be a non-negative number, got {}", self.std_dev),
            ));
        }
    }
}

/// Revenue assumptions for one hectare under conventional use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueAssumptions {
    /// One-time timber revenue at year 0; `None` disables timber extraction
    pub timber: Option<RevenueDistribution>,
    /// Annual cattle revenue (even years)
    pub cattle: RevenueDistribution,
    /// Annual soybean revenue (odd years)
    pub soy: RevenueDistribution,
}

impl RevenueAssumptions {
    /// Reference land-use revenues (BRL per hectare)
    pub fn default_pricing() -> Self {
        Self {
            timber: Some(RevenueDistribution::fixed(5000.0)),
            cattle: RevenueDistribution::new(800.0, 200.0),
            soy: RevenueDistribution::new(6100.0, 300.0),
        }
    }

    /// Same assumptions with timber extraction switched off
    pub fn without_timber(mut self) -> Self {
        self.timber = None;
        self
    }

    pub fn distribution(&self, activity: Activity) -> Option<RevenueDistribution> {
        match activity {
            Activity::Timber => self.timber,
            Activity::Cattle => Some(self.cattle),
            Activity::Soy => Some(self.soy),
        }
    }

    /// Every out-of-range mean / standard deviation
    pub fn issues(&self) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        if let Some(timber) = &self.timber {
            timber.collect_issues("timber_mean", "timber_std_dev", &mut issues);
        }
        self.cattle.collect_issues("cattle_mean", "cattle_std_dev", &mut issues);
        self.soy.collect_issues("soy_mean", "soy_std_dev", &mut issues);
        issues
    }

    /// Load assumptions from a CSV table (`activity,mean,std_dev`)
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        loader::load_revenue_assumptions(path)
    }
}

impl Default for RevenueAssumptions {
    fn default() -> Self {
        Self::default_pricing()
    }
}
