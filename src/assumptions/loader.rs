//! CSV-based revenue assumption loader
//!
//! Expected layout, one row per activity (timber row optional):
//!
//! ```text
//! activity,mean,std_dev
//! timber,5000,0
//! cattle,800,200
//! soy,6100,300
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{Activity, RevenueAssumptions, RevenueDistribution};
use crate::error::{FieldIssue, Result, SimulationError};

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    activity: Activity,
    mean: f64,
    std_dev: f64,
}

/// Load revenue assumptions from a CSV file
pub fn load_revenue_assumptions(path: &Path) -> Result<RevenueAssumptions> {
    let file = File::open(path)?;
    read_revenue_assumptions(file)
}

/// Parse revenue assumptions from any CSV reader
pub fn read_revenue_assumptions<R: Read>(input: R) -> Result<RevenueAssumptions> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut timber = None;
    let mut cattle = None;
    let mut soy = None;

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        let distribution = RevenueDistribution::new(row.mean, row.std_dev);
        let slot = match row.activity {
            Activity::Timber => &mut timber,
            Activity::Cattle => &mut cattle,
            Activity::Soy => &mut soy,
        };
        if slot.replace(distribution).is_some() {
            return Err(SimulationError::invalid(
                "activity",
                format!("duplicate row for {}", row.activity.as_str()),
            ));
        }
    }

    let mut missing = Vec::new();
    if cattle.is_none() {
        missing.push(FieldIssue::new("cattle", "missing from assumptions table"));
    }
    if soy.is_none() {
        missing.push(FieldIssue::new("soy", "missing from assumptions table"));
    }

    match (cattle, soy) {
        (Some(cattle), Some(soy)) => Ok(RevenueAssumptions { timber, cattle, soy }),
        _ => Err(SimulationError::InvalidInput(missing)),
    }
}
