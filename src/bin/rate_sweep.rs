//! Sweep the discount rate and tabulate equilibrium carbon prices
//!
//! Every rate reuses the same seed, so rows differ only by the rate.

use anyhow::{Context, Result};
use carbon_equilibrium::{EquilibriumOutcome, RevenueAssumptions, RunReport, SimulationConfig, SimulationRunner};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Run the simulator once per discount rate
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV revenue assumptions (activity,mean,std_dev)
    #[arg(long)]
    assumptions: Option<PathBuf>,

    /// Discount rates in percent, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0])]
    rates: Vec<f64>,

    /// Trials per rate
    #[arg(long)]
    trials: Option<usize>,

    /// RNG seed shared by all rates
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path
    #[arg(long, default_value = "rate_sweep.csv")]
    output: PathBuf,
}

#[derive(Debug, Serialize)]
struct SweepRow {
    discount_rate: f64,
    conventional_npv_mean: Option<f64>,
    conventional_npv_target: Option<f64>,
    viable: bool,
    recommended_stock_price: Option<f64>,
    recommended_flow_price: Option<f64>,
    recommended_stock_price_annualized: Option<f64>,
    error: Option<String>,
}

fn sweep_row(rate: f64, result: carbon_equilibrium::Result<RunReport>) -> SweepRow {
    match result {
        Ok(report) => {
            let target_npv = match &report.equilibrium {
                EquilibriumOutcome::Viable(solution) => solution.target_npv,
                EquilibriumOutcome::NoViableSolution { target_npv, .. } => *target_npv,
            };
            let recommendation = report.equilibrium.recommendation();
            SweepRow {
                discount_rate: rate,
                conventional_npv_mean: Some(report.stats.mean),
                conventional_npv_target: Some(target_npv),
                viable: report.equilibrium.is_viable(),
                recommended_stock_price: recommendation.map(|r| r.stock_price),
                recommended_flow_price: recommendation.map(|r| r.flow_price),
                recommended_stock_price_annualized: recommendation.map(|r| r.stock_price_annualized),
                error: None,
            }
        }
        Err(err) => {
            log::warn!("rate {:.4} failed: {}", rate, err);
            SweepRow {
                discount_rate: rate,
                conventional_npv_mean: None,
                conventional_npv_target: None,
                viable: false,
                recommended_stock_price: None,
                recommended_flow_price: None,
                recommended_stock_price_annualized: None,
                error: Some(err.to_string()),
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_json_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(trials) = args.trials {
        config.trials = trials;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let assumptions = match &args.assumptions {
        Some(path) => RevenueAssumptions::from_csv_path(path)
            .with_context(|| format!("failed to load assumptions from {}", path.display()))?,
        None => RevenueAssumptions::default_pricing(),
    };

    let rates: Vec<f64> = args.rates.iter().map(|pct| pct / 100.0).collect();
    println!("Running {} rates x {} trials...", rates.len(), config.trials);

    let runner = SimulationRunner::new(assumptions);
    let results = runner.run_rate_sweep(&config, &rates);

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    println!("\n{:>8} {:>14} {:>14} {:>12} {:>12}", "Rate", "Mean NPV", "Target NPV", "Stock", "Flow");
    for (&rate, result) in rates.iter().zip(results) {
        let row = sweep_row(rate, result);

        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
        println!(
            "{:>7.2}% {:>14} {:>14} {:>12} {:>12}",
            rate * 100.0,
            fmt(row.conventional_npv_mean),
            fmt(row.conventional_npv_target),
            fmt(row.recommended_stock_price),
            fmt(row.recommended_flow_price),
        );
        writer.serialize(&row)?;
    }
    writer.flush()?;

    println!("\nOutput written to {}", args.output.display());
    println!("Total time: {:?}", start.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbon_equilibrium::{CarbonConstants, RevenueDistribution, SimulationError};

    fn report(carbon: CarbonConstants) -> RunReport {
        let assumptions = RevenueAssumptions {
            timber: None,
            cattle: RevenueDistribution::new(5000.0, 1000.0),
            soy: RevenueDistribution::new(4000.0, 800.0),
        };
        let config = SimulationConfig {
            trials: 50,
            seed: Some(3),
            carbon,
            ..Default::default()
        };
        SimulationRunner::new(assumptions).run(&config).unwrap()
    }

    #[test]
    fn test_non_viable_row_keeps_target() {
        let report = report(CarbonConstants {
            carbon_stock: 0.001,
            sequestration_rate: 0.001,
        });
        let mean = report.stats.mean;
        let row = sweep_row(0.08, Ok(report));

        assert!(!row.viable);
        assert_eq!(row.conventional_npv_mean, Some(mean));
        assert!(row.conventional_npv_target.unwrap() > 0.0);
        assert!(row.recommended_stock_price.is_none());
    }

    #[test]
    fn test_viable_row_has_prices() {
        let row = sweep_row(0.08, Ok(report(CarbonConstants::default())));
        assert!(row.viable);
        assert!(row.recommended_stock_price.is_some());
        assert!(row.error.is_none());
    }

    #[test]
    fn test_failed_run_row_is_blank() {
        let row = sweep_row(-0.5, Err(SimulationError::invalid("discount_rate", "must be between 0 and 1")));

        assert!(row.conventional_npv_mean.is_none());
        assert!(row.conventional_npv_target.is_none());
        assert!(row.error.unwrap().contains("discount_rate"));

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(sweep_row(0.1, Err(SimulationError::invalid("trials", "must be at least 1")))).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert!(!text.contains("NaN"));
    }
}
