//! CSV and JSON export of run results
//!
//! Amounts are converted to the display currency on the way out; the report
//! itself stays in BRL.

use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::CurrencyDisplay;
use crate::equilibrium::{EquilibriumSolution, PriceCombination};
use crate::error::Result;
use crate::scenario::{EquilibriumOutcome, RunReport};
use crate::simulation::ConventionalDistribution;

pub const DISTRIBUTION_FILE: &str = "conventional_npv_distribution.csv";
pub const VIABLE_FILE: &str = "viable_price_combinations.csv";
pub const FRONTIER_FILE: &str = "equilibrium_frontier.csv";
pub const RESULTS_FILE: &str = "carbon_credit_simulation_results.csv";
pub const REPORT_FILE: &str = "carbon_credit_simulation_report.json";

#[derive(Debug, Serialize)]
struct DistributionRow {
    trial: usize,
    npv: f64,
}

#[derive(Debug, Serialize)]
struct PriceRow {
    stock_price: f64,
    flow_price: f64,
    conservation_npv: f64,
}

/// One-row results table; price columns are empty when no price is viable
#[derive(Debug, Serialize)]
struct ResultsRow {
    currency: &'static str,
    seed: u64,
    trials: usize,
    discount_rate: f64,
    horizon_years: u32,
    target_percentile: f64,
    conventional_npv_mean: f64,
    conventional_npv_target: f64,
    min_stock_price: Option<f64>,
    min_flow_price: Option<f64>,
    recommended_stock_price: Option<f64>,
    recommended_flow_price: Option<f64>,
    recommended_stock_price_annualized: Option<f64>,
    conservation_npv: Option<f64>,
}

/// Write one `trial,npv` row per trial
pub fn write_distribution_csv<W: Write>(
    writer: W,
    distribution: &ConventionalDistribution,
    display: &CurrencyDisplay,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (trial, &npv) in distribution.values().iter().enumerate() {
        csv_writer.serialize(DistributionRow {
            trial: trial + 1,
            npv: display.convert(npv),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write every viable price combination
pub fn write_viable_csv<W: Write>(
    writer: W,
    solution: &EquilibriumSolution,
    display: &CurrencyDisplay,
) -> Result<()> {
    write_price_rows(writer, &solution.viable, display)
}

/// Write the sampled frontier, one row per flow price
pub fn write_frontier_csv<W: Write>(
    writer: W,
    solution: &EquilibriumSolution,
    display: &CurrencyDisplay,
) -> Result<()> {
    write_price_rows(writer, &solution.frontier, display)
}

fn write_price_rows<W: Write>(writer: W, combinations: &[PriceCombination], display: &CurrencyDisplay) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for combination in combinations {
        csv_writer.serialize(PriceRow {
            stock_price: display.convert(combination.stock_price),
            flow_price: display.convert(combination.flow_price),
            conservation_npv: display.convert(combination.conservation_npv),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the one-row results summary
pub fn write_results_csv<W: Write>(writer: W, report: &RunReport, display: &CurrencyDisplay) -> Result<()> {
    let solution = report.equilibrium.solution();
    let convert = |value: Option<f64>| value.map(|v| display.convert(v));

    let conventional_npv_target = match &report.equilibrium {
        EquilibriumOutcome::Viable(solution) => solution.target_npv,
        EquilibriumOutcome::NoViableSolution { target_npv, .. } => *target_npv,
    };

    let row = ResultsRow {
        currency: display.currency.code(),
        seed: report.seed,
        trials: report.config.trials,
        discount_rate: report.config.discount_rate,
        horizon_years: report.config.horizon_years,
        target_percentile: report.config.target_percentile,
        conventional_npv_mean: display.convert(report.stats.mean),
        conventional_npv_target: display.convert(conventional_npv_target),
        min_stock_price: convert(solution.map(|s| s.min_stock_price)),
        min_flow_price: convert(solution.map(|s| s.min_flow_price)),
        recommended_stock_price: convert(solution.map(|s| s.recommendation.stock_price)),
        recommended_flow_price: convert(solution.map(|s| s.recommendation.flow_price)),
        recommended_stock_price_annualized: convert(solution.map(|s| s.recommendation.stock_price_annualized)),
        conservation_npv: convert(solution.map(|s| s.recommendation.conservation_npv)),
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.serialize(row)?;
    csv_writer.flush()?;
    Ok(())
}

/// Write the full report as pretty JSON (BRL)
pub fn write_report_json<W: Write>(writer: W, report: &RunReport) -> Result<()> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Write every export file into `dir`, returning the paths written
pub fn export_all(dir: &Path, report: &RunReport, display: &CurrencyDisplay) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let path = dir.join(DISTRIBUTION_FILE);
    write_distribution_csv(File::create(&path)?, &report.distribution, display)?;
    written.push(path);

    if let Some(solution) = report.equilibrium.solution() {
        let path = dir.join(VIABLE_FILE);
        write_viable_csv(File::create(&path)?, solution, display)?;
        written.push(path);

        let path = dir.join(FRONTIER_FILE);
        write_frontier_csv(File::create(&path)?, solution, display)?;
        written.push(path);
    }

    let path = dir.join(RESULTS_FILE);
    write_results_csv(File::create(&path)?, report, display)?;
    written.push(path);

    let path = dir.join(REPORT_FILE);
    write_report_json(File::create(&path)?, report)?;
    written.push(path);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{RevenueAssumptions, RevenueDistribution};
    use crate::config::{CarbonConstants, SimulationConfig};
    use crate::scenario::SimulationRunner;

    fn small_report(carbon: CarbonConstants) -> RunReport {
        let assumptions = RevenueAssumptions {
            timber: None,
            cattle: RevenueDistribution::new(5000.0, 1000.0),
            soy: RevenueDistribution::new(4000.0, 800.0),
        };
        let config = SimulationConfig {
            trials: 20,
            seed: Some(1),
            carbon,
            ..Default::default()
        };
        SimulationRunner::new(assumptions).run(&config).unwrap()
    }

    #[test]
    fn test_distribution_csv_rows() {
        let report = small_report(CarbonConstants::default());
        let mut buffer = Vec::new();
        write_distribution_csv(&mut buffer, &report.distribution, &CurrencyDisplay::brl()).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "trial,npv");
        assert_eq!(lines.len(), 21);
        assert!(lines[1].starts_with("1,"));
    }

    #[test]
    fn test_viable_csv_converts_currency() {
        let report = small_report(CarbonConstants::default());
        let solution = report.equilibrium.solution().unwrap();

        let mut buffer = Vec::new();
        write_viable_csv(&mut buffer, solution, &CurrencyDisplay::usd(5.0).unwrap()).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "stock_price");

        let first = reader.records().next().unwrap().unwrap();
        let npv: f64 = first[2].parse().unwrap();
        assert!((npv - solution.viable[0].conservation_npv / 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_frontier_csv_rows() {
        let report = small_report(CarbonConstants::default());
        let solution = report.equilibrium.solution().unwrap();

        let mut buffer = Vec::new();
        write_frontier_csv(&mut buffer, solution, &CurrencyDisplay::brl()).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, vec!["stock_price", "flow_price", "conservation_npv"]);

        let rows: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(rows.len(), solution.frontier.len());
        assert_eq!(rows[0][1].parse::<f64>().unwrap(), 0.0);
    }

    #[test]
    fn test_results_csv_blank_when_not_viable() {
        let report = small_report(CarbonConstants {
            carbon_stock: 0.001,
            sequestration_rate: 0.001,
        });
        assert!(!report.equilibrium.is_viable());

        let mut buffer = Vec::new();
        write_results_csv(&mut buffer, &report, &CurrencyDisplay::brl()).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let headers = reader.headers().unwrap().clone();
        let record = reader.records().next().unwrap().unwrap();
        let column = headers.iter().position(|h| h == "recommended_stock_price").unwrap();

        assert_eq!(&record[0], "BRL");
        assert_eq!(&record[column], "");
    }

    #[test]
    fn test_report_json_round_trips_outcome() {
        let report = small_report(CarbonConstants::default());
        let mut buffer = Vec::new();
        write_report_json(&mut buffer, &report).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["equilibrium"]["status"], "viable");
        assert_eq!(value["seed"], 1);
    }
}
