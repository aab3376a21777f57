//! Carbon Equilibrium CLI
//!
//! Runs one simulation, prints the headline numbers and writes CSV/JSON exports

use anyhow::{Context, Result};
use carbon_equilibrium::{
    config::DEFAULT_EXCHANGE_RATE, export, Currency, CurrencyDisplay, EquilibriumOutcome, RecommendationRule,
    RevenueAssumptions, RevenueDistribution, RunReport, SimulationConfig, SimulationRunner,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CurrencyArg {
    Brl,
    Usd,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RuleArg {
    MinimumTotalPayment,
    ViableMedian,
}

/// Estimate equilibrium carbon credit prices for forest conservation
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV revenue assumptions (activity,mean,std_dev); overrides revenue flags
    #[arg(long)]
    assumptions: Option<PathBuf>,

    /// Annual discount rate in percent
    #[arg(long)]
    discount_rate_pct: Option<f64>,

    /// Time horizon in years (10-50)
    #[arg(long)]
    horizon: Option<u32>,

    /// Number of Monte Carlo trials
    #[arg(long)]
    trials: Option<usize>,

    /// Conventional NPV percentile that conservation must match
    #[arg(long)]
    target_percentile: Option<f64>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Leave out one-time timber extraction
    #[arg(long)]
    no_timber: bool,

    /// Timber revenue mean per ha, one-time (display currency; default R$ 5,000)
    #[arg(long)]
    timber_mean: Option<f64>,

    /// Timber revenue std dev per ha (display currency; default 0)
    #[arg(long)]
    timber_std: Option<f64>,

    /// Cattle revenue mean per ha per year (display currency; default R$ 800)
    #[arg(long)]
    cattle_mean: Option<f64>,

    /// Cattle revenue std dev per ha per year (display currency; default R$ 200)
    #[arg(long)]
    cattle_std: Option<f64>,

    /// Soybean revenue mean per ha per year (display currency; default R$ 6,100)
    #[arg(long)]
    soy_mean: Option<f64>,

    /// Soybean revenue std dev per ha per year (display currency; default R$ 300)
    #[arg(long)]
    soy_std: Option<f64>,

    /// Rule for the recommended price pair
    #[arg(long, value_enum)]
    rule: Option<RuleArg>,

    /// Recommend the stock price needed at this fixed flow price
    #[arg(long, conflicts_with_all = ["rule", "anchor_stock"])]
    anchor_flow: Option<f64>,

    /// Recommend the flow price needed at this fixed stock price
    #[arg(long, conflicts_with = "rule")]
    anchor_stock: Option<f64>,

    /// Display/export currency
    #[arg(long, value_enum)]
    currency: Option<CurrencyArg>,

    /// Exchange rate in BRL per USD; implies USD display unless --currency is given
    #[arg(long)]
    exchange_rate: Option<f64>,

    /// Directory for CSV/JSON exports
    #[arg(long, default_value = "simulation_output")]
    out_dir: PathBuf,

    /// Print the full report as JSON instead of the text summary
    #[arg(long)]
    json: bool,
}

impl Args {
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let config = match &self.config {
            Some(path) => SimulationConfig::from_json_path(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => SimulationConfig::default(),
        };
        self.apply_overrides(config)
    }

    /// Layer the command line flags over `config`
    fn apply_overrides(&self, mut config: SimulationConfig) -> Result<SimulationConfig> {
        if let Some(pct) = self.discount_rate_pct {
            config.discount_rate = pct / 100.0;
        }
        if let Some(horizon) = self.horizon {
            config.horizon_years = horizon;
        }
        if let Some(trials) = self.trials {
            config.trials = trials;
        }
        if let Some(percentile) = self.target_percentile {
            config.target_percentile = percentile;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        if let Some(rule) = self.rule {
            config.recommendation = match rule {
                RuleArg::MinimumTotalPayment => RecommendationRule::MinimumTotalPayment,
                RuleArg::ViableMedian => RecommendationRule::ViableMedian,
            };
        }
        if let Some(flow) = self.anchor_flow {
            config.recommendation = RecommendationRule::AnchorFlowPrice(flow);
        }
        if let Some(stock) = self.anchor_stock {
            config.recommendation = RecommendationRule::AnchorStockPrice(stock);
        }

        config.display = self.display_currency(config.display)?;
        Ok(config)
    }

    /// Resolve the display currency from the flags, falling back to `configured`
    fn display_currency(&self, configured: CurrencyDisplay) -> Result<CurrencyDisplay> {
        let currency = match (self.currency, self.exchange_rate) {
            (Some(CurrencyArg::Usd), _) => Currency::Usd,
            (Some(CurrencyArg::Brl), _) => Currency::Brl,
            (None, Some(_)) => Currency::Usd,
            (None, None) => return Ok(configured),
        };

        if currency == Currency::Brl && self.exchange_rate.is_some() {
            log::warn!("--exchange-rate ignored for BRL display");
        }

        let rate = match self.exchange_rate {
            Some(rate) => rate,
            None if configured.currency == Currency::Usd => configured.exchange_rate,
            None => DEFAULT_EXCHANGE_RATE,
        };
        Ok(CurrencyDisplay::new(currency, rate)?)
    }

    /// Revenue assumptions from the CSV table (BRL) or from the revenue flags
    ///
    /// Flag values are read in the display currency and converted to BRL;
    /// flags left out take the BRL reference values.
    fn revenue_assumptions(&self, display: &CurrencyDisplay) -> Result<RevenueAssumptions> {
        if let Some(path) = &self.assumptions {
            return RevenueAssumptions::from_csv_path(path)
                .with_context(|| format!("failed to load assumptions from {}", path.display()));
        }

        let reference = RevenueAssumptions::default_pricing();
        let timber = reference.timber.unwrap_or(RevenueDistribution::fixed(0.0));
        let input = |flag: Option<f64>, brl_default: f64| flag.map_or(brl_default, |v| display.to_canonical(v));

        Ok(RevenueAssumptions {
            timber: (!self.no_timber).then(|| {
                RevenueDistribution::new(
                    input(self.timber_mean, timber.mean),
                    input(self.timber_std, timber.std_dev),
                )
            }),
            cattle: RevenueDistribution::new(
                input(self.cattle_mean, reference.cattle.mean),
                input(self.cattle_std, reference.cattle.std_dev),
            ),
            soy: RevenueDistribution::new(
                input(self.soy_mean, reference.soy.mean),
                input(self.soy_std, reference.soy.std_dev),
            ),
        })
    }
}

fn print_summary(report: &RunReport) {
    let display = &report.config.display;
    let stats = &report.stats;

    println!("Carbon Credit Price Simulator v0.1.0");
    println!("====================================\n");

    println!(
        "Trials: {}  Rate: {:.2}%  Horizon: {} years  Seed: {}",
        stats.count,
        report.config.discount_rate * 100.0,
        report.config.horizon_years,
        report.seed
    );
    println!(
        "Timber: {}\n",
        if report.assumptions.timber.is_some() { "included" } else { "excluded" }
    );

    println!("Conventional Use NPV (per ha):");
    println!("  Mean:   {}", display.format(stats.mean));
    println!("  StdDev: {}", display.format(stats.std_dev));
    println!("  P5:     {}", display.format(stats.p5));
    println!("  Median: {}", display.format(stats.median));
    println!("  P75:    {}", display.format(stats.p75));
    println!("  P95:    {}", display.format(stats.p95));
    println!();

    match &report.equilibrium {
        EquilibriumOutcome::Viable(solution) => {
            let rec = &solution.recommendation;
            println!(
                "Target: P{} conventional NPV = {}",
                solution.target_percentile,
                display.format(solution.target_npv)
            );
            println!("Viable price combinations: {}", solution.viable.len());
            println!("Recommendation ({:?}):", rec.rule);
            println!(
                "  Stock credit: {}/tCO2 (annualized {}/tCO2/yr)",
                display.format(rec.stock_price),
                display.format(rec.stock_price_annualized)
            );
            println!("  Flow credit:  {}/tCO2/yr", display.format(rec.flow_price));
            println!("  Conservation NPV: {}/ha", display.format(rec.conservation_npv));
            if let Some(stock_only) = solution.stock_price_without_flow {
                println!("  Stock price with no flow credit: {}/tCO2", display.format(stock_only));
            }
            if let Some(flow_only) = solution.flow_price_without_stock {
                println!("  Flow price with no stock credit: {}/tCO2/yr", display.format(flow_only));
            }
        }
        EquilibriumOutcome::NoViableSolution { message, .. } => {
            println!("No viable carbon price: {}", message);
        }
    }

    if let Some(summary) = &report.summary {
        println!("\nFinancial Summary (per ha):");
        println!("  Total carbon stock value:          {}", display.format(summary.total_stock_value_per_ha));
        println!("  Annual carbon absorption value:    {}", display.format(summary.annual_flow_value_per_ha));
        println!(
            "  Equivalent annual conservation:    {}",
            display.format(summary.equivalent_annual_conservation_revenue)
        );
        println!(
            "  Equivalent annual conventional {}: {}",
            if summary.includes_timber { "(inc. timber)" } else { "(excl. timber)" },
            display.format(summary.equivalent_annual_conventional_revenue)
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = args.simulation_config()?;
    let assumptions = args.revenue_assumptions(&config.display)?;

    let runner = SimulationRunner::new(assumptions);
    let report = runner.run(&config).context("simulation failed")?;

    if args.json {
        export::write_report_json(std::io::stdout().lock(), &report)?;
        println!();
    } else {
        print_summary(&report);
    }

    let written = export::export_all(&args.out_dir, &report, &config.display)
        .with_context(|| format!("failed to export to {}", args.out_dir.display()))?;
    for path in written {
        log::info!("wrote {}", path.display());
    }

    Ok(())
}
