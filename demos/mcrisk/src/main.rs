use anyhow::{Context, Result};
use clap::Parser;
use mc_risk::{AnalysisRun, HistoricalTable, RiskPipeline};
use std::path::PathBuf;
use tracing::info;

mod config;

use config::{ModelArg, Overrides};

#[derive(Parser, Debug)]
#[clap(name = "mcrisk", about = "Monte Carlo VaR / ES from historical prices")]
struct Args {
    /// Analysis configuration (YAML or JSON)
    #[clap(short, long, default_value = "configs/default.yaml")]
    config: PathBuf,

    /// Historical price table (JSON or YAML rows of date, close, log_return)
    #[clap(short, long, default_value = "data/sample_prices.json")]
    prices: PathBuf,

    /// Override the simulated model
    #[clap(long, value_enum)]
    model: Option<ModelArg>,

    /// Override the number of simulated paths
    #[clap(long)]
    paths: Option<usize>,

    /// Override the random seed
    #[clap(long)]
    seed: Option<u64>,

    /// Override the confidence levels, e.g. --cl 0.95 --cl 0.99
    #[clap(long = "cl")]
    confidence_levels: Vec<f64>,

    /// Write the full run (report and terminal returns) as JSON
    #[clap(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Loading configuration from {:?}", args.config);
    let overrides = Overrides {
        model: args.model,
        paths: args.paths,
        seed: args.seed,
        confidence_levels: args.confidence_levels.clone(),
    };
    let config = config::load(&args.config, &overrides)?;

    info!("Loading price history from {:?}", args.prices);
    let table = HistoricalTable::load(&args.prices)
        .with_context(|| format!("Failed to load price history from {:?}", args.prices))?;
    info!("Loaded {} rows", table.rows.len());

    let pipeline = RiskPipeline::new(config);
    let run = pipeline.run_table(&table)?;

    print_run(&run);

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&run)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        info!("Wrote report to {:?}", path);
    }

    Ok(())
}

fn print_run(run: &AnalysisRun) {
    println!("Initial price: {:.2}", run.s0);
    println!("Drift (mu): {:.6}, Volatility (sigma): {:.6}", run.params.mu, run.params.sigma);
    if let Some(jump) = &run.params.jump {
        println!(
            "Jumps: lambda {:.4}/yr, mu_j {:.6}, sigma_j {:.6}",
            jump.lambda, jump.mu_j, jump.sigma_j
        );
    }
    println!("Simulated paths: {}", run.report.observations);
    println!();

    for measure in run.report.iter() {
        println!("Confidence Level: {}", format_confidence(measure.confidence_level));
        println!("  VaR: {:.4}", measure.var);
        println!("  Expected Shortfall (ES): {:.4}", measure.expected_shortfall);
    }

    if let Some(rolling) = &run.rolling {
        println!();
        println!("Worst {}-day return: {:.4}", rolling.window, rolling.worst);
        println!("Best {}-day return: {:.4}", rolling.window, rolling.best);
        println!("Average {}-day return: {:.4}", rolling.window, rolling.average);
    }
}

fn format_confidence(confidence_level: f64) -> String {
    format!("{:.1}%", confidence_level * 100.0)
}
