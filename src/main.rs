//! Balance-aware trader - Main Entry Point
//!
//! Runs the decision pipeline once, or on an interval until Ctrl-C, and
//! prints each cycle as JSON.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use balance_aware_trader::config::{has_prefixed_env, load_config, load_from_env};
use balance_aware_trader::{
    AppConfig, BalanceProvider, BoxedDecisionSource, CycleReport, HttpModelSource, MarketContext,
    SolanaRpcBalance, TradingPipeline, TrendHeuristicSource,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Wallet balance in SOL (skips the RPC lookup)
    #[arg(long, conflicts_with = "wallet")]
    balance: Option<Decimal>,

    /// Wallet address whose balance is fetched over RPC
    #[arg(long, env = "TRADER_WALLET")]
    wallet: Option<String>,

    /// Trend strength, 0.0 (bearish) to 1.0 (bullish)
    #[arg(long, default_value_t = 0.5)]
    trend: f64,

    /// Market volatility
    #[arg(long, default_value_t = 0.0)]
    volatility: f64,

    /// Recent realised performance
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    recent_performance: f64,

    /// Repeat every N seconds until Ctrl-C (overrides settings.interval_seconds)
    #[arg(long)]
    interval_seconds: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    // Without a config file or TRADER__ overrides, plain env vars are enough
    let from_file = Path::new(&args.config).exists() || has_prefixed_env();
    let config = if from_file {
        load_config(Some(&args.config))
    } else {
        load_from_env()
    }
    .context("failed to load configuration")?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so stdout stays machine-readable
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting balance-aware trader");
    if from_file {
        info!("Configuration file: {}", args.config);
    } else {
        info!("No configuration file, using environment variables");
    }

    let pipeline = TradingPipeline::from_config(&config, Some(build_source(&config)?));

    let rpc = match (&args.balance, &args.wallet) {
        (Some(_), _) => None,
        (None, Some(_)) => Some(SolanaRpcBalance::from_config(&config.rpc)?),
        (None, None) => bail!("either --balance or --wallet is required"),
    };

    let interval = args
        .interval_seconds
        .unwrap_or(config.settings.interval_seconds);

    if interval == 0 {
        let report = run_once(&pipeline, &args, rpc.as_ref()).await?;
        emit(&report, args.pretty)?;
        return Ok(());
    }

    info!(interval, "Running decision loop, Ctrl-C to stop");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match run_once(&pipeline, &args, rpc.as_ref()).await {
                    Ok(report) => emit(&report, args.pretty)?,
                    Err(e) => warn!(error = %e, "Cycle skipped"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal, cleaning up...");
                break;
            }
        }
    }

    info!(stats = ?pipeline.stats(), "Final pipeline statistics");
    Ok(())
}

/// Model source when a key is configured, otherwise the trend heuristic
fn build_source(config: &AppConfig) -> Result<BoxedDecisionSource> {
    match &config.model {
        Some(model) => {
            info!(endpoint = %model.endpoint, model = %model.model, "Using model decision source");
            Ok(Box::new(HttpModelSource::from_config(model)?))
        }
        None => {
            info!("Using trend heuristic decision source");
            Ok(Box::new(TrendHeuristicSource::new(
                config.engine.fallback_token.clone(),
            )))
        }
    }
}

async fn run_once(
    pipeline: &TradingPipeline,
    args: &Args,
    rpc: Option<&SolanaRpcBalance>,
) -> Result<CycleReport> {
    match (args.balance, rpc, &args.wallet) {
        (Some(balance), _, _) => {
            let context =
                MarketContext::new(balance, args.trend, args.volatility, args.recent_performance);
            Ok(pipeline.run_cycle(&context).await)
        }
        (None, Some(rpc), Some(wallet)) => Ok(pipeline
            .decide_for_wallet(
                rpc as &dyn BalanceProvider,
                wallet,
                args.trend,
                args.volatility,
                args.recent_performance,
            )
            .await?),
        _ => bail!("either --balance or --wallet is required"),
    }
}

fn emit(report: &CycleReport, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{}", json);
    Ok(())
}
