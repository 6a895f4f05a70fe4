//! # Strider
//!
//! Walk-forward experiment harness for a containerized trading bot.
//!
//! The bot itself (strategy evaluation, hyperparameter search, order
//! simulation) is an external CLI driven over subprocess; Strider owns the
//! orchestration around it: experiment batches, IS/OOS window chaining,
//! report scraping, CSV summaries, HTML reports and the walk-forward
//! dashboard.

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};

use strider_core::HarnessConfig;
use strider_models::{parse_date, ExperimentSpec, WalkForwardResults};
use strider_report::write_dashboard;

mod artifacts;
mod batch;
mod experiment;
mod walkforward;

use experiment::{run_experiment, RunOptions};
use walkforward::{run_walk_forward, WalkForwardParams};

#[derive(Parser, Debug)]
#[command(
    name = "strider",
    version,
    about = "Walk-forward experiment harness for a containerized trading bot"
)]
struct Cli {
    /// Harness configuration file.
    #[arg(long, global = true, default_value = "strider.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one experiment: hyperopt over IS, backtest over OOS, report.
    Run(RunArgs),
    /// Run every experiment from a conf file, appending to summary.csv.
    RunAll(RunAllArgs),
    /// Chained IS/OOS walk-forward validation with a dashboard report.
    WalkForward(WalkForwardArgs),
    /// Re-scrape an existing run directory into report.html and a CSV row.
    Report(ReportArgs),
    /// Re-render the dashboard from a combined results JSON.
    Dashboard(DashboardArgs),
    /// Print the file:// URL of the newest generated report.
    LatestReport,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    strategy: String,
    pair: String,
    timeframe: String,
    /// Start of the in-sample period, YYYYMMDD.
    start_date: String,
    is_days: u32,
    oos_days: u32,
    epochs: u32,

    /// Hyperopt loss function.
    #[arg(long, default_value = "SortinoHyperOptLoss")]
    loss: String,
    /// Skip the `<Strategy>Short` sibling.
    #[arg(long)]
    no_short: bool,
    /// Experiment index recorded in the CSV row.
    #[arg(long, default_value_t = 1)]
    experiment_num: usize,
}

#[derive(clap::Args, Debug)]
struct RunAllArgs {
    /// Experiment conf file: one whitespace-separated tuple per line.
    #[arg(default_value = "experiments/experiments.conf")]
    conf: PathBuf,

    /// Hyperopt loss function applied to the whole batch.
    #[arg(long, default_value = "SortinoHyperOptLoss")]
    loss: String,
    /// Skip the `<Strategy>Short` siblings.
    #[arg(long)]
    no_short: bool,
}

#[derive(clap::Args, Debug)]
struct WalkForwardArgs {
    /// Length in days of the in-sample hyperopt window.
    #[arg(long)]
    insample_days: u32,
    /// Length in days of the out-of-sample backtest window.
    #[arg(long)]
    outsample_days: u32,
    /// Number of walk-forward iterations.
    #[arg(long)]
    num_walks: u32,
    /// End date, YYYYMMDD. Defaults to today.
    #[arg(long)]
    end_date: Option<String>,
    #[arg(long, default_value = "BTC/USDT:USDT")]
    pair: String,
    #[arg(long, default_value = "1h")]
    timeframe: String,
    #[arg(long, default_value_t = 200)]
    epochs: u32,
    #[arg(long, default_value = "SharpeHyperOptLoss")]
    hyperopt_loss: String,
    #[arg(long, default_value = "QFLRSI_Strategy")]
    strategy: String,
    /// Render per-walk IS/OOS profit charts.
    #[arg(long)]
    charts: bool,
}

#[derive(clap::Args, Debug)]
struct ReportArgs {
    /// Run directory holding run.log.
    run_dir: PathBuf,
    /// Strategy whose CSV row to regenerate.
    strategy: String,
    #[arg(long, default_value_t = 1)]
    experiment_num: usize,
}

#[derive(clap::Args, Debug)]
struct DashboardArgs {
    /// Combined walk-forward results JSON.
    results: PathBuf,
    /// Output path; defaults to walk_forward_report.html next to the JSON.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    let cfg = HarnessConfig::load_or_default(&cli.config)
        .with_context(|| format!("load config {}", cli.config.display()))?;

    match cli.command {
        Command::Run(args) => {
            let spec = ExperimentSpec {
                strategy: args.strategy,
                pair: args.pair,
                timeframe: args.timeframe,
                start_date: parse_date(&args.start_date)?,
                is_days: args.is_days,
                oos_days: args.oos_days,
                epochs: args.epochs,
            };
            let opts = RunOptions {
                loss: args.loss,
                with_short: !args.no_short,
                experiment_num: args.experiment_num,
            };
            let outcome = run_experiment(&cfg, &spec, &opts).await?;
            for row in &outcome.csv_rows {
                println!("{row}");
            }
        }

        Command::RunAll(args) => {
            let summary = batch::run_all(&cfg, &args.conf, &args.loss, !args.no_short).await?;
            if summary.failed > 0 {
                std::process::exit(1);
            }
        }

        Command::WalkForward(args) => {
            let end_date = match &args.end_date {
                Some(s) => parse_date(s)?,
                None => Local::now().date_naive(),
            };
            let params = WalkForwardParams {
                strategy: args.strategy,
                pair: args.pair,
                timeframe: args.timeframe,
                insample_days: args.insample_days,
                outsample_days: args.outsample_days,
                num_walks: args.num_walks,
                end_date,
                epochs: args.epochs,
                hyperopt_loss: args.hyperopt_loss,
                charts: args.charts,
            };
            let report = run_walk_forward(&cfg, &params).await?;
            println!("{}", report.display());
        }

        Command::Report(args) => {
            let (report_path, row) =
                experiment::regenerate(&args.run_dir, &args.strategy, args.experiment_num)?;
            info!("Report written to {}", report_path.display());
            println!("{row}");
        }

        Command::Dashboard(args) => {
            let results = WalkForwardResults::load(&args.results)
                .with_context(|| format!("load {}", args.results.display()))?;
            let output = args.output.unwrap_or_else(|| {
                args.results
                    .parent()
                    .unwrap_or_else(|| std::path::Path::new("."))
                    .join("walk_forward_report.html")
            });
            write_dashboard(&results, &output)?;
            println!("{}", output.display());
        }

        Command::LatestReport => {
            let Some(report) = artifacts::find_latest_report(&cfg.paths.outputs) else {
                anyhow::bail!("no reports found under {}", cfg.paths.outputs.display());
            };
            let abs = std::fs::canonicalize(&report).unwrap_or(report);
            println!("file://{}", abs.display());
        }
    }

    Ok(())
}
