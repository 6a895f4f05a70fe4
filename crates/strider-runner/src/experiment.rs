//! Single-experiment pipeline.
//!
//! One experiment: derive the IS/OOS timeranges from the start date, run
//! hyperopt over IS and a backtest over OOS for the strategy (and its Short
//! sibling), tee every step into `run.log`, copy the bot's artifacts into
//! the run directory, then scrape the log into `report.html` and one summary
//! CSV row per strategy.
//!
//! Step failures become status strings; the pipeline keeps going so the run
//! directory always holds whatever was produced.

use anyhow::Context;
use chrono::Local;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use strider_core::bot::{BacktestRequest, BotCli, HyperoptRequest};
use strider_core::windows::forward_split;
use strider_core::HarnessConfig;
use strider_models::{ExperimentSpec, StrategyParams};
use strider_report::{
    csv::SummaryRow, parse_status_file, write_run_report, ReportScraper,
};

use crate::artifacts;

/// Knobs that are not part of the experiment tuple itself.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Hyperopt loss function recorded per CSV row.
    pub loss: String,
    /// Also run the `<Strategy>Short` sibling.
    pub with_short: bool,
    /// 1-based index for the CSV.
    pub experiment_num: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            loss: "SortinoHyperOptLoss".to_string(),
            with_short: true,
            experiment_num: 1,
        }
    }
}

/// What one experiment left behind.
#[derive(Debug)]
pub struct ExperimentOutcome {
    pub run_dir: PathBuf,
    /// Rendered summary rows, one per strategy variant.
    pub csv_rows: Vec<String>,
}

/// Appends to `run.log` and mirrors status lines to the console.
struct RunLog {
    file: std::fs::File,
}

impl RunLog {
    fn create(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("create {}", path.display()))?;
        Ok(Self { file })
    }

    /// A status line: into the log and onto the console.
    fn line(&mut self, msg: &str) {
        info!("{msg}");
        let _ = writeln!(self.file, "{msg}");
    }

    /// Bulk step output: into the log only.
    fn raw(&mut self, text: &str) {
        let _ = writeln!(self.file, "{text}");
    }
}

/// Runs one experiment end to end.
pub async fn run_experiment(
    cfg: &HarnessConfig,
    spec: &ExperimentSpec,
    opts: &RunOptions,
) -> anyhow::Result<ExperimentOutcome> {
    let (is_period, oos_period) = forward_split(spec.start_date, spec.is_days, spec.oos_days)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let run_dir = cfg
        .paths
        .outputs
        .join(&spec.strategy)
        .join(spec.pair_dir())
        .join(&spec.timeframe)
        .join(&timestamp);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("create run dir {}", run_dir.display()))?;

    let mut log = RunLog::create(&run_dir.join("run.log"))?;
    log.line(&format!("Strategy: {}", spec.strategy));
    log.line(&format!("Pair: {}", spec.pair));
    log.line(&format!("Timeframe: {}", spec.timeframe));
    log.line(&format!("Start Date: {}", spec.start_date.format("%Y%m%d")));
    log.line(&format!("IS Length (days): {}", spec.is_days));
    log.line(&format!("OOS Length (days): {}", spec.oos_days));
    log.line(&format!("Epochs: {}", spec.epochs));
    log.line(&format!("Loss Function: {}", opts.loss));
    log.line(&format!("Calculated In Sample Period: {is_period}"));
    log.line(&format!("Calculated Out of Sample Period: {oos_period}"));

    // Blank slate: stale results or parameter files would bleed into the
    // artifact copy and the scrape below.
    let results_dir = cfg.backtest_results_dir();
    artifacts::remove_files_with_extensions(&results_dir, &["json", "zip"]);
    clean_param_artifacts(cfg, spec);

    let bot = BotCli::from_config(cfg);
    let mut variants: Vec<(String, Vec<&str>)> =
        vec![(spec.strategy.clone(), vec!["buy", "stoploss"])];
    if opts.with_short {
        variants.push((spec.short_strategy(), vec!["sell", "stoploss"]));
    }

    let mut statuses: Vec<(String, String)> = Vec::new();
    for (name, spaces) in &variants {
        let status = run_variant(&bot, spec, opts, name, spaces, is_period, oos_period, &mut log)
            .await?;
        statuses.push((name.clone(), status));
    }

    // Status file consumed by report regeneration.
    let status_content: String = statuses
        .iter()
        .map(|(name, status)| format!("{name}:{status}\n"))
        .collect();
    std::fs::write(run_dir.join("hyperopt_status.txt"), status_content)
        .with_context(|| "write hyperopt_status.txt")?;

    // Keep the bot's artifacts with the run.
    let copied = artifacts::copy_files_with_extensions(&results_dir, &run_dir, &["json", "zip"])?;
    log.line(&format!("Copied {copied} result artifact(s) into {}", run_dir.display()));
    for (name, _) in &variants {
        artifacts::copy_if_exists(
            &cfg.strategies_dir().join(format!("{name}.json")),
            &run_dir.join(format!("{name}.json")),
        );
    }

    // Scrape the combined log into the report and the CSV rows.
    let log_content = std::fs::read_to_string(run_dir.join("run.log"))
        .with_context(|| "read back run.log")?;
    let scraper = ReportScraper::new();
    let sections = scraper.scrape_sections(&log_content);
    let info = scraper.run_log_info(&log_content);

    let mut csv_rows = Vec::new();
    for (name, status) in &statuses {
        let metrics = sections
            .iter()
            .find(|s| &s.strategy == name)
            .map(|s| &s.metrics)
            .filter(|m| !m.is_empty());
        let params = StrategyParams::load(&run_dir, name);
        let row = SummaryRow::build(
            opts.experiment_num,
            name,
            &spec.pair,
            &spec.timeframe,
            &info,
            status,
            metrics,
            &params,
        );
        csv_rows.push(row.to_line());
    }

    let report_path = write_run_report(&run_dir, &sections, &log_content)?;
    info!("Report written to {}", report_path.display());
    info!(
        "Experiment finished for {} {} {}",
        spec.strategy, spec.pair, spec.timeframe
    );

    clean_param_artifacts(cfg, spec);

    Ok(ExperimentOutcome { run_dir, csv_rows })
}

/// Hyperopt + OOS backtest for one strategy variant. Returns the status
/// string recorded for the variant; failures are recorded, not raised.
#[allow(clippy::too_many_arguments)]
async fn run_variant(
    bot: &BotCli,
    spec: &ExperimentSpec,
    opts: &RunOptions,
    name: &str,
    spaces: &[&str],
    is_period: strider_models::Timerange,
    oos_period: strider_models::Timerange,
    log: &mut RunLog,
) -> anyhow::Result<String> {
    let hyperopt_args = bot.hyperopt_args(&HyperoptRequest {
        strategy: name,
        loss: &opts.loss,
        spaces,
        epochs: spec.epochs,
        pair: Some(&spec.pair),
        timeframe: &spec.timeframe,
        timerange: is_period,
    });
    log.line(&format!("Running command: {}", bot.render(&hyperopt_args)));
    let hyperopt = bot.run(&hyperopt_args).await?;
    log.raw(&hyperopt.combined_output());
    if !hyperopt.succeeded() {
        warn!("hyperopt for {name}: {}", hyperopt.status_string(bot.timeout_secs()));
    }

    let backtest_args = bot.backtest_args(&BacktestRequest {
        strategy: name,
        pair: Some(&spec.pair),
        timeframe: &spec.timeframe,
        timerange: oos_period,
    });
    log.line(&format!("Running command: {}", bot.render(&backtest_args)));
    let backtest = bot.run(&backtest_args).await?;
    log.raw(&backtest.combined_output());
    if !backtest.succeeded() {
        warn!("backtest for {name}: {}", backtest.status_string(bot.timeout_secs()));
    }

    let status = if !hyperopt.succeeded() {
        format!("hyperopt {}", hyperopt.status_string(bot.timeout_secs()))
    } else if !backtest.succeeded() {
        format!("backtest {}", backtest.status_string(bot.timeout_secs()))
    } else {
        "completed".to_string()
    };
    Ok(status)
}

fn clean_param_artifacts(cfg: &HarnessConfig, spec: &ExperimentSpec) {
    let strategies = cfg.strategies_dir();
    for name in [spec.strategy.clone(), spec.short_strategy()] {
        let path = strategies.join(format!("{name}.json"));
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("could not remove {}: {e}", path.display());
            }
        }
    }
}

/// Re-scrapes an existing run directory: rebuilds `report.html` and returns
/// the regenerated CSV row. The run log is the one required input.
pub fn regenerate(
    run_dir: &Path,
    strategy: &str,
    experiment_num: usize,
) -> anyhow::Result<(PathBuf, String)> {
    let log_path = run_dir.join("run.log");
    if !log_path.exists() {
        anyhow::bail!("log file not found in {}", run_dir.display());
    }
    let log_content = std::fs::read_to_string(&log_path)
        .with_context(|| format!("read {}", log_path.display()))?;

    let scraper = ReportScraper::new();
    let sections = scraper.scrape_sections(&log_content);
    let info = scraper.run_log_info(&log_content);

    // pair and timeframe come from the directory layout:
    // <outputs>/<strategy>/<pair with / -> ->/<timeframe>/<timestamp>
    let timeframe = run_dir
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "N/A".to_string());
    let pair = run_dir
        .parent()
        .and_then(|p| p.parent())
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().replace('-', "/"))
        .unwrap_or_else(|| "N/A".to_string());

    let statuses = std::fs::read_to_string(run_dir.join("hyperopt_status.txt"))
        .map(|content| parse_status_file(&content))
        .unwrap_or_default();
    let status = statuses
        .get(strategy)
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string());

    let metrics = sections
        .iter()
        .find(|s| s.strategy == strategy)
        .map(|s| &s.metrics)
        .filter(|m| !m.is_empty());
    let params = StrategyParams::load(run_dir, strategy);

    let row = SummaryRow::build(
        experiment_num,
        strategy,
        &pair,
        &timeframe,
        &info,
        &status,
        metrics,
        &params,
    );

    let report_path = write_run_report(run_dir, &sections, &log_content)?;
    Ok((report_path, row.to_line()))
}
