//! Walk-forward driver.
//!
//! Chains IS/OOS windows backwards from the end date, then per walk: run
//! hyperopt over the in-sample window, pick up the parameter artifact, run
//! the out-of-sample backtest, pull the trade list from the newest result
//! artifact and optionally render profit charts. Every walk gets a record in
//! the combined JSON artifact whether it completed or not; the dashboard
//! renders failed walks as windows with no data.

use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use strider_core::bot::{BacktestRequest, BotCli, HyperoptRequest};
use strider_core::windows::chain_backwards;
use strider_core::HarnessConfig;
use strider_models::{
    BacktestOutcome, ChartAvailability, HyperoptOutcome, MetricsTable, OosMetrics, ParamsFile,
    Timerange, TradeRecord, WalkForwardMeta, WalkForwardResults, WalkRecord, WalkWindow,
};
use strider_report::{write_dashboard, ReportScraper};

use crate::artifacts;

/// Walk-forward session settings.
#[derive(Debug, Clone)]
pub struct WalkForwardParams {
    pub strategy: String,
    pub pair: String,
    pub timeframe: String,
    pub insample_days: u32,
    pub outsample_days: u32,
    pub num_walks: u32,
    pub end_date: NaiveDate,
    pub epochs: u32,
    pub hyperopt_loss: String,
    /// Render per-walk IS/OOS profit charts (best effort).
    pub charts: bool,
}

impl WalkForwardParams {
    /// Command line that reproduces this session, echoed into the report.
    pub fn repro_command(&self) -> String {
        format!(
            "strider walk-forward --strategy {} --pair {} --timeframe {} \
             --insample-days {} --outsample-days {} --num-walks {} \
             --end-date {} --epochs {} --hyperopt-loss {}{}",
            self.strategy,
            self.pair,
            self.timeframe,
            self.insample_days,
            self.outsample_days,
            self.num_walks,
            self.end_date.format("%Y%m%d"),
            self.epochs,
            self.hyperopt_loss,
            if self.charts { " --charts" } else { "" },
        )
    }
}

/// Runs the whole session. Returns the path of the rendered dashboard.
pub async fn run_walk_forward(
    cfg: &HarnessConfig,
    params: &WalkForwardParams,
) -> anyhow::Result<PathBuf> {
    let windows = chain_backwards(
        params.end_date,
        params.insample_days,
        params.outsample_days,
        params.num_walks,
    )?;
    if windows.is_empty() {
        anyhow::bail!("no walks requested");
    }
    let total_period = Timerange::new(
        windows[0].is_period.start,
        windows[windows.len() - 1].oos_period.end,
    )?;

    info!("Starting Walk Forward Test:");
    info!("- In-sample period: {} days", params.insample_days);
    info!("- Out-of-sample period: {} days", params.outsample_days);
    info!("- Number of walks: {}", params.num_walks);
    info!("- End date: {}", params.end_date.format("%Y-%m-%d"));
    info!("- Strategy: {}", params.strategy);
    info!("- Pair: {}", params.pair);

    // Fresh results dir so trade extraction only ever sees this session.
    let results_dir = cfg.backtest_results_dir();
    if results_dir.exists() {
        info!("Cleaning {}", results_dir.display());
        std::fs::remove_dir_all(&results_dir)
            .with_context(|| format!("clean {}", results_dir.display()))?;
    }
    std::fs::create_dir_all(&results_dir)
        .with_context(|| format!("create {}", results_dir.display()))?;

    let session = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let out_dir = cfg
        .paths
        .outputs
        .join("walk_forward")
        .join(&params.strategy)
        .join(&session);
    std::fs::create_dir_all(out_dir.join("charts"))
        .with_context(|| format!("create {}", out_dir.display()))?;

    let bot = BotCli::from_config(cfg);
    let scraper = ReportScraper::new();

    let mut walks = Vec::with_capacity(windows.len());
    for window in &windows {
        info!("{}", "=".repeat(60));
        info!("Walk {} of {}", window.walk_num, params.num_walks);
        info!("Hyperopt period: {}", window.is_period.pretty());
        info!("Backtest period: {}", window.oos_period.pretty());

        walks.push(run_walk(cfg, &bot, &scraper, params, window, &out_dir).await?);
    }

    let results = WalkForwardResults {
        meta: WalkForwardMeta {
            strategy: params.strategy.clone(),
            pair: params.pair.clone(),
            timeframe: params.timeframe.clone(),
            num_walks: params.num_walks,
            is_window_days: params.insample_days,
            oos_window_days: params.outsample_days,
            epochs: params.epochs,
            hyperopt_loss: params.hyperopt_loss.clone(),
            end_date: params.end_date,
            total_period,
            original_command: params.repro_command(),
            session_timestamp: session,
        },
        walks,
    };

    let json_path = out_dir.join("walk_forward_results.json");
    results.write(&json_path)?;
    info!("Combined results saved to {}", json_path.display());

    let report_path = out_dir.join("walk_forward_report.html");
    write_dashboard(&results, &report_path)?;
    info!("Dashboard written to {}", report_path.display());

    let completed = results.walks.iter().filter(|w| w.completed()).count();
    info!(
        "Walk Forward Test finished: {completed}/{} walks completed",
        results.walks.len()
    );
    Ok(report_path)
}

/// One walk: hyperopt, parameter pickup, OOS backtest, trades, charts.
async fn run_walk(
    cfg: &HarnessConfig,
    bot: &BotCli,
    scraper: &ReportScraper,
    params: &WalkForwardParams,
    window: &WalkWindow,
    out_dir: &Path,
) -> anyhow::Result<WalkRecord> {
    let hyperopt_args = bot.hyperopt_args(&HyperoptRequest {
        strategy: &params.strategy,
        loss: &params.hyperopt_loss,
        spaces: &["buy", "sell"],
        epochs: params.epochs,
        pair: Some(&params.pair),
        timeframe: &params.timeframe,
        timerange: window.is_period,
    });
    let hyperopt = bot.run(&hyperopt_args).await?;
    let raw_output = hyperopt.combined_output();

    if !hyperopt.succeeded() {
        let status = format!("hyperopt {}", hyperopt.status_string(bot.timeout_secs()));
        warn!("Walk {}: {status}", window.walk_num);
        return Ok(WalkRecord {
            window: *window,
            status,
            hyperopt: Some(HyperoptOutcome { raw_output, params: None }),
            backtest: None,
            charts: ChartAvailability::default(),
        });
    }

    let params_file = ParamsFile::load(&cfg.strategies_dir(), &params.strategy);
    if params_file.is_none() {
        warn!(
            "Walk {}: optimizer wrote no parameter artifact for {}",
            window.walk_num, params.strategy
        );
    }
    let hyperopt_outcome = HyperoptOutcome { raw_output, params: params_file };

    let backtest_args = bot.backtest_args(&BacktestRequest {
        strategy: &params.strategy,
        pair: Some(&params.pair),
        timeframe: &params.timeframe,
        timerange: window.oos_period,
    });
    let backtest = bot.run(&backtest_args).await?;

    if !backtest.succeeded() {
        let status = format!("backtest {}", backtest.status_string(bot.timeout_secs()));
        warn!("Walk {}: {status}", window.walk_num);
        return Ok(WalkRecord {
            window: *window,
            status,
            hyperopt: Some(hyperopt_outcome),
            backtest: None,
            charts: ChartAvailability::default(),
        });
    }

    let table = scraper.parse_summary_metrics(&backtest.combined_output());
    let trades = match artifacts::extract_trades(&cfg.backtest_results_dir(), &params.strategy) {
        Ok(trades) => trades,
        Err(e) => {
            warn!("Walk {}: no trade artifact ({e:#})", window.walk_num);
            Vec::new()
        }
    };
    let metrics = oos_metrics(&table, &trades);

    let charts = if params.charts {
        generate_charts(cfg, bot, params, window, out_dir).await
    } else {
        ChartAvailability::default()
    };

    Ok(WalkRecord {
        window: *window,
        status: "completed".to_string(),
        hyperopt: Some(hyperopt_outcome),
        backtest: Some(BacktestOutcome { metrics, trades }),
        charts,
    })
}

/// Combines the scraped backtest table with the extracted trade list.
fn oos_metrics(table: &MetricsTable, trades: &[TradeRecord]) -> OosMetrics {
    let total_profit_abs = table
        .profit_abs()
        .unwrap_or_else(|| trades.iter().map(|t| t.profit_abs).sum());
    let wins = trades.iter().filter(|t| t.profit_abs > 0.0).count();
    let win_rate = if trades.is_empty() {
        0.0
    } else {
        wins as f64 / trades.len() as f64
    };

    OosMetrics {
        total_profit_abs,
        total_profit_pct: table.profit_pct().unwrap_or(0.0),
        win_rate,
        profit_factor: table.numeric("Profit factor").unwrap_or(0.0),
        sharpe: table.numeric("Sharpe").unwrap_or(0.0),
    }
}

/// Best-effort IS and OOS profit charts for one walk. A failed chart never
/// fails the walk.
async fn generate_charts(
    cfg: &HarnessConfig,
    bot: &BotCli,
    params: &WalkForwardParams,
    window: &WalkWindow,
    out_dir: &Path,
) -> ChartAvailability {
    ChartAvailability {
        is_chart: generate_chart(cfg, bot, params, window.is_period, window.walk_num, "IS", out_dir)
            .await,
        oos_chart: generate_chart(
            cfg,
            bot,
            params,
            window.oos_period,
            window.walk_num,
            "OOS",
            out_dir,
        )
        .await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn generate_chart(
    cfg: &HarnessConfig,
    bot: &BotCli,
    params: &WalkForwardParams,
    timerange: Timerange,
    walk_num: u32,
    side: &str,
    out_dir: &Path,
) -> bool {
    let args = bot.plot_profit_args(
        &params.strategy,
        Some(&params.pair),
        &params.timeframe,
        timerange,
    );
    match bot.run(&args).await {
        Ok(outcome) if outcome.succeeded() => {
            let Some(plot) = artifacts::newest_plot_html(&cfg.plot_dir()) else {
                warn!("Walk {walk_num}: plot command produced no chart file");
                return false;
            };
            let dest = out_dir
                .join("charts")
                .join(format!("walk_{walk_num}_{side}_chart.html"));
            artifacts::copy_if_exists(&plot, &dest)
        }
        Ok(outcome) => {
            warn!(
                "Walk {walk_num}: chart generation {}",
                outcome.status_string(bot.timeout_secs())
            );
            false
        }
        Err(e) => {
            warn!("Walk {walk_num}: chart generation failed to spawn: {e:#}");
            false
        }
    }
}
