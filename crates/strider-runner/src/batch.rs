//! Batch driver: run every experiment in the conf file.
//!
//! Experiments run strictly one after another, each bounded by the
//! experiment timeout. A failure or timeout counts the experiment as failed
//! and moves on; the summary CSV only ever receives rows from experiments
//! that produced them.

use anyhow::Context;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use strider_core::HarnessConfig;
use strider_models::load_experiments;
use strider_report::csv::{append_rows, ensure_summary_csv};

use crate::experiment::{run_experiment, RunOptions};

/// Totals reported at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
}

/// Runs every experiment in `conf_path` sequentially, appending summary rows
/// as they arrive.
pub async fn run_all(
    cfg: &HarnessConfig,
    conf_path: &Path,
    loss: &str,
    with_short: bool,
) -> anyhow::Result<BatchSummary> {
    if !conf_path.exists() {
        anyhow::bail!("configuration file not found: {}", conf_path.display());
    }

    let summary_csv = cfg.summary_csv_path();
    if ensure_summary_csv(&summary_csv)? {
        info!("Created {} with headers", summary_csv.display());
    }

    let loaded = load_experiments(conf_path)
        .with_context(|| format!("read {}", conf_path.display()))?;
    for (line, err) in &loaded.skipped {
        warn!("Invalid experiment line {line}: {err}");
    }
    if loaded.specs.is_empty() {
        anyhow::bail!("no valid experiments found in {}", conf_path.display());
    }

    info!("Found {} experiments to run", loaded.specs.len());

    let mut summary = BatchSummary::default();
    let total = loaded.specs.len();

    for (i, spec) in loaded.specs.iter().enumerate() {
        let num = i + 1;
        info!("--- Processing experiment {num}/{total} ---");
        info!(
            "Running experiment: {} {} {} {} {} {} {}",
            spec.strategy,
            spec.pair,
            spec.timeframe,
            spec.start_date.format("%Y%m%d"),
            spec.is_days,
            spec.oos_days,
            spec.epochs
        );

        let opts = RunOptions {
            loss: loss.to_string(),
            with_short,
            experiment_num: num,
        };

        let budget = Duration::from_secs(cfg.limits.experiment_timeout_secs);
        let outcome = match tokio::time::timeout(budget, run_experiment(cfg, spec, &opts)).await {
            Err(_) => {
                warn!(
                    "Failed: {} (timeout after {}s)",
                    spec.strategy, cfg.limits.experiment_timeout_secs
                );
                summary.failed += 1;
                continue;
            }
            Ok(Err(e)) => {
                warn!("Failed: {} (error: {e:#})", spec.strategy);
                summary.failed += 1;
                continue;
            }
            Ok(Ok(outcome)) => outcome,
        };

        if outcome.csv_rows.is_empty() {
            warn!("Failed: {} (no CSV output found)", spec.strategy);
            summary.failed += 1;
            continue;
        }

        append_rows(&summary_csv, &outcome.csv_rows)?;
        info!("Completed: {} ({} CSV rows)", spec.strategy, outcome.csv_rows.len());
        summary.successful += 1;
    }

    info!("Batch completed: {} successful, {} failed", summary.successful, summary.failed);
    info!("Results saved to: {}", summary_csv.display());
    Ok(summary)
}
