//! Walk-forward records and the combined results artifact.
//!
//! One `WalkRecord` per IS/OOS window pair, collected into
//! `WalkForwardResults` and persisted as pretty JSON for later report
//! generation. The optimizer's raw text output is kept verbatim on the
//! record; in-sample metrics are re-scraped from it at render time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::params::ParamsFile;
use crate::timerange::Timerange;

/// One pair of chained windows: in-sample immediately precedes out-of-sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkWindow {
    /// 1-based, chronological.
    pub walk_num: u32,
    pub is_period: Timerange,
    pub oos_period: Timerange,
}

/// Optimizer step outcome for one walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperoptOutcome {
    /// Combined stdout/stderr of the optimizer run.
    pub raw_output: String,
    /// Parameter artifact written by the bot, when one appeared.
    pub params: Option<ParamsFile>,
}

/// One trade from the bot's backtest result artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(default)]
    pub pair: String,
    #[serde(default)]
    pub open_date: String,
    #[serde(default)]
    pub close_date: String,
    #[serde(default)]
    pub profit_abs: f64,
    #[serde(default)]
    pub profit_ratio: f64,
    /// Minutes.
    #[serde(default)]
    pub trade_duration: i64,
    #[serde(default)]
    pub exit_reason: String,
}

impl TradeRecord {
    /// Duration as `"3h 25m"`.
    pub fn duration_pretty(&self) -> String {
        format!("{}h {}m", self.trade_duration / 60, self.trade_duration % 60)
    }
}

/// Out-of-sample metrics for one walk, derived from the scraped backtest
/// table and the extracted trade list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OosMetrics {
    pub total_profit_abs: f64,
    pub total_profit_pct: f64,
    /// Fraction 0..1.
    pub win_rate: f64,
    pub profit_factor: f64,
    pub sharpe: f64,
}

/// Backtest step outcome for one walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestOutcome {
    pub metrics: OosMetrics,
    pub trades: Vec<TradeRecord>,
}

/// Which profit charts were generated for a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartAvailability {
    pub is_chart: bool,
    pub oos_chart: bool,
}

/// Everything known about one walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkRecord {
    pub window: WalkWindow,
    /// "completed", or a human-readable failure description.
    pub status: String,
    pub hyperopt: Option<HyperoptOutcome>,
    pub backtest: Option<BacktestOutcome>,
    #[serde(default)]
    pub charts: ChartAvailability,
}

impl WalkRecord {
    pub fn completed(&self) -> bool {
        self.status == "completed"
    }
}

/// Test configuration echoed into the combined artifact and the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardMeta {
    pub strategy: String,
    pub pair: String,
    pub timeframe: String,
    pub num_walks: u32,
    pub is_window_days: u32,
    pub oos_window_days: u32,
    pub epochs: u32,
    pub hyperopt_loss: String,
    pub end_date: NaiveDate,
    /// First IS day through last OOS day.
    pub total_period: Timerange,
    /// Command line that reproduces this run.
    pub original_command: String,
    pub session_timestamp: String,
}

/// The combined walk-forward artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardResults {
    pub meta: WalkForwardMeta,
    pub walks: Vec<WalkRecord>,
}

impl WalkForwardResults {
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_trade_duration_pretty() {
        let trade = TradeRecord { trade_duration: 205, ..Default::default() };
        assert_eq!(trade.duration_pretty(), "3h 25m");
    }

    #[test]
    fn test_results_round_trip() {
        let results = WalkForwardResults {
            meta: WalkForwardMeta {
                strategy: "QFLRSI_Strategy".into(),
                pair: "BTC/USDT:USDT".into(),
                timeframe: "1h".into(),
                num_walks: 1,
                is_window_days: 90,
                oos_window_days: 30,
                epochs: 200,
                hyperopt_loss: "SharpeHyperOptLoss".into(),
                end_date: d(2024, 6, 30),
                total_period: Timerange::new(d(2024, 3, 2), d(2024, 6, 30)).unwrap(),
                original_command: "strider walk-forward".into(),
                session_timestamp: "2024-06-30_12-00-00".into(),
            },
            walks: vec![WalkRecord {
                window: WalkWindow {
                    walk_num: 1,
                    is_period: Timerange::new(d(2024, 3, 2), d(2024, 5, 31)).unwrap(),
                    oos_period: Timerange::new(d(2024, 5, 31), d(2024, 6, 30)).unwrap(),
                },
                status: "completed".into(),
                hyperopt: Some(HyperoptOutcome { raw_output: "Sharpe 1.2".into(), params: None }),
                backtest: Some(BacktestOutcome::default()),
                charts: ChartAvailability::default(),
            }],
        };

        let json = serde_json::to_string_pretty(&results).unwrap();
        let back: WalkForwardResults = serde_json::from_str(&json).unwrap();
        assert_eq!(back.walks.len(), 1);
        assert!(back.walks[0].completed());
        assert_eq!(back.meta.strategy, "QFLRSI_Strategy");
    }
}
