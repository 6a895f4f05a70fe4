//! Summary CSV output.
//!
//! One row per strategy per run, appended to `experiments/outputs/summary.csv`
//! against a fixed header schema. Written by hand through a `BufWriter`; the
//! schema is small and stable enough that a CSV dependency buys nothing.

use anyhow::Context;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use strider_models::{MetricsTable, StrategyParams};

use crate::scrape::RunLogInfo;

/// Column order of `summary.csv`.
pub const CSV_HEADERS: &[&str] = &[
    "experiment_num",
    "strategy",
    "pair",
    "timeframe",
    "start_date",
    "IS_days",
    "OOS_days",
    "epochs",
    "loss_function",
    "Status",
    "Total profit %",
    "Max Drawdown (Acct)",
    "Sortino",
    "Sharpe",
    "Calmar",
    "Profit factor",
    "Trades",
    "Win %",
    "stoploss",
    "buy_params",
    "sell_params",
    "roi_params",
];

/// RFC-4180 quoting: only fields containing separators, quotes or newlines
/// get wrapped.
pub fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One summary row, all cells already stringified ("N/A" for gaps).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub experiment_num: String,
    pub strategy: String,
    pub pair: String,
    pub timeframe: String,
    pub start_date: String,
    pub is_days: String,
    pub oos_days: String,
    pub epochs: String,
    pub loss_function: String,
    pub status: String,
    pub total_profit_pct: String,
    pub max_drawdown: String,
    pub sortino: String,
    pub sharpe: String,
    pub calmar: String,
    pub profit_factor: String,
    pub trades: String,
    pub win_pct: String,
    pub stoploss: String,
    pub buy_params: String,
    pub sell_params: String,
    pub roi_params: String,
}

impl SummaryRow {
    /// Assembles a row from the scraped pieces of one run.
    pub fn build(
        experiment_num: usize,
        strategy: &str,
        pair: &str,
        timeframe: &str,
        info: &RunLogInfo,
        status: &str,
        metrics: Option<&MetricsTable>,
        params: &StrategyParams,
    ) -> Self {
        let na = || "N/A".to_string();
        let metric = |key: &str| -> String {
            metrics
                .and_then(|m| m.get(key))
                .map(str::to_string)
                .unwrap_or_else(na)
        };

        let trades = metrics
            .and_then(|m| m.trades())
            .map(|t| t.to_string())
            .unwrap_or_else(na);
        let win_pct = metrics.and_then(|m| m.win_component()).unwrap_or_else(na);

        Self {
            experiment_num: experiment_num.to_string(),
            strategy: strategy.to_string(),
            pair: pair.to_string(),
            timeframe: timeframe.to_string(),
            start_date: info.start_date.clone(),
            is_days: info.is_days.clone(),
            oos_days: info.oos_days.clone(),
            epochs: info.epochs.clone(),
            loss_function: info.loss_function.clone(),
            status: status.to_string(),
            total_profit_pct: metric("Total profit %"),
            max_drawdown: metric("Absolute Drawdown"),
            sortino: metric("Sortino"),
            sharpe: metric("Sharpe"),
            calmar: metric("Calmar"),
            profit_factor: metric("Profit factor"),
            trades,
            win_pct,
            stoploss: params.stoploss.clone(),
            buy_params: params.buy_params.clone(),
            sell_params: params.sell_params.clone(),
            roi_params: params.roi_params.clone(),
        }
    }

    /// Renders the row in header order.
    pub fn to_line(&self) -> String {
        [
            &self.experiment_num,
            &self.strategy,
            &self.pair,
            &self.timeframe,
            &self.start_date,
            &self.is_days,
            &self.oos_days,
            &self.epochs,
            &self.loss_function,
            &self.status,
            &self.total_profit_pct,
            &self.max_drawdown,
            &self.sortino,
            &self.sharpe,
            &self.calmar,
            &self.profit_factor,
            &self.trades,
            &self.win_pct,
            &self.stoploss,
            &self.buy_params,
            &self.sell_params,
            &self.roi_params,
        ]
        .iter()
        .map(|cell| csv_escape(cell))
        .collect::<Vec<_>>()
        .join(",")
    }
}

/// Header line in the schema's column order.
pub fn header_line() -> String {
    CSV_HEADERS
        .iter()
        .map(|h| csv_escape(h))
        .collect::<Vec<_>>()
        .join(",")
}

/// Creates the summary CSV with its header when it does not exist yet.
/// Returns true when the file was created.
pub fn ensure_summary_csv(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", header_line())?;
    writer.flush()?;
    Ok(true)
}

/// Appends pre-rendered rows to the summary CSV.
pub fn append_rows(path: &Path, rows: &[String]) -> anyhow::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("append to {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        writeln!(writer, "{row}")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("{\"k\":1,\"j\":2}"), "\"{\"\"k\"\":1,\"\"j\"\":2}\"");
    }

    #[test]
    fn test_header_matches_schema_width() {
        assert_eq!(CSV_HEADERS.len(), 22);
        assert_eq!(header_line().split(',').count(), 22);
    }

    #[test]
    fn test_build_row_with_metrics() {
        let mut metrics = MetricsTable::new();
        metrics.insert("Total profit %", "12.34%");
        metrics.insert("Absolute Drawdown", "45.60 USDT");
        metrics.insert("Sharpe", "1.91");
        metrics.insert("Total/Daily Avg Trades", "23 / 0.77");
        metrics.insert("Days win/draw/lose", "12 / 3 / 15");

        let info = RunLogInfo {
            start_date: "20240101".into(),
            is_days: "90".into(),
            oos_days: "30".into(),
            epochs: "200".into(),
            loss_function: "SortinoHyperOptLoss".into(),
        };

        let row = SummaryRow::build(
            3,
            "QFLRSI_Strategy",
            "BTC/USDT:USDT",
            "1h",
            &info,
            "completed",
            Some(&metrics),
            &StrategyParams::default(),
        );

        assert_eq!(row.total_profit_pct, "12.34%");
        assert_eq!(row.sharpe, "1.91");
        assert_eq!(row.sortino, "N/A");
        assert_eq!(row.trades, "23");
        assert_eq!(row.win_pct, "12");

        let line = row.to_line();
        assert!(line.starts_with("3,QFLRSI_Strategy,BTC/USDT:USDT,1h,20240101,"));
    }

    #[test]
    fn test_build_row_without_metrics() {
        let row = SummaryRow::build(
            1,
            "S",
            "P",
            "1h",
            &RunLogInfo::default(),
            "failed: exit code 1",
            None,
            &StrategyParams::default(),
        );
        assert_eq!(row.total_profit_pct, "N/A");
        assert_eq!(row.trades, "N/A");
        assert_eq!(row.status, "failed: exit code 1");
    }

    #[test]
    fn test_ensure_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outputs").join("summary.csv");

        assert!(ensure_summary_csv(&path).unwrap());
        assert!(!ensure_summary_csv(&path).unwrap());

        append_rows(&path, &["a,b".to_string(), "c,d".to_string()]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], header_line());
        assert_eq!(lines[2], "c,d");
    }
}
