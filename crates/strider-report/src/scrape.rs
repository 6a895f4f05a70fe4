//! Regex scraping of the bot's rendered report output.
//!
//! The run log for one experiment interleaves echoed settings, optimizer
//! progress and one rendered backtest report per strategy. Extraction is
//! string matching against the table layouts the bot actually prints; there
//! is no grammar and no recovery beyond "try the next pattern".

use regex::Regex;
use std::collections::BTreeMap;

use strider_models::{HyperoptMetrics, MetricsTable};

/// Metric keys that prove a scraped table really was the metrics table.
const EXPECTED_METRIC_KEYS: &[&str] = &[
    "Total profit %",
    "Absolute Drawdown",
    "Sortino",
    "Sharpe",
    "Calmar",
    "Profit factor",
];

/// One per-strategy result section cut out of a run log.
#[derive(Debug, Clone)]
pub struct StrategySection {
    pub strategy: String,
    /// Raw text between the section header and the STRATEGY SUMMARY banner.
    pub body: String,
    pub metrics: MetricsTable,
}

/// Settings echoed at the top of a run log. Absent values stay `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLogInfo {
    pub start_date: String,
    pub is_days: String,
    pub oos_days: String,
    pub epochs: String,
    pub loss_function: String,
}

impl Default for RunLogInfo {
    fn default() -> Self {
        let na = "N/A".to_string();
        Self {
            start_date: na.clone(),
            is_days: na.clone(),
            oos_days: na.clone(),
            epochs: na.clone(),
            loss_function: na,
        }
    }
}

/// Compiled patterns for everything the harness scrapes.
pub struct ReportScraper {
    result_section: Regex,
    metrics_block: Regex,
    metric_row: Regex,
    table_split: Regex,
    drawdown_cell: Regex,
    start_date: Regex,
    is_days: Regex,
    oos_days: Regex,
    epochs: Regex,
    loss_function: Regex,
    hyperopt_patterns: Vec<(HyperoptField, Regex)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HyperoptField {
    TotProfitUsdt,
    TotProfitPct,
    Sharpe,
    Sortino,
    Calmar,
    ProfitFactor,
    WinRate,
    TotalTrades,
    MaxDrawdown,
    Cagr,
    Sqn,
    Expectancy,
    BestTrade,
    WorstTrade,
    MarketChange,
}

impl Default for ReportScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportScraper {
    pub fn new() -> Self {
        use HyperoptField::*;
        let hyperopt_patterns = vec![
            (TotProfitUsdt, Regex::new(r"Tot Profit USDT.*?(-?\d+\.?\d*)").unwrap()),
            (TotProfitPct, Regex::new(r"Total profit %.*?(-?\d+\.?\d*)").unwrap()),
            (Sharpe, Regex::new(r"Sharpe.*?(-?\d+\.?\d*)").unwrap()),
            (Sortino, Regex::new(r"Sortino.*?(-?\d+\.?\d*)").unwrap()),
            (Calmar, Regex::new(r"Calmar.*?(-?\d+\.?\d*)").unwrap()),
            (ProfitFactor, Regex::new(r"Profit factor.*?(\d+\.?\d*)").unwrap()),
            (WinRate, Regex::new(r"Win%.*?(\d+\.?\d*)").unwrap()),
            (TotalTrades, Regex::new(r"Total/Daily Avg Trades.*?(\d+)").unwrap()),
            (MaxDrawdown, Regex::new(r"Max % of account underwater.*?(\d+\.?\d*)%").unwrap()),
            (Cagr, Regex::new(r"CAGR %.*?(-?\d+\.?\d*)").unwrap()),
            (Sqn, Regex::new(r"SQN.*?(-?\d+\.?\d*)").unwrap()),
            (Expectancy, Regex::new(r"Expectancy \(Ratio\).*?(-?\d+\.?\d*)").unwrap()),
            (BestTrade, Regex::new(r"Best trade.*?(\d+\.?\d*)%").unwrap()),
            (WorstTrade, Regex::new(r"Worst trade.*?(-?\d+\.?\d*)%").unwrap()),
            (MarketChange, Regex::new(r"Market change.*?(-?\d+\.?\d*)%").unwrap()),
        ];

        Self {
            result_section: Regex::new(r"(?s)Result for strategy (.+?)\n(.*?)STRATEGY SUMMARY")
                .unwrap(),
            metrics_block: Regex::new(r"(?s)SUMMARY METRICS\s*\n(.*?)(?:\n\s*\n|\z)").unwrap(),
            metric_row: Regex::new(r"[│|] (.*?) [│|] (.*?) [│|]").unwrap(),
            table_split: Regex::new(r"\s*[│|]\s*").unwrap(),
            drawdown_cell: Regex::new(r"([\d.]+)\s+USDT\s+([\d.]+)%").unwrap(),
            start_date: Regex::new(r"Start Date: (\d{8})").unwrap(),
            is_days: Regex::new(r"IS Length \(days\): (\d+)").unwrap(),
            oos_days: Regex::new(r"OOS Length \(days\): (\d+)").unwrap(),
            epochs: Regex::new(r"Epochs: (\d+)").unwrap(),
            loss_function: Regex::new(r"Loss Function: (.+)").unwrap(),
            hyperopt_patterns,
        }
    }

    /// Cuts the per-strategy result sections out of a combined run log and
    /// scrapes the metrics table of each. When a section has no usable
    /// SUMMARY METRICS table (zero-trade runs render none), the strategy's
    /// row in the STRATEGY SUMMARY table is used instead.
    pub fn scrape_sections(&self, content: &str) -> Vec<StrategySection> {
        let mut sections = Vec::new();
        for caps in self.result_section.captures_iter(content) {
            let strategy = caps[1].trim().to_string();
            let body = caps[2].to_string();

            let mut metrics = self.parse_summary_metrics(&body);
            if metrics.is_empty() {
                metrics = self.strategy_summary_fallback(content, &strategy);
            }

            sections.push(StrategySection { strategy, body, metrics });
        }
        sections
    }

    /// Parses the two-column SUMMARY METRICS table. Returns an empty table
    /// when the section is absent or none of the expected keys showed up.
    pub fn parse_summary_metrics(&self, content: &str) -> MetricsTable {
        let mut table = MetricsTable::new();
        if !content.contains("SUMMARY METRICS") {
            return table;
        }
        let Some(block) = self.metrics_block.captures(content) else {
            return table;
        };

        for row in self.metric_row.captures_iter(&block[0]) {
            let key = row[1].trim().to_string();
            let value = row[2].trim().to_string();
            if !key.is_empty() && !value.is_empty() && key != "Metric" {
                table.insert(key, value);
            }
        }

        if !table.contains_any(EXPECTED_METRIC_KEYS) {
            return MetricsTable::new();
        }
        table
    }

    /// Synthesizes core metrics from the strategy's STRATEGY SUMMARY row.
    /// Zero-trade strategies get zero-filled ratio metrics so downstream
    /// consumers see numbers instead of gaps.
    pub fn strategy_summary_fallback(&self, content: &str, strategy: &str) -> MetricsTable {
        let mut metrics = MetricsTable::new();

        for line in content.lines() {
            if !line.contains(strategy) || !(line.contains('│') || line.contains('|')) {
                continue;
            }
            let trimmed = line.trim_matches(|c| c == '│' || c == '|' || c == ' ');
            let parts: Vec<&str> = self.table_split.split(trimmed).collect();
            if parts.len() < 8 || parts[0] != strategy {
                continue;
            }

            let trades = parts[1].trim();
            let total_profit_pct = parts[4].trim();
            let win_stats = parts[6].trim();
            let drawdown = parts[7].trim();

            let win_pct = win_stats.split_whitespace().last().unwrap_or("0");
            let (dd_usdt, _dd_pct) = match self.drawdown_cell.captures(drawdown) {
                Some(caps) => (caps[1].to_string(), caps[2].to_string()),
                None => ("0".to_string(), "0.00".to_string()),
            };

            metrics.insert("Total profit %", format!("{total_profit_pct}%"));
            metrics.insert("Absolute Drawdown", format!("{dd_usdt} USDT"));
            metrics.insert("Total/Daily Avg Trades", trades.to_string());
            metrics.insert("Days win/draw/lose", win_pct.to_string());

            if trades == "0" {
                metrics.insert("Sortino", "0.00");
                metrics.insert("Sharpe", "0.00");
                metrics.insert("Calmar", "0.00");
                metrics.insert("Profit factor", "0.00");
            }
            break;
        }

        metrics
    }

    /// Pulls the named numeric metrics out of raw optimizer output.
    pub fn hyperopt_metrics(&self, raw: &str) -> HyperoptMetrics {
        let mut out = HyperoptMetrics::default();
        for (field, pattern) in &self.hyperopt_patterns {
            let value = pattern
                .captures(raw)
                .and_then(|caps| caps[1].parse::<f64>().ok())
                .unwrap_or(0.0);
            use HyperoptField::*;
            match field {
                TotProfitUsdt => out.total_profit_usdt = value,
                TotProfitPct => out.total_profit_pct = value,
                Sharpe => out.sharpe = value,
                Sortino => out.sortino = value,
                Calmar => out.calmar = value,
                ProfitFactor => out.profit_factor = value,
                WinRate => out.win_rate = value,
                TotalTrades => out.total_trades = value as u64,
                MaxDrawdown => out.max_drawdown_pct = value,
                Cagr => out.cagr = value,
                Sqn => out.sqn = value,
                Expectancy => out.expectancy_ratio = value,
                BestTrade => out.best_trade_pct = value,
                WorstTrade => out.worst_trade_pct = value,
                MarketChange => out.market_change_pct = value,
            }
        }
        out
    }

    /// Extracts the settings echoed at the top of a run log.
    pub fn run_log_info(&self, content: &str) -> RunLogInfo {
        let mut info = RunLogInfo::default();
        let grab = |re: &Regex| -> Option<String> {
            re.captures(content).map(|c| c[1].trim().to_string())
        };
        if let Some(v) = grab(&self.start_date) {
            info.start_date = v;
        }
        if let Some(v) = grab(&self.is_days) {
            info.is_days = v;
        }
        if let Some(v) = grab(&self.oos_days) {
            info.oos_days = v;
        }
        if let Some(v) = grab(&self.epochs) {
            info.epochs = v;
        }
        if let Some(v) = grab(&self.loss_function) {
            info.loss_function = v;
        }
        info
    }
}

/// Parses a `hyperopt_status.txt` body: one `Strategy:status` pair per line.
pub fn parse_status_file(content: &str) -> BTreeMap<String, String> {
    let mut statuses = BTreeMap::new();
    for line in content.lines() {
        if let Some((strategy, status)) = line.split_once(':') {
            let strategy = strategy.trim();
            if !strategy.is_empty() {
                statuses.insert(strategy.to_string(), status.trim().to_string());
            }
        }
    }
    statuses
}
