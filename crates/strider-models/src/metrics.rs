//! Metrics scraped from the bot's rendered output.
//!
//! Two shapes show up in practice: the two-column SUMMARY METRICS table a
//! backtest prints (string values, unit suffixes included), and the one-line
//! metric mentions scattered through raw optimizer output. `MetricsTable`
//! keeps the former verbatim in scrape order; `HyperoptMetrics` is the typed
//! extraction of the latter.

use serde::{Deserialize, Serialize};

/// Ordered key/value table scraped from a SUMMARY METRICS section.
///
/// Values are kept exactly as rendered (`"4.52 USDT"`, `"1.23%"`); the typed
/// getters strip the suffixes on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsTable {
    rows: Vec<(String, String)>,
}

impl MetricsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row, replacing any existing value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(row) = self.rows.iter_mut().find(|(k, _)| *k == key) {
            row.1 = value;
        } else {
            self.rows.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True when any of the given keys is present. Used to reject tables
    /// that matched the row pattern but are not actually metrics.
    pub fn contains_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.get(k).is_some())
    }

    /// Numeric view of a value: strips `%`, currency suffixes and thousands
    /// separators, then parses the leading token.
    pub fn numeric(&self, key: &str) -> Option<f64> {
        let raw = self.get(key)?;
        let token = raw.split_whitespace().next()?;
        token
            .trim_end_matches('%')
            .replace(',', "")
            .parse::<f64>()
            .ok()
    }

    /// `Total profit %` as a number.
    pub fn profit_pct(&self) -> Option<f64> {
        self.numeric("Total profit %")
    }

    /// Absolute profit in stake currency.
    pub fn profit_abs(&self) -> Option<f64> {
        self.numeric("Absolute profit")
    }

    /// Trade count: first component of `Total/Daily Avg Trades`.
    pub fn trades(&self) -> Option<u64> {
        let raw = self.get("Total/Daily Avg Trades")?;
        raw.split('/').next()?.trim().parse::<u64>().ok()
    }

    /// First component of `Days win/draw/lose`.
    pub fn win_component(&self) -> Option<String> {
        let raw = self.get("Days win/draw/lose")?;
        Some(raw.split('/').next()?.trim().to_string())
    }
}

/// Named metrics pulled out of raw optimizer output by per-metric patterns.
///
/// An absent metric is 0.0, matching the pipeline's degrade-to-zero policy
/// for optional data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperoptMetrics {
    pub total_profit_usdt: f64,
    pub total_profit_pct: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub profit_factor: f64,
    pub win_rate: f64,
    pub total_trades: u64,
    pub max_drawdown_pct: f64,
    pub cagr: f64,
    pub sqn: f64,
    pub expectancy_ratio: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    pub market_change_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces() {
        let mut table = MetricsTable::new();
        table.insert("Sharpe", "1.10");
        table.insert("Sharpe", "2.20");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Sharpe"), Some("2.20"));
    }

    #[test]
    fn test_numeric_strips_suffixes() {
        let mut table = MetricsTable::new();
        table.insert("Total profit %", "12.34%");
        table.insert("Absolute profit", "1,204.56 USDT");
        table.insert("Sharpe", "1.91");
        assert_eq!(table.profit_pct(), Some(12.34));
        assert_eq!(table.profit_abs(), Some(1204.56));
        assert_eq!(table.numeric("Sharpe"), Some(1.91));
        assert_eq!(table.numeric("Missing"), None);
    }

    #[test]
    fn test_trades_and_win_component() {
        let mut table = MetricsTable::new();
        table.insert("Total/Daily Avg Trades", "23 / 0.77");
        table.insert("Days win/draw/lose", "12 / 3 / 15");
        assert_eq!(table.trades(), Some(23));
        assert_eq!(table.win_component().as_deref(), Some("12"));
    }

    #[test]
    fn test_contains_any() {
        let mut table = MetricsTable::new();
        table.insert("Sortino", "0.50");
        assert!(table.contains_any(&["Sharpe", "Sortino"]));
        assert!(!table.contains_any(&["Calmar"]));
    }
}
