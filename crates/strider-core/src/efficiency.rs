//! Walk-forward efficiency ratios.
//!
//! WFER is average out-of-sample profit over average in-sample profit. A
//! strategy whose optimized parameters keep working out of sample scores
//! near 1; heavy overfitting pushes it towards 0. All ratios guard the
//! zero-denominator case by reporting 0.

use serde::{Deserialize, Serialize};

/// Per-walk performance inputs. `None` means the step produced no data;
/// such walks are excluded from the averages, matching the degrade policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkPerf {
    pub is_profit_pct: Option<f64>,
    pub is_sharpe: Option<f64>,
    pub oos_profit_pct: Option<f64>,
    pub oos_sharpe: Option<f64>,
}

/// Aggregate efficiency metrics over all walks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencySummary {
    /// Walk-forward efficiency ratio: avg OOS profit / avg IS profit.
    pub wfer: f64,
    pub avg_is_profit: f64,
    pub avg_oos_profit: f64,
    pub avg_is_sharpe: f64,
    pub avg_oos_sharpe: f64,
    /// avg OOS Sharpe / avg IS Sharpe.
    pub sharpe_degradation: f64,
    pub total_oos_profit: f64,
    /// Fraction of walks with data whose OOS profit was positive.
    pub profit_consistency: f64,
}

/// Ratio with a zero-denominator guard.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Efficiency of a single walk: OOS profit over IS profit.
pub fn walk_efficiency(is_profit_pct: f64, oos_profit_pct: f64) -> f64 {
    ratio(oos_profit_pct, is_profit_pct)
}

/// Aggregates per-walk performance into the summary metrics.
pub fn summarize(perfs: &[WalkPerf]) -> EfficiencySummary {
    let is_profits: Vec<f64> = perfs.iter().filter_map(|p| p.is_profit_pct).collect();
    let oos_profits: Vec<f64> = perfs.iter().filter_map(|p| p.oos_profit_pct).collect();
    let is_sharpes: Vec<f64> = perfs.iter().filter_map(|p| p.is_sharpe).collect();
    let oos_sharpes: Vec<f64> = perfs.iter().filter_map(|p| p.oos_sharpe).collect();

    let avg_is_profit = mean(&is_profits);
    let avg_oos_profit = mean(&oos_profits);
    let avg_is_sharpe = mean(&is_sharpes);
    let avg_oos_sharpe = mean(&oos_sharpes);

    let profit_consistency = if oos_profits.is_empty() {
        0.0
    } else {
        oos_profits.iter().filter(|p| **p > 0.0).count() as f64 / oos_profits.len() as f64
    };

    EfficiencySummary {
        wfer: ratio(avg_oos_profit, avg_is_profit),
        avg_is_profit,
        avg_oos_profit,
        avg_is_sharpe,
        avg_oos_sharpe,
        sharpe_degradation: ratio(avg_oos_sharpe, avg_is_sharpe),
        total_oos_profit: oos_profits.iter().sum(),
        profit_consistency,
    }
}

/// Per-walk status bucket by efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalkStatus {
    Excellent,
    Good,
    Caution,
    Poor,
    NoData,
}

impl WalkStatus {
    /// Buckets a walk by its efficiency ratio; `None` means no data.
    pub fn from_efficiency(efficiency: Option<f64>) -> Self {
        match efficiency {
            None => WalkStatus::NoData,
            Some(e) if e > 0.7 => WalkStatus::Excellent,
            Some(e) if e > 0.5 => WalkStatus::Good,
            Some(e) if e > 0.3 => WalkStatus::Caution,
            Some(_) => WalkStatus::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WalkStatus::Excellent => "Excellent",
            WalkStatus::Good => "Good",
            WalkStatus::Caution => "Caution",
            WalkStatus::Poor => "Poor",
            WalkStatus::NoData => "No Data",
        }
    }
}

/// Overall deployment rating from WFER and profit consistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Green,
    Yellow,
    Red,
}

impl Rating {
    pub fn evaluate(summary: &EfficiencySummary) -> Self {
        if summary.wfer > 0.7 && summary.profit_consistency > 0.6 {
            Rating::Green
        } else if summary.wfer > 0.5 && summary.profit_consistency > 0.3 {
            Rating::Yellow
        } else {
            Rating::Red
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rating::Green => "GREEN",
            Rating::Yellow => "YELLOW",
            Rating::Red => "RED",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Rating::Green => "green",
            Rating::Yellow => "yellow",
            Rating::Red => "red",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Rating::Green => "Deploy with confidence",
            Rating::Yellow => "Deploy with caution",
            Rating::Red => "Do not deploy",
        }
    }

    pub fn confidence(&self) -> &'static str {
        match self {
            Rating::Green => "High",
            Rating::Yellow => "Medium",
            Rating::Red => "Low",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(is: f64, oos: f64) -> WalkPerf {
        WalkPerf {
            is_profit_pct: Some(is),
            oos_profit_pct: Some(oos),
            is_sharpe: Some(2.0),
            oos_sharpe: Some(1.0),
        }
    }

    #[test]
    fn test_summarize_basic() {
        let summary = summarize(&[perf(10.0, 8.0), perf(20.0, 10.0), perf(30.0, -3.0)]);
        assert!((summary.avg_is_profit - 20.0).abs() < 1e-9);
        assert!((summary.avg_oos_profit - 5.0).abs() < 1e-9);
        assert!((summary.wfer - 0.25).abs() < 1e-9);
        assert!((summary.sharpe_degradation - 0.5).abs() < 1e-9);
        assert!((summary.total_oos_profit - 15.0).abs() < 1e-9);
        assert!((summary.profit_consistency - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_denominator_guards() {
        assert_eq!(walk_efficiency(0.0, 5.0), 0.0);
        let summary = summarize(&[]);
        assert_eq!(summary.wfer, 0.0);
        assert_eq!(summary.profit_consistency, 0.0);
    }

    #[test]
    fn test_walks_without_data_excluded() {
        let summary = summarize(&[perf(10.0, 10.0), WalkPerf::default()]);
        assert!((summary.avg_is_profit - 10.0).abs() < 1e-9);
        assert!((summary.profit_consistency - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_walk_status_buckets() {
        assert_eq!(WalkStatus::from_efficiency(Some(0.9)), WalkStatus::Excellent);
        assert_eq!(WalkStatus::from_efficiency(Some(0.6)), WalkStatus::Good);
        assert_eq!(WalkStatus::from_efficiency(Some(0.4)), WalkStatus::Caution);
        assert_eq!(WalkStatus::from_efficiency(Some(0.1)), WalkStatus::Poor);
        assert_eq!(WalkStatus::from_efficiency(None), WalkStatus::NoData);
    }

    #[test]
    fn test_rating_thresholds() {
        let green = EfficiencySummary { wfer: 0.8, profit_consistency: 0.7, ..Default::default() };
        let yellow = EfficiencySummary { wfer: 0.6, profit_consistency: 0.4, ..Default::default() };
        let red = EfficiencySummary { wfer: 0.2, profit_consistency: 0.9, ..Default::default() };
        assert_eq!(Rating::evaluate(&green), Rating::Green);
        assert_eq!(Rating::evaluate(&yellow), Rating::Yellow);
        assert_eq!(Rating::evaluate(&red), Rating::Red);
        assert_eq!(Rating::Green.recommendation(), "Deploy with confidence");
    }
}
