//! Strategy catalogue for reporting.
//!
//! The harness never evaluates a strategy itself; it only needs to know which
//! family a name belongs to so the dashboard can lay out the right
//! parameter-evolution columns. Unknown names fall back to a wide generic
//! table.

use serde::{Deserialize, Serialize};

/// Strategy family, detected from the strategy name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    /// QFL base detection gated by an adaptive RSI percentile band.
    QflRsi,
    /// QFL base detection with optimized stop-loss / take-profit exits.
    QflSltp,
    /// Anything else: show every parameter column we know about.
    Generic,
}

impl StrategyKind {
    pub fn detect(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("qflrsi") {
            StrategyKind::QflRsi
        } else if lower.contains("qfl") && lower.contains("sltp") {
            StrategyKind::QflSltp
        } else {
            StrategyKind::Generic
        }
    }

    /// Columns for the dashboard's parameter-evolution table.
    pub fn param_table(&self) -> ParamTable {
        match self {
            StrategyKind::QflRsi => ParamTable {
                columns: &[
                    ParamColumn { header: "RSI Entry Percentile", key: "rsi_entry_percentile", decimals: 3 },
                    ParamColumn { header: "RSI Exit Percentile", key: "rsi_exit_percentile", decimals: 3 },
                    ParamColumn { header: "ATR Multiplier", key: "atr_multiplier", decimals: 1 },
                    ParamColumn { header: "ATR Period", key: "atr_period", decimals: 0 },
                    ParamColumn { header: "Volume MA Period", key: "volume_ma_period", decimals: 0 },
                ],
            },
            StrategyKind::QflSltp => ParamTable {
                columns: &[
                    ParamColumn { header: "Volume MA Period", key: "volume_ma_period", decimals: 0 },
                    ParamColumn { header: "Buy Percentage", key: "buy_percentage", decimals: 3 },
                    ParamColumn { header: "Max Base Age", key: "max_base_age", decimals: 0 },
                    ParamColumn { header: "ROI 0", key: ParamColumn::ROI_FIRST, decimals: 3 },
                    ParamColumn { header: "ROI Final", key: ParamColumn::ROI_FINAL, decimals: 3 },
                    ParamColumn { header: "Stoploss", key: ParamColumn::STOPLOSS, decimals: 3 },
                ],
            },
            StrategyKind::Generic => ParamTable {
                columns: &[
                    ParamColumn { header: "Volume MA Period", key: "volume_ma_period", decimals: 0 },
                    ParamColumn { header: "Buy Percentage", key: "buy_percentage", decimals: 3 },
                    ParamColumn { header: "Max Base Age", key: "max_base_age", decimals: 0 },
                    ParamColumn { header: "RSI Entry", key: "rsi_entry_percentile", decimals: 3 },
                    ParamColumn { header: "RSI Exit", key: "rsi_exit_percentile", decimals: 3 },
                    ParamColumn { header: "ATR Multiplier", key: "atr_multiplier", decimals: 1 },
                    ParamColumn { header: "ROI 0", key: ParamColumn::ROI_FIRST, decimals: 3 },
                    ParamColumn { header: "Stoploss", key: ParamColumn::STOPLOSS, decimals: 3 },
                ],
            },
        }
    }
}

/// One column of the parameter-evolution table.
#[derive(Debug, Clone, Copy)]
pub struct ParamColumn {
    pub header: &'static str,
    /// Buy/sell-space parameter key, or one of the pseudo keys below.
    pub key: &'static str,
    pub decimals: usize,
}

impl ParamColumn {
    /// Pseudo key: immediate ROI step.
    pub const ROI_FIRST: &'static str = "$roi_first";
    /// Pseudo key: final ROI step.
    pub const ROI_FINAL: &'static str = "$roi_final";
    /// Pseudo key: optimized stoploss.
    pub const STOPLOSS: &'static str = "$stoploss";
}

/// Column set for one strategy family.
#[derive(Debug, Clone, Copy)]
pub struct ParamTable {
    pub columns: &'static [ParamColumn],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection() {
        assert_eq!(StrategyKind::detect("QFLRSI_Strategy"), StrategyKind::QflRsi);
        assert_eq!(StrategyKind::detect("QFL_Strategy_SLTP"), StrategyKind::QflSltp);
        assert_eq!(StrategyKind::detect("VWMAStrategyV3"), StrategyKind::Generic);
        assert_eq!(StrategyKind::detect("qflrsi_strategyShort"), StrategyKind::QflRsi);
    }

    #[test]
    fn test_tables_have_columns() {
        assert_eq!(StrategyKind::QflRsi.param_table().columns.len(), 5);
        assert_eq!(StrategyKind::QflSltp.param_table().columns.len(), 6);
        assert_eq!(StrategyKind::Generic.param_table().columns.len(), 8);
    }
}
