//! Optimizer parameter artifacts.
//!
//! After a hyperopt run the bot writes `<Strategy>.json` next to the strategy
//! source, holding the winning parameters per search space. The harness reads
//! it for CSV summaries and the dashboard's parameter-evolution table. A
//! missing or malformed file degrades to `"N/A"` placeholders; it never fails
//! the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// The `<Strategy>.json` artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamsFile {
    #[serde(default)]
    pub strategy_name: Option<String>,
    #[serde(default)]
    pub params: ParamSpaces,
}

/// Per-space winning parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSpaces {
    #[serde(default)]
    pub buy: Map<String, Value>,
    #[serde(default)]
    pub sell: Map<String, Value>,
    /// ROI curve: minutes-since-open (as a string key) to minimum ROI.
    #[serde(default)]
    pub roi: Map<String, Value>,
    /// Stoploss space; the value of interest sits under the `stoploss` key.
    #[serde(default)]
    pub stoploss: Map<String, Value>,
}

impl ParamsFile {
    /// Loads `<dir>/<strategy>.json`, or `None` when absent/unreadable.
    pub fn load(dir: &Path, strategy: &str) -> Option<Self> {
        let path = dir.join(format!("{strategy}.json"));
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Optimized stoploss, 0.0 when the space is absent.
    pub fn stoploss_f64(&self) -> f64 {
        self.params
            .stoploss
            .get("stoploss")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Looks a parameter up in the buy space first, then sell. 0.0 default.
    pub fn param_f64(&self, key: &str) -> f64 {
        self.params
            .buy
            .get(key)
            .or_else(|| self.params.sell.get(key))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// ROI steps sorted by their integer minute key.
    pub fn roi_steps(&self) -> Vec<(u64, f64)> {
        let mut steps: Vec<(u64, f64)> = self
            .params
            .roi
            .iter()
            .filter_map(|(k, v)| Some((k.parse::<u64>().ok()?, v.as_f64()?)))
            .collect();
        steps.sort_by_key(|(minute, _)| *minute);
        steps
    }

    /// Immediate ROI target (minute 0 step, or the earliest present).
    pub fn roi_first(&self) -> f64 {
        self.roi_steps().first().map(|(_, v)| *v).unwrap_or(0.0)
    }

    /// Final ROI step (usually 0).
    pub fn roi_final(&self) -> f64 {
        self.roi_steps().last().map(|(_, v)| *v).unwrap_or(0.0)
    }
}

/// CSV-facing view of a parameter artifact: compact one-line JSON per space,
/// `"N/A"` wherever nothing was optimized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub stoploss: String,
    pub buy_params: String,
    pub sell_params: String,
    pub roi_params: String,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            stoploss: "N/A".to_string(),
            buy_params: "N/A".to_string(),
            sell_params: "N/A".to_string(),
            roi_params: "N/A".to_string(),
        }
    }
}

impl StrategyParams {
    /// Loads and flattens `<dir>/<strategy>.json`; placeholders when missing.
    pub fn load(dir: &Path, strategy: &str) -> Self {
        match ParamsFile::load(dir, strategy) {
            Some(file) => Self::from_file(&file),
            None => Self::default(),
        }
    }

    pub fn from_file(file: &ParamsFile) -> Self {
        let mut out = Self::default();
        if let Some(v) = file.params.stoploss.get("stoploss") {
            out.stoploss = v.to_string();
        }
        if !file.params.buy.is_empty() {
            out.buy_params = compact_json(&file.params.buy);
        }
        if !file.params.sell.is_empty() {
            out.sell_params = compact_json(&file.params.sell);
        }
        if !file.params.roi.is_empty() {
            out.roi_params = compact_json(&file.params.roi);
        }
        out
    }
}

fn compact_json(map: &Map<String, Value>) -> String {
    serde_json::to_string(map).unwrap_or_else(|_| "N/A".to_string())
}
