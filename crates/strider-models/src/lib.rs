//! # Strider Data Models
//!
//! Flat records shared by the Strider walk-forward harness:
//! - **Experiments**: one-line experiment tuples from the batch conf file.
//! - **Metrics**: key/value tables scraped from the bot's rendered reports
//!   and the named numeric metrics pulled from raw optimizer output.
//! - **Parameters**: the optimizer parameter artifact the bot writes next to
//!   a strategy after a hyperopt run.
//! - **Walks**: per-window records and the combined walk-forward artifact.
//! - **Strategy catalogue**: name-based strategy families and their
//!   parameter-table layouts for reporting.
//!
//! Everything here is created once per run, serialized to JSON/CSV/HTML and
//! discarded. No lifecycle beyond that.

pub mod experiment;
pub mod metrics;
pub mod params;
pub mod strategy;
pub mod timerange;
pub mod walk;

pub use experiment::{load_experiments, ExperimentParseError, ExperimentSpec, LoadedExperiments};
pub use metrics::{HyperoptMetrics, MetricsTable};
pub use params::{ParamSpaces, ParamsFile, StrategyParams};
pub use strategy::{ParamColumn, ParamTable, StrategyKind};
pub use timerange::{format_date, parse_date, Timerange, TimerangeError};
pub use walk::{
    BacktestOutcome, ChartAvailability, HyperoptOutcome, OosMetrics, TradeRecord, WalkForwardMeta,
    WalkForwardResults, WalkRecord, WalkWindow,
};
