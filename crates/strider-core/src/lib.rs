//! # Strider Core
//!
//! Engine plumbing for the walk-forward harness:
//! - **config**: TOML harness configuration with full defaults.
//! - **bot**: argv construction and sequential, timeout-bounded execution of
//!   the external trading-bot CLI.
//! - **windows**: walk-forward window arithmetic.
//! - **efficiency**: walk-forward efficiency ratios and ratings.
//!
//! The pipeline is strictly sequential: one subprocess at a time, awaited to
//! completion before the next step starts. Failures are classified into
//! status strings, not raised as faults, except for broken preconditions
//! (missing config, unspawnable bot).

pub mod bot;
pub mod config;
pub mod efficiency;
pub mod error;
pub mod windows;

pub use bot::{BacktestRequest, BotCli, CommandOutcome, HyperoptRequest, StepStatus};
pub use config::{BotConfig, HarnessConfig, LimitsConfig, PathsConfig};
pub use efficiency::{EfficiencySummary, Rating, WalkPerf, WalkStatus};
pub use error::HarnessError;
