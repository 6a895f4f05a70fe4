//! Harness configuration.
//!
//! Loaded from `strider.toml`; every field has a default so a bare checkout
//! runs against the conventional docker-compose layout without any config
//! file at all.
//!
//! ```toml
//! [bot]
//! program = "docker-compose"
//! args = ["run", "--rm", "freqtrade"]
//! config = "user_data/config.json"
//!
//! [paths]
//! user_data = "user_data"
//! outputs = "experiments/outputs"
//!
//! [limits]
//! step_timeout_secs = 3600
//! experiment_timeout_secs = 14400
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Top-level harness configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub bot: BotConfig,
    pub paths: PathsConfig,
    pub limits: LimitsConfig,
}

/// How to invoke the external bot CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Program to execute.
    pub program: String,
    /// Leading arguments placed before the bot subcommand.
    pub args: Vec<String>,
    /// Bot config path passed as `--config` to every subcommand.
    pub config: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            program: "docker-compose".to_string(),
            args: vec!["run".to_string(), "--rm".to_string(), "freqtrade".to_string()],
            config: "user_data/config.json".to_string(),
        }
    }
}

/// Filesystem layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// The bot's user-data directory (strategies, backtest results, plots).
    pub user_data: PathBuf,
    /// Root for per-run output directories and the summary CSV.
    pub outputs: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            user_data: PathBuf::from("user_data"),
            outputs: PathBuf::from("experiments/outputs"),
        }
    }
}

/// Timeouts. The pipeline never retries; a step that exceeds its budget is
/// recorded as timed out and the unit of work moves on.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Budget for one bot invocation.
    pub step_timeout_secs: u64,
    /// Budget for one whole experiment inside `run-all`.
    pub experiment_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { step_timeout_secs: 3600, experiment_timeout_secs: 14400 }
    }
}

impl HarnessConfig {
    /// Loads from an explicit path. Missing file is an error here.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        toml::from_str(&content)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))
    }

    /// Loads from the conventional path, falling back to defaults when the
    /// file does not exist. Parse errors still surface.
    pub fn load_or_default(path: &Path) -> Result<Self, HarnessError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn backtest_results_dir(&self) -> PathBuf {
        self.paths.user_data.join("backtest_results")
    }

    pub fn strategies_dir(&self) -> PathBuf {
        self.paths.user_data.join("strategies")
    }

    pub fn plot_dir(&self) -> PathBuf {
        self.paths.user_data.join("plot")
    }

    pub fn summary_csv_path(&self) -> PathBuf {
        self.paths.outputs.join("summary.csv")
    }
}
