//! External bot CLI invocation.
//!
//! The trading bot is an opaque containerized CLI. This module builds the
//! argv for its `hyperopt`, `backtesting` and `plot-profit` subcommands and
//! runs one command at a time to completion under a fixed timeout, capturing
//! stdout and stderr for the run log and the scrapers.
//!
//! Outcome classification follows the pipeline's error policy: exit status,
//! timeout, and substring matches against known failure phrases all become a
//! status string on the outcome. Only a command that cannot be spawned at
//! all is a hard error.

use std::time::Duration;
use tokio::process::Command;
use tracing::info;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use strider_models::Timerange;

/// Failure phrases the bot prints without a non-zero exit.
const FAILURE_PHRASES: &[(&str, &str)] = &[
    ("No data found", "no data available for the requested timerange"),
    ("No epochs evaluated", "optimizer evaluated no epochs"),
    ("Impossible to load Strategy", "strategy could not be loaded"),
    ("freqtrade.exceptions", "bot raised an internal exception"),
];

/// One optimizer invocation.
#[derive(Debug, Clone)]
pub struct HyperoptRequest<'a> {
    pub strategy: &'a str,
    pub loss: &'a str,
    /// Search spaces, e.g. `["buy", "stoploss"]`.
    pub spaces: &'a [&'a str],
    pub epochs: u32,
    /// Restrict to one pair; `None` uses the bot config's whitelist.
    pub pair: Option<&'a str>,
    pub timeframe: &'a str,
    pub timerange: Timerange,
}

/// One backtest invocation.
#[derive(Debug, Clone)]
pub struct BacktestRequest<'a> {
    pub strategy: &'a str,
    pub pair: Option<&'a str>,
    pub timeframe: &'a str,
    pub timerange: Timerange,
}

/// How a finished (or abandoned) command is classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Success,
    /// Non-zero exit or a known failure phrase in the output.
    Failed(String),
    TimedOut,
}

/// Captured result of one bot invocation.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Rendered command line, for logs and reports.
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub status: StepStatus,
}

impl CommandOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Success
    }

    /// stdout followed by stderr, the way the run log records a step.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }

    /// The status string recorded in CSV rows and reports.
    pub fn status_string(&self, timeout_secs: u64) -> String {
        match &self.status {
            StepStatus::Success => "completed".to_string(),
            StepStatus::Failed(reason) => format!("failed: {reason}"),
            StepStatus::TimedOut => format!("timed out after {timeout_secs}s"),
        }
    }
}

/// Classifies a finished command from its exit state and combined output.
pub fn classify(exit_ok: bool, exit_code: Option<i32>, combined: &str) -> StepStatus {
    for (phrase, reason) in FAILURE_PHRASES {
        if combined.contains(phrase) {
            return StepStatus::Failed((*reason).to_string());
        }
    }
    if exit_ok {
        StepStatus::Success
    } else {
        match exit_code {
            Some(code) => StepStatus::Failed(format!("exit code {code}")),
            None => StepStatus::Failed("terminated by signal".to_string()),
        }
    }
}

/// The bot CLI handle. Cheap to construct from config.
#[derive(Debug, Clone)]
pub struct BotCli {
    program: String,
    base_args: Vec<String>,
    bot_config: String,
    timeout: Duration,
}

impl BotCli {
    pub fn from_config(cfg: &HarnessConfig) -> Self {
        Self {
            program: cfg.bot.program.clone(),
            base_args: cfg.bot.args.clone(),
            bot_config: cfg.bot.config.clone(),
            timeout: Duration::from_secs(cfg.limits.step_timeout_secs),
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }

    /// argv for a hyperopt run (after the program itself).
    pub fn hyperopt_args(&self, req: &HyperoptRequest<'_>) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend([
            "hyperopt".to_string(),
            "--config".to_string(),
            self.bot_config.clone(),
            "--strategy".to_string(),
            req.strategy.to_string(),
            "--hyperopt-loss".to_string(),
            req.loss.to_string(),
            "--spaces".to_string(),
        ]);
        args.extend(req.spaces.iter().map(|s| s.to_string()));
        args.extend(["--epochs".to_string(), req.epochs.to_string()]);
        if let Some(pair) = req.pair {
            args.extend(["--pair".to_string(), pair.to_string()]);
        }
        args.extend([
            "--timeframe".to_string(),
            req.timeframe.to_string(),
            "--timerange".to_string(),
            req.timerange.to_string(),
            "-j".to_string(),
            "-1".to_string(),
        ]);
        args
    }

    /// argv for a backtest run with trade export.
    pub fn backtest_args(&self, req: &BacktestRequest<'_>) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend([
            "backtesting".to_string(),
            "--config".to_string(),
            self.bot_config.clone(),
            "--strategy".to_string(),
            req.strategy.to_string(),
        ]);
        if let Some(pair) = req.pair {
            args.extend(["--pair".to_string(), pair.to_string()]);
        }
        args.extend([
            "--timeframe".to_string(),
            req.timeframe.to_string(),
            "--timerange".to_string(),
            req.timerange.to_string(),
            "--export".to_string(),
            "trades".to_string(),
        ]);
        args
    }

    /// argv for a profit chart over one timerange.
    pub fn plot_profit_args(
        &self,
        strategy: &str,
        pair: Option<&str>,
        timeframe: &str,
        timerange: Timerange,
    ) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend([
            "plot-profit".to_string(),
            "--config".to_string(),
            self.bot_config.clone(),
            "--strategy".to_string(),
            strategy.to_string(),
        ]);
        if let Some(pair) = pair {
            args.extend(["--pair".to_string(), pair.to_string()]);
        }
        args.extend([
            "--timeframe".to_string(),
            timeframe.to_string(),
            "--timerange".to_string(),
            timerange.to_string(),
        ]);
        args
    }

    /// Renders the full command line for logging.
    pub fn render(&self, args: &[String]) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }

    /// Runs one command to completion under the step timeout.
    ///
    /// Never retries. A timeout kills the child (kill-on-drop) and is
    /// reported on the outcome, not as an error.
    pub async fn run(&self, args: &[String]) -> Result<CommandOutcome, HarnessError> {
        let rendered = self.render(args);
        info!("Running command: {rendered}");

        let mut cmd = Command::new(&self.program);
        cmd.args(args).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(HarnessError::Spawn {
                    command: rendered,
                    detail: e.to_string(),
                })
            }
            Err(_) => {
                return Ok(CommandOutcome {
                    command: rendered,
                    stdout: String::new(),
                    stderr: String::new(),
                    status: StepStatus::TimedOut,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let combined = format!("{stdout}\n{stderr}");
        let status = classify(output.status.success(), output.status.code(), &combined);

        Ok(CommandOutcome { command: rendered, stdout, stderr, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timerange() -> Timerange {
        Timerange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .unwrap()
    }

    fn bot() -> BotCli {
        BotCli::from_config(&HarnessConfig::default())
    }

    #[test]
    fn test_hyperopt_argv() {
        let args = bot().hyperopt_args(&HyperoptRequest {
            strategy: "QFLRSI_Strategy",
            loss: "SortinoHyperOptLoss",
            spaces: &["buy", "stoploss"],
            epochs: 200,
            pair: Some("BTC/USDT:USDT"),
            timeframe: "1h",
            timerange: timerange(),
        });
        let expected: Vec<&str> = vec![
            "run", "--rm", "freqtrade", "hyperopt",
            "--config", "user_data/config.json",
            "--strategy", "QFLRSI_Strategy",
            "--hyperopt-loss", "SortinoHyperOptLoss",
            "--spaces", "buy", "stoploss",
            "--epochs", "200",
            "--pair", "BTC/USDT:USDT",
            "--timeframe", "1h",
            "--timerange", "20240101-20240331",
            "-j", "-1",
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn test_backtest_argv() {
        let args = bot().backtest_args(&BacktestRequest {
            strategy: "QFLRSI_Strategy",
            pair: None,
            timeframe: "1h",
            timerange: timerange(),
        });
        let expected: Vec<&str> = vec![
            "run", "--rm", "freqtrade", "backtesting",
            "--config", "user_data/config.json",
            "--strategy", "QFLRSI_Strategy",
            "--timeframe", "1h",
            "--timerange", "20240101-20240331",
            "--export", "trades",
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn test_classify_exit_codes() {
        assert_eq!(classify(true, Some(0), "all good"), StepStatus::Success);
        assert_eq!(
            classify(false, Some(2), "boom"),
            StepStatus::Failed("exit code 2".to_string())
        );
        assert_eq!(
            classify(false, None, ""),
            StepStatus::Failed("terminated by signal".to_string())
        );
    }

    #[test]
    fn test_classify_failure_phrases_override_exit() {
        let status = classify(true, Some(0), "... No data found for BTC/USDT ...");
        assert_eq!(
            status,
            StepStatus::Failed("no data available for the requested timerange".to_string())
        );
    }

    #[test]
    fn test_status_strings() {
        let outcome = CommandOutcome {
            command: "x".into(),
            stdout: String::new(),
            stderr: String::new(),
            status: StepStatus::TimedOut,
        };
        assert_eq!(outcome.status_string(3600), "timed out after 3600s");
    }

    #[tokio::test]
    async fn test_run_captures_output() {
        let mut cfg = HarnessConfig::default();
        cfg.bot.program = "echo".to_string();
        cfg.bot.args = vec!["step".to_string()];
        let bot = BotCli::from_config(&cfg);

        let outcome = bot.run(&["step".to_string(), "done".to_string()]).await.unwrap();
        assert!(outcome.succeeded());
        assert_eq!(outcome.stdout.trim(), "step done");
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let mut cfg = HarnessConfig::default();
        cfg.bot.program = "sleep".to_string();
        cfg.bot.args = vec![];
        cfg.limits.step_timeout_secs = 1;
        let bot = BotCli::from_config(&cfg);

        let outcome = bot.run(&["5".to_string()]).await.unwrap();
        assert_eq!(outcome.status, StepStatus::TimedOut);
    }

    #[tokio::test]
    async fn test_run_unspawnable_is_error() {
        let mut cfg = HarnessConfig::default();
        cfg.bot.program = "/definitely/not/a/program".to_string();
        let bot = BotCli::from_config(&cfg);
        assert!(bot.run(&[]).await.is_err());
    }
}
