use chrono::NaiveDate;
use std::io::Write;
use std::path::Path;

use strider_core::bot::{BacktestRequest, BotCli, HyperoptRequest};
use strider_core::windows::chain_backwards;
use strider_core::HarnessConfig;
use strider_models::{
    BacktestOutcome, ChartAvailability, HyperoptOutcome, OosMetrics, StrategyParams, Timerange,
    TradeRecord, WalkForwardMeta, WalkForwardResults, WalkRecord,
};
use strider_report::csv::SummaryRow;
use strider_report::{write_run_report, ReportScraper};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

const SAMPLE_RUN_LOG: &str = "\
Strategy: QFLRSI_Strategy
Pair: BTC/USDT:USDT
Timeframe: 1h
Start Date: 20240101
IS Length (days): 90
OOS Length (days): 30
Epochs: 200
Loss Function: SortinoHyperOptLoss
Calculated In Sample Period: 20240101-20240330
Calculated Out of Sample Period: 20240331-20240429
Running command: docker-compose run --rm freqtrade backtesting ...
Result for strategy QFLRSI_Strategy
                       SUMMARY METRICS
│ Total profit %          │ 8.91%          │
│ Absolute profit         │ 89.10 USDT     │
│ Absolute Drawdown       │ 21.30 USDT     │
│ Sortino                 │ 1.05           │
│ Sharpe                  │ 1.42           │
│ Calmar                  │ 6.20           │
│ Profit factor           │ 1.31           │
│ Total/Daily Avg Trades  │ 18 / 0.6       │
│ Days win/draw/lose      │ 14 / 2 / 14    │

                       STRATEGY SUMMARY
";

/// The whole offline path of one run: scrape the combined log, build the
/// summary row, render the report.
#[test]
fn test_scrape_to_report_pipeline() {
    let scraper = ReportScraper::new();
    let sections = scraper.scrape_sections(SAMPLE_RUN_LOG);
    assert_eq!(sections.len(), 1);

    let info = scraper.run_log_info(SAMPLE_RUN_LOG);
    assert_eq!(info.start_date, "20240101");
    assert_eq!(info.loss_function, "SortinoHyperOptLoss");

    let row = SummaryRow::build(
        1,
        "QFLRSI_Strategy",
        "BTC/USDT:USDT",
        "1h",
        &info,
        "completed",
        Some(&sections[0].metrics),
        &StrategyParams::default(),
    );
    let line = row.to_line();
    assert!(line.starts_with("1,QFLRSI_Strategy,BTC/USDT:USDT,1h,20240101,90,30,200,"));
    assert!(line.contains("8.91%"));
    assert!(line.contains(",18,"));

    let run_dir = tempfile::tempdir().unwrap();
    let report = write_run_report(run_dir.path(), &sections, SAMPLE_RUN_LOG).unwrap();
    let html = std::fs::read_to_string(report).unwrap();
    assert!(html.contains("<h2>QFLRSI_Strategy</h2>"));
    assert!(html.contains("<td>Total profit %</td><td>8.91%</td>"));
}

/// Writes a shell script that answers like the bot CLI for each subcommand.
fn write_fake_bot(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("fake_bot.sh");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "#!/bin/sh\n\
         case \"$1\" in\n\
         hyperopt)\n\
           echo \"Best result:\"\n\
           echo \"| Total profit %              | 22.50          |\"\n\
           echo \"| Sharpe                      | 2.40           |\"\n\
           echo \"| Total/Daily Avg Trades      | 31 / 1.0       |\"\n\
           ;;\n\
         backtesting)\n\
           echo \"Result for strategy QFLRSI_Strategy\"\n\
           echo \"SUMMARY METRICS\"\n\
           echo \"| Total profit %          | 11.20%         |\"\n\
           echo \"| Absolute profit         | 112.00 USDT    |\"\n\
           echo \"| Sharpe                  | 1.60           |\"\n\
           echo \"| Profit factor           | 1.50           |\"\n\
           echo \"\"\n\
           echo \" STRATEGY SUMMARY\"\n\
           ;;\n\
         *)\n\
           echo \"unknown subcommand $1\" >&2\n\
           exit 2\n\
           ;;\n\
         esac"
    )
    .unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

/// Drives the bot layer against a fake CLI and scrapes both step outputs.
#[tokio::test]
async fn test_fake_bot_hyperopt_then_backtest() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_fake_bot(dir.path());

    let mut cfg = HarnessConfig::default();
    cfg.bot.program = script.to_string_lossy().into_owned();
    cfg.bot.args = vec![];
    cfg.limits.step_timeout_secs = 30;
    let bot = BotCli::from_config(&cfg);
    let scraper = ReportScraper::new();

    let timerange = Timerange::new(d(2024, 1, 1), d(2024, 3, 30)).unwrap();

    let hyperopt = bot
        .run(&bot.hyperopt_args(&HyperoptRequest {
            strategy: "QFLRSI_Strategy",
            loss: "SharpeHyperOptLoss",
            spaces: &["buy", "sell"],
            epochs: 50,
            pair: Some("BTC/USDT:USDT"),
            timeframe: "1h",
            timerange,
        }))
        .await
        .unwrap();
    assert!(hyperopt.succeeded());
    let is_metrics = scraper.hyperopt_metrics(&hyperopt.combined_output());
    assert_eq!(is_metrics.total_profit_pct, 22.50);
    assert_eq!(is_metrics.total_trades, 31);

    let backtest = bot
        .run(&bot.backtest_args(&BacktestRequest {
            strategy: "QFLRSI_Strategy",
            pair: Some("BTC/USDT:USDT"),
            timeframe: "1h",
            timerange,
        }))
        .await
        .unwrap();
    assert!(backtest.succeeded());
    let table = scraper.parse_summary_metrics(&backtest.combined_output());
    assert_eq!(table.profit_pct(), Some(11.20));
    assert_eq!(table.numeric("Profit factor"), Some(1.50));

    // unknown subcommand surfaces as a failed step, not an error
    let broken = bot.run(&["plot-nothing".to_string()]).await.unwrap();
    assert!(!broken.succeeded());
}

/// Window chaining feeding the combined artifact, persisted and re-rendered.
#[test]
fn test_walk_forward_artifact_round_trip() {
    let windows = chain_backwards(d(2024, 6, 30), 90, 30, 2).unwrap();
    assert_eq!(windows.len(), 2);

    let walks: Vec<WalkRecord> = windows
        .iter()
        .map(|w| WalkRecord {
            window: *w,
            status: "completed".to_string(),
            hyperopt: Some(HyperoptOutcome {
                raw_output: "| Total profit % | 10.00 |\n| Sharpe | 1.00 |".to_string(),
                params: None,
            }),
            backtest: Some(BacktestOutcome {
                metrics: OosMetrics {
                    total_profit_abs: 50.0,
                    total_profit_pct: 6.0,
                    win_rate: 0.5,
                    profit_factor: 1.2,
                    sharpe: 0.8,
                },
                trades: vec![TradeRecord {
                    pair: "BTC/USDT:USDT".to_string(),
                    profit_abs: 50.0,
                    profit_ratio: 0.05,
                    trade_duration: 90,
                    ..Default::default()
                }],
            }),
            charts: ChartAvailability::default(),
        })
        .collect();

    let results = WalkForwardResults {
        meta: WalkForwardMeta {
            strategy: "QFLRSI_Strategy".to_string(),
            pair: "BTC/USDT:USDT".to_string(),
            timeframe: "1h".to_string(),
            num_walks: 2,
            is_window_days: 90,
            oos_window_days: 30,
            epochs: 200,
            hyperopt_loss: "SharpeHyperOptLoss".to_string(),
            end_date: d(2024, 6, 30),
            total_period: Timerange::new(
                windows[0].is_period.start,
                windows[1].oos_period.end,
            )
            .unwrap(),
            original_command: "strider walk-forward --num-walks 2".to_string(),
            session_timestamp: "2024-06-30_10-00-00".to_string(),
        },
        walks,
    };

    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("walk_forward_results.json");
    results.write(&json_path).unwrap();

    let loaded = WalkForwardResults::load(&json_path).unwrap();
    assert_eq!(loaded.walks.len(), 2);
    assert!(loaded.walks.iter().all(|w| w.completed()));

    let report_path = dir.path().join("walk_forward_report.html");
    strider_report::write_dashboard(&loaded, &report_path).unwrap();
    let html = std::fs::read_to_string(&report_path).unwrap();

    // both walks profitable OOS, efficiency 0.6 each => yellow rating
    assert!(html.contains("class=\"rating yellow\""));
    assert!(html.contains("Deploy with caution"));
    assert!(html.contains("1h 30m"));
}
