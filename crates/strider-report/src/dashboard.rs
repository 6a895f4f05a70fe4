//! Walk-forward dashboard.
//!
//! A single self-contained HTML page summarizing a whole walk-forward
//! session: overall rating, efficiency metrics, test configuration with the
//! reproduction command, walk-by-walk analysis, parameter evolution and the
//! individual trade list. In-sample metrics are re-scraped from the raw
//! optimizer output stored on each walk record.

use anyhow::Context;
use chrono::Utc;
use std::path::Path;

use strider_core::efficiency::{self, Rating, WalkPerf, WalkStatus};
use strider_models::{
    HyperoptMetrics, ParamColumn, ParamsFile, StrategyKind, WalkForwardResults, WalkRecord,
};

use crate::html::escape_html;
use crate::scrape::ReportScraper;

const GREEN: &str = "#28a745";
const RED: &str = "#dc3545";

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
    min-height: 100vh;
    padding: 20px;
}
.container {
    max-width: 1400px; margin: 0 auto; background: white;
    border-radius: 20px; box-shadow: 0 20px 40px rgba(0,0,0,0.1); overflow: hidden;
}
.header {
    background: linear-gradient(135deg, #2c3e50 0%, #34495e 100%);
    color: white; padding: 40px; text-align: center;
}
.header h1 { font-size: 2.5rem; margin-bottom: 10px; }
.header .subtitle { font-size: 1.2rem; opacity: 0.9; margin-bottom: 20px; }
.rating {
    display: inline-block; font-size: 2rem; font-weight: bold;
    padding: 20px 40px; border-radius: 50px; margin: 20px;
    text-transform: uppercase; letter-spacing: 2px;
    box-shadow: 0 10px 20px rgba(0,0,0,0.2);
}
.green { background: linear-gradient(135deg, #4CAF50, #45a049); color: white; }
.yellow { background: linear-gradient(135deg, #FFC107, #f0b90b); color: black; }
.red { background: linear-gradient(135deg, #F44336, #d32f2f); color: white; }
.recommendation { font-size: 1.3rem; margin-top: 10px; }
.content { padding: 40px; }
.section { margin-bottom: 50px; }
.section h2 {
    color: #2c3e50; font-size: 1.8rem; margin-bottom: 25px;
    padding-bottom: 12px; border-bottom: 3px solid #3498db;
}
.metrics-dashboard {
    display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
    gap: 25px; margin-bottom: 30px;
}
.metric-card {
    background: linear-gradient(135deg, #f8f9fa 0%, #e9ecef 100%);
    padding: 28px; border-radius: 15px; text-align: center;
    border-left: 5px solid #3498db;
}
.metric-value { font-size: 2.3rem; font-weight: 700; color: #2c3e50; margin-bottom: 8px; }
.metric-label { font-size: 0.85rem; color: #7f8c8d; text-transform: uppercase; letter-spacing: 1px; }
.config-grid {
    display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr));
    gap: 18px; background: #f8f9fa; padding: 28px; border-radius: 15px; margin: 20px 0;
}
.config-item {
    display: flex; justify-content: space-between;
    padding: 8px 0; border-bottom: 1px solid #e9ecef;
}
.config-label { font-weight: 600; color: #495057; }
.config-value { color: #2c3e50; }
.analysis-table {
    width: 100%; border-collapse: collapse; margin: 20px 0; background: white;
    border-radius: 10px; overflow: hidden; box-shadow: 0 5px 15px rgba(0,0,0,0.1);
}
.analysis-table th {
    background: linear-gradient(135deg, #3498db, #2980b9); color: white;
    padding: 13px 10px; text-align: left; font-size: 0.85rem;
}
.analysis-table td { padding: 12px 10px; border-bottom: 1px solid #e9ecef; }
.analysis-table tbody tr:nth-child(even) { background-color: #fafafa; }
.info-panel {
    background: linear-gradient(135deg, #e3f2fd 0%, #bbdefb 100%);
    border: 1px solid #2196f3; padding: 22px; border-radius: 15px; margin: 25px 0;
}
.info-panel h3 { color: #1976d2; margin-bottom: 12px; }
.info-panel ul { margin-left: 20px; }
.info-panel li { margin: 6px 0; }
.highlight {
    background: linear-gradient(135deg, #fff3cd, #ffeaa7);
    border: 1px solid #ffc107; padding: 18px; border-radius: 10px; margin: 20px 0;
}
.command-box {
    background: #f8f9fa; padding: 14px; border-radius: 8px; margin: 10px 0;
    border-left: 4px solid #007bff; font-family: monospace; font-size: 0.9em;
    word-break: break-all; white-space: pre-wrap;
}
.footer {
    background: #f8f9fa; padding: 28px; text-align: center;
    border-top: 1px solid #e9ecef; color: #6c757d;
}
"#;

/// Everything derived for one walk before rendering.
struct WalkView<'a> {
    record: &'a WalkRecord,
    is_metrics: Option<HyperoptMetrics>,
    efficiency: Option<f64>,
    status: WalkStatus,
}

fn build_views<'a>(scraper: &ReportScraper, walks: &'a [WalkRecord]) -> Vec<WalkView<'a>> {
    walks
        .iter()
        .map(|record| {
            let is_metrics = record
                .hyperopt
                .as_ref()
                .filter(|h| !h.raw_output.is_empty())
                .map(|h| scraper.hyperopt_metrics(&h.raw_output));

            let efficiency = record.backtest.as_ref().map(|b| {
                let is_profit = is_metrics.map(|m| m.total_profit_pct).unwrap_or(0.0);
                efficiency::walk_efficiency(is_profit, b.metrics.total_profit_pct)
            });

            WalkView {
                record,
                is_metrics,
                efficiency,
                status: WalkStatus::from_efficiency(efficiency),
            }
        })
        .collect()
}

fn status_cell(status: WalkStatus) -> &'static str {
    match status {
        WalkStatus::Excellent => "🟢 Excellent",
        WalkStatus::Good => "🟡 Good",
        WalkStatus::Caution => "🟠 Caution",
        WalkStatus::Poor => "🔴 Poor",
        WalkStatus::NoData => "❌ No Data",
    }
}

fn profit_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => {
            let color = if v > 0.0 { GREEN } else { RED };
            format!("<td style=\"color: {color}; font-weight: bold;\">{v:.2}%</td>")
        }
        None => "<td>N/A</td>".to_string(),
    }
}

fn chart_cell(available: bool, walk_num: u32, side: &str, label: &str) -> String {
    if available {
        format!(
            "<td style=\"text-align: center;\"><a href=\"charts/walk_{walk_num}_{side}_chart.html\" \
             target=\"_blank\">{label}</a></td>"
        )
    } else {
        "<td style=\"text-align: center;\"><span style=\"color: #6c757d;\">No Chart</span></td>"
            .to_string()
    }
}

fn resolve_param(params: &ParamsFile, key: &str) -> f64 {
    match key {
        ParamColumn::ROI_FIRST => params.roi_first(),
        ParamColumn::ROI_FINAL => params.roi_final(),
        ParamColumn::STOPLOSS => params.stoploss_f64(),
        other => params.param_f64(other),
    }
}

fn walk_rows(views: &[WalkView<'_>]) -> String {
    let mut rows = String::new();
    for view in views {
        let w = view.record;
        let (is_profit, is_sharpe, is_trades, is_drawdown) = match view.is_metrics {
            Some(m) => (
                Some(m.total_profit_pct),
                format!("{:.2}", m.sharpe),
                m.total_trades.to_string(),
                format!("{:.2}%", m.max_drawdown_pct),
            ),
            None => (None, "N/A".into(), "N/A".into(), "N/A".into()),
        };

        let (oos_profit, oos_trades, oos_win, oos_pf) = match &w.backtest {
            Some(b) => (
                Some(b.metrics.total_profit_pct),
                b.trades.len().to_string(),
                format!("{:.1}%", b.metrics.win_rate * 100.0),
                format!("{:.2}", b.metrics.profit_factor),
            ),
            None => (None, "N/A".into(), "N/A".into(), "N/A".into()),
        };

        let efficiency = match view.efficiency {
            Some(e) => format!("{e:.2}"),
            None => "N/A".into(),
        };

        rows.push_str(&format!(
            "<tr>\n\
             <td style=\"font-weight: bold; text-align: center;\">{num}</td>\n\
             <td style=\"font-size: 12px;\">{is_period}</td>\n\
             <td style=\"font-size: 12px;\">{oos_period}</td>\n\
             {is_profit}\n<td>{is_sharpe}</td>\n<td>{is_trades}</td>\n<td>{is_drawdown}</td>\n\
             {oos_profit}\n<td>{oos_trades}</td>\n<td>{oos_win}</td>\n<td>{oos_pf}</td>\n\
             <td style=\"font-weight: bold;\">{efficiency}</td>\n\
             <td style=\"font-weight: bold;\">{status}</td>\n\
             {is_chart}\n{oos_chart}\n</tr>\n",
            num = w.window.walk_num,
            is_period = w.window.is_period.pretty(),
            oos_period = w.window.oos_period.pretty(),
            is_profit = profit_cell(is_profit),
            oos_profit = profit_cell(oos_profit),
            status = status_cell(view.status),
            is_chart = chart_cell(w.charts.is_chart, w.window.walk_num, "IS", "📈 IS Chart"),
            oos_chart = chart_cell(w.charts.oos_chart, w.window.walk_num, "OOS", "📊 OOS Chart"),
        ));
    }
    rows
}

fn param_evolution_table(kind: StrategyKind, views: &[WalkView<'_>]) -> String {
    let table = kind.param_table();

    let mut headers = String::from("<th>Walk</th>");
    for col in table.columns {
        headers.push_str(&format!("<th>{}</th>", escape_html(col.header)));
    }

    let mut rows = String::new();
    for view in views {
        let Some(params) = view.record.hyperopt.as_ref().and_then(|h| h.params.as_ref()) else {
            continue;
        };
        rows.push_str(&format!(
            "<tr>\n<td style=\"font-weight: bold; text-align: center;\">{}</td>",
            view.record.window.walk_num
        ));
        for col in table.columns {
            let value = resolve_param(params, col.key);
            rows.push_str(&format!("\n<td>{:.*}</td>", col.decimals, value));
        }
        rows.push_str("\n</tr>\n");
    }

    format!(
        "<div style=\"overflow-x: auto;\">\n<table class=\"analysis-table\">\n\
         <thead><tr>{headers}</tr></thead>\n<tbody>\n{rows}</tbody>\n</table>\n</div>\n"
    )
}

fn trade_rows(walks: &[WalkRecord]) -> String {
    let mut rows = String::new();
    for walk in walks {
        let Some(backtest) = &walk.backtest else { continue };
        for (i, trade) in backtest.trades.iter().enumerate() {
            let color = if trade.profit_abs > 0.0 { GREEN } else { RED };
            rows.push_str(&format!(
                "<tr>\n<td>Walk {num}</td>\n<td>{idx}</td>\n<td>{pair}</td>\n\
                 <td>{open}</td>\n<td>{close}</td>\n\
                 <td style=\"color: {color}; font-weight: bold;\">{abs:.2} USDT</td>\n\
                 <td style=\"color: {color}; font-weight: bold;\">{pct:.2}%</td>\n\
                 <td>{duration}</td>\n<td>{reason}</td>\n</tr>\n",
                num = walk.window.walk_num,
                idx = i + 1,
                pair = escape_html(&trade.pair),
                open = escape_html(&trade.open_date),
                close = escape_html(&trade.close_date),
                abs = trade.profit_abs,
                pct = trade.profit_ratio * 100.0,
                duration = trade.duration_pretty(),
                reason = escape_html(&trade.exit_reason),
            ));
        }
    }
    rows
}

fn metric_card(value: &str, label: &str) -> String {
    format!(
        "<div class=\"metric-card\"><div class=\"metric-value\">{value}</div>\
         <div class=\"metric-label\">{label}</div></div>\n"
    )
}

fn config_item(label: &str, value: &str) -> String {
    format!(
        "<div class=\"config-item\"><span class=\"config-label\">{label}</span>\
         <span class=\"config-value\">{}</span></div>\n",
        escape_html(value)
    )
}

/// Renders the full dashboard page.
pub fn render_dashboard(results: &WalkForwardResults) -> String {
    let scraper = ReportScraper::new();
    let meta = &results.meta;
    let views = build_views(&scraper, &results.walks);

    let perfs: Vec<WalkPerf> = views
        .iter()
        .map(|v| WalkPerf {
            is_profit_pct: v.is_metrics.map(|m| m.total_profit_pct),
            is_sharpe: v.is_metrics.map(|m| m.sharpe),
            oos_profit_pct: v.record.backtest.as_ref().map(|b| b.metrics.total_profit_pct),
            oos_sharpe: v.record.backtest.as_ref().map(|b| b.metrics.sharpe),
        })
        .collect();
    let summary = efficiency::summarize(&perfs);
    let rating = Rating::evaluate(&summary);

    let total_trades: usize = results
        .walks
        .iter()
        .filter_map(|w| w.backtest.as_ref())
        .map(|b| b.trades.len())
        .sum();
    let total_profit_abs: f64 = results
        .walks
        .iter()
        .filter_map(|w| w.backtest.as_ref())
        .map(|b| b.metrics.total_profit_abs)
        .sum();

    let mut cards = String::new();
    cards.push_str(&metric_card(&format!("{:.3}", summary.wfer), "Walk Forward Efficiency Ratio"));
    cards.push_str(&metric_card(
        &format!("{:.1}%", summary.profit_consistency * 100.0),
        "Profit Consistency",
    ));
    cards.push_str(&metric_card(&total_trades.to_string(), "Total Out-of-Sample Trades"));
    cards.push_str(&metric_card(&format!("{total_profit_abs:.2}"), "Total OOS Profit (USDT)"));
    cards.push_str(&metric_card(&format!("{:.2}%", summary.avg_is_profit), "Avg In-Sample Profit"));
    cards.push_str(&metric_card(
        &format!("{:.2}%", summary.avg_oos_profit),
        "Avg Out-of-Sample Profit",
    ));
    cards.push_str(&metric_card(
        &format!("{:.2}", summary.sharpe_degradation),
        "Sharpe Ratio Degradation",
    ));
    cards.push_str(&metric_card(&results.walks.len().to_string(), "Walk Forward Periods"));

    let mut config = String::new();
    config.push_str(&config_item("Strategy:", &meta.strategy));
    config.push_str(&config_item("Trading Pair:", &meta.pair));
    config.push_str(&config_item("Timeframe:", &meta.timeframe));
    config.push_str(&config_item("Total Walks:", &meta.num_walks.to_string()));
    config.push_str(&config_item("In-Sample Period:", &format!("{} days", meta.is_window_days)));
    config.push_str(&config_item(
        "Out-of-Sample Period:",
        &format!("{} days", meta.oos_window_days),
    ));
    config.push_str(&config_item("Epochs per Walk:", &meta.epochs.to_string()));
    config.push_str(&config_item("Test Period:", &meta.total_period.pretty()));
    config.push_str(&config_item("Optimization Function:", &meta.hyperopt_loss));

    let kind = StrategyKind::detect(&meta.strategy);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Walk Forward Analysis Report - {strategy}</title>
<style>{style}</style>
</head>
<body>
<div class="container">
<div class="header">
<h1>Walk Forward Analysis Report</h1>
<div class="subtitle">{strategy} on {pair}</div>
<div class="rating {rating_class}">{rating_label}</div>
<div class="recommendation">
<strong>Recommendation:</strong> {recommendation}<br>
<strong>Confidence Level:</strong> {confidence}
</div>
</div>
<div class="content">

<div class="section">
<h2>📊 Key Performance Metrics</h2>
<div class="metrics-dashboard">
{cards}</div>
</div>

<div class="section">
<h2>⚙️ Test Configuration</h2>
<div class="config-grid">
{config}</div>
<div class="highlight">
<h4>🔄 Reproduction Command</h4>
<div class="command-box" id="reproCommand">{command}</div>
</div>
</div>

<div class="section">
<h2>📈 Walk-by-Walk Analysis</h2>
<div style="overflow-x: auto;">
<table class="analysis-table">
<thead>
<tr>
<th>Walk</th><th>In-Sample Period</th><th>Out-of-Sample Period</th>
<th>IS Profit</th><th>IS Sharpe</th><th>IS Trades</th><th>IS Drawdown</th>
<th>OOS Profit</th><th>OOS Trades</th><th>OOS Win Rate</th><th>OOS Profit Factor</th>
<th>Efficiency</th><th>Status</th><th>IS Chart</th><th>OOS Chart</th>
</tr>
</thead>
<tbody>
{walk_rows}</tbody>
</table>
</div>
</div>

<div class="section">
<h2>🔧 Strategy Parameter Evolution</h2>
{param_table}<div class="info-panel">
<h3>Parameter Analysis</h3>
<p>Parameters were optimized independently for each walk. Consistent ranges
across walks indicate robust strategy design; volatile parameters suggest
fitting to window-specific conditions.</p>
</div>
</div>

<div class="section">
<h2>📋 Individual Trade Analysis</h2>
<div style="overflow-x: auto;">
<table class="analysis-table">
<thead>
<tr>
<th>Walk</th><th>Trade #</th><th>Pair</th><th>Open Date</th><th>Close Date</th>
<th>Profit (USDT)</th><th>Profit (%)</th><th>Duration</th><th>Exit Reason</th>
</tr>
</thead>
<tbody>
{trade_rows}</tbody>
</table>
</div>
</div>

<div class="section">
<h2>📚 Understanding Walk Forward Analysis</h2>
<div class="info-panel">
<h3>Walk Forward Efficiency Ratio (WFER)</h3>
<p>WFER is the ratio of average out-of-sample performance to average
in-sample performance.</p>
<ul>
<li><strong>WFER &gt; 0.7:</strong> Excellent - minimal out-of-sample degradation</li>
<li><strong>WFER 0.5-0.7:</strong> Good - acceptable degradation, suitable for deployment</li>
<li><strong>WFER 0.3-0.5:</strong> Caution - significant performance drop</li>
<li><strong>WFER &lt; 0.3:</strong> Poor - likely overfitting, do not deploy</li>
</ul>
</div>
<div class="info-panel">
<h3>Profit Consistency</h3>
<p>The share of walks that produced a positive out-of-sample return. Higher
consistency means more reliable behavior across market regimes.</p>
</div>
</div>

</div>
<div class="footer">
<p><strong>Report Generated:</strong> {generated} UTC</p>
<p><strong>Session ID:</strong> {session}</p>
<p><strong>Generated by:</strong> Strider Walk Forward Analysis</p>
</div>
</div>
</body>
</html>
"#,
        strategy = escape_html(&meta.strategy),
        pair = escape_html(&meta.pair),
        style = STYLE,
        rating_class = rating.css_class(),
        rating_label = rating.label(),
        recommendation = rating.recommendation(),
        confidence = rating.confidence(),
        cards = cards,
        config = config,
        command = escape_html(&meta.original_command),
        walk_rows = walk_rows(&views),
        param_table = param_evolution_table(kind, &views),
        trade_rows = trade_rows(&results.walks),
        generated = Utc::now().format("%Y-%m-%d %H:%M:%S"),
        session = escape_html(&meta.session_timestamp),
    )
}

/// Renders and writes the dashboard next to the combined artifact.
pub fn write_dashboard(results: &WalkForwardResults, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(path, render_dashboard(results))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
