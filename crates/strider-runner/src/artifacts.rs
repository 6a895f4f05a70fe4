//! Filesystem plumbing around the bot's artifacts.
//!
//! The bot drops backtest result JSON/ZIPs into its results directory and
//! parameter files next to the strategies. Runs copy what they need into
//! their own output directory and clean the shared locations so the next run
//! starts from a blank slate.

use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

use strider_models::TradeRecord;

/// Removes every file in `dir` with one of the given extensions. Best
/// effort; a missing directory is fine.
pub fn remove_files_with_extensions(dir: &Path, exts: &[&str]) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if has_extension(&path, exts) {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("could not remove {}: {e}", path.display());
            }
        }
    }
}

/// Copies every file in `src` with one of the given extensions into `dst`.
/// Returns the number of files copied.
pub fn copy_files_with_extensions(src: &Path, dst: &Path, exts: &[&str]) -> anyhow::Result<usize> {
    let mut copied = 0;
    let Ok(entries) = std::fs::read_dir(src) else {
        return Ok(0);
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !has_extension(&path, exts) {
            continue;
        }
        let Some(name) = path.file_name() else { continue };
        std::fs::copy(&path, dst.join(name))
            .with_context(|| format!("copy {} into {}", path.display(), dst.display()))?;
        copied += 1;
    }
    Ok(copied)
}

/// Copies a single file when present. Returns whether it was copied.
pub fn copy_if_exists(src: &Path, dst: &Path) -> bool {
    if !src.is_file() {
        return false;
    }
    match std::fs::copy(src, dst) {
        Ok(_) => true,
        Err(e) => {
            warn!("could not copy {}: {e}", src.display());
            false
        }
    }
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| exts.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

fn mtime(path: &Path) -> SystemTime {
    path.metadata()
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Newest backtest result JSON in the results directory, skipping the
/// `.meta.json` companions the bot writes alongside.
pub fn newest_result_json(dir: &Path) -> anyhow::Result<PathBuf> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("read backtest results dir {}", dir.display()))?;

    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.extension().and_then(|e| e.to_str()) == Some("json")
                && !p.to_string_lossy().ends_with(".meta.json")
        })
        .max_by_key(|p| mtime(p))
        .ok_or_else(|| anyhow!("no backtest result artifacts in {}", dir.display()))
}

/// Pulls the trade list for one strategy out of the newest backtest result
/// artifact. The artifact shape is `{"strategy": {"<name>": {"trades": [..]}}}`.
pub fn extract_trades(results_dir: &Path, strategy: &str) -> anyhow::Result<Vec<TradeRecord>> {
    let path = newest_result_json(results_dir)?;
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))?;

    let trades = value
        .get("strategy")
        .and_then(|s| s.get(strategy))
        .and_then(|s| s.get("trades"))
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));

    Ok(serde_json::from_value(trades)?)
}

/// Newest HTML chart the bot's plot subcommand produced.
pub fn newest_plot_html(plot_dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(plot_dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("html"))
        .max_by_key(|p| mtime(p))
}

/// Newest generated report under the outputs root, per-run reports and
/// walk-forward dashboards alike.
pub fn find_latest_report(root: &Path) -> Option<PathBuf> {
    let mut best: Option<(SystemTime, PathBuf)> = None;
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if matches!(
                path.file_name().and_then(|n| n.to_str()),
                Some("report.html") | Some("walk_forward_report.html")
            ) {
                let modified = mtime(&path);
                if best.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
                    best = Some((modified, path));
                }
            }
        }
    }
    best.map(|(_, p)| p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_and_copy_by_extension() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.json"), "{}").unwrap();
        std::fs::write(src.path().join("b.zip"), "zz").unwrap();
        std::fs::write(src.path().join("keep.txt"), "t").unwrap();

        let copied = copy_files_with_extensions(src.path(), dst.path(), &["json", "zip"]).unwrap();
        assert_eq!(copied, 2);
        assert!(dst.path().join("a.json").exists());
        assert!(!dst.path().join("keep.txt").exists());

        remove_files_with_extensions(src.path(), &["json", "zip"]);
        assert!(!src.path().join("a.json").exists());
        assert!(src.path().join("keep.txt").exists());
    }

    #[test]
    fn test_extract_trades() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = serde_json::json!({
            "strategy": {
                "QFLRSI_Strategy": {
                    "trades": [
                        {
                            "pair": "BTC/USDT:USDT",
                            "open_date": "2024-04-03 10:00:00",
                            "close_date": "2024-04-03 16:00:00",
                            "profit_abs": 25.0,
                            "profit_ratio": 0.025,
                            "trade_duration": 360,
                            "exit_reason": "roi"
                        }
                    ]
                }
            }
        });
        std::fs::write(
            dir.path().join("backtest-result-2024-04-30.json"),
            artifact.to_string(),
        )
        .unwrap();
        std::fs::write(dir.path().join("backtest-result-2024-04-30.meta.json"), "{}").unwrap();

        let trades = extract_trades(dir.path(), "QFLRSI_Strategy").unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].profit_abs, 25.0);
        assert_eq!(trades[0].exit_reason, "roi");

        // unknown strategy degrades to empty, not an error
        assert!(extract_trades(dir.path(), "Other").unwrap().is_empty());
    }

    #[test]
    fn test_newest_result_json_requires_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        assert!(newest_result_json(dir.path()).is_err());
    }

    #[test]
    fn test_find_latest_report() {
        let root = tempfile::tempdir().unwrap();
        let a = root.path().join("s1/p/1h/run1");
        let b = root.path().join("walk_forward/s1/sess");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(a.join("report.html"), "x").unwrap();
        std::fs::write(b.join("walk_forward_report.html"), "y").unwrap();

        let found = find_latest_report(root.path()).unwrap();
        assert!(found.ends_with("report.html") || found.ends_with("walk_forward_report.html"));
    }
}
