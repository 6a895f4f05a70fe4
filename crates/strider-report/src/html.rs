//! Per-run HTML report.
//!
//! A minimal static page: one section per strategy with its scraped metrics
//! table and raw report text, followed by the full run log. Self-contained,
//! viewable straight from the filesystem.

use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::scrape::StrategySection;

/// Escapes text for HTML body and attribute contexts.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the per-run report page.
pub fn render_run_report(title: &str, sections: &[StrategySection], log: &str) -> String {
    let mut html = format!(
        "<html>\n<head>\n<title>Experiment Report: {title}</title>\n<style>\n\
         body {{ font-family: sans-serif; }}\n\
         h1, h2 {{ color: #333; }}\n\
         table {{ border-collapse: collapse; width: 100%; }}\n\
         th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}\n\
         th {{ background-color: #f2f2f2; }}\n\
         pre {{ background-color: #eee; padding: 10px; border-radius: 5px; overflow-x: auto; }}\n\
         </style>\n</head>\n<body>\n<h1>Experiment Report: {title}</h1>\n",
        title = escape_html(title),
    );

    for section in sections {
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.strategy)));

        if !section.metrics.is_empty() {
            html.push_str("<h3>Summary Metrics</h3>\n<table>\n");
            html.push_str("<tr><th>Metric</th><th>Value</th></tr>\n");
            for (key, value) in section.metrics.iter() {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td></tr>\n",
                    escape_html(key),
                    escape_html(value)
                ));
            }
            html.push_str("</table>\n");
        }

        html.push_str("<h3>Full Report</h3>\n");
        html.push_str(&format!("<pre>{}</pre>\n", escape_html(&section.body)));
    }

    html.push_str("<h2>Full Log</h2>\n");
    html.push_str(&format!("<pre>{}</pre>\n", escape_html(log)));
    html.push_str("</body>\n</html>\n");
    html
}

/// Writes `report.html` into the run directory.
pub fn write_run_report(
    run_dir: &Path,
    sections: &[StrategySection],
    log: &str,
) -> anyhow::Result<PathBuf> {
    let title = run_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string());
    let path = run_dir.join("report.html");
    std::fs::write(&path, render_run_report(&title, sections, log))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strider_models::MetricsTable;

    #[test]
    fn test_escape() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_render_contains_sections_and_log() {
        let mut metrics = MetricsTable::new();
        metrics.insert("Total profit %", "1.00%");
        let sections = vec![StrategySection {
            strategy: "QFLRSI_Strategy".into(),
            body: "raw <report>".into(),
            metrics,
        }];

        let html = render_run_report("2024-01-01_12-00-00", &sections, "the log & stuff");
        assert!(html.contains("<h2>QFLRSI_Strategy</h2>"));
        assert!(html.contains("<td>Total profit %</td><td>1.00%</td>"));
        assert!(html.contains("raw &lt;report&gt;"));
        assert!(html.contains("the log &amp; stuff"));
    }
}
