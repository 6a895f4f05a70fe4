//! # Strider Report
//!
//! The reporting side of the harness: regex scraping of the bot's rendered
//! text tables, the summary CSV schema, the per-run HTML report, and the
//! walk-forward dashboard.
//!
//! Scraping is deliberately tolerant. The bot renders its tables for humans,
//! with box-drawing or ASCII pipes depending on terminal detection, so every
//! extractor degrades to placeholders instead of failing the pipeline.

pub mod csv;
pub mod dashboard;
pub mod html;
pub mod scrape;

pub use csv::{csv_escape, ensure_summary_csv, SummaryRow, CSV_HEADERS};
pub use dashboard::{render_dashboard, write_dashboard};
pub use html::{escape_html, render_run_report, write_run_report};
pub use scrape::{parse_status_file, ReportScraper, RunLogInfo, StrategySection};
