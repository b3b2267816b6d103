//! Output formatting for resmon CLI

use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use resmon_sampler::report::{change_lines, statistics_lines, CHANGE_HEADER};
use resmon_sampler::{Metric, Phase, RunReport, StatValue, StatsDelta};
use serde::Serialize;
use std::path::PathBuf;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Compact text format
    Text,
}

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format as a table row
    fn table_headers() -> Vec<String>;
    fn table_row(&self) -> Vec<String>;
}

/// Statistics of one metric, with the change against the before run if any
#[derive(Debug, Clone, Serialize)]
pub struct MetricRow {
    pub metric: Metric,
    #[serde(skip)]
    pub unit: &'static str,
    pub median: StatValue,
    pub average: StatValue,
    pub peak: StatValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<StatsDelta>,
}

impl MetricRow {
    pub fn rows(report: &RunReport) -> Vec<MetricRow> {
        Metric::ALL
            .iter()
            .map(|metric| {
                let stats = report.stats_for(*metric);
                MetricRow {
                    metric: *metric,
                    unit: metric.unit(),
                    median: stats.median,
                    average: stats.average,
                    peak: stats.peak,
                    change: report.delta_for(*metric),
                }
            })
            .collect()
    }
}

impl Formattable for MetricRow {
    fn table_headers() -> Vec<String> {
        [
            "Metric",
            "Median",
            "Average",
            "Peak",
            "Change (Median / Average / Peak)",
        ]
        .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn table_row(&self) -> Vec<String> {
        let change = match &self.change {
            Some(delta) => delta
                .entries()
                .iter()
                .map(|(_, v)| v.with_unit(self.unit))
                .collect::<Vec<_>>()
                .join(" / "),
            None => "-".to_string(),
        };
        vec![
            self.metric.label().to_string(),
            self.median.with_unit(self.unit),
            self.average.with_unit(self.unit),
            self.peak.with_unit(self.unit),
            change,
        ]
    }
}

/// Structured view of a finished run
#[derive(Debug, Serialize)]
pub struct ReportView {
    pub phase: Phase,
    pub scenario: String,
    pub samples: usize,
    pub metrics: Vec<MetricRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workbook_path: Option<PathBuf>,
}

impl From<&RunReport> for ReportView {
    fn from(report: &RunReport) -> Self {
        Self {
            phase: report.phase,
            scenario: report.scenario.clone(),
            samples: report.series.len(),
            metrics: MetricRow::rows(report),
            log_path: report.log_path.clone(),
            record_path: report.record_path.clone(),
            workbook_path: report.workbook_path.clone(),
        }
    }
}

/// Output formatter
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the statistics of a finished run
    pub fn print_report(&self, report: &RunReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&ReportView::from(report))?;
                println!("{}", json);
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(&ReportView::from(report))?;
                println!("{}", yaml);
            }
            OutputFormat::Table => {
                println!(
                    "{} {} ({} samples)",
                    report.phase.title().bold(),
                    report.scenario.cyan(),
                    report.series.len()
                );
                self.print_table(&MetricRow::rows(report));
            }
            OutputFormat::Text => {
                println!("--- Resource Utilization Stats ---");
                for line in statistics_lines(report) {
                    println!("{}", line);
                }
                let changes = change_lines(report);
                if !changes.is_empty() {
                    println!("{}", CHANGE_HEADER);
                    for line in changes {
                        println!("{}", line);
                    }
                }
            }
        }
        Ok(())
    }

    /// Print items as a table
    fn print_table<T>(&self, items: &[T])
    where
        T: Formattable,
    {
        if items.is_empty() {
            return;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let header_cells: Vec<Cell> = T::table_headers()
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan))
            .collect();
        table.set_header(header_cells);

        for item in items {
            table.add_row(item.table_row());
        }

        println!("{}", table);
    }

    /// Print a success message
    pub fn print_success(&self, message: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let result = serde_json::json!({
                    "status": "success",
                    "message": message
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            OutputFormat::Yaml => {
                println!("status: success");
                println!("message: {}", message);
            }
            OutputFormat::Table | OutputFormat::Text => {
                println!("{} {}", "✓".green().bold(), message.green());
            }
        }
        Ok(())
    }

    /// Print a warning message
    pub fn print_warning(&self, message: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json | OutputFormat::Yaml => {
                // Structured output stays parseable; the warning goes to the log
                tracing::warn!("{}", message);
            }
            OutputFormat::Table | OutputFormat::Text => {
                eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
            }
        }
        Ok(())
    }

    /// Print a progress message (only for interactive formats)
    pub fn print_progress(&self, message: &str) {
        if matches!(self.format, OutputFormat::Table | OutputFormat::Text) {
            eprint!("{} {}...\r", "⏳".yellow(), message);
        }
    }

    /// Clear progress message (only for interactive formats)
    pub fn clear_progress(&self) {
        if matches!(self.format, OutputFormat::Table | OutputFormat::Text) {
            eprint!("\r{}\r", " ".repeat(80));
        }
    }
}

/// Helper function to format duration
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        format!("{}h {}m", hours, minutes)
    }
}
