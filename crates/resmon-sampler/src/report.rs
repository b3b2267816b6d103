//! Human-readable text log

use crate::sample::Metric;
use crate::session::{Phase, RunReport};
use crate::stats::SummaryStats;
use crate::Result;

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

pub const STATISTICS_HEADER: &str = "--- Utilization Statistics ---";
pub const CHANGE_HEADER: &str = "--- Change vs Before Test Execution ---";

/// Section title, e.g. `Before Test Execution - Scenario: boot`
pub fn section_title(phase: Phase, scenario: &str) -> String {
    format!("{} - Scenario: {}", phase.title(), scenario)
}

/// `CSV`-style header line for raw samples
pub fn sample_header() -> String {
    let columns: Vec<&str> = Metric::ALL.iter().map(|m| m.column_header()).collect();
    format!("Timestamp, {}", columns.join(", "))
}

/// `CPU - Median: 20%, Average: 20%, Peak: 30%`
pub fn metric_line(metric: Metric, stats: &SummaryStats) -> String {
    format!("{} - {}", metric.label(), stats.render(metric.unit()))
}

/// Statistics lines for every metric, in report order
pub fn statistics_lines(report: &RunReport) -> Vec<String> {
    Metric::ALL
        .iter()
        .map(|metric| metric_line(*metric, &report.stats_for(*metric)))
        .collect()
}

/// Delta lines for every metric; empty for a "Before" run
pub fn change_lines(report: &RunReport) -> Vec<String> {
    match &report.deltas {
        Some(deltas) => Metric::ALL
            .iter()
            .map(|metric| metric_line(*metric, &deltas.get(metric).copied().unwrap_or_default()))
            .collect(),
        None => Vec::new(),
    }
}

/// Render one complete section of the log
pub fn render_section(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", section_title(report.phase, &report.scenario));
    let _ = writeln!(out, "{}", sample_header());
    for sample in report.series.iter() {
        let _ = writeln!(out, "{}", sample.log_line());
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", STATISTICS_HEADER);
    for line in statistics_lines(report) {
        let _ = writeln!(out, "{}", line);
    }

    if report.phase == Phase::After {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", CHANGE_HEADER);
        if report.baseline.is_none() {
            let _ = writeln!(out, "No before-stats record found; deltas are N/A");
        }
        for line in change_lines(report) {
            let _ = writeln!(out, "{}", line);
        }
    }

    out
}

/// Append a section to the log, creating the file when needed
pub fn append_section(path: &Path, report: &RunReport) -> Result<()> {
    let has_content = std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if has_content {
        writeln!(file)?;
    }
    file.write_all(render_section(report).as_bytes())?;
    debug!("Appended {} section to {}", report.phase.title(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RunRecord;
    use crate::sample::{Sample, Series};
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn series(cpu: &[u32]) -> Series {
        cpu.iter()
            .enumerate()
            .map(|(i, c)| Sample {
                timestamp: Local.with_ymd_and_hms(2024, 5, 1, 10, 0, i as u32).unwrap(),
                cpu_percent: Some(*c),
                memory_percent: Some(40),
                npu_percent: None,
                memory_used_gb: Some(6.5),
                memory_total_gb: Some(16.0),
            })
            .collect()
    }

    #[test]
    fn test_render_before_section() {
        let report = RunReport::build(Phase::Before, "boot", series(&[10, 20, 30]), None);
        let text = render_section(&report);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Before Test Execution - Scenario: boot");
        assert_eq!(
            lines[1],
            "Timestamp, CPU Utilization (%), Memory Utilization (%), NPU Utilization (%), Memory Used (GB)"
        );
        assert_eq!(lines[2], "2024-05-01 10:00:00, 10, 40, N/A, 6.5");
        assert!(text.contains("CPU - Median: 20%, Average: 20%, Peak: 30%"));
        assert!(text.contains("NPU - Median: N/A, Average: N/A, Peak: N/A"));
        assert!(text.contains("Memory Used - Median: 6.5 GB"));
        assert!(!text.contains(CHANGE_HEADER));
    }

    #[test]
    fn test_render_after_section_with_baseline() {
        let baseline = RunRecord::from_series("boot", Local::now(), &series(&[10, 10, 10]));
        let report = RunReport::build(Phase::After, "boot", series(&[15, 15, 15]), Some(baseline));
        let text = render_section(&report);

        assert!(text.starts_with("After Test Execution - Scenario: boot"));
        assert!(text.contains(CHANGE_HEADER));
        assert!(text.contains("CPU - Median: 5%, Average: 5%, Peak: 5%"));
        assert!(text.contains("NPU - Median: N/A"));
        assert!(!text.contains("No before-stats record found"));
    }

    #[test]
    fn test_render_after_section_without_baseline() {
        let report = RunReport::build(Phase::After, "boot", series(&[15]), None);
        let text = render_section(&report);
        assert!(text.contains("No before-stats record found"));
        assert!(text.contains("CPU - Median: N/A, Average: N/A, Peak: N/A"));
    }

    #[test]
    fn test_append_keeps_sections_separated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resource_utilization.txt");

        let before = RunReport::build(Phase::Before, "boot", series(&[10]), None);
        append_section(&path, &before).unwrap();
        let after = RunReport::build(Phase::After, "boot", series(&[20]), None);
        append_section(&path, &after).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Before Test Execution"));
        assert!(content.contains("\n\nAfter Test Execution - Scenario: boot\n"));
        assert_eq!(content.matches(STATISTICS_HEADER).count(), 2);
    }
}
