//! Spreadsheet export of a finished run

use crate::sample::{Metric, TIMESTAMP_FORMAT};
use crate::session::{Phase, RunReport};
use crate::stats::{StatValue, NOT_AVAILABLE};
use crate::{MonitorError, Result};

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::info;

pub const SAMPLES_SHEET: &str = "Samples";
pub const SUMMARY_SHEET: &str = "Summary";

/// Samples that fit on one sheet below the header row
pub const MAX_SAMPLE_ROWS: u64 = 1_048_575;

impl From<XlsxError> for MonitorError {
    fn from(e: XlsxError) -> Self {
        MonitorError::Workbook(e.to_string())
    }
}

/// `resource_utilization_<scenario>_<phase>.xlsx`, with the scenario reduced
/// to characters that are safe in a file name
pub fn workbook_file_name(scenario: &str, phase: Phase) -> String {
    let scenario: String = scenario
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("resource_utilization_{}_{}.xlsx", scenario, phase)
}

/// Write the `Samples` and `Summary` sheets for `report`
pub fn write_workbook(path: &Path, report: &RunReport) -> Result<()> {
    let header = Format::new().set_bold();
    let mut workbook = Workbook::new();

    write_samples(workbook.add_worksheet(), report, &header)?;
    write_summary(workbook.add_worksheet(), report, &header)?;

    workbook.save(path)?;
    info!("Exported workbook to {}", path.display());
    Ok(())
}

fn write_samples(sheet: &mut Worksheet, report: &RunReport, header: &Format) -> Result<()> {
    sheet.set_name(SAMPLES_SHEET)?;

    let mut columns = vec!["Timestamp"];
    columns.extend(Metric::ALL.iter().map(|m| m.column_header()));
    columns.push("Memory Total (GB)");
    for (col, title) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, header)?;
    }
    sheet.set_column_width(0, 20)?;

    for (i, sample) in report.series.iter().enumerate() {
        let row = i as u32 + 1;
        let timestamp = sample.timestamp.format(TIMESTAMP_FORMAT).to_string();
        sheet.write_string(row, 0, timestamp)?;

        let values = Metric::ALL
            .iter()
            .map(|m| sample.value(*m))
            .chain(std::iter::once(sample.memory_total_gb));
        for (offset, value) in values.enumerate() {
            let col = offset as u16 + 1;
            match value {
                Some(v) => sheet.write_number(row, col, v)?,
                None => sheet.write_string(row, col, NOT_AVAILABLE)?,
            };
        }
    }
    Ok(())
}

fn write_summary(sheet: &mut Worksheet, report: &RunReport, header: &Format) -> Result<()> {
    sheet.set_name(SUMMARY_SHEET)?;

    let mut columns = vec!["Metric", "Median", "Average", "Peak"];
    if report.deltas.is_some() {
        columns.extend(["Median Change", "Average Change", "Peak Change"]);
    }
    for (col, title) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, header)?;
    }
    sheet.set_column_width(0, 14)?;

    for (i, metric) in Metric::ALL.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, metric.label())?;

        let mut values: Vec<StatValue> = report
            .stats_for(*metric)
            .entries()
            .iter()
            .map(|(_, v)| *v)
            .collect();
        if let Some(delta) = report.delta_for(*metric) {
            values.extend(delta.entries().iter().map(|(_, v)| *v));
        }

        for (offset, value) in values.iter().enumerate() {
            write_stat(sheet, row, offset as u16 + 1, *value)?;
        }
    }
    Ok(())
}

fn write_stat(sheet: &mut Worksheet, row: u32, col: u16, value: StatValue) -> Result<()> {
    match value {
        StatValue::Value(v) => sheet.write_number(row, col, v)?,
        StatValue::NotAvailable => sheet.write_string(row, col, NOT_AVAILABLE)?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RunRecord;
    use crate::sample::{Sample, Series};
    use chrono::Local;
    use tempfile::TempDir;

    fn series() -> Series {
        let mut series = Series::new();
        series.push(Sample {
            timestamp: Local::now(),
            cpu_percent: Some(12),
            memory_percent: Some(48),
            npu_percent: None,
            memory_used_gb: Some(7.6),
            memory_total_gb: Some(15.7),
        });
        series.push(Sample::absent(Local::now()));
        series
    }

    #[test]
    fn test_workbook_file_name() {
        assert_eq!(
            workbook_file_name("boot", Phase::Before),
            "resource_utilization_boot_before.xlsx"
        );
        assert_eq!(
            workbook_file_name(" video call/4k ", Phase::After),
            "resource_utilization_video_call_4k_after.xlsx"
        );
    }

    #[test]
    fn test_write_before_workbook() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir
            .path()
            .join(workbook_file_name("boot", Phase::Before));

        let report = RunReport::build(Phase::Before, "boot", series(), None);
        write_workbook(&path, &report).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_write_after_workbook_with_deltas() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(workbook_file_name("boot", Phase::After));

        let baseline = RunRecord::from_series("boot", Local::now(), &series());
        let report = RunReport::build(Phase::After, "boot", series(), Some(baseline));
        write_workbook(&path, &report).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_path_is_workbook_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("out.xlsx");

        let report = RunReport::build(Phase::Before, "boot", series(), None);
        let err = write_workbook(&path, &report).unwrap_err();
        assert!(matches!(err, MonitorError::Workbook(_)));
    }
}
