//! Persisted statistics of a "Before" run

use crate::sample::{Metric, Series};
use crate::stats::SummaryStats;
use crate::{MonitorError, Result};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Statistics of a "Before" run, kept so the matching "After" run can diff
/// against them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Scenario label of the run that produced the record
    pub scenario: String,

    /// When the run finished
    pub captured_at: DateTime<Local>,

    /// Number of ticks in the run
    pub sample_count: usize,

    /// Metric -> {Median, Average, Peak}
    pub stats: BTreeMap<Metric, SummaryStats>,
}

impl RunRecord {
    pub fn new(scenario: impl Into<String>, captured_at: DateTime<Local>) -> Self {
        Self {
            scenario: scenario.into(),
            captured_at,
            sample_count: 0,
            stats: BTreeMap::new(),
        }
    }

    /// Summarize every metric of `series`
    pub fn from_series(
        scenario: impl Into<String>,
        captured_at: DateTime<Local>,
        series: &Series,
    ) -> Self {
        let stats = Metric::ALL
            .iter()
            .map(|metric| (*metric, series.summarize(*metric)))
            .collect();
        Self {
            scenario: scenario.into(),
            captured_at,
            sample_count: series.len(),
            stats,
        }
    }

    /// Stats for `metric`; the sentinel when the record has none
    pub fn get(&self, metric: Metric) -> SummaryStats {
        self.stats.get(&metric).copied().unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved before-stats record to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let record: Self =
            serde_json::from_str(&content).map_err(|e| MonitorError::InvalidRecord {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        debug!(
            "Loaded before-stats record for '{}' ({} samples)",
            record.scenario, record.sample_count
        );
        Ok(record)
    }

    /// Like `load`, but `Ok(None)` when the file does not exist
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use crate::stats::StatValue;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn series() -> Series {
        [10, 20, 30]
            .iter()
            .enumerate()
            .map(|(i, cpu)| Sample {
                timestamp: Local.with_ymd_and_hms(2024, 5, 1, 10, 0, i as u32).unwrap(),
                cpu_percent: Some(*cpu),
                memory_percent: Some(50),
                npu_percent: None,
                memory_used_gb: Some(8.0),
                memory_total_gb: Some(16.0),
            })
            .collect()
    }

    #[test]
    fn test_from_series() {
        let record = RunRecord::from_series("boot", Local::now(), &series());
        assert_eq!(record.sample_count, 3);
        assert_eq!(record.stats.len(), Metric::ALL.len());
        assert_eq!(record.get(Metric::Cpu).median, StatValue::Value(20.0));
        assert_eq!(record.get(Metric::Npu), SummaryStats::not_available());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("before_stats.json");

        let record = RunRecord::from_series("boot", Local::now(), &series());
        record.save(&path).unwrap();
        assert!(path.exists());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"cpu\""));
        assert!(raw.contains("\"Median\": 20.0"));
        assert!(raw.contains("\"N/A\""));

        let loaded = RunRecord::load(&path).unwrap();
        assert_eq!(loaded.scenario, "boot");
        assert_eq!(loaded.get(Metric::Cpu), record.get(Metric::Cpu));
        assert_eq!(loaded.get(Metric::Npu), SummaryStats::not_available());
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("before_stats.json");
        assert!(RunRecord::load_if_exists(&path).unwrap().is_none());

        std::fs::write(&path, "{ not json").unwrap();
        let err = RunRecord::load(&path).unwrap_err();
        assert!(matches!(err, MonitorError::InvalidRecord { .. }));
    }

    #[test]
    fn test_missing_metric_defaults_to_sentinel() {
        let record = RunRecord::new("empty", Local::now());
        assert_eq!(record.get(Metric::MemoryUsedGb), SummaryStats::not_available());
    }
}
