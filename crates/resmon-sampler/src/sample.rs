//! Samples and series collected during a run

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats::{summarize, SummaryStats};

/// Timestamp format used in the text log and the workbook
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Metrics tracked for every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Cpu,
    Memory,
    Npu,
    MemoryUsedGb,
}

impl Metric {
    /// Every metric, in report order
    pub const ALL: [Metric; 4] = [Metric::Cpu, Metric::Memory, Metric::Npu, Metric::MemoryUsedGb];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Cpu => "CPU",
            Metric::Memory => "Memory",
            Metric::Npu => "NPU",
            Metric::MemoryUsedGb => "Memory Used",
        }
    }

    /// Suffix appended to rendered values
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::MemoryUsedGb => " GB",
            _ => "%",
        }
    }

    /// Column header for raw sample tables
    pub fn column_header(&self) -> &'static str {
        match self {
            Metric::Cpu => "CPU Utilization (%)",
            Metric::Memory => "Memory Utilization (%)",
            Metric::Npu => "NPU Utilization (%)",
            Metric::MemoryUsedGb => "Memory Used (GB)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One tick's readings. Any gauge that could not be read is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub cpu_percent: Option<u32>,
    pub memory_percent: Option<u32>,
    pub npu_percent: Option<u32>,
    pub memory_used_gb: Option<f64>,
    pub memory_total_gb: Option<f64>,
}

impl Sample {
    /// A sample with every gauge absent
    pub fn absent(timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            cpu_percent: None,
            memory_percent: None,
            npu_percent: None,
            memory_used_gb: None,
            memory_total_gb: None,
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Cpu => self.cpu_percent.map(f64::from),
            Metric::Memory => self.memory_percent.map(f64::from),
            Metric::Npu => self.npu_percent.map(f64::from),
            Metric::MemoryUsedGb => self.memory_used_gb,
        }
    }

    pub fn is_absent(&self) -> bool {
        Metric::ALL.iter().all(|m| self.value(*m).is_none()) && self.memory_total_gb.is_none()
    }

    /// One log line: `timestamp, cpu%, mem%, npu%, mem_used_gb`
    pub fn log_line(&self) -> String {
        let fields: Vec<String> = Metric::ALL
            .iter()
            .map(|m| match self.value(*m) {
                Some(v) => format!("{}", v),
                None => "N/A".to_string(),
            })
            .collect();
        format!("{}, {}", self.timestamp.format(TIMESTAMP_FORMAT), fields.join(", "))
    }
}

/// Ordered samples owned by a single run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Present values of one metric, absent readings skipped
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.samples.iter().filter_map(|s| s.value(metric)).collect()
    }

    pub fn summarize(&self, metric: Metric) -> SummaryStats {
        summarize(&self.values(metric))
    }
}

impl FromIterator<Sample> for Series {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
