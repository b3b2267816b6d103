//! Summary statistics over a series of readings

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker written wherever a statistic has no data behind it
pub const NOT_AVAILABLE: &str = "N/A";

/// A single statistic: a number, or the "N/A" sentinel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StatValue {
    Value(f64),
    #[default]
    NotAvailable,
}

impl StatValue {
    pub fn is_available(&self) -> bool {
        matches!(self, StatValue::Value(_))
    }

    /// Render with a unit suffix; the sentinel never carries one
    pub fn with_unit(&self, unit: &str) -> String {
        match self {
            StatValue::Value(v) => format!("{}{}", v, unit),
            StatValue::NotAvailable => NOT_AVAILABLE.to_string(),
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Value(v) => write!(f, "{}", v),
            StatValue::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl From<Option<f64>> for StatValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(StatValue::NotAvailable, StatValue::Value)
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StatValue::Value(v) => serializer.serialize_f64(*v),
            StatValue::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for StatValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(StatValue::Value(v)),
            Repr::Text(s) if s == NOT_AVAILABLE => Ok(StatValue::NotAvailable),
            Repr::Text(s) => Err(de::Error::custom(format!(
                "expected a number or \"{}\", got \"{}\"",
                NOT_AVAILABLE, s
            ))),
        }
    }
}

/// Median, average and peak of one metric
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SummaryStats {
    pub median: StatValue,
    pub average: StatValue,
    pub peak: StatValue,
}

/// Per-statistic change between two runs (after minus before)
pub type StatsDelta = SummaryStats;

impl SummaryStats {
    /// All three statistics set to the sentinel
    pub fn not_available() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.median.is_available() || self.average.is_available() || self.peak.is_available()
    }

    /// `(name, value)` pairs in report order
    pub fn entries(&self) -> [(&'static str, StatValue); 3] {
        [
            ("Median", self.median),
            ("Average", self.average),
            ("Peak", self.peak),
        ]
    }

    /// `Median: 20%, Average: 20%, Peak: 30%`
    pub fn render(&self, unit: &str) -> String {
        self.entries()
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value.with_unit(unit)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Median, average (two decimals) and peak of `values`.
///
/// An empty slice is not an error: every statistic is the sentinel.
pub fn summarize(values: &[f64]) -> SummaryStats {
    if values.is_empty() {
        return SummaryStats::not_available();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let average = sorted.iter().sum::<f64>() / sorted.len() as f64;
    let peak = sorted[sorted.len() - 1];

    SummaryStats {
        median: StatValue::Value(median),
        average: StatValue::Value(round2(average)),
        peak: StatValue::Value(peak),
    }
}

fn diff_value(before: StatValue, after: StatValue) -> StatValue {
    match (before, after) {
        (StatValue::Value(b), StatValue::Value(a)) => StatValue::Value(round2(a - b)),
        _ => StatValue::NotAvailable,
    }
}

/// `after - before` per statistic, rounded to two decimals; the sentinel
/// wherever either side has no value.
pub fn diff(before: &SummaryStats, after: &SummaryStats) -> StatsDelta {
    SummaryStats {
        median: diff_value(before.median, after.median),
        average: diff_value(before.average, after.average),
        peak: diff_value(before.peak, after.peak),
    }
}
