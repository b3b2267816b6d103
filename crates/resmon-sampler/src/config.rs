//! Sampler configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// UI automation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiBackend {
    /// Windows UI Automation
    Uia,
    /// Scripted in-memory Task Manager
    Mock,
}

/// Sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// UI backend to drive
    pub backend: UiBackend,

    /// Identifiers of the Task Manager elements that are read or clicked
    pub elements: ElementIds,

    /// Timing for ticks and UI settling
    pub timing: TimingConfig,

    /// Name of the text log inside the log folder
    pub log_file_name: String,

    /// Name of the persisted before-stats record inside the log folder
    pub before_stats_file_name: String,

    /// Write an `.xlsx` workbook at the end of each run
    pub export_workbook: bool,
}

/// Element identifiers inside the Task Manager window.
///
/// These depend on the Windows build and locale, so they are configuration
/// rather than constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub executable: String,
    pub window_title: String,
    pub cpu_automation_id: String,
    pub memory_automation_id: String,
    pub npu_button_text: String,
    pub performance_tab_title: String,
    pub more_details_title: String,
}

/// Timing configuration, all values in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Sampling interval
    pub interval_ms: u64,

    /// How long to wait for an existing window when attaching
    pub connect_timeout_ms: u64,

    /// Pause after launching the executable
    pub launch_settle_ms: u64,

    /// Pause after window and tab changes
    pub ui_settle_ms: u64,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            executable: "taskmgr.exe".to_string(),
            window_title: "Task Manager".to_string(),
            cpu_automation_id: "sidebar_cpu_util".to_string(),
            memory_automation_id: "sidebar_mem_util".to_string(),
            npu_button_text: "NPU".to_string(),
            performance_tab_title: "Performance".to_string(),
            more_details_title: "More details".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            connect_timeout_ms: 2000,
            launch_settle_ms: 3000,
            ui_settle_ms: 1000,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(UiBackend::Uia)
    }
}

impl MonitorConfig {
    /// Create a new configuration for the given backend
    pub fn new(backend: UiBackend) -> Self {
        Self {
            backend,
            elements: ElementIds::default(),
            timing: TimingConfig::default(),
            log_file_name: "resource_utilization.txt".to_string(),
            before_stats_file_name: "before_stats.json".to_string(),
            export_workbook: true,
        }
    }

    /// Set the sampling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.timing.interval_ms = interval.as_millis() as u64;
        self
    }

    /// Enable or disable the workbook export
    pub fn with_workbook_export(mut self, enabled: bool) -> Self {
        self.export_workbook = enabled;
        self
    }

    /// Skip every UI settle pause (tests and dry runs)
    pub fn without_settle_delays(mut self) -> Self {
        self.timing.connect_timeout_ms = 0;
        self.timing.launch_settle_ms = 0;
        self.timing.ui_settle_ms = 0;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.timing.interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.timing.connect_timeout_ms)
    }

    pub fn launch_settle(&self) -> Duration {
        Duration::from_millis(self.timing.launch_settle_ms)
    }

    pub fn ui_settle(&self) -> Duration {
        Duration::from_millis(self.timing.ui_settle_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timing.interval_ms == 0 {
            return Err("Sampling interval must be greater than zero".to_string());
        }

        if self.log_file_name.trim().is_empty() {
            return Err("Log file name cannot be empty".to_string());
        }

        if self.before_stats_file_name.trim().is_empty() {
            return Err("Before-stats file name cannot be empty".to_string());
        }

        if self.log_file_name == self.before_stats_file_name {
            return Err("Log file and before-stats file must differ".to_string());
        }

        let ids = [
            ("executable", &self.elements.executable),
            ("window_title", &self.elements.window_title),
            ("cpu_automation_id", &self.elements.cpu_automation_id),
            ("memory_automation_id", &self.elements.memory_automation_id),
            ("npu_button_text", &self.elements.npu_button_text),
            (
                "performance_tab_title",
                &self.elements.performance_tab_title,
            ),
            ("more_details_title", &self.elements.more_details_title),
        ];
        for (name, value) in ids {
            if value.trim().is_empty() {
                return Err(format!("Element identifier '{}' cannot be empty", name));
            }
        }

        Ok(())
    }
}

impl fmt::Display for UiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiBackend::Uia => write!(f, "uia"),
            UiBackend::Mock => write!(f, "mock"),
        }
    }
}

impl FromStr for UiBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uia" | "uiautomation" => Ok(UiBackend::Uia),
            "mock" => Ok(UiBackend::Mock),
            _ => Err(format!("Unknown UI backend: {}", s)),
        }
    }
}
