//! Configuration management for resmon CLI

use anyhow::{anyhow, Context, Result};
use resmon_sampler::{ElementIds, MonitorConfig, TimingConfig, UiBackend};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// UI backend (uia, mock)
    pub backend: UiBackend,

    /// Sampling interval in milliseconds
    pub interval_ms: u64,

    /// Duration used when none is given on the command line
    pub default_duration_secs: u64,

    /// Scenario label used when none is given on the command line
    pub default_scenario: String,

    /// Text log name inside the log folder
    pub log_file_name: String,

    /// Before-stats record name inside the log folder
    pub before_stats_file_name: String,

    /// Write an `.xlsx` workbook at the end of each run
    pub export_workbook: bool,

    /// Task Manager element identifiers
    pub elements: ElementIds,

    /// How long to look for a running Task Manager, in milliseconds
    pub connect_timeout_ms: u64,

    /// Pause after launching Task Manager, in milliseconds
    pub launch_settle_ms: u64,

    /// Pause after window and tab changes, in milliseconds
    pub ui_settle_ms: u64,

    /// Configuration source path
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        let monitor = MonitorConfig::default();
        Self {
            backend: default_backend(),
            interval_ms: monitor.timing.interval_ms,
            default_duration_secs: 10,
            default_scenario: "default".to_string(),
            log_file_name: monitor.log_file_name,
            before_stats_file_name: monitor.before_stats_file_name,
            export_workbook: monitor.export_workbook,
            elements: monitor.elements,
            connect_timeout_ms: monitor.timing.connect_timeout_ms,
            launch_settle_ms: monitor.timing.launch_settle_ms,
            ui_settle_ms: monitor.timing.ui_settle_ms,
            source: None,
        }
    }
}

// Only Windows builds with UI Automation can drive the real Task Manager.
fn default_backend() -> UiBackend {
    if cfg!(all(windows, feature = "uia")) {
        UiBackend::Uia
    } else {
        UiBackend::Mock
    }
}

impl CliConfig {
    /// Load configuration from file or create default
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let mut config = Self::default();
            config.source = Some(config_path);
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        };

        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("resmon").join("config.yaml"))
    }

    /// Get the configuration source path
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Validate values the sampler configuration does not cover
    pub fn validate(&self) -> Result<()> {
        if self.default_duration_secs == 0 {
            return Err(anyhow!("default_duration_secs must be greater than zero"));
        }
        if self.default_scenario.trim().is_empty() {
            return Err(anyhow!("default_scenario cannot be empty"));
        }
        self.monitor_config().validate().map_err(|e| anyhow!(e))
    }

    /// Sampler configuration described by this file
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            backend: self.backend,
            elements: self.elements.clone(),
            timing: TimingConfig {
                interval_ms: self.interval_ms,
                connect_timeout_ms: self.connect_timeout_ms,
                launch_settle_ms: self.launch_settle_ms,
                ui_settle_ms: self.ui_settle_ms,
            },
            log_file_name: self.log_file_name.clone(),
            before_stats_file_name: self.before_stats_file_name.clone(),
            export_workbook: self.export_workbook,
        }
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, backend: Option<UiBackend>, interval_ms: Option<u64>) {
        if let Some(backend) = backend {
            self.backend = backend;
        }
        if let Some(interval_ms) = interval_ms {
            self.interval_ms = interval_ms;
        }
    }
}
