//! # resmon-sampler
//!
//! Resource utilization sampling through the Windows Task Manager UI.
//!
//! This crate provides:
//! - A `UiSurface` collaborator abstracting the accessibility API
//! - Per-tick sampling of CPU, memory and NPU gauges
//! - A fixed-cadence sampling loop that owns its `Series`
//! - Median / average / peak statistics and before/after deltas
//! - Text log, before-stats record and workbook output
//!
//! ## Supported Backends
//!
//! - **UIA**: Windows UI Automation (Windows only, `uia` feature)
//! - **Mock**: scripted in-memory Task Manager for tests and dry runs
//!
//! ## Example
//!
//! ```rust,no_run
//! use resmon_sampler::{create_surface, MonitorConfig, Phase, RunRequest, TaskManagerSession, UiBackend};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::new(UiBackend::Mock);
//!     let surface = create_surface(&config)?;
//!     let mut session = TaskManagerSession::new(surface, config);
//!
//!     session.start_task_manager()?;
//!     session.switch_to_performance_tab()?;
//!
//!     let request = RunRequest::new("results", "smoke", 10).with_phase(Phase::Before);
//!     let report = session.log_utilization(&request)?;
//!     println!("Collected {} samples", report.series.len());
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub mod clock;
pub mod config;
pub mod export;
pub mod parse;
pub mod record;
pub mod report;
pub mod sample;
pub mod sampler;
pub mod session;
pub mod stats;
pub mod surface;

#[cfg(all(windows, feature = "uia"))]
pub mod uia;

// Mock implementation for testing and dry runs
#[cfg(any(feature = "mock", test))]
pub mod mock;

pub use clock::{Clock, SystemClock};
pub use config::{ElementIds, MonitorConfig, TimingConfig, UiBackend};
pub use record::RunRecord;
pub use sample::{Metric, Sample, Series};
pub use sampler::{ResourceSampler, Run};
pub use session::{Phase, RunReport, RunRequest, TaskManagerSession};
pub use stats::{diff, summarize, StatValue, StatsDelta, SummaryStats};
pub use surface::{
    create_surface, AppTarget, ControlKind, ElementHandle, LaunchOutcome, Locator, UiSurface,
    WindowAction,
};

/// Result type for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur while driving the UI surface or writing results
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("UI backend not supported: {0}")]
    UnsupportedBackend(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to launch application: {0}")]
    LaunchFailed(String),

    #[error("Window not found: {0}")]
    WindowNotFound(String),

    #[error("UI element not found: {0}")]
    ElementNotFound(String),

    #[error("UI automation error: {0}")]
    Automation(String),

    #[error("Not attached to an application window")]
    NotAttached,

    #[error("Invalid before-stats record {path}: {reason}")]
    InvalidRecord { path: String, reason: String },

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    /// Whether the process should stop instead of degrading the current sample
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MonitorError::UnsupportedBackend(_)
                | MonitorError::Configuration(_)
                | MonitorError::LaunchFailed(_)
                | MonitorError::WindowNotFound(_)
                | MonitorError::NotAttached
        )
    }

    /// Whether the error came from the automation layer rather than local I/O
    pub fn is_surface_issue(&self) -> bool {
        matches!(
            self,
            MonitorError::WindowNotFound(_)
                | MonitorError::ElementNotFound(_)
                | MonitorError::Automation(_)
                | MonitorError::NotAttached
        )
    }
}
