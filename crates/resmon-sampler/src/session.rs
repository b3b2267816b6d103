//! Task Manager session: window operations and before/after runs

use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::export;
use crate::record::RunRecord;
use crate::report::append_section;
use crate::sample::{Metric, Series};
use crate::sampler::ResourceSampler;
use crate::stats::{diff, StatsDelta, SummaryStats};
use crate::surface::{AppTarget, ControlKind, LaunchOutcome, Locator, UiSurface, WindowAction};
use crate::{MonitorError, Result};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Which side of the tested operation a run measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Before,
    After,
}

impl Phase {
    /// Section title used in the text log
    pub fn title(&self) -> &'static str {
        match self {
            Phase::Before => "Before Test Execution",
            Phase::After => "After Test Execution",
        }
    }

    /// Phase to use for a run writing to `log_path`.
    ///
    /// An explicit phase wins. Otherwise the first run against a log folder is
    /// a "Before" run and every later one is an "After" run.
    pub fn resolve(requested: Option<Phase>, log_path: &Path) -> Phase {
        match requested {
            Some(phase) => phase,
            None if log_path.exists() => Phase::After,
            None => Phase::Before,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Before => write!(f, "before"),
            Phase::After => write!(f, "after"),
        }
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before" => Ok(Phase::Before),
            "after" => Ok(Phase::After),
            _ => Err(format!("Unknown phase: {}", s)),
        }
    }
}

/// Parameters of one `log_utilization` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub log_folder: PathBuf,
    pub scenario: String,
    pub duration_secs: u64,
    /// `None` resolves through `Phase::resolve`
    pub phase: Option<Phase>,
}

impl RunRequest {
    pub fn new(
        log_folder: impl Into<PathBuf>,
        scenario: impl Into<String>,
        duration_secs: u64,
    ) -> Self {
        Self {
            log_folder: log_folder.into(),
            scenario: scenario.into(),
            duration_secs,
            phase: None,
        }
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn validate(&self, config: &MonitorConfig) -> Result<()> {
        if self.duration_secs == 0 {
            return Err(MonitorError::Configuration(
                "Duration must be at least one second".to_string(),
            ));
        }
        if config.export_workbook && self.duration_secs > export::MAX_SAMPLE_ROWS {
            return Err(MonitorError::Configuration(format!(
                "Duration of {}s exceeds the {} rows a workbook sheet can hold",
                self.duration_secs,
                export::MAX_SAMPLE_ROWS
            )));
        }
        if self.scenario.trim().is_empty() {
            return Err(MonitorError::Configuration(
                "Scenario label cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub phase: Phase,
    pub scenario: String,
    pub series: Series,
    pub stats: BTreeMap<Metric, SummaryStats>,
    /// After minus before, per metric; `None` for a "Before" run
    pub deltas: Option<BTreeMap<Metric, StatsDelta>>,
    /// Record the deltas were computed against
    pub baseline: Option<RunRecord>,
    pub log_path: Option<PathBuf>,
    pub record_path: Option<PathBuf>,
    pub workbook_path: Option<PathBuf>,
}

impl RunReport {
    /// Summarize `series` and, for an "After" run, diff against `baseline`
    pub fn build(
        phase: Phase,
        scenario: impl Into<String>,
        series: Series,
        baseline: Option<RunRecord>,
    ) -> Self {
        let stats: BTreeMap<Metric, SummaryStats> = Metric::ALL
            .iter()
            .map(|metric| (*metric, series.summarize(*metric)))
            .collect();

        let deltas = match phase {
            Phase::Before => None,
            Phase::After => Some(
                Metric::ALL
                    .iter()
                    .map(|metric| {
                        let before = baseline
                            .as_ref()
                            .map(|record| record.get(*metric))
                            .unwrap_or_default();
                        let after = stats.get(metric).copied().unwrap_or_default();
                        (*metric, diff(&before, &after))
                    })
                    .collect(),
            ),
        };

        Self {
            phase,
            scenario: scenario.into(),
            series,
            stats,
            deltas,
            baseline,
            log_path: None,
            record_path: None,
            workbook_path: None,
        }
    }

    pub fn stats_for(&self, metric: Metric) -> SummaryStats {
        self.stats.get(&metric).copied().unwrap_or_default()
    }

    pub fn delta_for(&self, metric: Metric) -> Option<StatsDelta> {
        self.deltas
            .as_ref()
            .map(|deltas| deltas.get(&metric).copied().unwrap_or_default())
    }
}

/// An attached Task Manager window plus the sampler reading it
pub struct TaskManagerSession<S, C = SystemClock> {
    sampler: ResourceSampler<S, C>,
    config: MonitorConfig,
}

impl<S: UiSurface> TaskManagerSession<S, SystemClock> {
    pub fn new(surface: S, config: MonitorConfig) -> Self {
        Self::with_clock(surface, SystemClock, config)
    }
}

impl<S: UiSurface, C: Clock> TaskManagerSession<S, C> {
    pub fn with_clock(surface: S, clock: C, config: MonitorConfig) -> Self {
        Self {
            sampler: ResourceSampler::with_clock(surface, clock, &config),
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        self.sampler.surface()
    }

    /// Attach to Task Manager or launch it, then bring it to full view
    pub fn start_task_manager(&mut self) -> Result<LaunchOutcome> {
        let target = AppTarget::from_config(&self.config);
        info!("Connecting to '{}'", target.window_title);

        let outcome = self.sampler.surface_mut().connect_or_launch(&target)?;
        match outcome {
            LaunchOutcome::Attached => info!("Attached to running Task Manager"),
            LaunchOutcome::Launched => info!("Launched {}", target.executable),
        }

        self.surface_window(WindowAction::Maximize)?;
        self.surface_window(WindowAction::Focus)?;

        let more_details =
            Locator::title(&self.config.elements.more_details_title, ControlKind::Button);
        if let Some(button) = self.sampler.surface_mut().find(&more_details)? {
            debug!("Leaving compact mode");
            self.sampler.surface_mut().click(button)?;
            self.settle();
        }

        Ok(outcome)
    }

    /// Attach to the running Task Manager without touching its window.
    ///
    /// Launches it when nothing is running, like `start_task_manager`.
    pub fn attach_task_manager(&mut self) -> Result<LaunchOutcome> {
        if self.sampler.surface().is_connected() {
            return Ok(LaunchOutcome::Attached);
        }
        let target = AppTarget::from_config(&self.config);
        self.sampler.surface_mut().connect_or_launch(&target)
    }

    pub fn maximize_task_manager(&mut self) -> Result<()> {
        self.surface_window(WindowAction::Maximize)?;
        info!("Task Manager maximized");
        Ok(())
    }

    pub fn minimize_task_manager(&mut self) -> Result<()> {
        self.surface_window(WindowAction::Minimize)?;
        info!("Task Manager minimized");
        Ok(())
    }

    /// Restore, focus and maximize; a no-op unless the window is minimized
    pub fn restore_task_manager(&mut self) -> Result<bool> {
        if !self.sampler.surface().is_minimized()? {
            debug!("Task Manager is not minimized");
            return Ok(false);
        }
        self.surface_window(WindowAction::Restore)?;
        self.surface_window(WindowAction::Focus)?;
        self.surface_window(WindowAction::Maximize)?;
        info!("Task Manager restored");
        Ok(true)
    }

    pub fn switch_to_performance_tab(&mut self) -> Result<()> {
        let title = self.config.elements.performance_tab_title.clone();
        let tab = self
            .sampler
            .surface_mut()
            .find(&Locator::title(&title, ControlKind::ListItem))?
            .ok_or_else(|| MonitorError::ElementNotFound(format!("{} tab", title)))?;
        self.sampler.surface_mut().click(tab)?;
        self.settle();
        info!("Switched to the {} tab", title);
        Ok(())
    }

    /// Sample for the requested duration and write every output.
    ///
    /// A "Before" run persists its statistics; an "After" run diffs against
    /// them. A missing or unreadable record only degrades the deltas.
    pub fn log_utilization(&mut self, request: &RunRequest) -> Result<RunReport> {
        request.validate(&self.config)?;
        std::fs::create_dir_all(&request.log_folder)?;

        let log_path = request.log_folder.join(&self.config.log_file_name);
        let record_path = request.log_folder.join(&self.config.before_stats_file_name);
        let phase = Phase::resolve(request.phase, &log_path);

        info!(
            "Logging {} utilization for scenario '{}' over {}s",
            phase, request.scenario, request.duration_secs
        );
        let series = self.sampler.run(request.duration_secs).collect_series();

        let baseline = match phase {
            Phase::Before => None,
            Phase::After => self.load_baseline(&record_path, &request.scenario),
        };

        let mut report = RunReport::build(phase, request.scenario.clone(), series, baseline);

        append_section(&log_path, &report)?;
        report.log_path = Some(log_path);

        if phase == Phase::Before {
            let captured_at = self.sampler.clock().wall_time();
            RunRecord::from_series(&request.scenario, captured_at, &report.series)
                .save(&record_path)?;
            report.record_path = Some(record_path);
        }

        if self.config.export_workbook {
            let workbook_path = request
                .log_folder
                .join(export::workbook_file_name(&request.scenario, phase));
            export::write_workbook(&workbook_path, &report)?;
            report.workbook_path = Some(workbook_path);
        }

        info!("{} run complete: {} samples", phase, report.series.len());
        Ok(report)
    }

    pub fn close_task_manager(&mut self) -> Result<()> {
        self.surface_window(WindowAction::Close)?;
        info!("Task Manager closed");
        Ok(())
    }

    fn load_baseline(&self, path: &Path, scenario: &str) -> Option<RunRecord> {
        match RunRecord::load_if_exists(path) {
            Ok(Some(record)) => {
                if record.scenario != scenario {
                    warn!(
                        "Before-stats were captured for scenario '{}', comparing with '{}'",
                        record.scenario, scenario
                    );
                }
                Some(record)
            }
            Ok(None) => {
                warn!("No before-stats record at {}", path.display());
                None
            }
            Err(e) => {
                warn!("Ignoring before-stats record: {}", e);
                None
            }
        }
    }

    fn surface_window(&mut self, action: WindowAction) -> Result<()> {
        debug!("Window action: {:?}", action);
        self.sampler.surface_mut().window(action)
    }

    fn settle(&self) {
        self.sampler.clock().sleep(self.config.ui_settle());
    }
}
