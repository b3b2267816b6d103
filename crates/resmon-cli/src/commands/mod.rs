//! Command implementations for resmon CLI

pub mod utilization;
pub mod window;

use crate::output::OutputFormatter;
use anyhow::Result;
use clap::ValueEnum;
use resmon_sampler::{Clock, Phase, TaskManagerSession, UiSurface};
use std::path::PathBuf;

/// Operations selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    /// Attach to or launch Task Manager and switch it to full view
    #[value(alias = "start_task_manager")]
    StartTaskManager,

    /// Maximize the Task Manager window
    #[value(alias = "maximize_task_manager")]
    MaximizeTaskManager,

    /// Minimize the Task Manager window
    #[value(alias = "minimize_task_manager")]
    MinimizeTaskManager,

    /// Restore the Task Manager window if it is minimized
    #[value(alias = "restore_task_manager")]
    RestoreTaskManager,

    /// Open the Performance tab
    #[value(alias = "switch_to_performance_tab")]
    SwitchToPerformanceTab,

    /// Sample utilization and write the log, record and workbook
    #[value(alias = "log_utilization")]
    LogUtilization,

    /// Close Task Manager
    #[value(alias = "close_task_manager")]
    CloseTaskManager,
}

/// Positional arguments shared by every operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    pub log_folder: PathBuf,
    pub scenario: String,
    pub duration_secs: u64,
    /// `None` picks the phase from the state of the log folder
    pub phase: Option<Phase>,
}

/// Run one operation against the session
pub fn dispatch<S: UiSurface, C: Clock>(
    operation: Operation,
    session: &mut TaskManagerSession<S, C>,
    context: &OperationContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    match operation {
        Operation::StartTaskManager => window::start(session, formatter),
        Operation::MaximizeTaskManager => window::maximize(session, formatter),
        Operation::MinimizeTaskManager => window::minimize(session, formatter),
        Operation::RestoreTaskManager => window::restore(session, formatter),
        Operation::SwitchToPerformanceTab => window::switch_to_performance_tab(session, formatter),
        Operation::LogUtilization => utilization::log_utilization(session, context, formatter),
        Operation::CloseTaskManager => window::close(session, formatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use resmon_sampler::clock::ManualClock;
    use resmon_sampler::mock::MockSurface;
    use resmon_sampler::{ElementIds, MonitorConfig, UiBackend, WindowAction};
    use tempfile::TempDir;

    fn session(surface: MockSurface) -> TaskManagerSession<MockSurface, ManualClock> {
        let config = MonitorConfig::new(UiBackend::Mock)
            .without_settle_delays()
            .with_workbook_export(false);
        TaskManagerSession::with_clock(surface, ManualClock::new(), config)
    }

    fn context(temp_dir: &TempDir) -> OperationContext {
        OperationContext {
            log_folder: temp_dir.path().to_path_buf(),
            scenario: "smoke".to_string(),
            duration_secs: 2,
            phase: None,
        }
    }

    #[test]
    fn test_operation_names() {
        let names: Vec<String> = Operation::value_variants()
            .iter()
            .filter_map(|op| op.to_possible_value())
            .map(|value| value.get_name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "start-task-manager",
                "maximize-task-manager",
                "minimize-task-manager",
                "restore-task-manager",
                "switch-to-performance-tab",
                "log-utilization",
                "close-task-manager",
            ]
        );

        assert_eq!(
            Operation::from_str("log_utilization", false).unwrap(),
            Operation::LogUtilization
        );
        assert!(Operation::from_str("get_utilization", false).is_err());
    }

    #[test]
    fn test_window_operations() {
        let temp_dir = TempDir::new().unwrap();
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let mut session = session(MockSurface::task_manager(&ElementIds::default()));

        for operation in [
            Operation::StartTaskManager,
            Operation::MinimizeTaskManager,
            Operation::RestoreTaskManager,
            Operation::SwitchToPerformanceTab,
            Operation::CloseTaskManager,
        ] {
            dispatch(operation, &mut session, &context(&temp_dir), &formatter).unwrap();
        }

        assert_eq!(session.surface().launches(), 1);
        assert!(!session.surface().is_connected());
        assert_eq!(
            session.surface().window_actions().last(),
            Some(&WindowAction::Close)
        );
    }

    #[test]
    fn test_log_utilization_operation() {
        let temp_dir = TempDir::new().unwrap();
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let mut session = session(MockSurface::task_manager(&ElementIds::default()));

        dispatch(
            Operation::LogUtilization,
            &mut session,
            &context(&temp_dir),
            &formatter,
        )
        .unwrap();

        assert!(temp_dir.path().join("resource_utilization.txt").exists());
        assert!(temp_dir.path().join("before_stats.json").exists());
    }

    #[test]
    fn test_invalid_request_rejected_before_touching_ui() {
        let temp_dir = TempDir::new().unwrap();
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let mut session = session(MockSurface::task_manager(&ElementIds::default()));
        let context = OperationContext {
            duration_secs: 0,
            ..context(&temp_dir)
        };

        let err = dispatch(
            Operation::LogUtilization,
            &mut session,
            &context,
            &formatter,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("at least one second"));
        assert_eq!(session.surface().launches(), 0);
        assert!(session.surface().clicks().is_empty());
        assert!(!temp_dir.path().join("resource_utilization.txt").exists());
    }

    #[test]
    fn test_missing_tab_fails_operation() {
        let temp_dir = TempDir::new().unwrap();
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let mut surface = MockSurface::task_manager(&ElementIds::default());
        surface.remove_element("Performance");
        let mut session = session(surface);

        let err = dispatch(
            Operation::LogUtilization,
            &mut session,
            &context(&temp_dir),
            &formatter,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Performance"));
        assert!(!temp_dir.path().join("resource_utilization.txt").exists());
    }
}
