//! Utilization logging command

use super::window::attach;
use super::OperationContext;
use crate::output::{format_duration, OutputFormatter};
use anyhow::{Context, Result};
use resmon_sampler::{Clock, Phase, RunRequest, TaskManagerSession, UiSurface};
use tracing::info;

/// Sample for the requested duration and report the statistics
pub fn log_utilization<S: UiSurface, C: Clock>(
    session: &mut TaskManagerSession<S, C>,
    context: &OperationContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut request = RunRequest::new(
        &context.log_folder,
        context.scenario.clone(),
        context.duration_secs,
    );
    request.phase = context.phase;
    request
        .validate(session.config())
        .context("Invalid utilization request")?;

    attach(session)?;
    session
        .switch_to_performance_tab()
        .context("Failed to switch to the Performance tab")?;

    formatter.print_progress(&format!(
        "Sampling '{}' for {}",
        context.scenario,
        format_duration(context.duration_secs)
    ));
    let result = session.log_utilization(&request);
    formatter.clear_progress();

    let report = result.with_context(|| {
        format!(
            "Failed to log utilization to {}",
            context.log_folder.display()
        )
    })?;
    info!(
        "Wrote {} samples to {}",
        report.series.len(),
        context.log_folder.display()
    );

    if report.phase == Phase::After && report.baseline.is_none() {
        formatter.print_warning("No before-stats record found; changes are reported as N/A")?;
    }
    formatter.print_report(&report)
}
