//! Task Manager window commands

use crate::output::OutputFormatter;
use anyhow::{Context, Result};
use resmon_sampler::{Clock, LaunchOutcome, TaskManagerSession, UiSurface};

/// Attach to or launch Task Manager and leave compact mode
pub fn start<S: UiSurface, C: Clock>(
    session: &mut TaskManagerSession<S, C>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let outcome = session
        .start_task_manager()
        .context("Failed to start Task Manager")?;

    match outcome {
        LaunchOutcome::Attached => formatter.print_success("Attached to existing Task Manager")?,
        LaunchOutcome::Launched => formatter.print_success("Task Manager launched")?,
    }
    Ok(())
}

pub fn maximize<S: UiSurface, C: Clock>(
    session: &mut TaskManagerSession<S, C>,
    formatter: &OutputFormatter,
) -> Result<()> {
    attach(session)?;
    session
        .maximize_task_manager()
        .context("Failed to maximize Task Manager")?;
    formatter.print_success("Task Manager maximized")
}

pub fn minimize<S: UiSurface, C: Clock>(
    session: &mut TaskManagerSession<S, C>,
    formatter: &OutputFormatter,
) -> Result<()> {
    attach(session)?;
    session
        .minimize_task_manager()
        .context("Failed to minimize Task Manager")?;
    formatter.print_success("Task Manager minimized")
}

pub fn restore<S: UiSurface, C: Clock>(
    session: &mut TaskManagerSession<S, C>,
    formatter: &OutputFormatter,
) -> Result<()> {
    attach(session)?;
    let restored = session
        .restore_task_manager()
        .context("Failed to restore Task Manager")?;

    if restored {
        formatter.print_success("Task Manager restored")
    } else {
        formatter.print_success("Task Manager is not minimized")
    }
}

pub fn switch_to_performance_tab<S: UiSurface, C: Clock>(
    session: &mut TaskManagerSession<S, C>,
    formatter: &OutputFormatter,
) -> Result<()> {
    attach(session)?;
    session
        .switch_to_performance_tab()
        .context("Failed to switch to the Performance tab")?;
    formatter.print_success("Switched to the Performance tab")
}

pub fn close<S: UiSurface, C: Clock>(
    session: &mut TaskManagerSession<S, C>,
    formatter: &OutputFormatter,
) -> Result<()> {
    attach(session)?;
    session
        .close_task_manager()
        .context("Failed to close Task Manager")?;
    formatter.print_success("Task Manager closed")
}

/// Attach to the running Task Manager, launching it when none is running
pub(crate) fn attach<S: UiSurface, C: Clock>(session: &mut TaskManagerSession<S, C>) -> Result<()> {
    session
        .attach_task_manager()
        .context("Failed to attach to Task Manager")?;
    Ok(())
}
