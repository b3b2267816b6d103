use resmon_sampler::clock::ManualClock;
use resmon_sampler::mock::{MockElement, MockSurface};
use resmon_sampler::{
    ElementIds, Metric, MonitorConfig, Phase, RunRecord, RunRequest, StatValue, SummaryStats,
    TaskManagerSession, UiBackend,
};
use std::time::Duration;
use tempfile::TempDir;

fn config() -> MonitorConfig {
    MonitorConfig::new(UiBackend::Mock)
        .without_settle_delays()
        .with_workbook_export(false)
}

fn surface(cpu: &[&str], npu: Option<&[&str]>) -> MockSurface {
    let ids = ElementIds::default();
    let mut surface = MockSurface::new()
        .with_element(MockElement::edit(&ids.cpu_automation_id, cpu.to_vec()))
        .with_element(MockElement::edit(&ids.memory_automation_id, ["7.9/15.7 GB (50%)"]))
        .with_element(MockElement::list_item(&ids.performance_tab_title));
    if let Some(npu) = npu {
        surface = surface.with_element(MockElement::button(&ids.npu_button_text, npu.to_vec()));
    }
    surface
}

fn run(
    temp_dir: &TempDir,
    surface: MockSurface,
    duration: u64,
    phase: Option<Phase>,
) -> resmon_sampler::RunReport {
    let mut session = TaskManagerSession::with_clock(surface, ManualClock::new(), config());
    session.start_task_manager().unwrap();
    session.switch_to_performance_tab().unwrap();

    let mut request = RunRequest::new(temp_dir.path(), "video_call", duration);
    request.phase = phase;
    session.log_utilization(&request).unwrap()
}

#[test]
fn before_and_after_runs_share_one_log() {
    let temp_dir = TempDir::new().unwrap();

    let before = run(&temp_dir, surface(&["10%", "20%", "30%"], None), 3, None);
    assert_eq!(before.phase, Phase::Before);
    assert_eq!(
        before.stats_for(Metric::Cpu),
        SummaryStats {
            median: StatValue::Value(20.0),
            average: StatValue::Value(20.0),
            peak: StatValue::Value(30.0),
        }
    );

    let record = RunRecord::load(&temp_dir.path().join("before_stats.json")).unwrap();
    assert_eq!(record.scenario, "video_call");
    assert_eq!(record.sample_count, 3);
    assert_eq!(record.get(Metric::Npu), SummaryStats::not_available());

    let after = run(
        &temp_dir,
        surface(&["20%", "25%", "45%"], Some(&["NPU 0\n40%"])),
        3,
        None,
    );
    assert_eq!(after.phase, Phase::After);

    let cpu = after.delta_for(Metric::Cpu).unwrap();
    assert_eq!(cpu.median, StatValue::Value(5.0));
    assert_eq!(cpu.average, StatValue::Value(10.0));
    assert_eq!(cpu.peak, StatValue::Value(15.0));

    // NPU was absent before, so its change cannot be computed
    assert_eq!(
        after.delta_for(Metric::Npu).unwrap(),
        SummaryStats::not_available()
    );
    assert_eq!(after.delta_for(Metric::Memory).unwrap().median, StatValue::Value(0.0));

    let log = std::fs::read_to_string(temp_dir.path().join("resource_utilization.txt")).unwrap();
    let sections: Vec<&str> = log.split("\n\nAfter Test Execution").collect();
    assert_eq!(sections.len(), 2);
    assert!(sections[0].starts_with("Before Test Execution - Scenario: video_call"));
    assert!(sections[0].contains(", 10, 50, N/A, 7.9"));
    assert!(sections[1].contains("NPU - Median: 40%, Average: 40%, Peak: 40%"));
    assert!(sections[1].contains("--- Change vs Before Test Execution ---"));
    assert!(sections[1].contains("CPU - Median: 5%, Average: 10%, Peak: 15%"));
    assert!(sections[1].contains("NPU - Median: N/A, Average: N/A, Peak: N/A"));
}

#[test]
fn explicit_before_phase_overwrites_record() {
    let temp_dir = TempDir::new().unwrap();

    run(&temp_dir, surface(&["10%"], None), 1, Some(Phase::Before));
    run(&temp_dir, surface(&["50%"], None), 1, Some(Phase::Before));

    let record = RunRecord::load(&temp_dir.path().join("before_stats.json")).unwrap();
    assert_eq!(record.get(Metric::Cpu).peak, StatValue::Value(50.0));

    let log = std::fs::read_to_string(temp_dir.path().join("resource_utilization.txt")).unwrap();
    assert_eq!(log.matches("Before Test Execution - Scenario").count(), 2);
    assert!(!log.contains("After Test Execution"));
}

#[test]
fn slow_gauges_do_not_stretch_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::with_step(Duration::from_millis(400));

    let mut session =
        TaskManagerSession::with_clock(surface(&["10%"], None), clock.clone(), config());
    session.start_task_manager().unwrap();
    let report = session
        .log_utilization(&RunRequest::new(temp_dir.path(), "slow", 5).with_phase(Phase::Before))
        .unwrap();

    assert_eq!(report.series.len(), 5);
    let sleeps = clock.sleeps();
    assert_eq!(sleeps.len(), 4);
    assert!(sleeps.iter().all(|d| *d == Duration::from_millis(600)));
}
