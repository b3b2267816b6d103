//! Per-tick sampling and the fixed-cadence run loop

use crate::clock::{Clock, SystemClock};
use crate::config::{ElementIds, MonitorConfig};
use crate::parse::{extract_memory_gb, extract_percentage};
use crate::sample::{Sample, Series};
use crate::surface::{ControlKind, Locator, UiSurface};
use crate::Result;

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Reads the Task Manager gauges through a `UiSurface`
pub struct ResourceSampler<S, C = SystemClock> {
    surface: S,
    clock: C,
    elements: ElementIds,
    interval: Duration,
}

impl<S: UiSurface> ResourceSampler<S, SystemClock> {
    pub fn new(surface: S, config: &MonitorConfig) -> Self {
        Self::with_clock(surface, SystemClock, config)
    }
}

impl<S: UiSurface, C: Clock> ResourceSampler<S, C> {
    pub fn with_clock(surface: S, clock: C, config: &MonitorConfig) -> Self {
        Self {
            surface,
            clock,
            elements: config.elements.clone(),
            interval: config.interval(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Read every gauge once.
    ///
    /// Never fails: a gauge that is missing is left absent, and a surface
    /// error degrades the whole sample to absent.
    pub fn sample(&mut self) -> Sample {
        let timestamp = self.clock.wall_time();
        match self.read_gauges(timestamp) {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Failed to capture utilization data: {}", e);
                Sample::absent(timestamp)
            }
        }
    }

    /// Lazily sample `ticks` times at the configured interval
    pub fn run(&mut self, ticks: u64) -> Run<'_, S, C> {
        let interval = self.interval;
        self.run_with_interval(ticks, interval)
    }

    pub fn run_with_interval(&mut self, ticks: u64, interval: Duration) -> Run<'_, S, C> {
        debug!("Starting run of {} ticks every {:?}", ticks, interval);
        Run {
            sampler: self,
            interval,
            total: ticks,
            completed: 0,
            tick_started: None,
        }
    }

    fn read_gauges(&mut self, timestamp: DateTime<Local>) -> Result<Sample> {
        let cpu_text = self.read_text(&Locator::automation_id(
            &self.elements.cpu_automation_id,
            ControlKind::Edit,
        ))?;
        let memory_text = self.read_text(&Locator::automation_id(
            &self.elements.memory_automation_id,
            ControlKind::Edit,
        ))?;
        let npu_percent = self.read_npu()?;

        let memory_gb = memory_text.as_deref().and_then(extract_memory_gb);

        Ok(Sample {
            timestamp,
            cpu_percent: cpu_text.as_deref().and_then(extract_percentage),
            memory_percent: memory_text.as_deref().and_then(extract_percentage),
            npu_percent,
            memory_used_gb: memory_gb.map(|(used, _)| used),
            memory_total_gb: memory_gb.map(|(_, total)| total),
        })
    }

    fn read_text(&mut self, locator: &Locator) -> Result<Option<String>> {
        match self.surface.find(locator)? {
            Some(handle) => Ok(Some(self.surface.read_text(handle)?)),
            None => {
                debug!("Element {} not found", locator);
                Ok(None)
            }
        }
    }

    // The NPU entry only exposes its gauge after being selected.
    fn read_npu(&mut self) -> Result<Option<u32>> {
        let locator = Locator::text_contains(&self.elements.npu_button_text, ControlKind::Button);
        let Some(handle) = self.surface.find(&locator)? else {
            debug!("No NPU entry in the sidebar");
            return Ok(None);
        };
        self.surface.click(handle)?;
        let text = self.surface.read_text(handle)?;
        Ok(extract_percentage(&text))
    }
}

/// How long to sleep so the next tick starts one `interval` after the last.
///
/// Clamped to zero when the tick overran the interval; no debt carries over.
pub fn pacing_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// A finite, lazy sequence of samples; yields exactly `ticks` items
pub struct Run<'a, S, C> {
    sampler: &'a mut ResourceSampler<S, C>,
    interval: Duration,
    total: u64,
    completed: u64,
    tick_started: Option<Instant>,
}

impl<'a, S: UiSurface, C: Clock> Run<'a, S, C> {
    /// Ticks yielded so far
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Drain the remaining ticks into an owned series
    pub fn collect_series(self) -> Series {
        let mut series = Series::new();
        for sample in self {
            series.push(sample);
        }
        series
    }
}

impl<'a, S: UiSurface, C: Clock> Iterator for Run<'a, S, C> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.completed >= self.total {
            return None;
        }

        if let Some(previous) = self.tick_started {
            let elapsed = self.sampler.clock.now().saturating_duration_since(previous);
            let pause = pacing_delay(self.interval, elapsed);
            if pause.is_zero() {
                debug!(
                    "Tick {} overran the interval by {:?}",
                    self.completed,
                    elapsed - self.interval
                );
            }
            self.sampler.clock.sleep(pause);
        }

        self.tick_started = Some(self.sampler.clock.now());

        let sample = self.sampler.sample();
        self.completed += 1;
        debug!("Tick {}/{}: {}", self.completed, self.total, sample.log_line());
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining =
            usize::try_from(self.total.saturating_sub(self.completed)).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl<'a, S: UiSurface, C: Clock> ExactSizeIterator for Run<'a, S, C> {}
