//! Time source for the sampling loop

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Monotonic time, wall time and blocking sleep
pub trait Clock {
    fn now(&self) -> Instant;
    fn wall_time(&self) -> DateTime<Local>;
    fn sleep(&self, duration: Duration);
}

/// Real clock backed by `std::time` and `chrono`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_time(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[cfg(any(feature = "mock", test))]
pub use manual::ManualClock;

#[cfg(any(feature = "mock", test))]
mod manual {
    use super::Clock;
    use chrono::{DateTime, Local, TimeZone};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    struct State {
        origin: Instant,
        wall_origin: DateTime<Local>,
        elapsed: Duration,
        sleeps: Vec<Duration>,
    }

    /// Virtual clock that never blocks.
    ///
    /// Every `now()` call advances virtual time by `step`, which stands in for
    /// the latency of the work done between two readings. `sleep` advances
    /// time by the requested amount and records it.
    #[derive(Clone)]
    pub struct ManualClock {
        state: Arc<Mutex<State>>,
        step: Duration,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self::with_step(Duration::ZERO)
        }

        pub fn with_step(step: Duration) -> Self {
            let wall_origin = Local
                .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
                .single()
                .unwrap_or_else(Local::now);
            Self {
                state: Arc::new(Mutex::new(State {
                    origin: Instant::now(),
                    wall_origin,
                    elapsed: Duration::ZERO,
                    sleeps: Vec::new(),
                })),
                step,
            }
        }

        /// Move virtual time forward without recording a sleep
        pub fn advance(&self, duration: Duration) {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.elapsed += duration;
        }

        pub fn elapsed(&self) -> Duration {
            self.state.lock().unwrap_or_else(|e| e.into_inner()).elapsed
        }

        /// Every sleep requested so far, in order
        pub fn sleeps(&self) -> Vec<Duration> {
            self.state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .sleeps
                .clone()
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.elapsed += self.step;
            state.origin + state.elapsed
        }

        fn wall_time(&self) -> DateTime<Local> {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let offset = chrono::Duration::from_std(state.elapsed)
                .unwrap_or_else(|_| chrono::Duration::zero());
            state.wall_origin + offset
        }

        fn sleep(&self, duration: Duration) {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
    }
}
