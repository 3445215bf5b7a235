use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use super::TickOutcome;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PresentMetricsSnapshot {
    /// Frames painted into the window per second.
    pub present_fps: f32,
    /// Game simulation ticks per second.
    pub sim_tps: f32,
    /// Ticks in the interval where presentation was on but nothing was painted.
    pub blank_ticks: u32,
}

#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<PresentMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(PresentMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> PresentMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: PresentMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                *poisoned.into_inner() = snapshot;
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    painted: u32,
    blank: u32,
    sim_session: Option<u64>,
    sim_ticks_seen: u64,
    sim_ticks: u64,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            painted: 0,
            blank: 0,
            sim_session: None,
            sim_ticks_seen: 0,
            sim_ticks: 0,
        }
    }

    pub(crate) fn record_tick(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Painted => self.painted = self.painted.saturating_add(1),
            TickOutcome::Blank => self.blank = self.blank.saturating_add(1),
            TickOutcome::Disabled => {}
        }
    }

    /// `sample` is the running session's id and cumulative tick counter, or
    /// `None` while stopped. Each session's counter starts at zero.
    pub(crate) fn record_sim_ticks(&mut self, sample: Option<(u64, u64)>) {
        let Some((session, total)) = sample else {
            return;
        };
        if self.sim_session != Some(session) {
            self.sim_session = Some(session);
            self.sim_ticks_seen = 0;
        }
        self.sim_ticks = self
            .sim_ticks
            .saturating_add(total.saturating_sub(self.sim_ticks_seen));
        self.sim_ticks_seen = self.sim_ticks_seen.max(total);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<PresentMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);

        let snapshot = PresentMetricsSnapshot {
            present_fps: self.painted as f32 / elapsed_seconds,
            sim_tps: self.sim_ticks as f32 / elapsed_seconds,
            blank_ticks: self.blank,
        };

        self.interval_start = now;
        self.painted = 0;
        self.blank = 0;
        self.sim_ticks = 0;

        Some(snapshot)
    }
}
