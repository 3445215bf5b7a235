use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};

use super::{FrameBuffer, GameKey, InputEvent, RawKeyCode, SessionContext};

/// The game loop collaborator driven by the stage's play/stop actions.
pub trait GameRuntime {
    /// Starts a session running `source`. Returns once the program is loaded
    /// and its loop is running.
    fn execute(&mut self, source: &str, session: Arc<SessionContext>) -> Result<(), RuntimeError>;

    /// Halts the running session. Returns only after its loop has exited.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// A loaded user program, stepped on the game thread.
pub trait GameProgram: Send {
    fn update(&mut self, dt_seconds: f32, input: &mut ProgramInput<'_>);
    fn render(&mut self, frame: &mut FrameBuffer);
}

pub trait ProgramLoader: Send + Sync {
    fn load(&self, source: &str) -> Result<Box<dyn GameProgram>, ProgramLoadError>;
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProgramLoadError {
    message: String,
}

impl ProgramLoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to load program: {0}")]
    Load(#[from] ProgramLoadError),
    #[error("failed to spawn game thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Game-side view of the session input.
pub struct ProgramInput<'a> {
    session: &'a SessionContext,
}

impl<'a> ProgramInput<'a> {
    pub fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }

    pub fn next_event(&mut self) -> Option<InputEvent> {
        self.session.try_next_event()
    }

    pub fn is_held(&self, key: GameKey) -> bool {
        self.session.is_key_held(key)
    }

    /// Game key the session delivers for a host key.
    pub fn key(&self, raw: RawKeyCode) -> GameKey {
        self.session.key_map().map(raw)
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_width: 320,
            frame_height: 240,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
        }
    }
}

struct Worker {
    session: Arc<SessionContext>,
    handle: JoinHandle<()>,
}

/// Runs each session's program on its own thread with a fixed timestep.
pub struct ThreadedRuntime {
    loader: Arc<dyn ProgramLoader>,
    config: RuntimeConfig,
    worker: Option<Worker>,
}

impl ThreadedRuntime {
    pub fn new(loader: Arc<dyn ProgramLoader>, config: RuntimeConfig) -> Self {
        Self {
            loader,
            config,
            worker: None,
        }
    }
}

impl GameRuntime for ThreadedRuntime {
    fn execute(&mut self, source: &str, session: Arc<SessionContext>) -> Result<(), RuntimeError> {
        self.stop();

        let program = self.loader.load(source)?;
        let config = self.config.clone();
        let thread_session = Arc::clone(&session);
        let handle = thread::Builder::new()
            .name(format!("game-session-{}", session.id()))
            .spawn(move || run_program_loop(program, &thread_session, &config))
            .map_err(RuntimeError::Spawn)?;

        info!(session = session.id(), "game_thread_started");
        self.worker = Some(Worker { session, handle });
        Ok(())
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.session.request_stop();
        match worker.handle.join() {
            Ok(()) => info!(
                session = worker.session.id(),
                sim_ticks = worker.session.sim_ticks(),
                "game_thread_stopped"
            ),
            Err(payload) => error!(
                session = worker.session.id(),
                panic = panic_message(payload.as_ref()),
                "game_thread_panicked"
            ),
        }
    }

    fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }
}

impl Drop for ThreadedRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_program_loop(
    mut program: Box<dyn GameProgram>,
    session: &SessionContext,
    config: &RuntimeConfig,
) {
    let target_tps = config.target_tps.max(1);
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let max_frame_delta = if config.max_frame_delta.is_zero() {
        Duration::from_millis(250)
    } else {
        config.max_frame_delta
    };

    let mut back = FrameBuffer::new(config.frame_width, config.frame_height);
    program.render(&mut back);
    back = recycle(session.publish_frame(back), config);

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();

    while !session.stop_requested() {
        let now = Instant::now();
        let frame_dt = clamp_frame_delta(
            now.saturating_duration_since(last_frame_instant),
            max_frame_delta,
        );
        last_frame_instant = now;

        if session.is_paused() {
            accumulator = Duration::ZERO;
            thread::sleep(fixed_dt);
            continue;
        }

        accumulator = accumulator.saturating_add(frame_dt);
        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        for _ in 0..step_plan.ticks_to_run {
            let mut input = ProgramInput::new(session);
            program.update(fixed_dt_seconds, &mut input);
            session.record_sim_tick();
        }
        accumulator = step_plan.remaining_accumulator;

        if step_plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        if step_plan.ticks_to_run > 0 {
            program.render(&mut back);
            back = recycle(session.publish_frame(back), config);
        }

        let elapsed = Instant::now().saturating_duration_since(now);
        if elapsed < fixed_dt {
            thread::sleep(fixed_dt - elapsed);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn recycle(previous: Option<FrameBuffer>, config: &RuntimeConfig) -> FrameBuffer {
    previous
        .filter(|frame| frame.width() == config.frame_width && frame.height() == config.frame_height)
        .unwrap_or_else(|| FrameBuffer::new(config.frame_width, config.frame_height))
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::app::{KeyEventKind, Modifiers, OffsetKeyMap, Rgb};

    struct CountingProgram {
        updates: Arc<AtomicU32>,
        keys_seen: Arc<AtomicU32>,
    }

    impl GameProgram for CountingProgram {
        fn update(&mut self, _dt_seconds: f32, input: &mut ProgramInput<'_>) {
            self.updates.fetch_add(1, Ordering::SeqCst);
            while let Some(event) = input.next_event() {
                if event.kind == KeyEventKind::KeyDown {
                    self.keys_seen.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        fn render(&mut self, frame: &mut FrameBuffer) {
            frame.fill(Rgb::new(0, 0, 200));
        }
    }

    struct CountingLoader {
        updates: Arc<AtomicU32>,
        keys_seen: Arc<AtomicU32>,
    }

    impl ProgramLoader for CountingLoader {
        fn load(&self, source: &str) -> Result<Box<dyn GameProgram>, ProgramLoadError> {
            if source == "broken" {
                return Err(ProgramLoadError::new("broken program"));
            }
            Ok(Box::new(CountingProgram {
                updates: Arc::clone(&self.updates),
                keys_seen: Arc::clone(&self.keys_seen),
            }))
        }
    }

    fn runtime() -> (ThreadedRuntime, Arc<AtomicU32>, Arc<AtomicU32>) {
        let updates = Arc::new(AtomicU32::new(0));
        let keys_seen = Arc::new(AtomicU32::new(0));
        let loader = CountingLoader {
            updates: Arc::clone(&updates),
            keys_seen: Arc::clone(&keys_seen),
        };
        let config = RuntimeConfig {
            frame_width: 16,
            frame_height: 12,
            target_tps: 200,
            ..RuntimeConfig::default()
        };
        (ThreadedRuntime::new(Arc::new(loader), config), updates, keys_seen)
    }

    fn session() -> Arc<SessionContext> {
        SessionContext::new(11, Arc::new(OffsetKeyMap::default()))
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let result = plan_sim_steps(Duration::from_millis(48), Duration::from_millis(16), 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let result = plan_sim_steps(Duration::from_millis(120), Duration::from_millis(16), 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn execute_publishes_frames_and_consumes_events() {
        let (mut runtime, updates, keys_seen) = runtime();
        let session = session();
        session.push_event(InputEvent::key_down(GameKey(97), Modifiers::empty()));

        runtime
            .execute("program", Arc::clone(&session))
            .expect("execute");

        assert!(wait_until(|| updates.load(Ordering::SeqCst) > 2));
        assert!(wait_until(|| keys_seen.load(Ordering::SeqCst) == 1));
        let frame = session.latest_frame().expect("frame");
        assert_eq!((frame.width(), frame.height()), (16, 12));
        assert_eq!(frame.pixel(0, 0), Some(Rgb::new(0, 0, 200)));

        runtime.stop();
        assert!(!runtime.is_running());
    }

    #[test]
    fn stop_halts_updates_before_returning() {
        let (mut runtime, updates, _) = runtime();
        let session = session();
        runtime
            .execute("program", Arc::clone(&session))
            .expect("execute");
        assert!(wait_until(|| updates.load(Ordering::SeqCst) > 0));

        runtime.stop();
        let after_stop = updates.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));

        assert_eq!(updates.load(Ordering::SeqCst), after_stop);
        assert_eq!(session.sim_ticks(), after_stop as u64);
    }

    #[test]
    fn paused_session_does_not_advance() {
        let (mut runtime, updates, _) = runtime();
        let session = session();
        session.set_paused(true);
        runtime
            .execute("program", Arc::clone(&session))
            .expect("execute");

        thread::sleep(Duration::from_millis(40));
        assert_eq!(updates.load(Ordering::SeqCst), 0);
        assert!(session.latest_frame().is_some());

        session.set_paused(false);
        assert!(wait_until(|| updates.load(Ordering::SeqCst) > 0));
        runtime.stop();
    }

    #[test]
    fn load_failure_does_not_spawn() {
        let (mut runtime, _, _) = runtime();
        let error = runtime
            .execute("broken", session())
            .expect_err("load should fail");

        assert!(matches!(error, RuntimeError::Load(_)));
        assert_eq!(error.to_string(), "failed to load program: broken program");
        assert!(!runtime.is_running());
    }

    #[test]
    fn panic_message_reads_string_payloads() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(7u8);

        assert_eq!(panic_message(literal.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    #[test]
    fn program_panic_is_contained_at_stop() {
        struct PanickingProgram;
        impl GameProgram for PanickingProgram {
            fn update(&mut self, _dt_seconds: f32, _input: &mut ProgramInput<'_>) {
                panic!("user program failure");
            }
            fn render(&mut self, _frame: &mut FrameBuffer) {}
        }
        struct PanickingLoader;
        impl ProgramLoader for PanickingLoader {
            fn load(&self, _source: &str) -> Result<Box<dyn GameProgram>, ProgramLoadError> {
                Ok(Box::new(PanickingProgram))
            }
        }

        let mut runtime = ThreadedRuntime::new(Arc::new(PanickingLoader), RuntimeConfig::default());
        runtime.execute("", session()).expect("execute");
        assert!(wait_until(|| !runtime.is_running()));
        runtime.stop();
    }
}
