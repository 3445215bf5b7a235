use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::{Canvas, GameRuntime, KeyMap, SessionContext};

const PROGRAM_EXITED_MESSAGE: &str = "Program stopped unexpectedly.";

/// Source of the program text run on play.
pub trait Editor {
    fn text(&mut self) -> Result<String, EditorError>;
}

/// Output pane the stage reports session progress to.
pub trait Console {
    fn clear(&mut self);
    fn write(&mut self, line: &str);
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to read program source from {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Play,
    Stop,
    Pause,
}

/// Owns the canvas and drives the game runtime through play, pause and stop.
pub struct Stage {
    state: PresentationState,
    canvas: Canvas,
    runtime: Box<dyn GameRuntime>,
    editor: Box<dyn Editor>,
    console: Box<dyn Console>,
    key_map: Arc<dyn KeyMap>,
    session: Option<Arc<SessionContext>>,
    next_session_id: u64,
}

impl Stage {
    pub fn new(
        canvas: Canvas,
        runtime: Box<dyn GameRuntime>,
        editor: Box<dyn Editor>,
        console: Box<dyn Console>,
        key_map: Arc<dyn KeyMap>,
    ) -> Self {
        Self {
            state: PresentationState::Stopped,
            canvas,
            runtime,
            editor,
            console,
            key_map,
            session: None,
            next_session_id: 1,
        }
    }

    pub fn state(&self) -> PresentationState {
        self.state
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn session(&self) -> Option<&Arc<SessionContext>> {
        self.session.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_paused())
    }

    pub fn trigger(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::Play => self.play(),
            ToolbarAction::Stop => self.stop(),
            ToolbarAction::Pause => self.pause(),
        }
    }

    pub fn play(&mut self) {
        if self.state != PresentationState::Stopped {
            return;
        }

        let source = match self.editor.text() {
            Ok(source) => source,
            Err(err) => {
                warn!(error = %err, "play_aborted");
                self.console.write(&err.to_string());
                return;
            }
        };

        self.console.clear();
        self.console.write("Starting program.");

        let session = SessionContext::new(self.next_session_id, Arc::clone(&self.key_map));
        self.next_session_id = self.next_session_id.wrapping_add(1);
        self.canvas.attach_session(Arc::clone(&session));
        self.canvas.play();

        if let Err(err) = self.runtime.execute(&source, Arc::clone(&session)) {
            warn!(error = %err, session = session.id(), "play_failed");
            self.console.write(&err.to_string());
            self.canvas.stop();
            return;
        }

        self.session = Some(session);
        self.set_state(PresentationState::Playing);
    }

    pub fn stop(&mut self) {
        if self.state == PresentationState::Stopped {
            return;
        }
        self.runtime.stop();
        self.canvas.stop();
        self.session = None;
        self.set_state(PresentationState::Stopped);
    }

    /// Toggles between playing and paused. Presentation continues either way.
    pub fn pause(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let paused = session.toggle_paused();
        self.set_state(if paused {
            PresentationState::Paused
        } else {
            PresentationState::Playing
        });
    }

    /// Called once per host tick. A runtime that is no longer running while
    /// the stage is playing or paused has lost its program, so the stage stops.
    pub fn check_runtime(&mut self) {
        if self.state == PresentationState::Stopped || self.runtime.is_running() {
            return;
        }
        let session = self.session.as_ref().map_or(0, |s| s.id());
        warn!(session, state = ?self.state, "game_thread_exited");
        self.console.write(PROGRAM_EXITED_MESSAGE);
        self.stop();
    }

    /// Window close: the session is stopped before the stage is dropped.
    pub fn close(&mut self) {
        self.stop();
        info!("stage_closed");
    }

    fn set_state(&mut self, state: PresentationState) {
        if self.state != state {
            info!(from = ?self.state, to = ?state, "presentation_state_changed");
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::{
        CanvasHandler, FrameBuffer, GameKey, Modifiers, OffsetKeyMap, RawKeyCode,
        RecordingSurface, RuntimeError, TickOutcome,
    };

    #[derive(Default)]
    struct RuntimeLog {
        executed: Vec<String>,
        stops: u32,
        fail_next: bool,
        session: Option<Arc<SessionContext>>,
    }

    struct FakeRuntime(Rc<RefCell<RuntimeLog>>);

    impl GameRuntime for FakeRuntime {
        fn execute(
            &mut self,
            source: &str,
            session: Arc<SessionContext>,
        ) -> Result<(), RuntimeError> {
            let mut log = self.0.borrow_mut();
            if log.fail_next {
                log.fail_next = false;
                return Err(RuntimeError::Load(crate::app::ProgramLoadError::new(
                    "syntax error",
                )));
            }
            log.executed.push(source.to_string());
            session.publish_frame(FrameBuffer::new(8, 8));
            log.session = Some(session);
            Ok(())
        }

        fn stop(&mut self) {
            let mut log = self.0.borrow_mut();
            log.stops += 1;
            log.session = None;
        }

        fn is_running(&self) -> bool {
            self.0.borrow().session.is_some()
        }
    }

    struct FixedEditor(Option<String>);

    impl Editor for FixedEditor {
        fn text(&mut self) -> Result<String, EditorError> {
            self.0.clone().ok_or_else(|| EditorError::Read {
                location: "memory".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })
        }
    }

    struct RecordingConsole(Rc<RefCell<Vec<String>>>);

    impl Console for RecordingConsole {
        fn clear(&mut self) {
            self.0.borrow_mut().clear();
        }

        fn write(&mut self, line: &str) {
            self.0.borrow_mut().push(line.to_string());
        }
    }

    struct Harness {
        stage: Stage,
        runtime: Rc<RefCell<RuntimeLog>>,
        console: Rc<RefCell<Vec<String>>>,
    }

    fn harness(source: Option<&str>) -> Harness {
        let runtime = Rc::new(RefCell::new(RuntimeLog::default()));
        let console = Rc::new(RefCell::new(vec!["old output".to_string()]));
        let mut canvas = Canvas::new(5);
        canvas.on_resize(120, 90);
        let stage = Stage::new(
            canvas,
            Box::new(FakeRuntime(Rc::clone(&runtime))),
            Box::new(FixedEditor(source.map(str::to_string))),
            Box::new(RecordingConsole(Rc::clone(&console))),
            Arc::new(OffsetKeyMap::default()),
        );
        Harness {
            stage,
            runtime,
            console,
        }
    }

    #[test]
    fn initial_state_is_stopped() {
        let h = harness(Some("code"));
        assert_eq!(h.stage.state(), PresentationState::Stopped);
        assert!(!h.stage.canvas().is_presenting());
    }

    #[test]
    fn play_runs_editor_text_and_reports_start() {
        let mut h = harness(Some("print(1)"));
        h.stage.play();

        assert_eq!(h.stage.state(), PresentationState::Playing);
        assert_eq!(h.runtime.borrow().executed, vec!["print(1)".to_string()]);
        assert_eq!(*h.console.borrow(), vec!["Starting program.".to_string()]);
        assert!(h.stage.canvas().is_presenting());
    }

    #[test]
    fn play_then_tick_paints_at_inset_and_stop_then_tick_does_not() {
        let mut h = harness(Some("code"));
        h.stage.play();

        let mut surface = RecordingSurface::default();
        assert_eq!(
            h.stage.canvas_mut().on_tick(&mut surface),
            TickOutcome::Painted
        );
        assert_eq!(surface.draws, vec![(5, 5, 110, 80)]);

        h.stage.stop();
        let mut surface = RecordingSurface::default();
        assert_eq!(
            h.stage.canvas_mut().on_tick(&mut surface),
            TickOutcome::Disabled
        );
        assert!(surface.draws.is_empty());
        assert_eq!(h.runtime.borrow().stops, 1);
    }

    #[test]
    fn play_while_playing_is_ignored() {
        let mut h = harness(Some("code"));
        h.stage.play();
        h.stage.play();
        assert_eq!(h.runtime.borrow().executed.len(), 1);
    }

    #[test]
    fn pause_twice_restores_paused_flag_and_keeps_presenting() {
        let mut h = harness(Some("code"));
        h.stage.play();
        let before = h.stage.is_paused();

        h.stage.pause();
        assert_eq!(h.stage.state(), PresentationState::Paused);
        assert!(h.stage.canvas().is_presenting());
        let mut surface = RecordingSurface::default();
        assert_eq!(
            h.stage.canvas_mut().on_tick(&mut surface),
            TickOutcome::Painted
        );

        h.stage.pause();
        assert_eq!(h.stage.is_paused(), before);
        assert_eq!(h.stage.state(), PresentationState::Playing);
        assert!(h.stage.canvas().is_presenting());
    }

    #[test]
    fn pause_while_stopped_is_noop() {
        let mut h = harness(Some("code"));
        h.stage.pause();
        assert_eq!(h.stage.state(), PresentationState::Stopped);
    }

    #[test]
    fn stop_from_paused_returns_to_stopped() {
        let mut h = harness(Some("code"));
        h.stage.play();
        h.stage.pause();
        h.stage.stop();

        assert_eq!(h.stage.state(), PresentationState::Stopped);
        assert!(h.stage.session().is_none());
        assert!(h.runtime.borrow().session.is_none());
    }

    #[test]
    fn stop_clears_session_input_and_detaches_bridge() {
        let mut h = harness(Some("code"));
        h.stage.play();
        let session = Arc::clone(h.stage.session().expect("session"));
        h.stage
            .canvas_mut()
            .on_key_down(RawKeyCode(97), Modifiers::empty(), false);
        assert!(session.is_key_held(GameKey(129)));

        h.stage.stop();
        h.stage
            .canvas_mut()
            .on_key_down(RawKeyCode(98), Modifiers::empty(), false);

        assert_eq!(session.pending_event_count(), 0);
        assert!(session.held_keys().is_empty());
        let frame = session.latest_frame().expect("frame");
        assert!(frame.pixels().iter().all(|&px| px == 0));
    }

    #[test]
    fn each_play_gets_a_fresh_session() {
        let mut h = harness(Some("code"));
        h.stage.play();
        let first = h.stage.session().expect("session").id();
        h.stage.stop();
        h.stage.play();
        let second = h.stage.session().expect("session").id();

        assert_ne!(first, second);
    }

    #[test]
    fn runtime_failure_rolls_back_to_stopped() {
        let mut h = harness(Some("code"));
        h.runtime.borrow_mut().fail_next = true;

        h.stage.play();

        assert_eq!(h.stage.state(), PresentationState::Stopped);
        assert!(!h.stage.canvas().is_presenting());
        assert_eq!(
            h.console.borrow().last().map(String::as_str),
            Some("failed to load program: syntax error")
        );
    }

    #[test]
    fn editor_failure_keeps_stage_stopped() {
        let mut h = harness(None);
        h.stage.play();

        assert_eq!(h.stage.state(), PresentationState::Stopped);
        assert!(h.runtime.borrow().executed.is_empty());
        let console = h.console.borrow();
        assert!(console
            .last()
            .is_some_and(|line| line.starts_with("failed to read program source")));
    }

    #[test]
    fn exited_runtime_stops_stage_and_reports() {
        let mut h = harness(Some("code"));
        h.stage.play();
        h.stage.pause();
        h.runtime.borrow_mut().session = None;

        h.stage.check_runtime();

        assert_eq!(h.stage.state(), PresentationState::Stopped);
        assert!(h.stage.session().is_none());
        assert!(!h.stage.canvas().is_presenting());
        assert_eq!(h.runtime.borrow().stops, 1);
        assert_eq!(
            h.console.borrow().last().map(String::as_str),
            Some(PROGRAM_EXITED_MESSAGE)
        );
    }

    #[test]
    fn running_or_stopped_runtime_check_is_noop() {
        let mut h = harness(Some("code"));
        h.stage.check_runtime();
        assert_eq!(h.stage.state(), PresentationState::Stopped);

        h.stage.play();
        h.stage.check_runtime();
        assert_eq!(h.stage.state(), PresentationState::Playing);
        assert_eq!(h.runtime.borrow().stops, 0);
        assert_eq!(*h.console.borrow(), vec!["Starting program.".to_string()]);
    }

    #[test]
    fn toolbar_actions_dispatch_and_close_forces_stop() {
        let mut h = harness(Some("code"));
        h.stage.trigger(ToolbarAction::Play);
        h.stage.trigger(ToolbarAction::Pause);
        assert_eq!(h.stage.state(), PresentationState::Paused);

        h.stage.close();
        assert_eq!(h.stage.state(), PresentationState::Stopped);
        assert_eq!(h.runtime.borrow().stops, 1);
    }
}
