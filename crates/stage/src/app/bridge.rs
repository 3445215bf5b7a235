use std::sync::Arc;

use tracing::trace;

use super::{InputEvent, Modifiers, RawKeyCode, SessionContext, ESCAPE_KEY, TOGGLE_FULLSCREEN_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDownOutcome {
    /// A key-down event was queued for the game.
    Queued,
    /// Auto-repeat press: held state updated, nothing queued.
    Repeat,
    /// No session is running.
    Ignored,
    ExitFullscreen,
    ToggleFullscreen,
}

/// Translates host key events into the running session's event queue and
/// held-key set.
#[derive(Debug, Default)]
pub struct InputBridge {
    session: Option<Arc<SessionContext>>,
}

impl InputBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, session: Arc<SessionContext>) {
        self.session = Some(session);
    }

    pub fn detach(&mut self) -> Option<Arc<SessionContext>> {
        self.session.take()
    }

    pub fn is_attached(&self) -> bool {
        self.session.is_some()
    }

    pub fn on_key_down(
        &mut self,
        raw: RawKeyCode,
        modifiers: Modifiers,
        is_auto_repeat: bool,
    ) -> KeyDownOutcome {
        if raw == ESCAPE_KEY {
            return KeyDownOutcome::ExitFullscreen;
        }
        if raw == TOGGLE_FULLSCREEN_KEY {
            return KeyDownOutcome::ToggleFullscreen;
        }
        let Some(session) = self.session.as_ref() else {
            trace!(raw = raw.0, "key_down_without_session");
            return KeyDownOutcome::Ignored;
        };

        let key = session.key_map().map(raw);
        if is_auto_repeat {
            session.hold_key(key);
            return KeyDownOutcome::Repeat;
        }

        session.push_event(InputEvent::key_down(key, modifiers));
        session.hold_key(key);
        trace!(raw = raw.0, key = key.0, modifiers = modifiers.bits(), "key_down_queued");
        KeyDownOutcome::Queued
    }

    /// Releasing a key that is not held is a no-op.
    pub fn on_key_up(&mut self, raw: RawKeyCode) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let key = session.key_map().map(raw);
        if session.release_key(key) {
            trace!(raw = raw.0, key = key.0, "key_released");
        }
    }
}
