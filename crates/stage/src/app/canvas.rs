use std::sync::Arc;

use tracing::info;

use super::bridge::{InputBridge, KeyDownOutcome};
use super::{
    Affordance, FramePresenter, Modifiers, PaintSurface, RawKeyCode, SessionContext, TickOutcome,
};

/// Callbacks the host window dispatches to the embedded canvas, in order, on
/// the GUI thread.
pub trait CanvasHandler {
    fn on_key_down(&mut self, raw: RawKeyCode, modifiers: Modifiers, is_auto_repeat: bool);
    fn on_key_up(&mut self, raw: RawKeyCode);
    fn on_focus_gained(&mut self);
    fn on_focus_lost(&mut self);
    fn on_resize(&mut self, width: u32, height: u32);
    fn on_tick(&mut self, surface: &mut dyn PaintSurface) -> TickOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Hidden,
    Pointer,
}

/// Changes the canvas asks the host window to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    EnterFullscreen,
    ExitFullscreen,
    SetCursor(CursorHint),
}

#[derive(Debug)]
pub struct Canvas {
    bridge: InputBridge,
    presenter: FramePresenter,
    fullscreen: bool,
    focused: bool,
    requests: Vec<WindowRequest>,
}

impl Canvas {
    pub fn new(border_inset: u32) -> Self {
        Self {
            bridge: InputBridge::new(),
            presenter: FramePresenter::new(border_inset),
            fullscreen: false,
            focused: false,
            requests: vec![WindowRequest::SetCursor(CursorHint::Pointer)],
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn affordance(&self) -> Affordance {
        self.presenter.affordance()
    }

    pub fn is_presenting(&self) -> bool {
        self.presenter.is_enabled()
    }

    pub fn take_window_requests(&mut self) -> Vec<WindowRequest> {
        std::mem::take(&mut self.requests)
    }

    pub(crate) fn attach_session(&mut self, session: Arc<SessionContext>) {
        self.bridge.attach(Arc::clone(&session));
        self.presenter.attach(session);
    }

    pub fn play(&mut self) {
        self.presenter.play();
    }

    /// Disables presentation, blanks the frame, and detaches the session so
    /// no further input reaches it.
    pub fn stop(&mut self) {
        self.presenter.stop();
        self.presenter.detach();
        if let Some(session) = self.bridge.detach() {
            session.clear_input();
        }
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        if self.fullscreen == fullscreen {
            return;
        }
        self.fullscreen = fullscreen;
        self.requests.push(if fullscreen {
            WindowRequest::EnterFullscreen
        } else {
            WindowRequest::ExitFullscreen
        });
        info!(fullscreen, "presentation_mode_changed");
    }
}

impl CanvasHandler for Canvas {
    fn on_key_down(&mut self, raw: RawKeyCode, modifiers: Modifiers, is_auto_repeat: bool) {
        match self.bridge.on_key_down(raw, modifiers, is_auto_repeat) {
            KeyDownOutcome::ExitFullscreen => {
                self.set_fullscreen(false);
                self.on_focus_lost();
            }
            KeyDownOutcome::ToggleFullscreen => {
                if !is_auto_repeat {
                    self.set_fullscreen(!self.fullscreen);
                }
            }
            KeyDownOutcome::Queued | KeyDownOutcome::Repeat | KeyDownOutcome::Ignored => {}
        }
    }

    fn on_key_up(&mut self, raw: RawKeyCode) {
        self.bridge.on_key_up(raw);
    }

    fn on_focus_gained(&mut self) {
        if !self.focused {
            self.focused = true;
            self.requests
                .push(WindowRequest::SetCursor(CursorHint::Hidden));
        }
    }

    fn on_focus_lost(&mut self) {
        if self.focused {
            self.focused = false;
            self.requests
                .push(WindowRequest::SetCursor(CursorHint::Pointer));
        }
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.presenter.on_resize(width, height);
    }

    fn on_tick(&mut self, surface: &mut dyn PaintSurface) -> TickOutcome {
        self.presenter.on_tick(surface)
    }
}
