//! Embedded game canvas for a live-coding studio.
//!
//! The host window feeds key, focus, resize and redraw callbacks into a
//! [`Canvas`]. Key presses become [`InputEvent`]s and held-key state on the
//! running [`SessionContext`], and frames the game thread publishes there are
//! scaled into the window on every redraw. [`Stage`] drives the
//! stopped/playing/paused lifecycle around a [`GameRuntime`].

pub mod app;

pub use app::{
    modifiers_from_state, raw_key_code, run_stage, run_stage_with_metrics, toolbar_action_for,
    Affordance, AppError, Canvas, CanvasHandler, Console, CursorHint, DisplayRegion, Editor,
    EditorError, FrameBuffer, FramePresenter, GameKey, GameProgram, GameRuntime, InputBridge,
    InputEvent, KeyDownOutcome, KeyEventKind, KeyMap, MetricsHandle, Modifiers, OffsetKeyMap,
    PaintSurface, PixelsSurface, PresentMetricsSnapshot, PresentationState, ProgramInput,
    ProgramLoadError, ProgramLoader, RawKeyCode, Rgb, RuntimeConfig, RuntimeError,
    SessionContext, Stage, StageConfig, ThreadedRuntime, TickOutcome, ToolbarAction, Viewport,
    WindowRequest, DEFAULT_KEY_CODE_OFFSET, ESCAPE_KEY, TARGET_TPS_ENV_VAR,
    TOGGLE_FULLSCREEN_KEY,
};
