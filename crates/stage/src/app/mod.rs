mod bridge;
mod canvas;
mod input;
mod keyboard;
mod loop_runner;
mod metrics;
mod rendering;
mod runtime;
mod session;
mod stage;

pub use bridge::{InputBridge, KeyDownOutcome};
pub use canvas::{Canvas, CanvasHandler, CursorHint, WindowRequest};
pub use input::{
    GameKey, InputEvent, KeyEventKind, KeyMap, Modifiers, OffsetKeyMap, RawKeyCode,
    DEFAULT_KEY_CODE_OFFSET, ESCAPE_KEY, TOGGLE_FULLSCREEN_KEY,
};
pub use keyboard::{modifiers_from_state, raw_key_code, toolbar_action_for};
pub use loop_runner::{run_stage, run_stage_with_metrics, AppError, StageConfig, TARGET_TPS_ENV_VAR};
pub use metrics::{MetricsHandle, PresentMetricsSnapshot};
pub use rendering::{
    Affordance, DisplayRegion, FrameBuffer, FramePresenter, PaintSurface, PixelsSurface, Rgb,
    TickOutcome, Viewport,
};
pub use runtime::{
    GameProgram, GameRuntime, ProgramInput, ProgramLoadError, ProgramLoader, RuntimeConfig,
    RuntimeError, ThreadedRuntime,
};
pub use session::SessionContext;
pub use stage::{Console, Editor, EditorError, PresentationState, Stage, ToolbarAction};

#[cfg(test)]
pub(crate) use rendering::RecordingSurface;
