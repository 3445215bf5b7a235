use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{ModifiersState, PhysicalKey};
use winit::window::{CursorIcon, Fullscreen, Window, WindowBuilder};

use super::keyboard::{modifiers_from_state, raw_key_code, toolbar_action_for};
use super::metrics::MetricsAccumulator;
use super::{
    Canvas, CanvasHandler, Console, CursorHint, Editor, GameRuntime, KeyMap, MetricsHandle,
    Modifiers, OffsetKeyMap, PixelsSurface, RawKeyCode, RuntimeConfig, Stage, WindowRequest,
    DEFAULT_KEY_CODE_OFFSET,
};

pub const TARGET_TPS_ENV_VAR: &str = "STAGE_TARGET_TPS";

#[derive(Debug, Clone)]
pub struct StageConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub min_window_width: u32,
    pub min_window_height: u32,
    pub border_inset: u32,
    pub key_code_offset: i32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            window_title: "Stage".to_string(),
            window_width: 1280,
            window_height: 800,
            min_window_width: 1024,
            min_window_height: 768,
            border_inset: 5,
            key_code_offset: DEFAULT_KEY_CODE_OFFSET,
            frame_width: 320,
            frame_height: 240,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
        }
    }
}

impl StageConfig {
    /// Game-thread settings, with the tick rate taken from the environment
    /// when it is set to a valid value.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            target_tps: resolve_target_tps(self.target_tps),
            max_frame_delta: self.max_frame_delta,
            max_ticks_per_frame: self.max_ticks_per_frame,
        }
    }

    pub fn key_map(&self) -> Arc<dyn KeyMap> {
        Arc::new(OffsetKeyMap::new(self.key_code_offset))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_stage(
    config: StageConfig,
    runtime: Box<dyn GameRuntime>,
    editor: Box<dyn Editor>,
    console: Box<dyn Console>,
) -> Result<(), AppError> {
    run_stage_with_metrics(config, runtime, editor, console, MetricsHandle::default())
}

pub fn run_stage_with_metrics(
    config: StageConfig,
    runtime: Box<dyn GameRuntime>,
    editor: Box<dyn Editor>,
    console: Box<dyn Console>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .with_min_inner_size(LogicalSize::new(
                config.min_window_width as f64,
                config.min_window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut surface = PixelsSurface::new(Arc::clone(&window), config.border_inset)
        .map_err(AppError::CreateRenderer)?;

    let mut canvas = Canvas::new(config.border_inset);
    let size = window.inner_size();
    canvas.on_resize(size.width, size.height);
    let mut stage = Stage::new(canvas, runtime, editor, console, config.key_map());
    apply_window_requests(&window, stage.canvas_mut());

    event_loop.set_control_flow(ControlFlow::Poll);

    let metrics_log_interval = if config.metrics_log_interval.is_zero() {
        Duration::from_secs(1)
    } else {
        config.metrics_log_interval
    };
    info!(
        border_inset = config.border_inset,
        key_code_offset = config.key_code_offset,
        frame_width = config.frame_width,
        frame_height = config.frame_height,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "stage_config"
    );

    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut modifiers = ModifiersState::empty();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    stage.close();
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = surface.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                    stage
                        .canvas_mut()
                        .on_resize(new_size.width, new_size.height);
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = surface.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                    stage.canvas_mut().on_resize(size.width, size.height);
                }
                WindowEvent::ModifiersChanged(new_modifiers) => {
                    modifiers = new_modifiers.state();
                }
                WindowEvent::Focused(false) => {
                    stage.canvas_mut().on_focus_lost();
                    apply_window_requests(&window, stage.canvas_mut());
                }
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => {
                    stage.canvas_mut().on_focus_gained();
                    apply_window_requests(&window, stage.canvas_mut());
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let PhysicalKey::Code(code) = event.physical_key else {
                        return;
                    };
                    if let Some(action) = toolbar_action_for(code) {
                        if event.state == ElementState::Pressed && !event.repeat {
                            info!(action = ?action, "toolbar_action");
                            stage.trigger(action);
                        }
                        return;
                    }
                    let Some(raw) = raw_key_code(code) else {
                        return;
                    };
                    let canvas = stage.canvas_mut();
                    forward_key(
                        canvas,
                        raw,
                        event.state,
                        modifiers_from_state(modifiers),
                        event.repeat,
                    );
                    apply_window_requests(&window, canvas);
                }
                WindowEvent::RedrawRequested => {
                    stage.check_runtime();
                    surface.begin_frame(stage.canvas().affordance());
                    let outcome = stage.canvas_mut().on_tick(&mut surface);
                    if let Err(error) = surface.render() {
                        warn!(error = %error, "renderer_draw_failed");
                        stage.close();
                        window_target.exit();
                    }

                    metrics_accumulator.record_tick(outcome);
                    metrics_accumulator
                        .record_sim_ticks(stage.session().map(|s| (s.id(), s.sim_ticks())));
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(Instant::now()) {
                        metrics_handle.publish(snapshot);
                        info!(
                            present_fps = snapshot.present_fps,
                            sim_tps = snapshot.sim_tps,
                            blank_ticks = snapshot.blank_ticks,
                            state = ?stage.state(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                stage.close();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Presses reach the canvas only while it has focus. Releases always do, so
/// a key held across a focus change is still released.
fn forward_key(
    canvas: &mut Canvas,
    raw: RawKeyCode,
    state: ElementState,
    modifiers: Modifiers,
    is_auto_repeat: bool,
) {
    match state {
        ElementState::Pressed if canvas.has_focus() => {
            canvas.on_key_down(raw, modifiers, is_auto_repeat);
        }
        ElementState::Pressed => {}
        ElementState::Released => canvas.on_key_up(raw),
    }
}

fn apply_window_requests(window: &Window, canvas: &mut Canvas) {
    for request in canvas.take_window_requests() {
        match request {
            WindowRequest::EnterFullscreen => {
                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            }
            WindowRequest::ExitFullscreen => window.set_fullscreen(None),
            WindowRequest::SetCursor(CursorHint::Hidden) => window.set_cursor_visible(false),
            WindowRequest::SetCursor(CursorHint::Pointer) => {
                window.set_cursor_icon(CursorIcon::Pointer);
                window.set_cursor_visible(true);
            }
        }
    }
}

fn resolve_target_tps(config_target_tps: u32) -> u32 {
    match env::var(TARGET_TPS_ENV_VAR) {
        Ok(value) => match value.parse::<u32>() {
            Ok(tps) if tps > 0 => tps,
            _ => {
                warn!(
                    env_var = TARGET_TPS_ENV_VAR,
                    value = value.as_str(),
                    "invalid target tps env var value; falling back to config"
                );
                config_target_tps
            }
        },
        Err(env::VarError::NotPresent) => config_target_tps,
        Err(err) => {
            warn!(
                env_var = TARGET_TPS_ENV_VAR,
                error = %err,
                "unable to read target tps env var; falling back to config"
            );
            config_target_tps
        }
    }
}
