use serde::Deserialize;
use stage::{
    FrameBuffer, GameProgram, KeyEventKind, ProgramInput, ProgramLoadError, ProgramLoader,
    RawKeyCode, Rgb,
};
use tracing::{debug, info};

const PALETTE: [Rgb; 4] = [
    Rgb::new(80, 220, 255),
    Rgb::new(255, 210, 70),
    Rgb::new(255, 120, 120),
    Rgb::new(170, 255, 140),
];

pub(crate) const DEFAULT_PROGRAM: &str = r#"{
  "background": [20, 22, 28],
  "player": { "color": [220, 220, 240], "size": 12, "speed": 90.0 }
}
"#;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DemoSource {
    background: [u8; 3],
    player: PlayerSource,
}

impl Default for DemoSource {
    fn default() -> Self {
        Self {
            background: [20, 22, 28],
            player: PlayerSource::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PlayerSource {
    color: [u8; 3],
    size: u32,
    /// Frame pixels per second.
    speed: f32,
}

impl Default for PlayerSource {
    fn default() -> Self {
        Self {
            color: [220, 220, 240],
            size: 12,
            speed: 90.0,
        }
    }
}

fn parse_demo_source(raw: &str) -> Result<DemoSource, ProgramLoadError> {
    if raw.trim().is_empty() {
        return Ok(DemoSource::default());
    }
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, DemoSource>(&mut deserializer) {
        Ok(source) => Ok(source),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(ProgramLoadError::new(format!("parse program json: {source}")))
            } else {
                Err(ProgramLoadError::new(format!(
                    "parse program json at {path}: {source}"
                )))
            }
        }
    }
}

/// Loads the demo program: a square steered with the arrow or WASD keys.
pub(crate) struct DemoLoader {
    frame_width: u32,
    frame_height: u32,
}

impl DemoLoader {
    pub(crate) fn new(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
        }
    }
}

impl ProgramLoader for DemoLoader {
    fn load(&self, source: &str) -> Result<Box<dyn GameProgram>, ProgramLoadError> {
        let source = parse_demo_source(source)?;
        if !source.player.speed.is_finite() || source.player.speed < 0.0 {
            return Err(ProgramLoadError::new(format!(
                "validation failed at player.speed: expected a non-negative number, got {}",
                source.player.speed
            )));
        }
        let max_size = self.frame_width.min(self.frame_height);
        if source.player.size > max_size {
            return Err(ProgramLoadError::new(format!(
                "validation failed at player.size: expected at most {max_size}, got {}",
                source.player.size
            )));
        }
        info!(
            size = source.player.size,
            speed = source.player.speed,
            "demo_program_loaded"
        );
        Ok(Box::new(DemoProgram::new(
            source,
            self.frame_width,
            self.frame_height,
        )))
    }
}

struct DemoProgram {
    background: Rgb,
    color: Rgb,
    palette_index: Option<usize>,
    size: u32,
    speed: f32,
    position: (f32, f32),
    bounds: (f32, f32),
}

impl DemoProgram {
    fn new(source: DemoSource, frame_width: u32, frame_height: u32) -> Self {
        let [r, g, b] = source.background;
        let [pr, pg, pb] = source.player.color;
        Self {
            background: Rgb::new(r, g, b),
            color: Rgb::new(pr, pg, pb),
            palette_index: None,
            size: source.player.size,
            speed: source.player.speed,
            position: (frame_width as f32 * 0.5, frame_height as f32 * 0.5),
            bounds: (frame_width as f32, frame_height as f32),
        }
    }

    fn cycle_color(&mut self) {
        let next = self.palette_index.map_or(0, |index| (index + 1) % PALETTE.len());
        self.palette_index = Some(next);
        self.color = PALETTE[next];
        debug!(palette_index = next, "demo_color_cycled");
    }
}

fn axis(input: &ProgramInput<'_>, negative: [RawKeyCode; 2], positive: [RawKeyCode; 2]) -> f32 {
    let held = |keys: [RawKeyCode; 2]| keys.iter().any(|&raw| input.is_held(input.key(raw)));
    match (held(negative), held(positive)) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

/// Keeps a square of half-size `half` inside `0..extent`, centring it when it
/// cannot fit.
fn clamp_axis(value: f32, half: f32, extent: f32) -> f32 {
    let high = extent - half;
    if half > high {
        extent * 0.5
    } else {
        value.clamp(half, high)
    }
}

fn letter(ch: char) -> RawKeyCode {
    RawKeyCode::from_ascii(ch).unwrap_or(RawKeyCode::SPACE)
}

impl GameProgram for DemoProgram {
    fn update(&mut self, dt_seconds: f32, input: &mut ProgramInput<'_>) {
        let space = input.key(RawKeyCode::SPACE);
        while let Some(event) = input.next_event() {
            if event.kind == KeyEventKind::KeyDown && event.code == space {
                self.cycle_color();
            }
        }

        let dx = axis(
            input,
            [RawKeyCode::LEFT, letter('a')],
            [RawKeyCode::RIGHT, letter('d')],
        );
        let dy = axis(
            input,
            [RawKeyCode::UP, letter('w')],
            [RawKeyCode::DOWN, letter('s')],
        );
        let step = self.speed * dt_seconds;
        let half = self.size as f32 * 0.5;
        self.position.0 = clamp_axis(self.position.0 + dx * step, half, self.bounds.0);
        self.position.1 = clamp_axis(self.position.1 + dy * step, half, self.bounds.1);
    }

    fn render(&mut self, frame: &mut FrameBuffer) {
        frame.fill(self.background);
        let half = i32::try_from(self.size / 2).unwrap_or(i32::MAX);
        frame.fill_rect(
            (self.position.0.round() as i32).saturating_sub(half),
            (self.position.1.round() as i32).saturating_sub(half),
            self.size,
            self.size,
            self.color,
        );
    }
}
