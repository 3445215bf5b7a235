use std::sync::Arc;

use tracing::{debug, info};

use crate::app::SessionContext;

use super::FrameBuffer;

/// Sink the host paints presented frames into.
pub trait PaintSurface {
    fn draw_image(&mut self, x: u32, y: u32, image: &FrameBuffer);
}

/// Paintable canvas area after the border inset is removed on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayRegion {
    pub width: u32,
    pub height: u32,
}

impl DisplayRegion {
    pub fn inset_from(width: u32, height: u32, border_inset: u32) -> Self {
        let border = border_inset.saturating_mul(2);
        Self {
            width: width.saturating_sub(border),
            height: height.saturating_sub(border),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Border colour shown around the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Painted,
    /// Presentation is enabled but there was no frame or no room to paint it.
    Blank,
    Disabled,
}

#[derive(Debug)]
pub struct FramePresenter {
    border_inset: u32,
    region: DisplayRegion,
    enabled: bool,
    affordance: Affordance,
    session: Option<Arc<SessionContext>>,
    scaled: FrameBuffer,
}

impl FramePresenter {
    pub fn new(border_inset: u32) -> Self {
        Self {
            border_inset,
            region: DisplayRegion::default(),
            enabled: false,
            affordance: Affordance::Inactive,
            session: None,
            scaled: FrameBuffer::new(0, 0),
        }
    }

    pub fn region(&self) -> DisplayRegion {
        self.region
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn affordance(&self) -> Affordance {
        self.affordance
    }

    pub(crate) fn attach(&mut self, session: Arc<SessionContext>) {
        self.session = Some(session);
    }

    pub(crate) fn detach(&mut self) -> Option<Arc<SessionContext>> {
        self.session.take()
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.region = DisplayRegion::inset_from(width, height, self.border_inset);
        debug!(
            width = self.region.width,
            height = self.region.height,
            "display_region_resized"
        );
    }

    pub fn on_tick(&mut self, surface: &mut dyn PaintSurface) -> TickOutcome {
        if !self.enabled {
            return TickOutcome::Disabled;
        }
        if self.region.is_empty() {
            return TickOutcome::Blank;
        }
        let Some(frame) = self.session.as_ref().and_then(|s| s.latest_frame()) else {
            return TickOutcome::Blank;
        };
        if frame.is_empty() {
            return TickOutcome::Blank;
        }

        frame.scale_into(&mut self.scaled, self.region.width, self.region.height);
        surface.draw_image(self.border_inset, self.border_inset, &self.scaled);
        TickOutcome::Painted
    }

    pub fn play(&mut self) {
        self.enabled = true;
        self.affordance = Affordance::Active;
        info!("presentation_enabled");
    }

    pub fn stop(&mut self) {
        if let Some(session) = &self.session {
            session.clear_frame_to_black();
        }
        self.enabled = false;
        self.affordance = Affordance::Inactive;
        info!("presentation_disabled");
    }
}
