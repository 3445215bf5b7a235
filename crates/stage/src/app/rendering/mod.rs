mod frame;
mod presenter;
mod surface;

pub use frame::{FrameBuffer, Rgb};
pub use presenter::{Affordance, DisplayRegion, FramePresenter, PaintSurface, TickOutcome};
pub use surface::PixelsSurface;

#[cfg(test)]
pub(crate) use presenter::tests::RecordingSurface;

/// Physical size of the host window in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}
