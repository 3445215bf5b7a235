use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::{Affordance, FrameBuffer, PaintSurface, Viewport};

const BACKGROUND_COLOR: [u8; 4] = [0, 0, 0, 255];
const ACTIVE_BORDER_COLOR: [u8; 4] = [0, 160, 0, 255];
const INACTIVE_BORDER_COLOR: [u8; 4] = [190, 0, 0, 255];

/// Window-backed paint surface. Pixel buffer and window share one physical size.
pub struct PixelsSurface {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    border_inset: u32,
}

impl PixelsSurface {
    pub fn new(window: Arc<Window>, border_inset: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            border_inset,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width.max(1), height.max(1), window);
        Pixels::new(width.max(1), height.max(1), surface)
    }

    /// Clears to the background and draws the border for `affordance`.
    pub fn begin_frame(&mut self, affordance: Affordance) {
        let border_color = match affordance {
            Affordance::Active => ACTIVE_BORDER_COLOR,
            Affordance::Inactive => INACTIVE_BORDER_COLOR,
        };
        let Viewport { width, height } = self.viewport;
        let inset = self.border_inset;
        let frame = self.pixels.frame_mut();

        for (index, chunk) in frame.chunks_exact_mut(4).enumerate() {
            let x = (index as u32) % width.max(1);
            let y = (index as u32) / width.max(1);
            let on_border = x < inset
                || y < inset
                || x >= width.saturating_sub(inset)
                || y >= height.saturating_sub(inset);
            chunk.copy_from_slice(if on_border {
                &border_color
            } else {
                &BACKGROUND_COLOR
            });
        }
    }

    pub fn render(&self) -> Result<(), Error> {
        self.pixels.render()
    }
}

impl PaintSurface for PixelsSurface {
    fn draw_image(&mut self, x: u32, y: u32, image: &FrameBuffer) {
        let Viewport { width, height } = self.viewport;
        image.blit_rgba(self.pixels.frame_mut(), width, height, x, y);
    }
}
