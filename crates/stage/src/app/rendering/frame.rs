#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs as `0x00RRGGBB`.
    pub const fn to_word(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn from_word(word: u32) -> Self {
        Self {
            r: (word >> 16) as u8,
            g: (word >> 8) as u8,
            b: word as u8,
        }
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Off-screen RGB image the game draws into, one `0x00RRGGBB` word per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color.to_word());
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Rgb::from_word(
            self.pixels[y as usize * self.width as usize + x as usize],
        ))
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.pixels[y as usize * self.width as usize + x as usize] = color.to_word();
    }

    /// Fills the rectangle, clipped to the buffer.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgb) {
        let left = x.max(0) as i64;
        let top = y.max(0) as i64;
        let right = (x as i64 + width as i64).min(self.width as i64);
        let bottom = (y as i64 + height as i64).min(self.height as i64);
        if left >= right || top >= bottom {
            return;
        }

        let word = color.to_word();
        let stride = self.width as usize;
        for row in top as usize..bottom as usize {
            let start = row * stride;
            self.pixels[start + left as usize..start + right as usize].fill(word);
        }
    }

    /// Nearest-neighbour scales `self` into `dst`, reshaping `dst` to
    /// `width` x `height` and reusing its allocation.
    pub fn scale_into(&self, dst: &mut FrameBuffer, width: u32, height: u32) {
        dst.width = width;
        dst.height = height;
        dst.pixels.clear();
        if self.is_empty() {
            dst.pixels.resize(width as usize * height as usize, 0);
            return;
        }
        dst.pixels.reserve(width as usize * height as usize);

        let src_stride = self.width as usize;
        for y in 0..height as u64 {
            let src_y = (y * self.height as u64 / height as u64) as usize;
            let row = &self.pixels[src_y * src_stride..(src_y + 1) * src_stride];
            for x in 0..width as u64 {
                let src_x = (x * self.width as u64 / width as u64) as usize;
                dst.pixels.push(row[src_x]);
            }
        }
    }

    pub fn scaled(&self, width: u32, height: u32) -> FrameBuffer {
        let mut dst = FrameBuffer::new(0, 0);
        self.scale_into(&mut dst, width, height);
        dst
    }

    /// Copies `self` into an RGBA byte frame of `frame_width` x `frame_height`
    /// with the top-left corner at `(x, y)`, clipping at the frame edges.
    pub fn blit_rgba(&self, frame: &mut [u8], frame_width: u32, frame_height: u32, x: u32, y: u32) {
        if x >= frame_width || y >= frame_height {
            return;
        }
        let copy_width = self.width.min(frame_width - x) as usize;
        let copy_height = self.height.min(frame_height - y) as usize;
        let src_stride = self.width as usize;
        let dst_stride = frame_width as usize * 4;

        for row in 0..copy_height {
            let src = &self.pixels[row * src_stride..row * src_stride + copy_width];
            let dst_start = (y as usize + row) * dst_stride + x as usize * 4;
            let Some(dst) = frame.get_mut(dst_start..dst_start + copy_width * 4) else {
                return;
            };
            for (chunk, &word) in dst.chunks_exact_mut(4).zip(src) {
                chunk.copy_from_slice(&Rgb::from_word(word).to_rgba());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    #[test]
    fn rgb_word_packing_is_xrgb() {
        let color = Rgb::new(0x12, 0x34, 0x56);
        assert_eq!(color.to_word(), 0x0012_3456);
        assert_eq!(Rgb::from_word(0xff12_3456), color);
    }

    #[test]
    fn new_buffer_is_black() {
        let frame = FrameBuffer::new(2, 3);
        assert_eq!(frame.pixels().len(), 6);
        assert_eq!(frame.pixel(1, 2), Some(Rgb::BLACK));
        assert_eq!(frame.pixel(2, 0), None);
    }

    #[test]
    fn fill_rect_clips_to_bounds() {
        let mut frame = FrameBuffer::new(4, 4);
        frame.fill_rect(-2, 2, 4, 10, RED);

        assert_eq!(frame.pixel(0, 2), Some(RED));
        assert_eq!(frame.pixel(1, 3), Some(RED));
        assert_eq!(frame.pixel(2, 2), Some(Rgb::BLACK));
        assert_eq!(frame.pixel(0, 1), Some(Rgb::BLACK));
    }

    #[test]
    fn fill_rect_outside_is_noop() {
        let mut frame = FrameBuffer::new(4, 4);
        frame.fill_rect(10, 10, 3, 3, RED);
        frame.set_pixel(-1, 0, RED);
        assert!(frame.pixels().iter().all(|&px| px == 0));
    }

    #[test]
    fn upscale_repeats_source_pixels() {
        let mut src = FrameBuffer::new(2, 1);
        src.set_pixel(0, 0, RED);
        src.set_pixel(1, 0, BLUE);

        let scaled = src.scaled(4, 2);

        assert_eq!((scaled.width(), scaled.height()), (4, 2));
        assert_eq!(scaled.pixel(0, 0), Some(RED));
        assert_eq!(scaled.pixel(1, 1), Some(RED));
        assert_eq!(scaled.pixel(2, 0), Some(BLUE));
        assert_eq!(scaled.pixel(3, 1), Some(BLUE));
    }

    #[test]
    fn downscale_samples_nearest_pixel() {
        let mut src = FrameBuffer::new(4, 4);
        src.fill_rect(2, 2, 2, 2, RED);

        let scaled = src.scaled(2, 2);

        assert_eq!(scaled.pixel(0, 0), Some(Rgb::BLACK));
        assert_eq!(scaled.pixel(1, 1), Some(RED));
    }

    #[test]
    fn scale_into_zero_size_yields_empty_buffer() {
        let src = FrameBuffer::new(4, 4);
        let mut dst = FrameBuffer::new(8, 8);
        src.scale_into(&mut dst, 0, 5);
        assert!(dst.is_empty());
        assert!(dst.pixels().is_empty());
    }

    #[test]
    fn blit_writes_rgba_at_offset_and_clips() {
        let mut image = FrameBuffer::new(3, 3);
        image.fill(RED);
        let mut frame = vec![0u8; 4 * 4 * 4];

        image.blit_rgba(&mut frame, 4, 4, 2, 2);

        let pixel_at = |x: usize, y: usize| {
            let idx = (y * 4 + x) * 4;
            [frame[idx], frame[idx + 1], frame[idx + 2], frame[idx + 3]]
        };
        assert_eq!(pixel_at(2, 2), [255, 0, 0, 255]);
        assert_eq!(pixel_at(3, 3), [255, 0, 0, 255]);
        assert_eq!(pixel_at(1, 2), [0, 0, 0, 0]);
        assert_eq!(pixel_at(2, 1), [0, 0, 0, 0]);
    }
}
