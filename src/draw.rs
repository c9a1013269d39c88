use std::borrow::Cow;

use anyhow::{bail, ensure, Result};
use gif::Frame;
use tracing::{debug, trace};

use crate::encode::AnimationParameters;

/// First row covered by the block.
pub const BLOCK_TOP: i64 = 4;
/// Last row covered by the block (inclusive).
pub const BLOCK_BOTTOM: i64 = 20;

/// A 1-bit raster. Each pixel is stored as a palette index, 0 for off and 1 for on,
/// so the buffer can go straight into a gif frame.
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Turns on every pixel in `[x0, x1] x [y0, y1]`, both ends inclusive.
    /// Whatever lies outside the bitmap is clipped, never wrapped.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64) {
        let clamp = |v: i64, len: usize| v.clamp(0, len as i64);
        let (left, right) = (clamp(x0, self.width), clamp(x1.saturating_add(1), self.width));
        let (top, bottom) = (clamp(y0, self.height), clamp(y1.saturating_add(1), self.height));
        for y in top..bottom {
            let row = y as usize * self.width;
            for x in left..right {
                self.pixels[row + x as usize] = 1;
            }
        }
    }

    pub fn into_indices(self) -> Vec<u8> {
        self.pixels
    }
}

#[cfg(test)]
impl Bitmap {
    /// Out of bounds reads as off.
    fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x] != 0
    }
}

/// Left edge of the block in frame `frame_nr`.
pub fn block_offset(frame_nr: usize, width: usize, frame_count: usize) -> usize {
    (frame_nr * (width / frame_count)) % width
}

pub trait Drawable {
    fn draw_func(&mut self, bitmap: &mut Bitmap, frame_nr: usize) -> Result<()>;
}

/// A solid block that slides one step to the right every frame.
#[derive(Debug, Copy, Clone)]
pub struct MovingBlock {
    pub block_size: usize,
    pub frame_count: usize,
}

impl Drawable for MovingBlock {
    fn draw_func(&mut self, bitmap: &mut Bitmap, frame_nr: usize) -> Result<()> {
        let x = block_offset(frame_nr, bitmap.width(), self.frame_count) as i64;
        let size = i64::try_from(self.block_size).unwrap_or(i64::MAX);
        debug!(frame_nr, x, "drawing block");
        bitmap.fill_rect(
            x,
            BLOCK_TOP,
            x.saturating_add(size),
            BLOCK_BOTTOM,
        );
        Ok(())
    }
}

pub struct Drawer<D: Drawable> {
    width: u16,
    height: u16,
    drawable: D,
}

impl<D: Drawable> Drawer<D> {
    pub fn new(width: usize, height: usize, drawable: D) -> Result<Self> {
        ensure!(width > 0 && height > 0, "frame must not be empty, got {width}x{height}");
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            bail!("{width}x{height} does not fit a gif logical screen");
        };
        Ok(Self {
            width: w,
            height: h,
            drawable,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn draw_frame(&mut self, frame_nr: usize) -> Result<Frame<'static>> {
        let mut bitmap = Bitmap::new(self.width as usize, self.height as usize);
        self.drawable.draw_func(&mut bitmap, frame_nr)?;
        Ok(Frame {
            width: self.width,
            height: self.height,
            buffer: Cow::Owned(bitmap.into_indices()),
            ..Default::default()
        })
    }
}

pub fn animate_gif<D: Drawable>(
    mut drawer: Drawer<D>,
    frame_count: usize,
    params: AnimationParameters,
) -> impl Iterator<Item = Result<Frame<'static>>> {
    (0..frame_count).map(move |i| {
        let mut frame = drawer.draw_frame(i)?;
        frame.delay = params.delay_cs();
        trace!(frame_nr = i, delay = frame.delay, "frame ready");
        Ok(frame)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_frames(width: usize, height: usize, count: usize, block: usize) -> Vec<Frame<'static>> {
        let drawer = Drawer::new(
            width,
            height,
            MovingBlock {
                block_size: block,
                frame_count: count,
            },
        )
        .unwrap();
        animate_gif(drawer, count, AnimationParameters::default())
            .collect::<Result<_>>()
            .unwrap()
    }

    fn covered(frame: &Frame, width: usize, x: usize, y: usize) -> bool {
        frame.buffer[y * width + x] == 1
    }

    #[test]
    fn fill_rect_is_inclusive() {
        let mut bitmap = Bitmap::new(10, 10);
        bitmap.fill_rect(2, 3, 4, 5);
        let on: usize = bitmap.clone().into_indices().iter().map(|&p| p as usize).sum();
        assert_eq!(on, 9);
        assert!(bitmap.get(2, 3));
        assert!(bitmap.get(4, 5));
        assert!(!bitmap.get(5, 5));
        assert!(!bitmap.get(4, 6));
    }

    #[test]
    fn fill_rect_clips_instead_of_wrapping() {
        let mut bitmap = Bitmap::new(8, 4);
        bitmap.fill_rect(6, -2, 12, 1);
        for y in 0..4 {
            for x in 0..8 {
                assert_eq!(bitmap.get(x, y), x >= 6 && y <= 1, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn fill_rect_fully_outside_draws_nothing() {
        let mut bitmap = Bitmap::new(8, 4);
        bitmap.fill_rect(20, 0, 30, 3);
        bitmap.fill_rect(-10, 0, -1, 3);
        assert!(bitmap.into_indices().iter().all(|&p| p == 0));
    }

    #[test]
    fn get_outside_reads_off() {
        let mut bitmap = Bitmap::new(3, 3);
        bitmap.fill_rect(0, 0, 5, 5);
        assert!(bitmap.get(2, 2));
        assert!(!bitmap.get(3, 0));
        assert!(!bitmap.get(0, 3));
    }

    #[test]
    fn offsets_step_by_width_over_count() {
        let offsets: Vec<_> = (0..8).map(|i| block_offset(i, 96, 8)).collect();
        assert_eq!(offsets, vec![0, 12, 24, 36, 48, 60, 72, 84]);
        assert_eq!(block_offset(3, 10, 3), 9);
        assert_eq!(block_offset(4, 10, 3), 2);
    }

    #[test]
    fn block_moves_across_frames() {
        let frames = block_frames(96, 24, 8, 12);
        assert_eq!(frames.len(), 8);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!((frame.width, frame.height), (96, 24));
            assert_eq!(frame.delay, 50);
            let left = 12 * i;
            let right = (left + 12).min(95);
            for y in 0..24 {
                for x in 0..96 {
                    let inside = (left..=right).contains(&x) && (4..=20).contains(&y);
                    assert_eq!(covered(frame, 96, x, y), inside, "frame {i} pixel ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn last_frame_is_clipped_at_right_edge() {
        let frames = block_frames(96, 24, 8, 12);
        let last = &frames[7];
        assert!(covered(last, 96, 84, 4));
        assert!(covered(last, 96, 95, 20));
        assert!(!covered(last, 96, 0, 4));
    }

    #[test]
    fn zero_frames_yield_nothing() {
        assert!(block_frames(96, 24, 0, 12).is_empty());
    }

    #[test]
    fn drawer_rejects_unencodable_dimensions() {
        let block = MovingBlock {
            block_size: 1,
            frame_count: 1,
        };
        assert!(Drawer::new(0, 10, block).is_err());
        assert!(Drawer::new(70_000, 10, block).is_err());
        assert!(Drawer::new(10, 10, block).is_ok());
    }

    #[test]
    fn huge_block_is_clipped_not_dropped() {
        let mut block = MovingBlock {
            block_size: usize::MAX,
            frame_count: 2,
        };
        let mut bitmap = Bitmap::new(10, 24);
        block.draw_func(&mut bitmap, 1).unwrap();
        for y in 0..24 {
            for x in 0..10 {
                let inside = x >= 5 && (4..=20).contains(&y);
                assert_eq!(bitmap.get(x, y), inside, "pixel ({x}, {y})");
            }
        }
        let on: usize = bitmap.into_indices().iter().map(|&p| p as usize).sum();
        assert_eq!(on, 85);
    }
}
