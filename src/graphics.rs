//! Graphics Support for renderers built on embedded-graphics
//!
//! [`FrameCanvas`] is a packed 1bpp buffer in renderer polarity (`BinaryColor::On` = bit set = ink),
//! exactly what [`FlushBridge::flush`](crate::bridge::FlushBridge::flush) takes.
//! Rotation is not applied here, the bridge maps logical coordinates to the panel.

use embedded_graphics_core::{pixelcolor::BinaryColor, prelude::*, primitives::Rectangle};

use crate::geometry::Area;

impl From<Rectangle> for Area {
    fn from(rect: Rectangle) -> Area {
        Area::new(
            rect.top_left.x,
            rect.top_left.y,
            rect.size.width as i32,
            rect.size.height as i32,
        )
    }
}

/// count the number of bytes per line knowing that it may contains padding bits
const fn line_bytes(width: u32) -> usize {
    // round to upper 8 bit count
    (width as usize + 7) / 8
}

/// Error found during usage of FrameCanvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCanvasError {
    /// The provided buffer was too small
    BufferTooSmall,
}

/// A renderer side drawing surface of runtime size over a caller provided buffer
pub struct FrameCanvas<'a> {
    width: u32,
    height: u32,
    buffer: &'a mut [u8],
}

impl<'a> FrameCanvas<'a> {
    /// You must allocate the buffer by yourself, it must hold `ceil(width / 8) * height` bytes.
    /// The canvas starts out blank.
    pub fn new(width: u32, height: u32, buffer: &'a mut [u8]) -> Result<Self, FrameCanvasError> {
        let size = line_bytes(width) * height as usize;
        if size > buffer.len() {
            return Err(FrameCanvasError::BufferTooSmall);
        }
        let buffer = &mut buffer[..size];
        buffer.fill(0);
        Ok(FrameCanvas {
            width,
            height,
            buffer,
        })
    }

    /// get internal buffer to hand it to the bridge
    pub fn buffer(&self) -> &[u8] {
        &*self.buffer
    }

    /// Bytes between two rows of [`buffer`](FrameCanvas::buffer)
    pub fn row_stride(&self) -> usize {
        line_bytes(self.width)
    }

    /// The area the canvas covers when its top left corner sits at `origin`
    pub fn area_at(&self, origin: Point) -> Area {
        Area::new(origin.x, origin.y, self.width as i32, self.height as i32)
    }

    /// Set a specific pixel color on this canvas, pixels outside are ignored
    pub fn set_pixel(&mut self, pixel: Pixel<BinaryColor>) {
        let Pixel(point, color) = pixel;
        if point.x < 0 || point.y < 0 || point.x >= self.width as i32 || point.y >= self.height as i32
        {
            return;
        }
        let index = point.y as usize * line_bytes(self.width) + point.x as usize / 8;
        let mask = 0x80 >> (point.x as u32 % 8);
        if color.is_on() {
            self.buffer[index] |= mask;
        } else {
            self.buffer[index] &= !mask;
        }
    }
}

/// For use with embedded_grahics
impl<'a> DrawTarget for FrameCanvas<'a> {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for pixel in pixels {
            self.set_pixel(pixel);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let byte = if color.is_on() { 0xFF } else { 0x00 };
        self.buffer.fill(byte);
        Ok(())
    }
}

/// For use with embedded_grahics
impl<'a> OriginDimensions for FrameCanvas<'a> {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
