/*
 *  vframebuf.rs
 *
 *  CoverHat - artwork on a hat
 *	(c) 2020-26 Stuart Hunter
 *
 *	Runtime-sized framebuffers: the RGB panel bitmap and 1-bit overlay masks
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{BinaryColor, PixelColor, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// A runtime-sized framebuffer for embedded-graphics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarFrameBuf<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

/// Full-colour frame as pushed to the panel.
pub type Bitmap = VarFrameBuf<Rgb888>;

/// Coverage mask an overlay layer is rasterised into before blending.
pub type Mask = VarFrameBuf<BinaryColor>;

impl<C: PixelColor> VarFrameBuf<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    /// Wrap an existing row-major pixel vector; None when the length does not match.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<C>) -> Option<Self> {
        let (w, h) = (width as usize, height as usize);
        (pixels.len() == w * h).then_some(Self { buf: pixels, w, h })
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    /// Immutable raw access, row-major (useful for pushing to the panel)
    pub fn as_slice(&self) -> &[C] { &self.buf }

    /// Clear to a color
    pub fn clear_color(&mut self, color: C) {
        self.buf.fill(color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<C> {
        self.idx(Point::new(x as i32, y as i32)).map(|i| self.buf[i])
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl Bitmap {
    /// Composite `color` at `alpha` over every pixel set in `mask`.
    ///
    /// The mask must have the bitmap's dimensions; pixels outside the
    /// overlap are left alone.
    pub fn blend_mask(&mut self, mask: &Mask, color: Rgb888, alpha: u8) {
        let w = self.w.min(mask.w);
        let h = self.h.min(mask.h);
        for y in 0..h {
            for x in 0..w {
                if mask.buf[y * mask.w + x] == BinaryColor::On {
                    let i = y * self.w + x;
                    self.buf[i] = blend(self.buf[i], color, alpha);
                }
            }
        }
    }
}

#[inline]
fn blend_channel(dst: u8, src: u8, alpha: u8) -> u8 {
    let a = alpha as u16;
    ((src as u16 * a + dst as u16 * (255 - a) + 127) / 255) as u8
}

/// Source-over blend of `src` at `alpha` onto `dst`.
pub fn blend(dst: Rgb888, src: Rgb888, alpha: u8) -> Rgb888 {
    Rgb888::new(
        blend_channel(dst.r(), src.r(), alpha),
        blend_channel(dst.g(), src.g(), alpha),
        blend_channel(dst.b(), src.b(), alpha),
    )
}

impl<C: PixelColor> OriginDimensions for VarFrameBuf<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor> DrawTarget for VarFrameBuf<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // walk the full area so clipped rows keep the iterator aligned
        let Size { width, height } = area.size;
        let mut it = colors.into_iter();
        for dy in 0..height as i32 {
            for dx in 0..width as i32 {
                let Some(c) = it.next() else { return Ok(()) };
                if let Some(i) = self.idx(area.top_left + Point::new(dx, dy)) {
                    self.buf[i] = c;
                }
            }
        }
        Ok(())
    }
}
