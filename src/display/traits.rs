/*
 *  display/traits.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Panel and backlight seams
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fmt;

use crate::display::error::DisplayError;
use crate::vframebuf::Bitmap;

/// Pixel format the panel takes on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    /// 16-bit 5-6-5, ST7789 and friends
    Rgb565,

    /// 24-bit, mostly for test doubles
    Rgb888,
}

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    /// Wire pixel format
    pub color_depth: ColorDepth,

    /// Mounting rotation applied by the controller, degrees
    pub rotation: u16,

    /// Maximum recommended frame rate
    pub max_fps: u32,
}

impl DisplayCapabilities {
    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }
}

impl fmt::Display for DisplayCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} {:?} rot {} up to {} fps",
            self.width, self.height, self.color_depth, self.rotation, self.max_fps
        )
    }
}

/// Minimal hardware abstraction for a full-frame colour panel
pub trait DisplayDriver {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Bring the controller up. Safe to call more than once.
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Push one whole frame. The frame must match `dimensions()`.
    fn write_frame(&mut self, frame: &Bitmap) -> Result<(), DisplayError>;

    /// Blank the panel
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Size check shared by drivers before they touch the bus
    fn check_frame(&self, frame: &Bitmap) -> Result<(), DisplayError> {
        let expected = self.capabilities().pixel_count();
        let actual = frame.as_slice().len();
        let (w, h) = self.dimensions();
        if actual != expected || frame.width() != w as usize || frame.height() != h as usize {
            return Err(DisplayError::BufferSizeMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Backlight with duty-cycle control
pub trait Backlight {
    /// Duty cycle in percent, 0 is fully off
    fn set_duty(&mut self, percent: u8) -> Result<(), DisplayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_summary() {
        let caps = DisplayCapabilities {
            width: 240,
            height: 240,
            color_depth: ColorDepth::Rgb565,
            rotation: 270,
            max_fps: 30,
        };
        assert_eq!(caps.pixel_count(), 57_600);
        assert_eq!(caps.to_string(), "240x240 Rgb565 rot 270 up to 30 fps");
    }
}
