/*
 *  display/sink.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame commit and activity-driven backlight
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

use log::{debug, info};

use crate::display::error::DisplayError;
use crate::display::traits::{Backlight, DisplayDriver};
use crate::vframebuf::Bitmap;

pub const BACKLIGHT_ON: u8 = 100;
pub const BACKLIGHT_OFF: u8 = 0;

/// Owns the panel and its backlight.
pub struct DisplaySink<D, B> {
    driver: D,
    backlight: B,
    /// Last duty that reached the hardware, None until the first call.
    lit: Option<bool>,
}

impl<D: DisplayDriver, B: Backlight> DisplaySink<D, B> {
    pub fn new(driver: D, backlight: B) -> Self {
        Self { driver, backlight, lit: None }
    }

    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.driver.init()?;
        info!("panel up: {}", self.driver.capabilities());
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.driver.dimensions()
    }

    /// Push a composed frame to the panel.
    pub fn commit(&mut self, frame: &Bitmap) -> Result<(), DisplayError> {
        self.driver.write_frame(frame)
    }

    /// Full duty when `active`, off otherwise. The pin is only touched on change.
    pub fn set_backlight(&mut self, active: bool) -> Result<(), DisplayError> {
        if self.lit == Some(active) {
            return Ok(());
        }
        self.backlight.set_duty(if active { BACKLIGHT_ON } else { BACKLIGHT_OFF })?;
        debug!("backlight {}", if active { "on" } else { "off" });
        self.lit = Some(active);
        Ok(())
    }

    /// Blank and darken, used on the way out.
    ///
    /// The backlight goes off even when the clear fails; the first error is returned.
    pub fn shutdown(&mut self) -> Result<(), DisplayError> {
        let cleared = self.driver.clear();
        let darkened = self.set_backlight(false);
        cleared.and(darkened)
    }
}
