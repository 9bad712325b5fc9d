/*
 *  display/drivers/pwm_backlight.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Software PWM backlight on a GPIO pin (rppal)
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

use log::debug;
use rppal::gpio::{Gpio, OutputPin};

use crate::display::error::DisplayError;
use crate::display::traits::Backlight;

pub struct PwmBacklight {
    pin: OutputPin,
    frequency_hz: f64,
}

impl PwmBacklight {
    pub fn new(pin: u8, frequency_hz: f64) -> Result<Self, DisplayError> {
        let pin = Gpio::new()
            .and_then(|gpio| gpio.get(pin))
            .map_err(|e| DisplayError::GpioError(format!("backlight pin {pin}: {e}")))?
            .into_output_low();
        Ok(Self { pin, frequency_hz })
    }
}

impl Backlight for PwmBacklight {
    fn set_duty(&mut self, percent: u8) -> Result<(), DisplayError> {
        let percent = percent.min(100);
        debug!("backlight duty {}%", percent);
        if percent == 0 {
            // stop the PWM thread outright rather than run it at 0%
            self.pin
                .clear_pwm()
                .map_err(|e| DisplayError::GpioError(e.to_string()))?;
            self.pin.set_low();
            return Ok(());
        }
        self.pin
            .set_pwm_frequency(self.frequency_hz, percent as f64 / 100.0)
            .map_err(|e| DisplayError::GpioError(e.to_string()))
    }
}
