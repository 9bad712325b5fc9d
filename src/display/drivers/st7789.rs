/*
 *  display/drivers/st7789.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  ST7789 240x240 TFT over SPI (mipidsi), plus the RGB565 panel adapter
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

use std::fmt::Debug;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::info;

use crate::display::error::DisplayError;
use crate::display::traits::{ColorDepth, DisplayCapabilities, DisplayDriver};
use crate::vframebuf::Bitmap;

/// Any RGB565 draw target driven as a whole-frame panel.
pub struct PanelDriver<T> {
    target: T,
    capabilities: DisplayCapabilities,
}

impl<T> PanelDriver<T>
where
    T: DrawTarget<Color = Rgb565>,
    T::Error: Debug,
{
    pub fn new(target: T, width: u32, height: u32, rotation: u16) -> Self {
        Self {
            target,
            capabilities: DisplayCapabilities {
                width,
                height,
                color_depth: ColorDepth::Rgb565,
                rotation,
                max_fps: 30,
            },
        }
    }

    fn area(&self) -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(self.capabilities.width, self.capabilities.height))
    }
}

impl<T> DisplayDriver for PanelDriver<T>
where
    T: DrawTarget<Color = Rgb565>,
    T::Error: Debug,
{
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    // the controller is brought up when the target is built
    fn init(&mut self) -> Result<(), DisplayError> {
        self.clear()
    }

    fn write_frame(&mut self, frame: &Bitmap) -> Result<(), DisplayError> {
        self.check_frame(frame)?;
        let area = self.area();
        self.target
            .fill_contiguous(&area, frame.as_slice().iter().map(|&c| Rgb565::from(c)))
            .map_err(|e| DisplayError::SpiError(format!("{e:?}")))
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let area = self.area();
        self.target
            .fill_solid(&area, Rgb565::BLACK)
            .map_err(|e| DisplayError::SpiError(format!("{e:?}")))?;
        info!("panel cleared");
        Ok(())
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use self::hardware::open;

#[cfg(all(feature = "hardware", target_os = "linux"))]
mod hardware {
    use super::PanelDriver;
    use crate::config::DisplayConfig;
    use crate::display::error::DisplayError;

    use embedded_graphics::pixelcolor::Rgb565;
    use embedded_graphics::prelude::DrawTarget;
    use log::info;
    use mipidsi::interface::SpiInterface;
    use mipidsi::models::ST7789;
    use mipidsi::options::{ColorInversion, Orientation, Rotation};
    use mipidsi::Builder;
    use rppal::gpio::Gpio;
    use rppal::hal::Delay;
    use rppal::spi::{Bus, Mode, SimpleHalSpiDevice, SlaveSelect, Spi};
    use std::fmt::Debug;

    fn rotation(degrees: u16) -> Result<Rotation, DisplayError> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(DisplayError::InvalidRotation(other)),
        }
    }

    fn slave_select(cs: u8) -> Result<SlaveSelect, DisplayError> {
        match cs {
            0 => Ok(SlaveSelect::Ss0),
            1 => Ok(SlaveSelect::Ss1),
            2 => Ok(SlaveSelect::Ss2),
            other => Err(DisplayError::InvalidConfiguration(format!("no SPI0 chip select {other}"))),
        }
    }

    /// Open SPI0 and the DC line, then initialise the ST7789.
    pub fn open(
        cfg: &DisplayConfig,
    ) -> Result<PanelDriver<impl DrawTarget<Color = Rgb565, Error: Debug>>, DisplayError> {
        let spi = Spi::new(Bus::Spi0, slave_select(cfg.spi_cs)?, cfg.spi_speed_hz, Mode::Mode0)
            .map_err(|e| DisplayError::SpiError(e.to_string()))?;
        let dc = Gpio::new()
            .and_then(|gpio| gpio.get(cfg.dc_pin))
            .map_err(|e| DisplayError::GpioError(format!("DC pin {}: {e}", cfg.dc_pin)))?
            .into_output();

        // the panel lives as long as the process, so its transfer buffer does too
        let buffer: &'static mut [u8] = Box::leak(vec![0u8; 4096].into_boxed_slice());
        let di = SpiInterface::new(SimpleHalSpiDevice::new(spi), dc, buffer);

        let mut builder = Builder::new(ST7789, di)
            .display_size(cfg.width as u16, cfg.height as u16)
            .display_offset(cfg.offset_x, cfg.offset_y)
            .orientation(Orientation::new().rotate(rotation(cfg.rotate_deg)?));
        if cfg.invert {
            builder = builder.invert_colors(ColorInversion::Inverted);
        }
        let display = builder
            .init(&mut Delay::new())
            .map_err(|e| DisplayError::InitializationFailed(format!("ST7789: {e:?}")))?;

        info!(
            "ST7789 {}x{} rot {} on SPI0.{} @ {} Hz",
            cfg.width, cfg.height, cfg.rotate_deg, cfg.spi_cs, cfg.spi_speed_hz
        );
        Ok(PanelDriver::new(display, cfg.width, cfg.height, cfg.rotate_deg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vframebuf::VarFrameBuf;
    use embedded_graphics::pixelcolor::Rgb888;

    #[test]
    fn test_panel_driver_converts_to_rgb565() {
        let target = VarFrameBuf::new(4, 4, Rgb565::GREEN);
        let mut panel = PanelDriver::new(target, 4, 4, 270);

        panel.write_frame(&Bitmap::new(4, 4, Rgb888::new(255, 0, 0))).unwrap();

        assert!(panel.target.as_slice().iter().all(|&c| c == Rgb565::RED));
    }

    #[test]
    fn test_panel_driver_init_clears() {
        let target = VarFrameBuf::new(2, 2, Rgb565::WHITE);
        let mut panel = PanelDriver::new(target, 2, 2, 0);
        panel.init().unwrap();
        assert!(panel.target.as_slice().iter().all(|&c| c == Rgb565::BLACK));
    }

    #[test]
    fn test_panel_driver_rejects_wrong_size() {
        let mut panel = PanelDriver::new(VarFrameBuf::new(4, 4, Rgb565::BLACK), 4, 4, 0);
        assert!(panel.write_frame(&Bitmap::new(3, 3, Rgb888::new(0, 0, 0))).is_err());
    }
}
