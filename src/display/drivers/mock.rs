/*
 *  display/drivers/mock.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock panel and backlight for testing without hardware
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

use embedded_graphics::pixelcolor::Rgb888;

use crate::display::error::DisplayError;
use crate::display::traits::{Backlight, ColorDepth, DisplayCapabilities, DisplayDriver};
use crate::vframebuf::Bitmap;

use std::sync::{Arc, Mutex};

/// Mock panel
///
/// Records every operation in a shared state the test keeps a handle to.
#[derive(Debug, Clone)]
pub struct MockPanel {
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<MockPanelState>>,
}

/// Internal state for the mock panel (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockPanelState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Frames accepted by write_frame()
    pub frames_written: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Copy of the last frame written
    pub last_frame: Option<Bitmap>,

    /// Simulate failures (for error testing)
    pub simulate_write_failure: bool,
    pub simulate_clear_failure: bool,
}

impl MockPanel {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            capabilities: DisplayCapabilities {
                width,
                height,
                color_depth: ColorDepth::Rgb888,
                rotation: 0,
                max_fps: 60,
            },
            state: Arc::new(Mutex::new(MockPanelState::default())),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockPanelState>> {
        Arc::clone(&self.state)
    }
}

impl DisplayDriver for MockPanel {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.state.lock().unwrap().init_count += 1;
        Ok(())
    }

    fn write_frame(&mut self, frame: &Bitmap) -> Result<(), DisplayError> {
        self.check_frame(frame)?;
        let mut state = self.state.lock().unwrap();
        if state.simulate_write_failure {
            return Err(DisplayError::SpiError("Simulated write failure".to_string()));
        }
        state.frames_written += 1;
        state.last_frame = Some(frame.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let blank = Bitmap::new(self.capabilities.width, self.capabilities.height, Rgb888::new(0, 0, 0));
        let mut state = self.state.lock().unwrap();
        if state.simulate_clear_failure {
            return Err(DisplayError::SpiError("Simulated clear failure".to_string()));
        }
        state.clear_count += 1;
        state.last_frame = Some(blank);
        Ok(())
    }
}

/// Mock backlight recording every duty cycle it is given
#[derive(Debug, Clone, Default)]
pub struct MockBacklight {
    duties: Arc<Mutex<Vec<u8>>>,
}

impl MockBacklight {
    pub fn duties(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.duties)
    }
}

impl Backlight for MockBacklight {
    fn set_duty(&mut self, percent: u8) -> Result<(), DisplayError> {
        self.duties.lock().unwrap().push(percent.min(100));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_panel_init() {
        let mut panel = MockPanel::new(240, 240);
        let state = panel.state();
        assert_eq!(state.lock().unwrap().init_count, 0);

        panel.init().unwrap();

        assert_eq!(state.lock().unwrap().init_count, 1);
        assert_eq!(panel.dimensions(), (240, 240));
    }

    #[test]
    fn test_mock_panel_simulated_failure() {
        let mut panel = MockPanel::new(2, 2);
        let frame = Bitmap::new(2, 2, Rgb888::new(1, 2, 3));

        panel.state().lock().unwrap().simulate_write_failure = true;
        assert!(panel.write_frame(&frame).is_err());

        panel.state().lock().unwrap().simulate_write_failure = false;
        assert!(panel.write_frame(&frame).is_ok());
        assert_eq!(panel.state().lock().unwrap().frames_written, 1);
    }

    #[test]
    fn test_mock_panel_clear() {
        let mut panel = MockPanel::new(2, 2);
        panel.write_frame(&Bitmap::new(2, 2, Rgb888::new(9, 9, 9))).unwrap();
        panel.clear().unwrap();
        let state = panel.state();
        let s = state.lock().unwrap();
        assert_eq!(s.clear_count, 1);
        assert_eq!(s.last_frame.as_ref().and_then(|f| f.pixel(1, 1)), Some(Rgb888::new(0, 0, 0)));
    }
}
