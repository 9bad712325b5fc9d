/*
 *  display/error.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error type for the panel, backlight and GPIO side
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
use std::error::Error;

/// Unified error type for all display operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// Hardware initialization failed
    InitializationFailed(String),

    /// SPI communication error
    SpiError(String),

    /// GPIO pin error (DC line, backlight PWM)
    GpioError(String),

    /// Invalid configuration
    InvalidConfiguration(String),

    /// Invalid rotation angle
    InvalidRotation(u16),

    /// Frame does not match the panel
    BufferSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::SpiError(msg) =>
                write!(f, "SPI communication error: {}", msg),
            DisplayError::GpioError(msg) =>
                write!(f, "GPIO error: {}", msg),
            DisplayError::InvalidConfiguration(msg) =>
                write!(f, "Invalid configuration: {}", msg),
            DisplayError::InvalidRotation(degrees) =>
                write!(f, "Invalid rotation angle: {} (must be 0, 90, 180, or 270)", degrees),
            DisplayError::BufferSizeMismatch { expected, actual } =>
                write!(f, "Frame size mismatch: expected {} pixels, got {}", expected, actual),
        }
    }
}

impl Error for DisplayError {}
