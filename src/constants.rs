//! This module contains global constants used across the render, display and button modules.

use std::time::Duration;

/// The total width of the panel in pixels.
pub const DISPLAY_WIDTH: u32 = 240;
/// The total height of the panel in pixels.
pub const DISPLAY_HEIGHT: u32 = 240;
/// Panel mounting rotation in degrees.
pub const DISPLAY_ROTATION_DEG: u16 = 270;

// ST7789 wiring on the four-button hat
pub const SPI_SPEED_HZ: u32 = 60_000_000;
pub const SPI_SLAVE_SELECT: u8 = 1;
pub const DC_PIN: u8 = 9;
pub const BACKLIGHT_PIN: u8 = 13;
pub const BACKLIGHT_PWM_HZ: f64 = 500.0;

/// BCM pins for the A, B, X and Y buttons, in that order.
pub const BUTTON_PINS: [u8; 4] = [5, 6, 16, 24];
/// Edges on the same pin inside this window are bounce.
pub const BUTTON_DEBOUNCE: Duration = Duration::from_millis(100);
/// Pending button edges before the interrupt side starts dropping them.
pub const BUTTON_QUEUE_DEPTH: usize = 16;

/// Poll/compose/commit cadence.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Upper bound for any single remote call (playback query, artwork download, transport command).
pub const NETWORK_TIMEOUT: Duration = Duration::from_secs(10);
/// Decoded artwork kept around for recently played tracks.
pub const ARTWORK_CACHE_ENTRIES: u64 = 8;

// overlay geometry
/// Horizontal inset of overlays from the panel edge.
pub const X_PADDING: i32 = 6;
/// Vertical inset of overlays from the panel edge.
pub const Y_PADDING: i32 = 3;
/// Margin between label text and its background box, also the progress bar inset.
pub const BORDER_PADDING: u32 = 4;
/// Margin between a hint icon and its background box.
pub const ICON_BORDER: u32 = 1;
/// Side of the square a hint icon is drawn in.
pub const ICON_SIZE: u32 = 20;
pub const PROGRESS_BAR_HEIGHT: u32 = 12;
pub const CORNER_RADIUS: u32 = 4;
/// Vertical centre of the upper button row.
pub const UPPER_ROW_Y: i32 = 60;
/// Vertical centre of the lower button row.
pub const LOWER_ROW_Y: i32 = 180;

/// Overlay alpha for both text and background (0..=255).
pub const OVERLAY_ALPHA: u8 = 128;

// settings menu text
pub const MENU_TITLE: &str = "Configure UI";
pub const MENU_SONG_INFO: &str = "Song Info";
pub const MENU_CLOSE: &str = "Close Menu";
pub const MENU_BUTTONS: &str = "Buttons";
pub const MENU_PROGRESS: &str = "Progress";

/// Background of the placeholder used when a track carries no artwork.
pub const PLACEHOLDER_RGB: (u8, u8, u8) = (24, 24, 32);
