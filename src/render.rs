/*
 *  render.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame composition: artwork, progress bar, menu, hints and song info
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

use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, iso_8859_1::FONT_7X13, MonoFont},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::Rectangle,
};

use crate::buttons::ButtonLabel;
use crate::constants::*;
use crate::draw::{self, Icon, OVERLAY_BG, OVERLAY_FG};
use crate::frame_cell::{FrameState, SharedFrameCell};
use crate::playback::PlaybackSnapshot;
use crate::ui_state::{Mode, UiState};
use crate::vframebuf::Bitmap;

const LABEL_FONT: &MonoFont = &FONT_10X20;
const INFO_FONT: &MonoFont = &FONT_7X13;
const INFO_LINE_GAP: i32 = 2;

/// Where a label sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopCenter,
    LeftUpper,
    LeftLower,
    RightUpper,
    RightLower,
}

impl Anchor {
    /// Quadrant of the physical button.
    pub fn for_button(label: ButtonLabel) -> Self {
        match label {
            ButtonLabel::Y => Anchor::LeftUpper,
            ButtonLabel::X => Anchor::LeftLower,
            ButtonLabel::B => Anchor::RightUpper,
            ButtonLabel::A => Anchor::RightLower,
        }
    }
}

/// Fill width for a bar whose fillable span is `span` pixels:
/// `floor(span * clamp(progress / duration, 0, 1))`, zero duration is zero.
///
/// Integer arithmetic so the result is exactly 0 at the start, exactly
/// `span` at the end and never decreases in between.
pub fn progress_fill_width(span: u32, progress_ms: u64, duration_ms: u64) -> u32 {
    if duration_ms == 0 {
        return 0;
    }
    (span as u64 * progress_ms.min(duration_ms) / duration_ms) as u32
}

/// Pure frame composer for a fixed panel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Composer {
    width: u32,
    height: u32,
}

impl Composer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The frame shown when nothing is playing.
    pub fn blank(&self) -> Bitmap {
        Bitmap::new(self.width, self.height, Rgb888::BLACK)
    }

    /// Progress bar track: full width less padding, on the bottom edge.
    pub fn progress_track(&self) -> Rectangle {
        let width = self.width.saturating_sub(2 * X_PADDING as u32);
        let y = self.height as i32 - Y_PADDING - PROGRESS_BAR_HEIGHT as i32;
        Rectangle::new(Point::new(X_PADDING, y), Size::new(width, PROGRESS_BAR_HEIGHT))
    }

    /// Filled part of the progress bar, inset into the track.
    pub fn progress_fill(&self, snapshot: &PlaybackSnapshot) -> Rectangle {
        let track = self.progress_track();
        let inset = BORDER_PADDING;
        let span = track.size.width.saturating_sub(2 * inset);
        let width = progress_fill_width(span, snapshot.progress_ms, snapshot.duration_ms);
        Rectangle::new(
            track.top_left + Point::new(inset as i32, inset as i32),
            Size::new(width, track.size.height.saturating_sub(2 * inset)),
        )
    }

    /// Top-left of a label box of `box_size` at `anchor`.
    pub fn anchor_point(&self, anchor: Anchor, box_size: Size) -> Point {
        let (w, h) = (box_size.width as i32, box_size.height as i32);
        let right = self.width as i32 - X_PADDING - w;
        match anchor {
            Anchor::TopCenter => Point::new((self.width as i32 - w) / 2, Y_PADDING),
            Anchor::LeftUpper => Point::new(X_PADDING, UPPER_ROW_Y - h / 2),
            Anchor::LeftLower => Point::new(X_PADDING, LOWER_ROW_Y - h / 2),
            Anchor::RightUpper => Point::new(right, UPPER_ROW_Y - h / 2),
            Anchor::RightLower => Point::new(right, LOWER_ROW_Y - h / 2),
        }
    }

    /// Compose straight from the shared cell.
    pub fn compose_cell(&self, cell: &SharedFrameCell, ui: &UiState) -> Bitmap {
        self.compose(&cell.load(), ui)
    }

    /// Build the panel frame for `frame` under `ui`.
    ///
    /// Deterministic in its arguments. Overlays are only drawn once a
    /// track has been seen and artwork is present.
    pub fn compose(&self, frame: &FrameState, ui: &UiState) -> Bitmap {
        let (Some(artwork), Some(snapshot)) = (&frame.artwork, &frame.snapshot) else {
            return match &frame.artwork {
                Some(artwork) => artwork.bitmap.as_ref().clone(),
                None => self.blank(),
            };
        };

        let mut bitmap = artwork.bitmap.as_ref().clone();
        match ui.mode {
            Mode::Settings => self.draw_menu(&mut bitmap),
            Mode::Normal => {
                if ui.show_progress_bar {
                    self.draw_progress(&mut bitmap, snapshot);
                }
                if ui.show_button_hints {
                    self.draw_hints(&mut bitmap);
                }
                if ui.show_song_info {
                    self.draw_song_info(&mut bitmap, snapshot);
                }
            }
        }
        bitmap
    }

    fn text_label(&self, bitmap: &mut Bitmap, text: &str, anchor: Anchor) {
        let size = draw::text_size(text, LABEL_FONT);
        let boxed = size + Size::new_equal(2 * BORDER_PADDING);
        let at = self.anchor_point(anchor, boxed);
        draw::draw_label(bitmap, at, size, BORDER_PADDING, CORNER_RADIUS, |mask, p| {
            draw::draw_text(mask, text, p, LABEL_FONT)
        });
    }

    fn draw_menu(&self, bitmap: &mut Bitmap) {
        self.text_label(bitmap, MENU_TITLE, Anchor::TopCenter);
        for (label, text) in [
            (ButtonLabel::Y, MENU_SONG_INFO),
            (ButtonLabel::X, MENU_CLOSE),
            (ButtonLabel::B, MENU_BUTTONS),
            (ButtonLabel::A, MENU_PROGRESS),
        ] {
            self.text_label(bitmap, text, Anchor::for_button(label));
        }
    }

    fn draw_hints(&self, bitmap: &mut Bitmap) {
        let size = Size::new_equal(ICON_SIZE);
        let boxed = size + Size::new_equal(2 * ICON_BORDER);
        for (label, icon) in [
            (ButtonLabel::Y, Icon::Previous),
            (ButtonLabel::B, Icon::Next),
            (ButtonLabel::A, Icon::PlayPause),
            (ButtonLabel::X, Icon::Info),
        ] {
            let at = self.anchor_point(Anchor::for_button(label), boxed);
            draw::draw_label(bitmap, at, size, ICON_BORDER, CORNER_RADIUS, |mask, p| {
                draw::draw_icon(mask, icon, p)
            });
        }
    }

    fn draw_progress(&self, bitmap: &mut Bitmap, snapshot: &PlaybackSnapshot) {
        let track = self.progress_track();
        let fill = self.progress_fill(snapshot);
        draw::blended(bitmap, OVERLAY_BG, OVERLAY_ALPHA, |mask| draw::fill_rounded(mask, track, CORNER_RADIUS));
        draw::blended(bitmap, OVERLAY_FG, OVERLAY_ALPHA, |mask| draw::fill_rounded(mask, fill, CORNER_RADIUS));
    }

    /// Title, album/show and artist/publisher, centred between the two button rows.
    fn draw_song_info(&self, bitmap: &mut Bitmap, snapshot: &PlaybackSnapshot) {
        let span = self.width.saturating_sub(2 * X_PADDING as u32);
        let text_width = span.saturating_sub(2 * BORDER_PADDING);
        let lines = [
            snapshot.title.as_str(),
            snapshot.album_or_show_name.as_str(),
            snapshot.artist_or_publisher.as_str(),
        ];

        let line_h = INFO_FONT.character_size.height as i32;
        let block_h = lines.len() as i32 * line_h + (lines.len() as i32 - 1) * INFO_LINE_GAP;
        let top = (UPPER_ROW_Y + LOWER_ROW_Y) / 2 - block_h / 2 - BORDER_PADDING as i32;
        let area = Rectangle::new(
            Point::new(X_PADDING, top),
            Size::new(span, block_h as u32 + 2 * BORDER_PADDING),
        );

        draw::blended(bitmap, OVERLAY_BG, OVERLAY_ALPHA, |mask| draw::fill_rounded(mask, area, CORNER_RADIUS));
        draw::blended(bitmap, OVERLAY_FG, OVERLAY_ALPHA, |mask| {
            let mut y = top + BORDER_PADDING as i32;
            for line in lines {
                let fitted = draw::fit_text(line, INFO_FONT, text_width);
                let at = Point::new(X_PADDING + BORDER_PADDING as i32, y);
                draw::draw_text_centered(mask, &fitted, at, text_width, INFO_FONT)?;
                y += line_h + INFO_LINE_GAP;
            }
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::ArtworkFrame;
    use crate::playback::testing::snapshot;
    use std::sync::Arc;

    const GREY: Rgb888 = Rgb888::new(100, 100, 100);

    fn showing(progress: u64, duration: u64) -> FrameState {
        let art = ArtworkFrame {
            track_id: "t1".into(),
            bitmap: Arc::new(Bitmap::new(240, 240, GREY)),
        };
        FrameState::showing(art, snapshot("t1", progress, duration))
    }

    fn normal(progress: bool, hints: bool, info: bool) -> UiState {
        UiState {
            show_progress_bar: progress,
            show_button_hints: hints,
            show_song_info: info,
            is_running: true,
            ..UiState::default()
        }
    }

    #[test]
    fn test_fill_zero_duration() {
        assert_eq!(progress_fill_width(220, 5_000, 0), 0);
        assert_eq!(progress_fill_width(220, 0, 0), 0);
    }

    #[test]
    fn test_fill_clamps_overrun() {
        assert_eq!(progress_fill_width(220, 200, 100), 220);
        assert_eq!(progress_fill_width(220, 1, 3), 73);
    }

    #[test]
    fn test_fill_width_quarter() {
        let composer = Composer::new(240, 240);
        let fill = composer.progress_fill(&snapshot("t1", 30_000, 120_000));
        // track 228 wide, inset 4 each side
        assert_eq!(fill.size.width, 55);
        assert_eq!(fill.top_left, Point::new(10, 229));
        assert_eq!(fill.size.height, 4);
    }

    #[test]
    fn test_progress_track_geometry() {
        let track = Composer::new(240, 240).progress_track();
        assert_eq!(track.top_left, Point::new(6, 225));
        assert_eq!(track.size, Size::new(228, 12));
    }

    #[test]
    fn test_blank_frame_composes_blank() {
        let composer = Composer::new(240, 240);
        let out = composer.compose(&FrameState::blank(), &normal(true, true, true));
        assert_eq!(out, composer.blank());
    }

    #[test]
    fn test_overlays_off_leave_artwork_untouched() {
        let composer = Composer::new(240, 240);
        let out = composer.compose(&showing(10, 100), &normal(false, false, false));
        assert!(out.as_slice().iter().all(|&c| c == GREY));
    }

    #[test]
    fn test_progress_bar_drawn_at_bottom() {
        let composer = Composer::new(240, 240);
        let out = composer.compose(&showing(60_000, 120_000), &normal(true, false, false));

        // filled part: white over darkened track
        assert!(out.pixel(20, 231).unwrap().r() > 100);
        // unfilled part of the track is darker than the art
        assert!(out.pixel(200, 231).unwrap().r() < 100);
        // above the bar untouched
        assert_eq!(out.pixel(120, 100), Some(GREY));
    }

    #[test]
    fn test_settings_menu_covers_all_quadrants() {
        let composer = Composer::new(240, 240);
        let ui = UiState { mode: Mode::Settings, ..normal(true, false, false) };
        let out = composer.compose(&showing(0, 100), &ui);

        for anchor in [Anchor::TopCenter, Anchor::LeftUpper, Anchor::LeftLower, Anchor::RightUpper, Anchor::RightLower] {
            let at = composer.anchor_point(anchor, Size::new(40, 28));
            let probe = at + Point::new(2, 14);
            assert_ne!(out.pixel(probe.x as u32, probe.y as u32), Some(GREY), "{anchor:?}");
        }
        // settings mode hides the progress bar
        assert_eq!(out.pixel(200, 231), Some(GREY));
    }

    #[test]
    fn test_hints_and_song_info_do_not_overlap() {
        let composer = Composer::new(240, 240);
        let hints = composer.compose(&showing(0, 100), &normal(false, true, false));
        let info = composer.compose(&showing(0, 100), &normal(false, false, true));

        let touched = |b: &Bitmap| -> Vec<bool> { b.as_slice().iter().map(|&c| c != GREY).collect() };
        let (h, i) = (touched(&hints), touched(&info));
        assert!(h.iter().any(|&t| t));
        assert!(i.iter().any(|&t| t));
        assert!(h.iter().zip(&i).all(|(&a, &b)| !(a && b)));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let composer = Composer::new(240, 240);
        let frame = showing(42_000, 180_000);
        let ui = normal(true, true, true);
        assert_eq!(composer.compose(&frame, &ui), composer.compose(&frame, &ui));
    }

    #[test]
    fn test_compose_cell_matches_compose() {
        let composer = Composer::new(240, 240);
        let cell = SharedFrameCell::new();
        cell.publish(showing(1, 2));
        let ui = normal(true, false, false);
        assert_eq!(composer.compose_cell(&cell, &ui), composer.compose(&showing(1, 2), &ui));
    }
}
