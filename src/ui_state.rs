/*
 *  ui_state.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mode and overlay toggles, written by the buttons, read by the renderer
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

use std::sync::{PoisonError, RwLock};

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Buttons drive playback.
    #[default]
    Normal,
    /// Buttons flip overlay toggles.
    Settings,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Normal => Mode::Settings,
            Mode::Settings => Mode::Normal,
        }
    }
}

/// Overlays that can be switched from the settings menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    ProgressBar,
    ButtonHints,
    SongInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiState {
    pub mode: Mode,
    pub show_progress_bar: bool,
    pub show_button_hints: bool,
    pub show_song_info: bool,
    /// Whether polling and rendering are active at all.
    pub is_running: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            show_progress_bar: true,
            show_button_hints: false,
            show_song_info: false,
            is_running: false,
        }
    }
}

impl UiState {
    pub fn feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::ProgressBar => self.show_progress_bar,
            Feature::ButtonHints => self.show_button_hints,
            Feature::SongInfo => self.show_song_info,
        }
    }

    fn feature_mut(&mut self, feature: Feature) -> &mut bool {
        match feature {
            Feature::ProgressBar => &mut self.show_progress_bar,
            Feature::ButtonHints => &mut self.show_button_hints,
            Feature::SongInfo => &mut self.show_song_info,
        }
    }
}

/// Shared UI state.
///
/// Writers hold the lock only for a field flip and readers take a copy,
/// so neither side ever sees a half-applied change. The values are plain
/// `Copy` data, so a poisoned lock is still consistent and is recovered.
#[derive(Debug, Default)]
pub struct UiStore {
    inner: RwLock<UiState>,
}

impl UiStore {
    pub fn new(initial: UiState) -> Self {
        Self { inner: RwLock::new(initial) }
    }

    pub fn get_snapshot(&self) -> UiState {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut UiState) -> R) -> R {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *state)
    }

    /// Flip between Normal and Settings, returning the new mode.
    pub fn toggle_mode(&self) -> Mode {
        let mode = self.update(|s| {
            s.mode = s.mode.toggled();
            s.mode
        });
        debug!("ui mode -> {:?}", mode);
        mode
    }

    /// Flip one overlay, returning its new value.
    pub fn toggle_feature(&self, feature: Feature) -> bool {
        let on = self.update(|s| {
            let flag = s.feature_mut(feature);
            *flag = !*flag;
            *flag
        });
        debug!("{:?} -> {}", feature, on);
        on
    }

    pub fn set_running(&self, running: bool) {
        self.update(|s| s.is_running = running);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_defaults() {
        let ui = UiState::default();
        assert_eq!(ui.mode, Mode::Normal);
        assert!(ui.show_progress_bar);
        assert!(!ui.show_button_hints);
        assert!(!ui.is_running);
    }

    #[test]
    fn test_toggle_mode_is_its_own_inverse() {
        let store = UiStore::default();
        let before = store.get_snapshot();
        assert_eq!(store.toggle_mode(), Mode::Settings);
        assert_eq!(store.toggle_mode(), Mode::Normal);
        assert_eq!(store.get_snapshot(), before);
    }

    #[test]
    fn test_toggle_feature_touches_one_flag() {
        let store = UiStore::default();
        for feature in [Feature::ProgressBar, Feature::ButtonHints, Feature::SongInfo] {
            let before = store.get_snapshot();
            store.toggle_feature(feature);
            let after = store.get_snapshot();

            assert_eq!(after.feature(feature), !before.feature(feature));
            for other in [Feature::ProgressBar, Feature::ButtonHints, Feature::SongInfo] {
                if other != feature {
                    assert_eq!(after.feature(other), before.feature(other));
                }
            }
            assert_eq!(after.mode, before.mode);
        }
    }

    #[test]
    fn test_set_running() {
        let store = UiStore::default();
        store.set_running(true);
        assert!(store.get_snapshot().is_running);
        store.set_running(false);
        assert!(!store.get_snapshot().is_running);
    }

    #[test]
    fn test_concurrent_toggles_never_tear() {
        let store = Arc::new(UiStore::default());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    store.toggle_mode();
                }
            })
        };
        for _ in 0..1000 {
            let s = store.get_snapshot();
            assert!(s.show_progress_bar);
        }
        writer.join().unwrap();
        // even number of flips lands back on Normal
        assert_eq!(store.get_snapshot().mode, Mode::Normal);
    }
}
