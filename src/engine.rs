/*
 *  engine.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fixed-cadence poll, compose and commit loop
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

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use tokio::time::{interval, MissedTickBehavior};

use crate::artwork::ArtworkSource;
use crate::display::{Backlight, DisplayDriver, DisplaySink};
use crate::fetcher::{FetchError, Fetcher, SnapshotResult};
use crate::frame_cell::{FrameState, SharedFrameCell};
use crate::playback::PlaybackSource;
use crate::render::Composer;
use crate::ui_state::UiStore;

/// The polling/render context.
///
/// Sole writer of the frame cell; reads the UI store every tick.
pub struct Engine<S, A, D, B> {
    fetcher: Fetcher<S, A>,
    cell: Arc<SharedFrameCell>,
    ui: Arc<UiStore>,
    composer: Composer,
    sink: DisplaySink<D, B>,
    period: Duration,
}

impl<S, A, D, B> Engine<S, A, D, B>
where
    S: PlaybackSource,
    A: ArtworkSource,
    D: DisplayDriver,
    B: Backlight,
{
    pub fn new(
        fetcher: Fetcher<S, A>,
        cell: Arc<SharedFrameCell>,
        ui: Arc<UiStore>,
        sink: DisplaySink<D, B>,
        period: Duration,
    ) -> Self {
        let (width, height) = sink.dimensions();
        Self {
            fetcher,
            cell,
            ui,
            composer: Composer::new(width, height),
            sink,
            period,
        }
    }

    /// Poll once and publish what it means for the screen.
    async fn refresh(&mut self) {
        match self.fetcher.fetch().await {
            Ok(SnapshotResult::Playing { snapshot, artwork }) => {
                self.cell.publish(FrameState::showing(artwork, snapshot));
            }
            Ok(SnapshotResult::Unchanged(snapshot)) => {
                let state = match self.fetcher.current_artwork() {
                    Some(artwork) => FrameState::showing(artwork.clone(), snapshot),
                    None => FrameState::blank(),
                };
                self.cell.publish(state);
            }
            Ok(SnapshotResult::NotPlaying) => {
                debug!("nothing playing");
                self.cell.publish(FrameState::blank());
            }
            Err(FetchError::Timeout) => {
                warn!("playback poll timed out, keeping the current frame");
            }
            Err(FetchError::Transient(detail)) => {
                error!("playback poll failed: {}", detail);
                self.cell.publish(FrameState::blank());
            }
        }
    }

    /// One full cycle. Nothing in here propagates.
    pub async fn tick(&mut self) {
        let ui = self.ui.get_snapshot();
        if ui.is_running {
            self.refresh().await;
        } else {
            self.cell.publish(FrameState::blank());
        }

        let state = self.cell.load();
        let frame = self.composer.compose(&state, &ui);
        if let Err(e) = self.sink.commit(&frame) {
            error!("frame commit failed: {}", e);
        }
        if let Err(e) = self.sink.set_backlight(!state.is_blank()) {
            error!("backlight update failed: {}", e);
        }
    }

    /// Tick forever. A slow tick delays the next one rather than bunching up.
    pub async fn run(&mut self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// Blank the panel and switch the backlight off.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.sink.shutdown() {
            warn!("display shutdown: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::{MockBacklight, MockPanel, MockPanelState};
    use crate::display::sink::{BACKLIGHT_OFF, BACKLIGHT_ON};
    use crate::fetcher::testing::FakeArtwork;
    use crate::playback::testing::{snapshot, ScriptedSource};
    use crate::playback::SourceError;
    use crate::ui_state::UiState;
    use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Rig {
        engine: Engine<ScriptedSource, FakeArtwork, MockPanel, MockBacklight>,
        panel: Arc<Mutex<MockPanelState>>,
        duties: Arc<Mutex<Vec<u8>>>,
        downloads: Arc<AtomicUsize>,
        ui: Arc<UiStore>,
        cell: Arc<SharedFrameCell>,
    }

    fn rig(source: ScriptedSource, art: FakeArtwork) -> Rig {
        let panel = MockPanel::new(240, 240);
        let backlight = MockBacklight::default();
        let (panel_state, duties, downloads) = (panel.state(), backlight.duties(), art.count());
        let ui = Arc::new(UiStore::new(UiState { is_running: true, ..UiState::default() }));
        let cell = Arc::new(SharedFrameCell::new());
        let fetcher = Fetcher::new(Arc::new(source), art, 240, 240, Duration::from_millis(200));
        let engine = Engine::new(
            fetcher,
            Arc::clone(&cell),
            Arc::clone(&ui),
            DisplaySink::new(panel, backlight),
            Duration::from_millis(250),
        );
        Rig { engine, panel: panel_state, duties, downloads, ui, cell }
    }

    fn last_duty(r: &Rig) -> Option<u8> {
        r.duties.lock().unwrap().last().copied()
    }

    fn last_frame(r: &Rig) -> crate::vframebuf::Bitmap {
        r.panel.lock().unwrap().last_frame.clone().unwrap()
    }

    #[tokio::test]
    async fn test_playing_then_unchanged() {
        let mut r = rig(
            ScriptedSource::new(vec![
                Ok(Some(snapshot("t1", 30_000, 120_000))),
                Ok(Some(snapshot("t1", 30_250, 120_000))),
            ]),
            FakeArtwork::new(),
        );

        r.engine.tick().await;
        assert_eq!(last_duty(&r), Some(BACKLIGHT_ON));
        let first = last_frame(&r);
        // default ui draws the progress bar: filled up to 25% of 220 px
        assert!(first.pixel(60, 231).unwrap().r() > first.pixel(70, 231).unwrap().r());

        r.engine.tick().await;
        assert_eq!(r.downloads.load(Ordering::SeqCst), 1);
        assert_eq!(r.cell.load().snapshot.as_ref().map(|s| s.progress_ms), Some(30_250));
        assert_eq!(r.panel.lock().unwrap().frames_written, 2);
        assert_eq!(r.duties.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_not_playing_blanks_and_darkens() {
        let mut r = rig(ScriptedSource::new(vec![Ok(None)]), FakeArtwork::new());
        r.engine.tick().await;

        assert!(last_frame(&r).as_slice().iter().all(|&c| c == Rgb888::new(0, 0, 0)));
        assert_eq!(last_duty(&r), Some(BACKLIGHT_OFF));
    }

    #[tokio::test]
    async fn test_timeout_keeps_previous_frame() {
        let mut art = FakeArtwork::new();
        art.delay = Some(Duration::from_secs(5));
        let mut r = rig(ScriptedSource::new(vec![Ok(Some(snapshot("t1", 0, 1000)))]), art);

        // nothing committed yet: blank is retained
        let started = std::time::Instant::now();
        r.engine.tick().await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(r.cell.load().is_blank());
        assert_eq!(last_duty(&r), Some(BACKLIGHT_OFF));
    }

    #[tokio::test]
    async fn test_timeout_after_playing_keeps_artwork() {
        let source = ScriptedSource::new(vec![Ok(Some(snapshot("t1", 0, 1000))), Ok(Some(snapshot("t2", 0, 1000)))]);
        let mut r = rig(source, FakeArtwork::new());
        r.engine.tick().await;
        let shown = r.cell.load();

        r.engine.fetcher.artwork_mut().delay = Some(Duration::from_secs(5));
        r.engine.tick().await;

        assert_eq!(r.cell.load(), shown);
        assert_eq!(last_duty(&r), Some(BACKLIGHT_ON));
    }

    #[tokio::test]
    async fn test_transient_error_blanks() {
        let source = ScriptedSource::new(vec![
            Ok(Some(snapshot("t1", 0, 1000))),
            Err(SourceError::Api("500".into())),
        ]);
        let mut r = rig(source, FakeArtwork::new());
        r.engine.tick().await;
        assert_eq!(last_duty(&r), Some(BACKLIGHT_ON));

        r.engine.tick().await;
        assert!(r.cell.load().is_blank());
        assert_eq!(last_duty(&r), Some(BACKLIGHT_OFF));
    }

    #[tokio::test]
    async fn test_stopped_engine_skips_remote_and_blanks() {
        let source = ScriptedSource::new(vec![Ok(Some(snapshot("t1", 0, 1000)))]);
        let mut r = rig(source, FakeArtwork::new());
        r.ui.set_running(false);

        r.engine.tick().await;

        assert_eq!(r.engine.fetcher.source().query_count(), 0);
        assert_eq!(last_duty(&r), Some(BACKLIGHT_OFF));
    }

    #[tokio::test]
    async fn test_commit_failure_does_not_stop_the_loop() {
        let mut r = rig(ScriptedSource::new(vec![Ok(Some(snapshot("t1", 0, 1000)))]), FakeArtwork::new());
        r.panel.lock().unwrap().simulate_write_failure = true;
        r.engine.tick().await;
        r.panel.lock().unwrap().simulate_write_failure = false;
        r.engine.tick().await;
        assert_eq!(r.panel.lock().unwrap().frames_written, 1);
    }

    #[tokio::test]
    async fn test_shutdown_darkens() {
        let mut r = rig(ScriptedSource::new(vec![Ok(Some(snapshot("t1", 0, 1000)))]), FakeArtwork::new());
        r.engine.tick().await;
        r.engine.shutdown();
        assert_eq!(last_duty(&r), Some(BACKLIGHT_OFF));
    }
}
