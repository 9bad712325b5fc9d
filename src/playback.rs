/*
 *  playback.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Playback snapshot model and the remote playback-control seam
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
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// What kind of item is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Track,
    Episode,
}

/// One point-in-time read of remote playback state.
///
/// `progress_ms <= duration_ms` is not guaranteed by the remote side,
/// anything drawing from it clamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub track_id: String,
    pub is_playing: bool,
    pub progress_ms: u64,
    pub duration_ms: u64,
    pub title: String,
    pub album_or_show_name: String,
    pub artist_or_publisher: String,
    pub content_kind: ContentKind,
    /// Empty when the item carries no artwork.
    pub artwork_url: String,
}

impl fmt::Display for PlaybackSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} by {}", self.title, self.album_or_show_name, self.artist_or_publisher)
    }
}

/// Transport commands issued from the buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    /// Pause when playing, resume otherwise.
    PlayPause,
    Next,
    Previous,
}

/// Failure talking to a remote endpoint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,
    #[error("remote error: {0}")]
    Api(String),
}

/// The remote playback endpoint.
///
/// Implementations must be cheap to share behind an `Arc`; the polling
/// loop and the button dispatcher both hold one.
pub trait PlaybackSource: Send + Sync + 'static {
    /// Current playback, tracks and episodes both. `None` when there is no active device.
    fn current_playback(&self) -> impl Future<Output = Result<Option<PlaybackSnapshot>, SourceError>> + Send;

    fn pause(&self) -> impl Future<Output = Result<(), SourceError>> + Send;

    fn resume(&self) -> impl Future<Output = Result<(), SourceError>> + Send;

    fn next(&self) -> impl Future<Output = Result<(), SourceError>> + Send;

    fn previous(&self) -> impl Future<Output = Result<(), SourceError>> + Send;
}

/// Transport command failure, logged and otherwise ignored.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0:?} timed out")]
    Timeout(TransportCommand),
    #[error("{command:?} failed: {source}")]
    Failed {
        command: TransportCommand,
        #[source]
        source: SourceError,
    },
}

/// Run one transport command against `source`, bounded by `limit`.
///
/// Play/pause looks at current playback first: playing pauses, anything
/// else (paused, stopped, no device) resumes.
pub async fn execute<S: PlaybackSource>(
    source: &S,
    command: TransportCommand,
    limit: Duration,
) -> Result<(), CommandError> {
    let work = async {
        match command {
            TransportCommand::PlayPause => {
                let playing = source
                    .current_playback()
                    .await?
                    .is_some_and(|p| p.is_playing);
                if playing { source.pause().await } else { source.resume().await }
            }
            TransportCommand::Next => source.next().await,
            TransportCommand::Previous => source.previous().await,
        }
    };

    match tokio::time::timeout(limit, work).await {
        Err(_) | Ok(Err(SourceError::Timeout)) => Err(CommandError::Timeout(command)),
        Ok(Err(source)) => Err(CommandError::Failed { command, source }),
        Ok(Ok(())) => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted playback source shared by the fetcher, engine and button tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub fn snapshot(track_id: &str, progress_ms: u64, duration_ms: u64) -> PlaybackSnapshot {
        PlaybackSnapshot {
            track_id: track_id.to_string(),
            is_playing: true,
            progress_ms,
            duration_ms,
            title: format!("Title {track_id}"),
            album_or_show_name: "Album".to_string(),
            artist_or_publisher: "Artist".to_string(),
            content_kind: ContentKind::Track,
            artwork_url: format!("http://art.example/{track_id}.jpg"),
        }
    }

    /// Replays queued responses, then repeats the last one.
    #[derive(Default)]
    pub struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Option<PlaybackSnapshot>, SourceError>>>,
        last: Mutex<Option<Result<Option<PlaybackSnapshot>, SourceError>>>,
        pub delay: Option<Duration>,
        pub queries: AtomicUsize,
        pub commands: Mutex<Vec<&'static str>>,
    }

    impl ScriptedSource {
        pub fn new(responses: Vec<Result<Option<PlaybackSnapshot>, SourceError>>) -> Self {
            Self { responses: Mutex::new(responses.into()), ..Default::default() }
        }

        /// Every playback query stalls for `delay` first.
        pub fn stalled(delay: Duration) -> Self {
            Self { delay: Some(delay), ..Default::default() }
        }

        pub fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }

        pub fn commands(&self) -> Vec<&'static str> {
            self.commands.lock().unwrap().clone()
        }

        fn record(&self, name: &'static str) {
            self.commands.lock().unwrap().push(name);
        }
    }

    impl PlaybackSource for ScriptedSource {
        async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>, SourceError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.responses.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(next) = next {
                *last = Some(next);
            }
            last.clone().unwrap_or(Ok(None))
        }

        async fn pause(&self) -> Result<(), SourceError> {
            self.record("pause");
            Ok(())
        }

        async fn resume(&self) -> Result<(), SourceError> {
            self.record("resume");
            Ok(())
        }

        async fn next(&self) -> Result<(), SourceError> {
            self.record("next");
            Ok(())
        }

        async fn previous(&self) -> Result<(), SourceError> {
            self.record("previous");
            Ok(())
        }
    }
}
