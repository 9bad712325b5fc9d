/*
 *  fetcher.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Playback snapshot fetcher: track change detection and artwork refresh
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

use log::{debug, info};
use mini_moka::sync::Cache;
use thiserror::Error;
use tokio::time::{timeout_at, Instant};

use crate::artwork::{decode_artwork, ArtworkFrame, ArtworkSource};
use crate::constants::ARTWORK_CACHE_ENTRIES;
use crate::playback::{PlaybackSnapshot, PlaybackSource, SourceError};

/// Outcome of one successful poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotResult {
    /// A track we had not shown yet, with its freshly decoded artwork.
    Playing {
        snapshot: PlaybackSnapshot,
        artwork: ArtworkFrame,
    },
    /// Nothing playing, or no active device.
    NotPlaying,
    /// Same track as the last success; keep the current artwork.
    /// Carries the fresh snapshot so progress keeps moving.
    Unchanged(PlaybackSnapshot),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network deadline exceeded")]
    Timeout,
    #[error("fetch failed: {0}")]
    Transient(String),
}

impl From<SourceError> for FetchError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Timeout => FetchError::Timeout,
            SourceError::Api(detail) => FetchError::Transient(detail),
        }
    }
}

pub struct Fetcher<S, A> {
    source: Arc<S>,
    artwork: A,
    width: u32,
    height: u32,
    timeout: Duration,
    last_track_id: Option<String>,
    current: Option<ArtworkFrame>,
    recent: Cache<String, ArtworkFrame>,
}

impl<S: PlaybackSource, A: ArtworkSource> Fetcher<S, A> {
    pub fn new(source: Arc<S>, artwork: A, width: u32, height: u32, timeout: Duration) -> Self {
        Self {
            source,
            artwork,
            width,
            height,
            timeout,
            last_track_id: None,
            current: None,
            recent: Cache::new(ARTWORK_CACHE_ENTRIES),
        }
    }

    /// Artwork of the last track that fetched successfully.
    pub fn current_artwork(&self) -> Option<&ArtworkFrame> {
        self.current.as_ref()
    }

    /// Poll remote playback once.
    ///
    /// Artwork is keyed on `track_id` alone: play state and progress changes
    /// never trigger a download. `last_track_id` only moves once a frame is in
    /// hand, so a failed download is retried on the next poll.
    ///
    /// Query and download share one deadline, so a poll never waits longer
    /// than `timeout` on the network.
    pub async fn fetch(&mut self) -> Result<SnapshotResult, FetchError> {
        let deadline = Instant::now() + self.timeout;
        let playback = timeout_at(deadline, self.source.current_playback())
            .await
            .map_err(|_| FetchError::Timeout)??;

        let Some(snapshot) = playback.filter(|p| p.is_playing) else {
            return Ok(SnapshotResult::NotPlaying);
        };

        if self.last_track_id.as_deref() == Some(snapshot.track_id.as_str()) && self.current.is_some() {
            return Ok(SnapshotResult::Unchanged(snapshot));
        }

        let artwork = match self.recent.get(&snapshot.track_id) {
            Some(frame) => {
                debug!("artwork for {} from cache", snapshot.track_id);
                frame
            }
            None => self.load_artwork(&snapshot, deadline).await?,
        };

        info!("Now playing: {}", snapshot);
        self.recent.insert(snapshot.track_id.clone(), artwork.clone());
        self.last_track_id = Some(snapshot.track_id.clone());
        self.current = Some(artwork.clone());

        Ok(SnapshotResult::Playing { snapshot, artwork })
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    #[cfg(test)]
    pub(crate) fn artwork_mut(&mut self) -> &mut A {
        &mut self.artwork
    }

    async fn load_artwork(&self, snapshot: &PlaybackSnapshot, deadline: Instant) -> Result<ArtworkFrame, FetchError> {
        if snapshot.artwork_url.is_empty() {
            debug!("{} has no artwork, using placeholder", snapshot.track_id);
            return Ok(ArtworkFrame::placeholder(&snapshot.track_id, self.width, self.height));
        }

        let bytes = timeout_at(deadline, self.artwork.download(&snapshot.artwork_url))
            .await
            .map_err(|_| FetchError::Timeout)??;

        let (track_id, width, height) = (snapshot.track_id.clone(), self.width, self.height);
        tokio::task::spawn_blocking(move || decode_artwork(&track_id, &bytes, width, height))
            .await
            .map_err(|e| FetchError::Transient(format!("decode task failed: {e}")))?
            .map_err(|e| FetchError::Transient(e.to_string()))
    }
}
