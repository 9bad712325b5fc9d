/*
 *  frame_cell.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Current artwork + snapshot pair, published by the poll loop
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

use std::sync::{Arc, PoisonError, RwLock};

use crate::artwork::ArtworkFrame;
use crate::playback::PlaybackSnapshot;

/// What the renderer works from. No artwork means the blank sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameState {
    pub artwork: Option<ArtworkFrame>,
    pub snapshot: Option<PlaybackSnapshot>,
}

impl FrameState {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn showing(artwork: ArtworkFrame, snapshot: PlaybackSnapshot) -> Self {
        Self { artwork: Some(artwork), snapshot: Some(snapshot) }
    }

    pub fn is_blank(&self) -> bool {
        self.artwork.is_none()
    }
}

/// Single-writer, many-reader cell.
///
/// The pair is swapped as one `Arc`, so a reader holding a loaded state
/// always sees artwork and snapshot from the same publish.
#[derive(Debug, Default)]
pub struct SharedFrameCell {
    current: RwLock<Arc<FrameState>>,
}

impl SharedFrameCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, state: FrameState) {
        let next = Arc::new(state);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub fn load(&self) -> Arc<FrameState> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }
}
