/*
 *  artwork.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Cover art download, decode and resize to panel size
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

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use embedded_graphics::pixelcolor::Rgb888;
use image::imageops::FilterType;
use log::debug;
use reqwest::{header, Client};
use thiserror::Error;

use crate::constants::PLACEHOLDER_RGB;
use crate::playback::SourceError;
use crate::vframebuf::Bitmap;

/// Decoded, panel-sized cover art and the track it belongs to.
///
/// The bitmap is shared; cloning a frame is a reference count bump.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkFrame {
    pub track_id: String,
    pub bitmap: Arc<Bitmap>,
}

impl ArtworkFrame {
    /// Solid frame for items that carry no artwork.
    pub fn placeholder(track_id: &str, width: u32, height: u32) -> Self {
        let (r, g, b) = PLACEHOLDER_RGB;
        Self {
            track_id: track_id.to_string(),
            bitmap: Arc::new(Bitmap::new(width, height, Rgb888::new(r, g, b))),
        }
    }
}

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("artwork response was empty")]
    Empty,
    #[error("artwork decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Where artwork bytes come from.
pub trait ArtworkSource: Send + Sync {
    fn download(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, SourceError>> + Send;
}

/// HTTP artwork client.
#[derive(Debug, Clone)]
pub struct HttpArtwork {
    client: Client,
}

impl HttpArtwork {
    /// Build the client with default headers and a hard per-request deadline.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(VERSION));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("image/*"));

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(3).min(timeout))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

fn classify(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Api(err.to_string())
    }
}

impl ArtworkSource for HttpArtwork {
    async fn download(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(classify)?;
        let body = response.bytes().await.map_err(classify)?;
        debug!("artwork {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

/// Decode an encoded image and scale it to exactly `width` x `height`.
///
/// CPU bound; callers on the runtime should go through `spawn_blocking`.
pub fn decode_artwork(track_id: &str, bytes: &[u8], width: u32, height: u32) -> Result<ArtworkFrame, ArtworkError> {
    if bytes.is_empty() {
        return Err(ArtworkError::Empty);
    }
    let decoded = image::load_from_memory(bytes)?.to_rgb8();
    let scaled = image::imageops::resize(&decoded, width, height, FilterType::Triangle);

    let pixels = scaled
        .pixels()
        .map(|p| Rgb888::new(p[0], p[1], p[2]))
        .collect::<Vec<_>>();

    // resize always yields width * height pixels
    let bitmap = Bitmap::from_pixels(width, height, pixels)
        .unwrap_or_else(|| Bitmap::new(width, height, Rgb888::new(0, 0, 0)));

    Ok(ArtworkFrame {
        track_id: track_id.to_string(),
        bitmap: Arc::new(bitmap),
    })
}
