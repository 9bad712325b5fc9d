/*
 *  spotify.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Spotify Web API playback source: OAuth session, polling and transport
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

use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use rspotify::model::{AdditionalType, CurrentPlaybackContext, Image, PlayableItem};
use rspotify::prelude::*;
use rspotify::{scopes, AuthCodeSpotify, ClientError, ClientResult, Config as ClientConfig, Credentials, OAuth};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{ApiKeys, Config};
use crate::playback::{ContentKind, PlaybackSnapshot, PlaybackSource, SourceError};

static ADDITIONAL_TYPES: [AdditionalType; 2] = [AdditionalType::Episode, AdditionalType::Track];

/// Authorised Web API session.
pub struct SpotifyClient {
    api: AuthCodeSpotify,
    timeout: Duration,
}

impl SpotifyClient {
    /// Build the client and make sure it holds a token.
    ///
    /// A cached token is used when present (expired ones refresh on the
    /// first request). Otherwise the authorise URL is printed and the
    /// redirected URL is read back from stdin.
    pub async fn connect(keys: &ApiKeys, cfg: &Config) -> Result<Self, SourceError> {
        let creds = Credentials::new(&keys.client_id, &keys.client_secret);
        let oauth = OAuth {
            redirect_uri: cfg.redirect_uri.clone(),
            scopes: scopes!(
                "user-read-currently-playing",
                "user-read-playback-state",
                "app-remote-control",
                "user-modify-playback-state"
            ),
            ..Default::default()
        };
        let client_cfg = ClientConfig {
            token_cached: true,
            token_refreshing: true,
            cache_path: cfg.token_cache.clone(),
            ..Default::default()
        };
        let api = AuthCodeSpotify::with_config(creds, oauth, client_cfg);

        match api.read_token_cache(true).await {
            Ok(Some(token)) => {
                debug!("using cached token from {}", cfg.token_cache.display());
                *api.token
                    .lock()
                    .await
                    .map_err(|_| SourceError::Api("token lock poisoned".into()))? = Some(token);
            }
            Ok(None) => authorize_interactively(&api).await?,
            Err(e) => {
                warn!("token cache unreadable ({}), authorising again", e);
                authorize_interactively(&api).await?;
            }
        }
        info!("Spotify session ready");

        Ok(Self { api, timeout: cfg.network_timeout() })
    }

    async fn bounded<T>(&self, call: impl Future<Output = ClientResult<T>>) -> Result<T, SourceError> {
        match tokio::time::timeout(self.timeout, call).await {
            Err(_) => Err(SourceError::Timeout),
            Ok(result) => result.map_err(classify),
        }
    }
}

async fn authorize_interactively(api: &AuthCodeSpotify) -> Result<(), SourceError> {
    let url = api.get_authorize_url(false).map_err(classify)?;
    println!("Open this URL in a browser and authorise the app:\n\n  {url}\n");
    println!("Then paste the URL you were redirected to:");

    let line = BufReader::new(tokio::io::stdin())
        .lines()
        .next_line()
        .await
        .map_err(|e| SourceError::Api(format!("reading redirect URL: {e}")))?
        .unwrap_or_default();
    let code = api
        .parse_response_code(line.trim())
        .ok_or_else(|| SourceError::Api("redirect URL carried no authorisation code".into()))?;

    api.request_token(&code).await.map_err(classify)
}

/// Timeouts anywhere in the error chain are reported as such.
fn classify(err: ClientError) -> SourceError {
    let mut cause: Option<&(dyn StdError + 'static)> = Some(&err);
    while let Some(e) = cause {
        if e.downcast_ref::<reqwest::Error>().is_some_and(reqwest::Error::is_timeout) {
            return SourceError::Timeout;
        }
        cause = e.source();
    }
    SourceError::Api(err.to_string())
}

fn first_image(images: &[Image]) -> String {
    images.first().map(|i| i.url.clone()).unwrap_or_default()
}

fn join_names<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().collect::<Vec<_>>().join(", ")
}

fn millis(d: chrono::Duration) -> u64 {
    d.num_milliseconds().max(0) as u64
}

/// Flatten a playback context. No item (ads, private session) reads as nothing playing.
fn snapshot_from(ctx: CurrentPlaybackContext) -> Option<PlaybackSnapshot> {
    let progress_ms = ctx.progress.map(millis).unwrap_or(0);
    let snapshot = match ctx.item? {
        PlayableItem::Track(track) => PlaybackSnapshot {
            track_id: track
                .id
                .as_ref()
                .map(|id| id.id().to_string())
                .unwrap_or_else(|| format!("local:{}", track.name)),
            is_playing: ctx.is_playing,
            progress_ms,
            duration_ms: millis(track.duration),
            album_or_show_name: track.album.name.clone(),
            artist_or_publisher: join_names(track.artists.iter().map(|a| a.name.as_str())),
            artwork_url: first_image(&track.album.images),
            content_kind: ContentKind::Track,
            title: track.name,
        },
        PlayableItem::Episode(episode) => PlaybackSnapshot {
            track_id: episode.id.id().to_string(),
            is_playing: ctx.is_playing,
            progress_ms,
            duration_ms: millis(episode.duration),
            album_or_show_name: episode.show.name.clone(),
            artist_or_publisher: episode.show.publisher.clone(),
            artwork_url: first_image(&episode.images),
            content_kind: ContentKind::Episode,
            title: episode.name,
        },
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(snapshot)
}

impl PlaybackSource for SpotifyClient {
    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>, SourceError> {
        let ctx = self
            .bounded(self.api.current_playback(None, Some(ADDITIONAL_TYPES.iter())))
            .await?;
        Ok(ctx.and_then(snapshot_from))
    }

    async fn pause(&self) -> Result<(), SourceError> {
        self.bounded(self.api.pause_playback(None)).await
    }

    async fn resume(&self) -> Result<(), SourceError> {
        self.bounded(self.api.resume_playback(None, None)).await
    }

    async fn next(&self) -> Result<(), SourceError> {
        self.bounded(self.api.next_track(None)).await
    }

    async fn previous(&self) -> Result<(), SourceError> {
        self.bounded(self.api.previous_track(None)).await
    }
}
