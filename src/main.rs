/*
 *  main.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
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

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use tokio::signal::unix::{signal, SignalKind};

use coverhat::config::{self, Cli, Config};
use coverhat::spotify::SpotifyClient;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

#[cfg_attr(not(all(feature = "hardware", target_os = "linux")), allow(dead_code))]
/// Waits for SIGINT, SIGTERM or SIGHUP and logs which one arrived.
async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
async fn run(cfg: Config, spotify: Arc<SpotifyClient>) -> Result<()> {
    use coverhat::artwork::HttpArtwork;
    use coverhat::buttons::{ButtonDispatcher, ButtonInputs, PinMap};
    use coverhat::constants::BUTTON_QUEUE_DEPTH;
    use coverhat::display::drivers::{pwm_backlight::PwmBacklight, st7789};
    use coverhat::display::DisplaySink;
    use coverhat::engine::Engine;
    use coverhat::fetcher::Fetcher;
    use coverhat::frame_cell::SharedFrameCell;
    use coverhat::ui_state::UiStore;
    use log::warn;
    use tokio::sync::mpsc;

    let panel = st7789::open(&cfg.display).context("opening the panel")?;
    let backlight = PwmBacklight::new(cfg.display.backlight_pin, cfg.display.backlight_pwm_hz)
        .context("claiming the backlight pin")?;
    let mut sink = DisplaySink::new(panel, backlight);
    sink.init().context("initialising the panel")?;

    let ui = Arc::new(UiStore::new(cfg.initial_ui()));

    let pins = PinMap::new(cfg.buttons.pins());
    let (tx, rx) = mpsc::channel(BUTTON_QUEUE_DEPTH);
    let _inputs = ButtonInputs::register(pins.pins(), cfg.buttons.debounce(), tx)
        .context("registering button interrupts")?;
    let dispatcher = ButtonDispatcher::new(
        pins,
        cfg.buttons.debounce(),
        Arc::clone(&ui),
        Some(Arc::clone(&spotify)),
        cfg.network_timeout(),
    );
    tokio::spawn(dispatcher.run(rx));

    let artwork = HttpArtwork::new(cfg.network_timeout()).context("building the artwork client")?;
    let fetcher = Fetcher::new(
        spotify,
        artwork,
        cfg.display.width,
        cfg.display.height,
        cfg.network_timeout(),
    );
    let mut engine = Engine::new(
        fetcher,
        Arc::new(SharedFrameCell::new()),
        Arc::clone(&ui),
        sink,
        cfg.poll_interval(),
    );

    ui.set_running(true);
    info!("polling every {:?}", cfg.poll_interval());

    tokio::select! {
        res = signal_handler() => {
            if let Err(e) = res {
                warn!("signal setup failed: {}", e);
            }
        }
        _ = engine.run() => {}
    }

    ui.set_running(false);
    engine.shutdown();
    info!("display dark, bye");
    Ok(())
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
async fn run(_cfg: Config, _spotify: Arc<SpotifyClient>) -> Result<()> {
    anyhow::bail!("built without the `hardware` feature, no panel to drive")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli)?;

    if cli.dump_config {
        print!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_filter()))
        .format_timestamp_secs()
        .init();

    info!("{} - artwork on a hat", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let keys = config::load_credentials(&cfg.credentials)?;
    let spotify = SpotifyClient::connect(&keys, &cfg)
        .await
        .context("Spotify authorisation failed")?;

    run(cfg, Arc::new(spotify)).await
}
