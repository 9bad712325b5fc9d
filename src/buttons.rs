/*
 *  buttons.rs
 *
 *  CoverHat - artwork on a hat
 *  (c) 2020-26 Stuart Hunter
 *
 *  Button edges to transport commands and settings toggles
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

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::playback::{execute, PlaybackSource, TransportCommand};
use crate::ui_state::{Feature, Mode, UiStore};

/// Logical button names as printed on the hat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonLabel {
    A,
    B,
    X,
    Y,
}

/// A falling edge seen on a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub pin: u8,
    pub at: Instant,
}

/// Failure claiming the button inputs at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("GPIO unavailable: {0}")]
    Gpio(String),
    #[error("button pin {pin}: {reason}")]
    Pin { pin: u8, reason: String },
}

/// What a press ends up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleMode,
    Toggle(Feature),
    Transport(TransportCommand),
}

/// Fixed pin to label table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinMap {
    pins: HashMap<u8, ButtonLabel>,
}

impl PinMap {
    /// Pins given in A, B, X, Y order.
    pub fn new(pins: [u8; 4]) -> Self {
        let labels = [ButtonLabel::A, ButtonLabel::B, ButtonLabel::X, ButtonLabel::Y];
        Self { pins: pins.into_iter().zip(labels).collect() }
    }

    pub fn label_for(&self, pin: u8) -> Option<ButtonLabel> {
        self.pins.get(&pin).copied()
    }

    pub fn pins(&self) -> impl Iterator<Item = u8> + '_ {
        self.pins.keys().copied()
    }
}

/// Per-pin refractory window, measured from the last accepted edge.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: HashMap<u8, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: HashMap::new() }
    }

    /// True when the edge counts as a new press.
    pub fn accept(&mut self, pin: u8, at: Instant) -> bool {
        if let Some(prev) = self.last.get(&pin) {
            if at.saturating_duration_since(*prev) < self.window {
                return false;
            }
        }
        self.last.insert(pin, at);
        true
    }
}

/// Transition table: X always flips the mode, the others depend on it.
pub fn route(label: ButtonLabel, mode: Mode) -> Action {
    match (label, mode) {
        (ButtonLabel::X, _) => Action::ToggleMode,
        (ButtonLabel::A, Mode::Normal) => Action::Transport(TransportCommand::PlayPause),
        (ButtonLabel::B, Mode::Normal) => Action::Transport(TransportCommand::Next),
        (ButtonLabel::Y, Mode::Normal) => Action::Transport(TransportCommand::Previous),
        (ButtonLabel::A, Mode::Settings) => Action::Toggle(Feature::ProgressBar),
        (ButtonLabel::B, Mode::Settings) => Action::Toggle(Feature::ButtonHints),
        (ButtonLabel::Y, Mode::Settings) => Action::Toggle(Feature::SongInfo),
    }
}

/// Consumes button edges and applies them.
///
/// Without a playback session every press is ignored.
pub struct ButtonDispatcher<S> {
    pins: PinMap,
    debounce: Debouncer,
    ui: Arc<UiStore>,
    control: Option<Arc<S>>,
    command_timeout: Duration,
}

impl<S: PlaybackSource> ButtonDispatcher<S> {
    pub fn new(
        pins: PinMap,
        debounce: Duration,
        ui: Arc<UiStore>,
        control: Option<Arc<S>>,
        command_timeout: Duration,
    ) -> Self {
        Self {
            pins,
            debounce: Debouncer::new(debounce),
            ui,
            control,
            command_timeout,
        }
    }

    /// Apply one edge. Transport commands are spawned, never awaited here.
    ///
    /// Must run inside a tokio runtime.
    pub fn handle(&mut self, event: ButtonEvent) -> Option<Action> {
        let control = self.control.as_ref()?;
        if !self.debounce.accept(event.pin, event.at) {
            debug!("bounce on pin {} ignored", event.pin);
            return None;
        }
        let Some(label) = self.pins.label_for(event.pin) else {
            warn!("edge on unmapped pin {}", event.pin);
            return None;
        };

        let action = route(label, self.ui.get_snapshot().mode);
        debug!("button {:?} -> {:?}", label, action);
        match action {
            Action::ToggleMode => {
                self.ui.toggle_mode();
            }
            Action::Toggle(feature) => {
                self.ui.toggle_feature(feature);
            }
            Action::Transport(command) => {
                let control = Arc::clone(control);
                let limit = self.command_timeout;
                tokio::spawn(async move {
                    match execute(&*control, command, limit).await {
                        Ok(()) => info!("{:?} sent", command),
                        Err(e) => warn!("{}", e),
                    }
                });
            }
        }
        Some(action)
    }

    /// Drain the edge queue until every sender is gone.
    pub async fn run(mut self, mut events: mpsc::Receiver<ButtonEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        debug!("button queue closed");
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use self::gpio::ButtonInputs;

#[cfg(all(feature = "hardware", target_os = "linux"))]
mod gpio {
    use super::{ButtonEvent, InputError};
    use log::{info, trace};
    use rppal::gpio::{Gpio, InputPin, Trigger};
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc;

    /// Falling-edge interrupts on the button pins.
    ///
    /// Callbacks run on rppal's interrupt thread and only ever `try_send`,
    /// so a full queue drops the edge instead of blocking.
    pub struct ButtonInputs {
        _pins: Vec<InputPin>,
    }

    impl ButtonInputs {
        pub fn register(
            pins: impl IntoIterator<Item = u8>,
            debounce: Duration,
            events: mpsc::Sender<ButtonEvent>,
        ) -> Result<Self, InputError> {
            let gpio = Gpio::new().map_err(|e| InputError::Gpio(e.to_string()))?;
            let mut held = Vec::new();
            for pin in pins {
                let mut input = gpio
                    .get(pin)
                    .map_err(|e| InputError::Pin { pin, reason: e.to_string() })?
                    .into_input_pullup();
                let tx = events.clone();
                input
                    .set_async_interrupt(Trigger::FallingEdge, Some(debounce), move |_| {
                        if tx.try_send(ButtonEvent { pin, at: Instant::now() }).is_err() {
                            trace!("button queue full, edge on {pin} dropped");
                        }
                    })
                    .map_err(|e| InputError::Pin { pin, reason: format!("interrupt: {e}") })?;
                held.push(input);
            }
            info!("watching {} buttons", held.len());
            Ok(Self { _pins: held })
        }
    }
}
