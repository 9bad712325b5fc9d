use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fmt, fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::constants::*;
use crate::ui_state::UiState;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("credential file {path}: {reason}")]
    Credentials { path: PathBuf, reason: String },
}

/// Top-level app configuration. Every field has a default, no file is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// Two-line secret file: client id, client secret
    pub credentials: PathBuf,
    /// OAuth token cache written after the first authorisation
    pub token_cache: PathBuf,
    pub redirect_uri: String,
    pub poll_interval_ms: u64,
    pub network_timeout_ms: u64,
    pub display: DisplayConfig,
    pub buttons: ButtonConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub rotate_deg: u16,
    pub invert: bool,
    pub offset_x: u16,
    pub offset_y: u16,
    pub spi_cs: u8,
    pub spi_speed_hz: u32,
    pub dc_pin: u8,          // BCM numbering
    pub backlight_pin: u8,
    pub backlight_pwm_hz: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    pub a: u8,
    pub b: u8,
    pub x: u8,
    pub y: u8,
    pub debounce_ms: u64,
}

/// Overlay toggles at startup; not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_progress_bar: bool,
    pub show_button_hints: bool,
    pub show_song_info: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            credentials: PathBuf::from("./spotifykeys.txt"),
            token_cache: PathBuf::from(".spotify_token_cache.json"),
            redirect_uri: "http://localhost".to_string(),
            poll_interval_ms: POLL_INTERVAL.as_millis() as u64,
            network_timeout_ms: NETWORK_TIMEOUT.as_millis() as u64,
            display: DisplayConfig::default(),
            buttons: ButtonConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
            rotate_deg: DISPLAY_ROTATION_DEG,
            invert: true,
            offset_x: 0,
            offset_y: 0,
            spi_cs: SPI_SLAVE_SELECT,
            spi_speed_hz: SPI_SPEED_HZ,
            dc_pin: DC_PIN,
            backlight_pin: BACKLIGHT_PIN,
            backlight_pwm_hz: BACKLIGHT_PWM_HZ,
        }
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        let [a, b, x, y] = BUTTON_PINS;
        Self { a, b, x, y, debounce_ms: BUTTON_DEBOUNCE.as_millis() as u64 }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        let ui = UiState::default();
        Self {
            show_progress_bar: ui.show_progress_bar,
            show_button_hints: ui.show_button_hints,
            show_song_info: ui.show_song_info,
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Startup UI state, not yet running.
    pub fn initial_ui(&self) -> UiState {
        UiState {
            show_progress_bar: self.ui.show_progress_bar,
            show_button_hints: self.ui.show_button_hints,
            show_song_info: self.ui.show_song_info,
            ..UiState::default()
        }
    }
}

impl ButtonConfig {
    /// Pins in A, B, X, Y order.
    pub fn pins(&self) -> [u8; 4] {
        [self.a, self.b, self.x, self.y]
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// CLI overrides, layered over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "coverhat", version, about = "Now-playing artwork on a 240x240 SPI panel")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Two-line credential file: client id, client secret
    #[arg(short = 'k', long, value_hint = ValueHint::FilePath)]
    pub credentials: Option<PathBuf>,
    /// OAuth token cache
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub token_cache: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Shorthand for --log-level debug
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Layer defaults, YAML (explicit path or search) and CLI, then validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    let mut cfg = match cli.config.as_ref() {
        Some(p) if p.exists() => read_yaml(p)?,
        Some(p) => {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        None => match find_config_file() {
            Some(p) => read_yaml(&p)?,
            None => Config::default(),
        },
    };

    apply_cli_overrides(&mut cfg, cli);
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // project local
    let local = PathBuf::from("coverhat.yaml");
    if local.exists() { return Some(local) }
    if let Some(home) = home_dir() {
        let p = home.join(".config/coverhat/config.yaml");
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    // an empty file is all defaults
    if s.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if let Some(p) = cli.credentials.as_ref() { cfg.credentials = p.clone(); }
    if let Some(p) = cli.token_cache.as_ref() { cfg.token_cache = p.clone(); }
    if cli.log_level.is_some()                { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                              { cfg.log_level = Some("debug".to_string()); }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let display = &cfg.display;
    if display.width == 0 || display.height == 0 {
        return Err(ConfigError::Validation("display width/height must be > 0".into()));
    }
    match display.rotate_deg {
        0 | 90 | 180 | 270 => {},
        _ => return Err(ConfigError::Validation("display rotate_deg must be 0|90|180|270".into()))
    }
    if display.spi_cs > 2 {
        return Err(ConfigError::Validation("display spi_cs must be 0..=2".into()));
    }
    if !(display.backlight_pwm_hz > 0.0) {
        return Err(ConfigError::Validation("backlight_pwm_hz must be > 0".into()));
    }
    if cfg.poll_interval_ms == 0 || cfg.network_timeout_ms == 0 {
        return Err(ConfigError::Validation("poll_interval_ms and network_timeout_ms must be > 0".into()));
    }
    let mut pins = cfg.buttons.pins();
    pins.sort_unstable();
    if pins.windows(2).any(|w| w[0] == w[1]) {
        return Err(ConfigError::Validation("button pins must be distinct".into()));
    }
    if pins.contains(&display.dc_pin) || pins.contains(&display.backlight_pin) {
        return Err(ConfigError::Validation("button pins clash with display pins".into()));
    }
    Ok(())
}

/// App credentials for the playback service.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeys {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Read the two-line credential file. Anything missing is fatal.
pub fn load_credentials(path: &Path) -> Result<ApiKeys, ConfigError> {
    let fail = |reason: &str| ConfigError::Credentials {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    let text = fs::read_to_string(path).map_err(|e| fail(&e.to_string()))?;
    let mut lines = text.lines().map(str::trim);

    let client_id = lines.next().filter(|s| !s.is_empty()).ok_or_else(|| fail("missing client id on line 1"))?;
    let client_secret = lines.next().filter(|s| !s.is_empty()).ok_or_else(|| fail("missing client secret on line 2"))?;

    Ok(ApiKeys {
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
    })
}
