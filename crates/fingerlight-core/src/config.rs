//! Device configuration.
//!
//! Configuration is resolved in three tiers, later tiers overriding earlier
//! ones:
//!
//! 1. TOML file (`fingerlight.toml`), every field optional
//! 2. Environment variables (`FINGERLIGHT_*`)
//! 3. Command line flags (applied by the binary)
//!
//! # Example
//!
//! ```
//! use fingerlight_core::config::DeviceConfig;
//!
//! let config: DeviceConfig = toml::from_str(r#"
//!     [strip]
//!     pixel_count = 60
//!     color_order = "rgb"
//! "#).unwrap();
//!
//! assert_eq!(config.strip.pixel_count, 60);
//! assert_eq!(config.sensor.baud_rate, 57_600);
//! config.validate().unwrap();
//! ```

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Rgb;
use crate::constants::*;
use crate::{Error, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "FINGERLIGHT_CONFIG_PATH";

/// Config file name searched in the working directory.
pub const CONFIG_FILE_NAME: &str = "fingerlight.toml";

/// Complete device configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub sensor: SensorConfig,
    pub strip: StripSettings,
    pub animation: AnimationSettings,
    pub logging: LoggingSettings,
}

/// Fingerprint sensor connection and polling parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Serial device the module is attached to. `None` selects the mock sensor.
    pub port: Option<String>,
    pub baud_rate: u32,
    pub address: u32,
    pub password: u32,
    /// Delay between finger-presence polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Delay between polls while waiting for finger removal, in milliseconds.
    pub release_poll_interval_ms: u64,
    /// Maximum polls while waiting for finger removal.
    pub release_poll_limit: u32,
    /// Maximum capture polls per enrollment pass.
    pub enroll_capture_attempts: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_SENSOR_BAUD_RATE,
            address: DEFAULT_SENSOR_ADDRESS,
            password: DEFAULT_SENSOR_PASSWORD,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            release_poll_interval_ms: DEFAULT_RELEASE_POLL_INTERVAL_MS,
            release_poll_limit: DEFAULT_RELEASE_POLL_LIMIT,
            enroll_capture_attempts: DEFAULT_ENROLL_CAPTURE_ATTEMPTS,
        }
    }
}

impl SensorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn release_poll_interval(&self) -> Duration {
        Duration::from_millis(self.release_poll_interval_ms)
    }
}

/// Byte order in which a strip expects color channels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    Rgb,
    Rbg,
    #[default]
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ColorOrder {
    /// Channel bytes of `color` in wire order.
    pub fn channels(self, color: Rgb) -> [u8; 3] {
        let Rgb { r, g, b } = color;
        match self {
            ColorOrder::Rgb => [r, g, b],
            ColorOrder::Rbg => [r, b, g],
            ColorOrder::Grb => [g, r, b],
            ColorOrder::Gbr => [g, b, r],
            ColorOrder::Brg => [b, r, g],
            ColorOrder::Bgr => [b, g, r],
        }
    }
}

impl fmt::Display for ColorOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorOrder::Rgb => "rgb",
            ColorOrder::Rbg => "rbg",
            ColorOrder::Grb => "grb",
            ColorOrder::Gbr => "gbr",
            ColorOrder::Brg => "brg",
            ColorOrder::Bgr => "bgr",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for ColorOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb" => Ok(ColorOrder::Rgb),
            "rbg" => Ok(ColorOrder::Rbg),
            "grb" => Ok(ColorOrder::Grb),
            "gbr" => Ok(ColorOrder::Gbr),
            "brg" => Ok(ColorOrder::Brg),
            "bgr" => Ok(ColorOrder::Bgr),
            other => Err(Error::Config(format!("Unknown color order: {other}"))),
        }
    }
}

/// LED strip layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripSettings {
    pub pixel_count: usize,
    pub data_pin: u8,
    pub color_order: ColorOrder,
}

impl Default for StripSettings {
    fn default() -> Self {
        Self {
            pixel_count: DEFAULT_PIXEL_COUNT,
            data_pin: DEFAULT_DATA_PIN,
            color_order: ColorOrder::default(),
        }
    }
}

/// Animation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// HSV value of the idle rainbow.
    pub idle_brightness: u8,
    /// Hue steps the idle rainbow drifts per millisecond.
    pub idle_drift_per_ms: f32,
    /// Comet tail width as a fraction of the strip.
    pub comet_falloff: f32,
    /// Duration of one comet sweep, in milliseconds.
    pub comet_period_ms: u64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            idle_brightness: DEFAULT_IDLE_BRIGHTNESS,
            idle_drift_per_ms: DEFAULT_IDLE_DRIFT_PER_MS,
            comet_falloff: DEFAULT_COMET_FALLOFF,
            comet_period_ms: DEFAULT_COMET_PERIOD_MS,
        }
    }
}

impl AnimationSettings {
    pub fn comet_period(&self) -> Duration {
        Duration::from_millis(self.comet_period_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl DeviceConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve the configuration from file and environment.
    ///
    /// An explicit `path` must exist. Without one, [`CONFIG_PATH_ENV`] and then
    /// `./fingerlight.toml` are tried; if neither exists the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path.map(Path::to_path_buf).or_else(find_config_file) {
            Some(file) => Self::from_file(&file).map_err(|e| match e {
                Error::Io(io) => Error::Config(format!("Cannot read {}: {io}", file.display())),
                other => other,
            })?,
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FINGERLIGHT_*` environment overrides.
    ///
    /// # Errors
    /// Returns `Error::Config` if `FINGERLIGHT_PIXEL_COUNT` is not a number.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("FINGERLIGHT_SENSOR_PORT") {
            self.sensor.port = Some(port);
        }
        if let Some(raw) = lookup("FINGERLIGHT_PIXEL_COUNT") {
            self.strip.pixel_count = raw.trim().parse().map_err(|_| {
                Error::Config(format!("FINGERLIGHT_PIXEL_COUNT is not a pixel count: '{raw}'"))
            })?;
        }
        if let Some(level) = lookup("FINGERLIGHT_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns `Error::InvalidStripLength` for an empty strip and
    /// `Error::Config` for any other out-of-range value.
    pub fn validate(&self) -> Result<()> {
        if self.strip.pixel_count < MIN_PIXEL_COUNT {
            return Err(Error::InvalidStripLength(self.strip.pixel_count));
        }
        if self.sensor.baud_rate == 0 {
            return Err(Error::Config("sensor.baud_rate must be non-zero".to_string()));
        }
        if self.sensor.release_poll_limit == 0 || self.sensor.enroll_capture_attempts == 0 {
            return Err(Error::Config(
                "sensor poll limits must be non-zero".to_string(),
            ));
        }
        if !(self.animation.comet_falloff > 0.0) {
            return Err(Error::Config(
                "animation.comet_falloff must be positive".to_string(),
            ));
        }
        if self.animation.comet_period_ms == 0 {
            return Err(Error::Config(
                "animation.comet_period_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    let local = env::current_dir().ok()?.join(CONFIG_FILE_NAME);
    local.exists().then_some(local)
}
