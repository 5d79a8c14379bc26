//! Common types shared across hardware device implementations.

use fingerlight_core::config::{ColorOrder, StripSettings};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "R307", "MockSensor").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            firmware_version: None,
        }
    }

    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// System parameters reported by a fingerprint module.
///
/// Mirrors the 16-byte `ReadSysPara` block of R30x/AS608 modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorParameters {
    /// Module status register.
    pub status_register: u16,

    /// System identifier code.
    pub system_id: u16,

    /// Template library capacity.
    pub capacity: u16,

    /// Matching security level (1-5).
    pub security_level: u16,

    /// Module address.
    pub device_address: u32,

    /// Maximum data packet length in bytes (32, 64, 128 or 256).
    pub packet_length: u16,

    /// UART baud rate in bits per second.
    pub baud_rate: u32,
}

impl Default for SensorParameters {
    fn default() -> Self {
        Self {
            status_register: 0,
            system_id: 0,
            capacity: 200,
            security_level: 3,
            device_address: 0xFFFF_FFFF,
            packet_length: 128,
            baud_rate: 57_600,
        }
    }
}

impl fmt::Display for SensorParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status=0x{:X} sys_id=0x{:X} capacity={} security={} addr=0x{:X} packet_len={} baud={}",
            self.status_register,
            self.system_id,
            self.capacity,
            self.security_level,
            self.device_address,
            self.packet_length,
            self.baud_rate
        )
    }
}

/// Feature buffer a converted image is written to.
///
/// Modules hold two buffers; a model is merged from both during enrollment,
/// while searches always read buffer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureSlot {
    One,
    Two,
}

impl FeatureSlot {
    /// Buffer id on the wire.
    pub fn buffer_id(self) -> u8 {
        match self {
            FeatureSlot::One => 1,
            FeatureSlot::Two => 2,
        }
    }
}

/// Configuration handed to a strip driver before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripConfig {
    /// Number of pixels on the strip.
    pub pixel_count: usize,

    /// GPIO pin of the data line.
    pub data_pin: u8,

    /// Channel order expected by the LEDs.
    pub color_order: ColorOrder,
}

impl StripConfig {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            pixel_count,
            data_pin: fingerlight_core::constants::DEFAULT_DATA_PIN,
            color_order: ColorOrder::default(),
        }
    }

    #[must_use]
    pub fn with_color_order(mut self, color_order: ColorOrder) -> Self {
        self.color_order = color_order;
        self
    }

    #[must_use]
    pub fn with_data_pin(mut self, data_pin: u8) -> Self {
        self.data_pin = data_pin;
        self
    }
}

impl From<&StripSettings> for StripConfig {
    fn from(settings: &StripSettings) -> Self {
        Self {
            pixel_count: settings.pixel_count,
            data_pin: settings.data_pin,
            color_order: settings.color_order,
        }
    }
}
