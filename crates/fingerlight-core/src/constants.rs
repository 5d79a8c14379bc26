//! Device-level constants shared by every Fingerlight crate.
//!
//! Values in this module describe the physical device the firmware was
//! designed around: a short WS2812B strip and an R30x-class optical
//! fingerprint module on a UART. Runtime-tunable values live in
//! [`DeviceConfig`](crate::config::DeviceConfig) and use these constants as
//! their defaults.
//!
//! # Usage
//!
//! ```
//! use fingerlight_core::constants::*;
//!
//! assert_eq!(COLOR_TABLE_CAPACITY, 256);
//! assert!(DEFAULT_PIXEL_COUNT >= MIN_PIXEL_COUNT);
//! ```

// ============================================================================
// Identities and colors
// ============================================================================

/// Number of slots in the color assignment table.
///
/// Covers every identity a `u8` can express, including the idle slot 0.
pub const COLOR_TABLE_CAPACITY: usize = 256;

/// Identity value reserved for "no active match".
pub const IDLE_IDENTITY: u8 = 0;

/// Number of distinct hues in the 8-bit hue wheel.
pub const HUE_STEPS: u16 = 256;

// ============================================================================
// LED strip
// ============================================================================

/// Default number of pixels on the strip.
pub const DEFAULT_PIXEL_COUNT: usize = 35;

/// Smallest strip the animation engine accepts.
pub const MIN_PIXEL_COUNT: usize = 1;

/// Default GPIO pin driving the strip data line.
pub const DEFAULT_DATA_PIN: u8 = 12;

// ============================================================================
// Animation
// ============================================================================

/// Brightness (HSV value) of the idle rainbow.
pub const DEFAULT_IDLE_BRIGHTNESS: u8 = 100;

/// Hue steps the idle rainbow drifts per elapsed millisecond.
///
/// At 0.1 the rainbow completes one full hue rotation every 2.56 seconds.
pub const DEFAULT_IDLE_DRIFT_PER_MS: f32 = 0.1;

/// Width of the comet tail as a fraction of the strip length.
pub const DEFAULT_COMET_FALLOFF: f32 = 0.1;

/// Time for the comet to sweep the whole strip once, in milliseconds.
pub const DEFAULT_COMET_PERIOD_MS: u64 = 1500;

// ============================================================================
// Fingerprint sensor
// ============================================================================

/// Default UART baud rate of R30x/AS608 modules.
pub const DEFAULT_SENSOR_BAUD_RATE: u32 = 57_600;

/// Default module address (broadcast).
pub const DEFAULT_SENSOR_ADDRESS: u32 = 0xFFFF_FFFF;

/// Default module password.
pub const DEFAULT_SENSOR_PASSWORD: u32 = 0;

/// Delay between finger-presence polls of the control loop, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Delay between polls while waiting for the finger to be lifted.
pub const DEFAULT_RELEASE_POLL_INTERVAL_MS: u64 = 100;

/// Maximum polls while waiting for the finger to be lifted.
pub const DEFAULT_RELEASE_POLL_LIMIT: u32 = 100;

/// Maximum capture polls per enrollment pass before the enrollment is dropped.
pub const DEFAULT_ENROLL_CAPTURE_ATTEMPTS: u32 = 50;
