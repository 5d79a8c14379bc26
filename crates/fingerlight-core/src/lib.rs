//! Shared building blocks for the Fingerlight access-feedback device.
//!
//! - [`Identity`]: handle of an enrolled fingerprint template (0 = idle)
//! - [`color`]: RGB/HSV types and the rainbow hue mapping
//! - [`config`]: layered device configuration
//! - [`Error`]: startup and configuration errors

pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use color::{Hsv, Rgb};
pub use config::DeviceConfig;
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
