//! Hardware abstraction layer for the fingerlight access-feedback unit.
//!
//! Defines the two peripherals the unit drives and the back ends available
//! without real hardware:
//!
//! - [`FingerprintSensor`]: an optical fingerprint module that captures,
//!   converts, searches and stores templates. Operations are `async` because
//!   each round trip takes tens to hundreds of milliseconds on the wire.
//! - [`LedStrip`]: an addressable pixel strip. Synchronous, driven only from
//!   the render thread.
//!
//! # Mock Implementations
//!
//! [`mock::MockSensor`] and [`mock::MockStrip`] come paired with handles that
//! script sensor responses and inspect flushed frames from tests.
//! [`terminal::TerminalStrip`] previews the strip as coloured blocks in a
//! terminal.
//!
//! ```no_run
//! use fingerlight_hardware::mock::MockSensor;
//! use fingerlight_hardware::traits::FingerprintSensor;
//!
//! #[tokio::main]
//! async fn main() -> fingerlight_hardware::Result<()> {
//!     let (mut sensor, handle) = MockSensor::new();
//!     handle.present_known_finger(3, 150);
//!
//!     assert!(sensor.initialize(57_600).await?);
//!     println!("{}", sensor.parameters().await?);
//!     Ok(())
//! }
//! ```
//!
//! [`FingerprintSensor`]: traits::FingerprintSensor
//! [`LedStrip`]: traits::LedStrip

pub mod devices;
pub mod error;
pub mod mock;
pub mod terminal;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use traits::{
    CaptureStatus, ExtractStatus, FingerprintSensor, LedStrip, ModelStatus, SearchOutcome,
    StoreStatus,
};
pub use types::{DeviceInfo, FeatureSlot, SensorParameters, StripConfig};
