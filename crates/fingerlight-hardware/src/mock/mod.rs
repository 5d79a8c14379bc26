//! Mock device implementations for testing and development.
//!
//! These devices are controlled programmatically through their handles and
//! need no physical hardware.

pub mod sensor;
pub mod strip;

pub use sensor::{CALL_LOG_CAPACITY, MockSensor, MockSensorHandle, SensorCall};
pub use strip::{MockStrip, MockStripHandle};
