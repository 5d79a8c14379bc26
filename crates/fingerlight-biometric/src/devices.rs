//! Enum wrapper for fingerprint sensor dispatch.
//!
//! `FingerprintSensor` uses native `async fn` and is not object-safe, so the
//! binary picks its sensor through this enum.
//!
//! # Examples
//!
//! ```
//! use fingerlight_biometric::AnySensor;
//! use fingerlight_hardware::mock::MockSensor;
//! use fingerlight_hardware::traits::FingerprintSensor;
//!
//! #[tokio::main]
//! async fn main() -> fingerlight_hardware::Result<()> {
//!     let (sensor, _handle) = MockSensor::new();
//!     let mut sensor = AnySensor::Mock(sensor);
//!     assert!(sensor.initialize(57_600).await?);
//!     Ok(())
//! }
//! ```

use fingerlight_hardware::{
    Result,
    mock::MockSensor,
    traits::{
        CaptureStatus, ExtractStatus, FingerprintSensor, ModelStatus, SearchOutcome, StoreStatus,
    },
    types::{DeviceInfo, FeatureSlot, SensorParameters},
};
use serialport::SerialPort;

use crate::driver::R30xSensor;

/// Fingerprint sensor selected at startup.
#[non_exhaustive]
pub enum AnySensor {
    /// Scripted sensor for development and testing.
    Mock(MockSensor),

    /// R30x/AS608 module on a serial port.
    R30x(R30xSensor<Box<dyn SerialPort>>),
}

impl FingerprintSensor for AnySensor {
    async fn initialize(&mut self, baud_rate: u32) -> Result<bool> {
        match self {
            Self::Mock(sensor) => sensor.initialize(baud_rate).await,
            Self::R30x(sensor) => sensor.initialize(baud_rate).await,
        }
    }

    async fn parameters(&mut self) -> Result<SensorParameters> {
        match self {
            Self::Mock(sensor) => sensor.parameters().await,
            Self::R30x(sensor) => sensor.parameters().await,
        }
    }

    async fn template_count(&mut self) -> Result<u16> {
        match self {
            Self::Mock(sensor) => sensor.template_count().await,
            Self::R30x(sensor) => sensor.template_count().await,
        }
    }

    async fn capture_image(&mut self) -> Result<CaptureStatus> {
        match self {
            Self::Mock(sensor) => sensor.capture_image().await,
            Self::R30x(sensor) => sensor.capture_image().await,
        }
    }

    async fn extract_features(&mut self, slot: FeatureSlot) -> Result<ExtractStatus> {
        match self {
            Self::Mock(sensor) => sensor.extract_features(slot).await,
            Self::R30x(sensor) => sensor.extract_features(slot).await,
        }
    }

    async fn search(&mut self) -> Result<SearchOutcome> {
        match self {
            Self::Mock(sensor) => sensor.search().await,
            Self::R30x(sensor) => sensor.search().await,
        }
    }

    async fn create_model(&mut self) -> Result<ModelStatus> {
        match self {
            Self::Mock(sensor) => sensor.create_model().await,
            Self::R30x(sensor) => sensor.create_model().await,
        }
    }

    async fn store_model(&mut self, id: u16) -> Result<StoreStatus> {
        match self {
            Self::Mock(sensor) => sensor.store_model(id).await,
            Self::R30x(sensor) => sensor.store_model(id).await,
        }
    }

    async fn device_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(sensor) => sensor.device_info().await,
            Self::R30x(sensor) => sensor.device_info().await,
        }
    }
}

impl From<MockSensor> for AnySensor {
    fn from(sensor: MockSensor) -> Self {
        Self::Mock(sensor)
    }
}

impl From<R30xSensor<Box<dyn SerialPort>>> for AnySensor {
    fn from(sensor: R30xSensor<Box<dyn SerialPort>>) -> Self {
        Self::R30x(sensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_dispatch() {
        let (sensor, handle) = MockSensor::new();
        handle.present_known_finger(7, 99);
        let mut sensor = AnySensor::from(sensor);

        assert_eq!(sensor.capture_image().await.unwrap(), CaptureStatus::Ok);
        assert_eq!(
            sensor.extract_features(FeatureSlot::One).await.unwrap(),
            ExtractStatus::Ok
        );
        assert_eq!(sensor.search().await.unwrap().matched_id(), Some(7));
    }

    #[tokio::test]
    async fn test_mock_device_info() {
        let (sensor, _handle) = MockSensor::with_name("bench");
        let sensor = AnySensor::Mock(sensor);
        assert_eq!(sensor.device_info().await.unwrap().name, "bench");
    }
}
