//! Hardware device trait definitions.
//!
//! Two devices make up the access-feedback unit:
//!
//! - [`FingerprintSensor`]: a slow, multi-step capture/convert/search/store
//!   module driven by the identification state machine.
//! - [`LedStrip`]: a pixel strip the animation engine flushes frames to.
//!
//! Every sensor operation returns a closed status enum so callers must handle
//! each outcome the module can report. `Err` is reserved for transport
//! failures (disconnected port, garbled packet).
//!
//! The sensor trait uses native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT). The strip trait is synchronous: it is only ever driven from the
//! dedicated render thread, which must never await.

#![allow(async_fn_in_trait)]

use fingerlight_core::Rgb;

use crate::error::Result;
use crate::types::{DeviceInfo, FeatureSlot, SensorParameters, StripConfig};

/// Outcome of an image capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureStatus {
    /// An image of a finger was captured.
    Ok,

    /// No finger is on the sensor.
    NoFinger,

    /// Packet receive error between host and module.
    CommError,

    /// The module failed to image the finger.
    ImagingError,
}

/// Outcome of converting the captured image to a feature template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractStatus {
    Ok,

    /// Image too messy to convert.
    TooMessy,

    CommError,

    /// Not enough feature points.
    FeatureFail,

    /// Image buffer holds no valid image.
    InvalidImage,
}

/// Outcome of searching the template library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOutcome {
    /// A stored template matched.
    Found {
        /// Template page of the match.
        id: u16,
        /// Match score reported by the module.
        confidence: u16,
    },

    /// No stored template matched.
    NotFound,

    CommError,
}

/// Outcome of merging both feature buffers into a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelStatus {
    Ok,

    CommError,

    /// The two reads are not from the same finger.
    Mismatch,
}

/// Outcome of storing a model into the template library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreStatus {
    Ok,

    CommError,

    /// Page id outside the library.
    BadLocation,

    /// Writing the flash failed.
    FlashError,
}

macro_rules! impl_is_ok {
    ($($status:ty),+) => {
        $(impl $status {
            /// Check if the module reported success.
            pub fn is_ok(&self) -> bool {
                matches!(self, Self::Ok)
            }
        })+
    };
}

impl_is_ok!(CaptureStatus, ExtractStatus, ModelStatus, StoreStatus);

impl SearchOutcome {
    /// Template page of the match, if any.
    pub fn matched_id(&self) -> Option<u16> {
        match self {
            Self::Found { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Fingerprint sensor abstraction.
///
/// Models the command set of R30x/AS608-class optical modules. A finger is
/// identified by capturing an image, converting it into feature buffer one,
/// and searching the library. Enrollment captures twice, converts into both
/// buffers, merges them and stores the model at a page id.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait is NOT object-safe (`async fn` methods return opaque futures).
/// Use generic parameters, or an enum wrapper for runtime selection.
///
/// # Examples
///
/// ```no_run
/// use fingerlight_hardware::traits::{CaptureStatus, FingerprintSensor, SearchOutcome};
/// use fingerlight_hardware::types::FeatureSlot;
/// use fingerlight_hardware::Result;
///
/// async fn identify<S: FingerprintSensor>(sensor: &mut S) -> Result<Option<u16>> {
///     if sensor.capture_image().await? != CaptureStatus::Ok {
///         return Ok(None);
///     }
///     if !sensor.extract_features(FeatureSlot::One).await?.is_ok() {
///         return Ok(None);
///     }
///     Ok(sensor.search().await?.matched_id())
/// }
/// ```
pub trait FingerprintSensor: Send + Sync {
    /// Open the link and verify the module password.
    ///
    /// Returns `Ok(false)` when the module answers but rejects the handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be configured or the module does
    /// not answer at all.
    async fn initialize(&mut self, baud_rate: u32) -> Result<bool>;

    /// Read the module's system parameters.
    async fn parameters(&mut self) -> Result<SensorParameters>;

    /// Number of templates stored in the library.
    async fn template_count(&mut self) -> Result<u16>;

    /// Capture a finger image into the image buffer.
    async fn capture_image(&mut self) -> Result<CaptureStatus>;

    /// Convert the image buffer into the given feature buffer.
    async fn extract_features(&mut self, slot: FeatureSlot) -> Result<ExtractStatus>;

    /// Search the whole library with feature buffer one.
    async fn search(&mut self) -> Result<SearchOutcome>;

    /// Merge both feature buffers into a model.
    async fn create_model(&mut self) -> Result<ModelStatus>;

    /// Store the merged model at page `id`.
    async fn store_model(&mut self, id: u16) -> Result<StoreStatus>;

    /// Get device information.
    async fn device_info(&self) -> Result<DeviceInfo>;
}

/// Addressable LED strip abstraction.
///
/// Frames are staged with [`set_frame`](LedStrip::set_frame) and pushed to the
/// LEDs by [`flush`](LedStrip::flush). Both are synchronous and infallible:
/// once configured, a strip always accepts frames.
pub trait LedStrip: Send {
    /// Prepare the strip for `config.pixel_count` pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable by this driver.
    fn configure(&mut self, config: &StripConfig) -> Result<()>;

    /// Stage a frame. Extra pixels are ignored; missing pixels stay dark.
    fn set_frame(&mut self, frame: &[Rgb]);

    /// Push the staged frame to the LEDs.
    fn flush(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_ok() {
        assert!(CaptureStatus::Ok.is_ok());
        assert!(!CaptureStatus::NoFinger.is_ok());
        assert!(ExtractStatus::Ok.is_ok());
        assert!(!ExtractStatus::TooMessy.is_ok());
        assert!(ModelStatus::Ok.is_ok());
        assert!(!ModelStatus::Mismatch.is_ok());
        assert!(StoreStatus::Ok.is_ok());
        assert!(!StoreStatus::FlashError.is_ok());
    }

    #[test]
    fn test_search_matched_id() {
        let found = SearchOutcome::Found {
            id: 3,
            confidence: 120,
        };
        assert_eq!(found.matched_id(), Some(3));
        assert_eq!(SearchOutcome::NotFound.matched_id(), None);
        assert_eq!(SearchOutcome::CommError.matched_id(), None);
    }
}
