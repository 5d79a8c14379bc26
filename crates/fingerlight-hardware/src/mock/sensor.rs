//! Mock fingerprint sensor implementation for testing and development.
//!
//! The mock plays back scripted status codes per operation. When a script
//! queue is empty the sensor behaves like an idle module with an unknown
//! finger: captures report `NoFinger`, conversions succeed, searches report
//! `NotFound`, and models merge and store successfully.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    HardwareError, Result,
    traits::{
        CaptureStatus, ExtractStatus, FingerprintSensor, ModelStatus, SearchOutcome, StoreStatus,
    },
    types::{DeviceInfo, FeatureSlot, SensorParameters},
};

/// Calls kept in the log; older ones are dropped first.
pub const CALL_LOG_CAPACITY: usize = 1024;

/// A sensor operation as observed by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCall {
    Initialize(u32),
    Parameters,
    TemplateCount,
    CaptureImage,
    ExtractFeatures(FeatureSlot),
    Search,
    CreateModel,
    StoreModel(u16),
}

#[derive(Debug)]
struct SensorScript {
    online: bool,
    accepts_handshake: bool,
    parameters: SensorParameters,
    template_count: u16,
    template_count_fails: bool,
    captures: VecDeque<CaptureStatus>,
    extractions: VecDeque<ExtractStatus>,
    searches: VecDeque<SearchOutcome>,
    models: VecDeque<ModelStatus>,
    stores: VecDeque<StoreStatus>,
    stored_ids: Vec<u16>,
    calls: VecDeque<SensorCall>,
}

impl Default for SensorScript {
    fn default() -> Self {
        Self {
            online: true,
            accepts_handshake: true,
            parameters: SensorParameters::default(),
            template_count: 0,
            template_count_fails: false,
            captures: VecDeque::new(),
            extractions: VecDeque::new(),
            searches: VecDeque::new(),
            models: VecDeque::new(),
            stores: VecDeque::new(),
            stored_ids: Vec::new(),
            calls: VecDeque::with_capacity(CALL_LOG_CAPACITY),
        }
    }
}

fn lock(script: &Mutex<SensorScript>) -> MutexGuard<'_, SensorScript> {
    script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock fingerprint sensor for testing and development.
///
/// # Examples
///
/// ```
/// use fingerlight_hardware::mock::MockSensor;
/// use fingerlight_hardware::traits::{FingerprintSensor, SearchOutcome};
///
/// #[tokio::main]
/// async fn main() -> fingerlight_hardware::Result<()> {
///     let (mut sensor, handle) = MockSensor::new();
///     handle.present_known_finger(3, 120);
///
///     assert!(sensor.capture_image().await?.is_ok());
///     assert_eq!(
///         sensor.search().await?,
///         SearchOutcome::Found { id: 3, confidence: 120 }
///     );
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockSensor {
    script: Arc<Mutex<SensorScript>>,
    name: String,
}

impl MockSensor {
    /// Create a new mock sensor with the default name.
    ///
    /// Returns the sensor and a handle used to script its responses.
    pub fn new() -> (Self, MockSensorHandle) {
        Self::with_name("Mock Fingerprint Sensor")
    }

    pub fn with_name(name: impl Into<String>) -> (Self, MockSensorHandle) {
        let script = Arc::new(Mutex::new(SensorScript::default()));

        let sensor = Self {
            script: Arc::clone(&script),
            name: name.into(),
        };

        (sensor, MockSensorHandle { script })
    }

    fn record(&self, call: SensorCall) -> Result<MutexGuard<'_, SensorScript>> {
        let mut script = lock(&self.script);
        if !script.online {
            return Err(HardwareError::disconnected(self.name.clone()));
        }
        if script.calls.len() == CALL_LOG_CAPACITY {
            script.calls.pop_front();
        }
        script.calls.push_back(call);
        Ok(script)
    }
}

impl Default for MockSensor {
    fn default() -> Self {
        Self::new().0
    }
}

impl FingerprintSensor for MockSensor {
    async fn initialize(&mut self, baud_rate: u32) -> Result<bool> {
        let script = self.record(SensorCall::Initialize(baud_rate))?;
        Ok(script.accepts_handshake)
    }

    async fn parameters(&mut self) -> Result<SensorParameters> {
        let script = self.record(SensorCall::Parameters)?;
        Ok(script.parameters)
    }

    async fn template_count(&mut self) -> Result<u16> {
        let script = self.record(SensorCall::TemplateCount)?;
        if script.template_count_fails {
            return Err(HardwareError::communication("TemplateNum returned 0x01"));
        }
        Ok(script.template_count)
    }

    async fn capture_image(&mut self) -> Result<CaptureStatus> {
        let mut script = self.record(SensorCall::CaptureImage)?;
        Ok(script.captures.pop_front().unwrap_or(CaptureStatus::NoFinger))
    }

    async fn extract_features(&mut self, slot: FeatureSlot) -> Result<ExtractStatus> {
        let mut script = self.record(SensorCall::ExtractFeatures(slot))?;
        Ok(script.extractions.pop_front().unwrap_or(ExtractStatus::Ok))
    }

    async fn search(&mut self) -> Result<SearchOutcome> {
        let mut script = self.record(SensorCall::Search)?;
        Ok(script.searches.pop_front().unwrap_or(SearchOutcome::NotFound))
    }

    async fn create_model(&mut self) -> Result<ModelStatus> {
        let mut script = self.record(SensorCall::CreateModel)?;
        Ok(script.models.pop_front().unwrap_or(ModelStatus::Ok))
    }

    async fn store_model(&mut self, id: u16) -> Result<StoreStatus> {
        let mut script = self.record(SensorCall::StoreModel(id))?;
        let status = script.stores.pop_front().unwrap_or(StoreStatus::Ok);
        if status.is_ok() {
            script.stored_ids.push(id);
            script.template_count = script.template_count.saturating_add(1);
        }
        Ok(status)
    }

    async fn device_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Fingerprint Sensor v1.0")
            .with_firmware_version("1.0.0"))
    }
}

/// Handle for scripting a mock fingerprint sensor.
///
/// Cloneable; every clone scripts the same sensor.
#[derive(Debug, Clone)]
pub struct MockSensorHandle {
    script: Arc<Mutex<SensorScript>>,
}

impl MockSensorHandle {
    pub fn queue_capture(&self, status: CaptureStatus) {
        lock(&self.script).captures.push_back(status);
    }

    pub fn queue_extract(&self, status: ExtractStatus) {
        lock(&self.script).extractions.push_back(status);
    }

    pub fn queue_search(&self, outcome: SearchOutcome) {
        lock(&self.script).searches.push_back(outcome);
    }

    pub fn queue_model(&self, status: ModelStatus) {
        lock(&self.script).models.push_back(status);
    }

    pub fn queue_store(&self, status: StoreStatus) {
        lock(&self.script).stores.push_back(status);
    }

    /// Simulate an enrolled finger placed on the sensor.
    ///
    /// Queues a successful capture and conversion followed by a match.
    pub fn present_known_finger(&self, id: u16, confidence: u16) {
        let mut script = lock(&self.script);
        script.captures.push_back(CaptureStatus::Ok);
        script.extractions.push_back(ExtractStatus::Ok);
        script
            .searches
            .push_back(SearchOutcome::Found { id, confidence });
    }

    /// Simulate an unknown finger held on the sensor long enough to enroll.
    ///
    /// Queues the identification pass (no match) and both enrollment reads.
    /// Model creation and storage use whatever is queued, succeeding by default.
    pub fn present_new_finger(&self) {
        let mut script = lock(&self.script);
        // identification read + two enrollment reads
        for _ in 0..3 {
            script.captures.push_back(CaptureStatus::Ok);
            script.extractions.push_back(ExtractStatus::Ok);
        }
        script.searches.push_back(SearchOutcome::NotFound);
    }

    /// Simulate a finger resting on the sensor for `polls` more captures.
    pub fn hold_finger(&self, polls: usize) {
        let mut script = lock(&self.script);
        script
            .captures
            .extend(std::iter::repeat_n(CaptureStatus::Ok, polls));
    }

    /// Connect or disconnect the sensor. A disconnected sensor fails every call.
    pub fn set_online(&self, online: bool) {
        lock(&self.script).online = online;
    }

    /// Make the password handshake succeed or fail.
    pub fn set_accepts_handshake(&self, accepts: bool) {
        lock(&self.script).accepts_handshake = accepts;
    }

    pub fn set_parameters(&self, parameters: SensorParameters) {
        lock(&self.script).parameters = parameters;
    }

    pub fn set_template_count(&self, count: u16) {
        lock(&self.script).template_count = count;
    }

    /// Make `template_count` fail while the sensor stays online.
    pub fn set_template_count_fails(&self, fails: bool) {
        lock(&self.script).template_count_fails = fails;
    }

    pub fn template_count(&self) -> u16 {
        lock(&self.script).template_count
    }

    /// Page ids successfully stored, in order.
    pub fn stored_ids(&self) -> Vec<u16> {
        lock(&self.script).stored_ids.clone()
    }

    /// The most recent calls made to the sensor, oldest first.
    ///
    /// At most [`CALL_LOG_CAPACITY`] calls are kept.
    pub fn calls(&self) -> Vec<SensorCall> {
        lock(&self.script).calls.iter().copied().collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.script).calls.clear();
    }

    /// Number of scripted captures not yet consumed.
    pub fn pending_captures(&self) -> usize {
        lock(&self.script).captures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_log_is_bounded() {
        let (mut sensor, handle) = MockSensor::new();
        sensor.template_count().await.unwrap();
        for _ in 0..CALL_LOG_CAPACITY * 3 {
            sensor.capture_image().await.unwrap();
        }
        sensor.search().await.unwrap();

        let calls = handle.calls();
        assert_eq!(calls.len(), CALL_LOG_CAPACITY);
        assert!(!calls.contains(&SensorCall::TemplateCount));
        assert_eq!(calls.last(), Some(&SensorCall::Search));
    }

    #[tokio::test]
    async fn test_template_count_failure() {
        let (mut sensor, handle) = MockSensor::new();
        handle.set_template_count(10);
        handle.set_template_count_fails(true);

        let err = sensor.template_count().await.unwrap_err();
        assert!(matches!(err, HardwareError::CommunicationError { .. }));
        assert_eq!(sensor.capture_image().await.unwrap(), CaptureStatus::NoFinger);

        handle.set_template_count_fails(false);
        assert_eq!(sensor.template_count().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_mock_sensor_defaults() {
        let (mut sensor, handle) = MockSensor::new();

        assert_eq!(sensor.capture_image().await.unwrap(), CaptureStatus::NoFinger);
        assert_eq!(
            sensor.extract_features(FeatureSlot::One).await.unwrap(),
            ExtractStatus::Ok
        );
        assert_eq!(sensor.search().await.unwrap(), SearchOutcome::NotFound);
        assert_eq!(sensor.create_model().await.unwrap(), ModelStatus::Ok);
        assert_eq!(sensor.store_model(1).await.unwrap(), StoreStatus::Ok);

        assert_eq!(handle.stored_ids(), vec![1]);
        assert_eq!(handle.template_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_sensor_scripted_order() {
        let (mut sensor, handle) = MockSensor::new();
        handle.queue_capture(CaptureStatus::ImagingError);
        handle.queue_capture(CaptureStatus::Ok);

        assert_eq!(
            sensor.capture_image().await.unwrap(),
            CaptureStatus::ImagingError
        );
        assert_eq!(sensor.capture_image().await.unwrap(), CaptureStatus::Ok);
        assert_eq!(sensor.capture_image().await.unwrap(), CaptureStatus::NoFinger);
    }

    #[tokio::test]
    async fn test_mock_sensor_failed_store_not_recorded() {
        let (mut sensor, handle) = MockSensor::new();
        handle.queue_store(StoreStatus::FlashError);

        assert_eq!(sensor.store_model(4).await.unwrap(), StoreStatus::FlashError);
        assert!(handle.stored_ids().is_empty());
        assert_eq!(handle.template_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_sensor_offline() {
        let (mut sensor, handle) = MockSensor::new();
        handle.set_online(false);

        let result = sensor.capture_image().await;
        assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
        assert!(handle.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mock_sensor_handshake() {
        let (mut sensor, handle) = MockSensor::new();
        assert!(sensor.initialize(57_600).await.unwrap());

        handle.set_accepts_handshake(false);
        assert!(!sensor.initialize(57_600).await.unwrap());
        assert_eq!(
            handle.calls(),
            vec![SensorCall::Initialize(57_600), SensorCall::Initialize(57_600)]
        );
    }

    #[tokio::test]
    async fn test_present_known_finger() {
        let (mut sensor, handle) = MockSensor::new();
        handle.present_known_finger(7, 88);

        assert!(sensor.capture_image().await.unwrap().is_ok());
        assert!(sensor
            .extract_features(FeatureSlot::One)
            .await
            .unwrap()
            .is_ok());
        assert_eq!(sensor.search().await.unwrap().matched_id(), Some(7));
        assert_eq!(handle.pending_captures(), 0);
    }

    #[tokio::test]
    async fn test_present_new_finger_queues_three_reads() {
        let (_sensor, handle) = MockSensor::new();
        handle.present_new_finger();
        assert_eq!(handle.pending_captures(), 3);
    }

    #[tokio::test]
    async fn test_device_info() {
        let (sensor, _handle) = MockSensor::with_name("Bench Sensor");
        let info = sensor.device_info().await.unwrap();
        assert_eq!(info.name, "Bench Sensor");
        assert_eq!(info.firmware_version, Some("1.0.0".to_string()));
    }
}
