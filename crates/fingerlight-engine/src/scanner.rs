//! Identification/enrollment state machine.
//!
//! One call to [`ScanStateMachine::run_scan_cycle`] handles one finger
//! presentation:
//!
//! ```text
//! AwaitFinger ──NoFinger──────────────────────────────► Idle
//!     │ Ok
//!     ▼
//! ExtractFeatures(1) ──fail──────────────────────────► Error(kind)
//!     │ Ok
//!     ▼
//! Search ──Found(id)──────────────────────────────────► Matched(id)
//!     │ NotFound
//!     ▼
//! Enroll: capture → extract(1) → capture → extract(2)
//!         → create model → store(next id) → assign color
//!     │ (success or failure)
//!     ▼
//! WaitRelease (bounded poll) ─────────────────────────► Idle
//! ```
//!
//! Every sensor error is classified, never retried inside a cycle. The
//! control loop's next call is the retry. The cycle's result is published to
//! [`SharedState`] before returning; errors publish idle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use fingerlight_core::{Identity, config::SensorConfig};
use fingerlight_hardware::{
    CaptureStatus, ExtractStatus, FeatureSlot, FingerprintSensor, ModelStatus, SearchOutcome,
    StoreStatus,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use crate::palette;
use crate::shared::SharedState;

/// Classification of a failed scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanErrorKind {
    /// Packet error or transport failure.
    Communication,
    /// The sensor could not image the finger.
    Imaging,
    /// The image was too messy to convert.
    TooMessy,
    /// Not enough feature points.
    FeatureExtraction,
    /// No valid image in the image buffer.
    InvalidImage,
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Communication => "communication error",
            Self::Imaging => "imaging error",
            Self::TooMessy => "image too messy",
            Self::FeatureExtraction => "could not find fingerprint features",
            Self::InvalidImage => "invalid image",
        };
        f.write_str(text)
    }
}

impl ScanErrorKind {
    fn from_capture(status: CaptureStatus) -> Option<Self> {
        match status {
            CaptureStatus::Ok | CaptureStatus::NoFinger => None,
            CaptureStatus::CommError => Some(Self::Communication),
            CaptureStatus::ImagingError => Some(Self::Imaging),
        }
    }

    fn from_extract(status: ExtractStatus) -> Option<Self> {
        match status {
            ExtractStatus::Ok => None,
            ExtractStatus::TooMessy => Some(Self::TooMessy),
            ExtractStatus::CommError => Some(Self::Communication),
            ExtractStatus::FeatureFail => Some(Self::FeatureExtraction),
            ExtractStatus::InvalidImage => Some(Self::InvalidImage),
        }
    }
}

/// Outcome of one scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanResult {
    /// No finger, or a presentation that ended in enrollment.
    Idle,
    /// A stored template matched.
    Matched(Identity),
    /// The cycle was aborted.
    Error(ScanErrorKind),
}

impl ScanResult {
    /// Identity to publish for this result.
    pub fn identity(&self) -> Identity {
        match self {
            Self::Matched(identity) => *identity,
            Self::Idle | Self::Error(_) => Identity::IDLE,
        }
    }
}

/// Why `create_model` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModelFailure {
    #[error("fingerprints did not match")]
    Mismatch,
    #[error("communication error")]
    Communication,
}

/// Why `store_model` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreFailure {
    #[error("could not store in that location")]
    BadLocation,
    #[error("error writing to flash")]
    Flash,
    #[error("communication error")]
    Communication,
}

/// Stage at which an enrollment was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnrollmentFailure {
    #[error("no finger on pass {pass}")]
    NoFinger { pass: u8 },

    #[error("capture pass {pass}: {kind}")]
    Capture { pass: u8, kind: ScanErrorKind },

    #[error("feature extraction pass {pass}: {kind}")]
    Extract { pass: u8, kind: ScanErrorKind },

    #[error("create model: {0}")]
    CreateModel(ModelFailure),

    #[error("store model #{id}: {reason}")]
    Store { id: u8, reason: StoreFailure },

    #[error("color table is full")]
    TableFull,
}

/// Counters kept across scan cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub cycles: u64,
    pub matches: u64,
    pub enrollments: u64,
    pub enrollment_failures: u64,
    pub errors: u64,
}

/// Polling parameters of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    /// Delay between capture polls while waiting for a finger during enrollment.
    pub poll_interval: Duration,
    /// Delay between polls while waiting for the finger to be lifted.
    pub release_poll_interval: Duration,
    /// Maximum polls while waiting for the finger to be lifted.
    pub release_poll_limit: u32,
    /// Maximum capture polls per enrollment pass.
    pub enroll_capture_attempts: u32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::from(&SensorConfig::default())
    }
}

impl From<&SensorConfig> for ScanSettings {
    fn from(config: &SensorConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            release_poll_interval: config.release_poll_interval(),
            release_poll_limit: config.release_poll_limit,
            enroll_capture_attempts: config.enroll_capture_attempts,
        }
    }
}

/// Drives a fingerprint sensor through identification and enrollment.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fingerlight_core::Identity;
/// use fingerlight_engine::{ScanResult, ScanSettings, ScanStateMachine, SharedState};
/// use fingerlight_hardware::mock::MockSensor;
///
/// #[tokio::main]
/// async fn main() {
///     let (sensor, handle) = MockSensor::new();
///     let shared = Arc::new(SharedState::new());
///     let mut machine = ScanStateMachine::new(sensor, Arc::clone(&shared), ScanSettings::default());
///
///     handle.present_known_finger(3, 120);
///     assert_eq!(machine.run_scan_cycle().await, ScanResult::Matched(Identity::new(3)));
///     assert_eq!(shared.read_latest(), Identity::new(3));
/// }
/// ```
pub struct ScanStateMachine<S> {
    sensor: S,
    shared: Arc<SharedState>,
    settings: ScanSettings,
    rng: StdRng,
    stats: ScanStats,
}

impl<S: FingerprintSensor> ScanStateMachine<S> {
    pub fn new(sensor: S, shared: Arc<SharedState>, settings: ScanSettings) -> Self {
        Self {
            sensor,
            shared,
            settings,
            rng: StdRng::from_entropy(),
            stats: ScanStats::default(),
        }
    }

    /// Use a seeded color generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Fill the color table with random colors.
    pub fn randomize_colors(&mut self) {
        palette::fill_random(self.shared.colors(), &mut self.rng);
    }

    /// Run one scan cycle and publish its result.
    pub async fn run_scan_cycle(&mut self) -> ScanResult {
        self.stats.cycles += 1;

        let result = self.identify().await;
        match result {
            ScanResult::Matched(_) => self.stats.matches += 1,
            ScanResult::Error(kind) => {
                self.stats.errors += 1;
                debug!("Scan cycle aborted: {}", kind);
            }
            ScanResult::Idle => {}
        }

        self.shared.publish(result.identity());
        result
    }

    async fn identify(&mut self) -> ScanResult {
        match self.sensor.capture_image().await {
            Ok(CaptureStatus::Ok) => trace!("Image taken"),
            Ok(CaptureStatus::NoFinger) => return ScanResult::Idle,
            Ok(status) => return Self::error(ScanErrorKind::from_capture(status)),
            Err(e) => return Self::transport_error("capture", &e),
        }

        match self.sensor.extract_features(FeatureSlot::One).await {
            Ok(ExtractStatus::Ok) => trace!("Image converted"),
            Ok(status) => return Self::error(ScanErrorKind::from_extract(status)),
            Err(e) => return Self::transport_error("extract", &e),
        }

        match self.sensor.search().await {
            Ok(SearchOutcome::Found { id, confidence }) => match u8::try_from(id) {
                Ok(raw) if raw != 0 => {
                    info!("Found ID #{} with confidence of {}", id, confidence);
                    ScanResult::Matched(Identity::new(raw))
                }
                _ => {
                    warn!("Matched template #{} has no color table entry", id);
                    ScanResult::Idle
                }
            },
            Ok(SearchOutcome::NotFound) => {
                debug!("Did not find a match, enrolling");
                self.enroll().await;
                self.wait_for_release().await;
                ScanResult::Idle
            }
            Ok(SearchOutcome::CommError) => ScanResult::Error(ScanErrorKind::Communication),
            Err(e) => Self::transport_error("search", &e),
        }
    }

    fn error(kind: Option<ScanErrorKind>) -> ScanResult {
        ScanResult::Error(kind.unwrap_or(ScanErrorKind::Communication))
    }

    fn transport_error(stage: &str, error: &fingerlight_hardware::HardwareError) -> ScanResult {
        debug!("Sensor {} failed: {}", stage, error);
        ScanResult::Error(ScanErrorKind::Communication)
    }

    /// Enroll the finger on the sensor, logging the outcome.
    async fn enroll(&mut self) -> Option<Identity> {
        match self.try_enroll().await {
            Ok(identity) => {
                self.stats.enrollments += 1;
                info!("Enrolled new fingerprint as ID {}", identity);
                Some(identity)
            }
            Err(failure) => {
                self.stats.enrollment_failures += 1;
                warn!("Enrollment abandoned: {}", failure);
                None
            }
        }
    }

    async fn try_enroll(&mut self) -> Result<Identity, EnrollmentFailure> {
        let identity = self
            .shared
            .next_identity()
            .ok_or(EnrollmentFailure::TableFull)?;

        for (pass, slot) in [(1, FeatureSlot::One), (2, FeatureSlot::Two)] {
            self.await_enroll_capture(pass).await?;

            match self.sensor.extract_features(slot).await {
                Ok(ExtractStatus::Ok) => {}
                Ok(status) => {
                    let kind = ScanErrorKind::from_extract(status)
                        .unwrap_or(ScanErrorKind::Communication);
                    return Err(EnrollmentFailure::Extract { pass, kind });
                }
                Err(e) => {
                    debug!("Sensor extract failed: {}", e);
                    return Err(EnrollmentFailure::Extract {
                        pass,
                        kind: ScanErrorKind::Communication,
                    });
                }
            }
        }

        match self.sensor.create_model().await {
            Ok(ModelStatus::Ok) => {}
            Ok(ModelStatus::Mismatch) => {
                return Err(EnrollmentFailure::CreateModel(ModelFailure::Mismatch));
            }
            Ok(ModelStatus::CommError) | Err(_) => {
                return Err(EnrollmentFailure::CreateModel(ModelFailure::Communication));
            }
        }

        let id = identity.as_u8();
        let reason = match self.sensor.store_model(u16::from(id)).await {
            Ok(StoreStatus::Ok) => None,
            Ok(StoreStatus::BadLocation) => Some(StoreFailure::BadLocation),
            Ok(StoreStatus::FlashError) => Some(StoreFailure::Flash),
            Ok(StoreStatus::CommError) | Err(_) => Some(StoreFailure::Communication),
        };
        if let Some(reason) = reason {
            return Err(EnrollmentFailure::Store { id, reason });
        }

        // Color first, then the counter that makes the id valid.
        let color = palette::random_color(&mut self.rng);
        self.shared.assign_color(identity, color);
        self.shared.set_enrolled_count(u16::from(id));
        Ok(identity)
    }

    /// Poll until a finger is imaged for enrollment pass `pass`.
    async fn await_enroll_capture(&mut self, pass: u8) -> Result<(), EnrollmentFailure> {
        for _ in 0..self.settings.enroll_capture_attempts {
            match self.sensor.capture_image().await {
                Ok(CaptureStatus::Ok) => return Ok(()),
                Ok(CaptureStatus::NoFinger) => sleep(self.settings.poll_interval).await,
                Ok(status) => {
                    let kind =
                        ScanErrorKind::from_capture(status).unwrap_or(ScanErrorKind::Communication);
                    return Err(EnrollmentFailure::Capture { pass, kind });
                }
                Err(e) => {
                    debug!("Sensor capture failed: {}", e);
                    return Err(EnrollmentFailure::Capture {
                        pass,
                        kind: ScanErrorKind::Communication,
                    });
                }
            }
        }
        Err(EnrollmentFailure::NoFinger { pass })
    }

    /// Poll until the finger is lifted. Returns `false` if it never was.
    async fn wait_for_release(&mut self) -> bool {
        for _ in 0..self.settings.release_poll_limit {
            if let Ok(CaptureStatus::NoFinger) = self.sensor.capture_image().await {
                return true;
            }
            sleep(self.settings.release_poll_interval).await;
        }
        warn!(
            "Finger still present after {} polls",
            self.settings.release_poll_limit
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fingerlight_hardware::mock::{MockSensor, MockSensorHandle, SensorCall};
    use rstest::rstest;

    fn machine() -> (ScanStateMachine<MockSensor>, MockSensorHandle, Arc<SharedState>) {
        let (sensor, handle) = MockSensor::new();
        let shared = Arc::new(SharedState::new());
        let machine = ScanStateMachine::new(sensor, Arc::clone(&shared), ScanSettings::default())
            .with_seed(1);
        (machine, handle, shared)
    }

    #[rstest]
    #[case(CaptureStatus::CommError, ScanErrorKind::Communication)]
    #[case(CaptureStatus::ImagingError, ScanErrorKind::Imaging)]
    #[tokio::test]
    async fn test_capture_errors(#[case] status: CaptureStatus, #[case] kind: ScanErrorKind) {
        let (mut machine, handle, _shared) = machine();
        handle.queue_capture(status);

        assert_eq!(machine.run_scan_cycle().await, ScanResult::Error(kind));
        assert_eq!(handle.calls(), vec![SensorCall::CaptureImage]);
    }

    #[rstest]
    #[case(ExtractStatus::TooMessy, ScanErrorKind::TooMessy)]
    #[case(ExtractStatus::CommError, ScanErrorKind::Communication)]
    #[case(ExtractStatus::FeatureFail, ScanErrorKind::FeatureExtraction)]
    #[case(ExtractStatus::InvalidImage, ScanErrorKind::InvalidImage)]
    #[tokio::test]
    async fn test_extract_errors(#[case] status: ExtractStatus, #[case] kind: ScanErrorKind) {
        let (mut machine, handle, _shared) = machine();
        handle.queue_capture(CaptureStatus::Ok);
        handle.queue_extract(status);

        assert_eq!(machine.run_scan_cycle().await, ScanResult::Error(kind));
        assert!(!handle.calls().contains(&SensorCall::Search));
    }

    #[tokio::test]
    async fn test_search_comm_error() {
        let (mut machine, handle, shared) = machine();
        handle.queue_capture(CaptureStatus::Ok);
        handle.queue_search(SearchOutcome::CommError);

        assert_eq!(
            machine.run_scan_cycle().await,
            ScanResult::Error(ScanErrorKind::Communication)
        );
        assert!(shared.read_latest().is_idle());
        assert_eq!(machine.stats().errors, 1);
    }

    #[tokio::test]
    async fn test_disconnected_sensor_is_communication_error() {
        let (mut machine, handle, _shared) = machine();
        handle.set_online(false);

        assert_eq!(
            machine.run_scan_cycle().await,
            ScanResult::Error(ScanErrorKind::Communication)
        );
    }

    #[tokio::test]
    async fn test_error_publishes_idle_after_match() {
        let (mut machine, handle, shared) = machine();
        handle.present_known_finger(4, 90);
        machine.run_scan_cycle().await;
        assert_eq!(shared.read_latest(), Identity::new(4));

        handle.queue_capture(CaptureStatus::ImagingError);
        machine.run_scan_cycle().await;
        assert!(shared.read_latest().is_idle());
    }

    #[tokio::test]
    async fn test_match_outside_color_table_is_idle() {
        let (mut machine, handle, shared) = machine();
        handle.present_known_finger(300, 50);

        assert_eq!(machine.run_scan_cycle().await, ScanResult::Idle);
        assert!(shared.read_latest().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enroll_waits_for_finger_between_polls() {
        let (mut machine, handle, shared) = machine();
        handle.queue_capture(CaptureStatus::Ok);
        handle.queue_search(SearchOutcome::NotFound);
        // finger slips off briefly before pass 1
        handle.queue_capture(CaptureStatus::NoFinger);
        handle.queue_capture(CaptureStatus::NoFinger);
        handle.hold_finger(2);

        assert_eq!(machine.run_scan_cycle().await, ScanResult::Idle);
        assert_eq!(shared.enrolled_count(), 1);
        assert_eq!(handle.stored_ids(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enroll_gives_up_without_finger() {
        let (mut machine, handle, shared) = machine();
        handle.queue_capture(CaptureStatus::Ok);
        handle.queue_search(SearchOutcome::NotFound);

        assert_eq!(machine.run_scan_cycle().await, ScanResult::Idle);
        assert_eq!(shared.enrolled_count(), 0);
        assert_eq!(machine.stats().enrollment_failures, 1);

        let captures = handle
            .calls()
            .iter()
            .filter(|call| **call == SensorCall::CaptureImage)
            .count();
        // identification + enrollment attempts + one release poll
        assert_eq!(captures, 1 + ScanSettings::default().enroll_capture_attempts as usize + 1);
    }

    #[rstest]
    #[case(ModelStatus::Mismatch)]
    #[case(ModelStatus::CommError)]
    #[tokio::test(start_paused = true)]
    async fn test_model_failure_abandons_enrollment(#[case] status: ModelStatus) {
        let (mut machine, handle, shared) = machine();
        handle.present_new_finger();
        handle.queue_model(status);

        assert_eq!(machine.run_scan_cycle().await, ScanResult::Idle);
        assert_eq!(shared.enrolled_count(), 0);
        assert!(handle.stored_ids().is_empty());
        assert!(
            !handle
                .calls()
                .iter()
                .any(|call| matches!(call, SensorCall::StoreModel(_)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_pass_extract_failure() {
        let (mut machine, handle, shared) = machine();
        handle.queue_capture(CaptureStatus::Ok);
        handle.queue_search(SearchOutcome::NotFound);
        handle.hold_finger(2);
        handle.queue_extract(ExtractStatus::Ok);
        handle.queue_extract(ExtractStatus::Ok);
        handle.queue_extract(ExtractStatus::TooMessy);

        assert_eq!(machine.run_scan_cycle().await, ScanResult::Idle);
        assert_eq!(shared.enrolled_count(), 0);
        assert_eq!(machine.stats().enrollment_failures, 1);
        assert!(!handle.calls().contains(&SensorCall::CreateModel));
        assert!(
            handle
                .calls()
                .contains(&SensorCall::ExtractFeatures(FeatureSlot::Two))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_wait_is_bounded() {
        let (mut machine, handle, _shared) = machine();
        handle.present_new_finger();
        handle.hold_finger(10_000);

        assert_eq!(machine.run_scan_cycle().await, ScanResult::Idle);
        let remaining = handle.pending_captures();
        assert_eq!(
            remaining,
            10_000 - ScanSettings::default().release_poll_limit as usize
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_table_full_skips_enrollment() {
        let (mut machine, handle, shared) = machine();
        shared.set_enrolled_count(255);
        handle.present_new_finger();

        assert_eq!(machine.run_scan_cycle().await, ScanResult::Idle);
        assert_eq!(shared.enrolled_count(), 255);
        assert_eq!(machine.stats().enrollment_failures, 1);
        assert!(handle.stored_ids().is_empty());
    }

    #[test]
    fn test_enrollment_failure_messages() {
        let failure = EnrollmentFailure::Store {
            id: 4,
            reason: StoreFailure::Flash,
        };
        assert_eq!(failure.to_string(), "store model #4: error writing to flash");

        let failure = EnrollmentFailure::Extract {
            pass: 2,
            kind: ScanErrorKind::TooMessy,
        };
        assert_eq!(failure.to_string(), "feature extraction pass 2: image too messy");
    }

    #[test]
    fn test_scan_result_identity() {
        assert!(ScanResult::Idle.identity().is_idle());
        assert!(ScanResult::Error(ScanErrorKind::Imaging).identity().is_idle());
        assert_eq!(
            ScanResult::Matched(Identity::new(9)).identity(),
            Identity::new(9)
        );
    }
}
