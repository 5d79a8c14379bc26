//! Core of the fingerlight access-feedback unit.
//!
//! Two units of execution share one [`SharedState`]:
//!
//! - the **control unit** runs [`ScanStateMachine::run_scan_cycle`] in a loop,
//!   driving the fingerprint sensor through identification and enrollment
//!   and publishing the resulting identity;
//! - the **render unit** calls [`AnimationEngine::render_frame`] as fast as
//!   the strip accepts frames, drawing an idle rainbow or the matched
//!   identity's comet.
//!
//! [`Device::start`] brings both up; see [`runtime`] for the threading model.

pub mod animation;
pub mod error;
pub mod palette;
pub mod runtime;
pub mod scanner;
pub mod shared;

pub use animation::AnimationEngine;
pub use error::{Error, Result};
pub use runtime::{Device, DeviceHandle, RenderReport, StopHandle};
pub use scanner::{
    EnrollmentFailure, ModelFailure, ScanErrorKind, ScanResult, ScanSettings, ScanStateMachine,
    ScanStats, StoreFailure,
};
pub use shared::{ColorTable, SharedState};
