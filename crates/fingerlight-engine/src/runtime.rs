//! Device runtime: wires the sensor, the strip and the shared state together.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐   publish()    ┌──────────────┐  read_latest()  ┌──────────────────┐
//! │ control unit       │───────────────►│ SharedState  │◄────────────────│ render thread    │
//! │ (caller's task)    │ assign_color() │ (atomics)    │    color()      │ (dedicated OS    │
//! │ ScanStateMachine   │───────────────►│              │◄────────────────│  thread)         │
//! └────────────────────┘                └──────────────┘                 │ AnimationEngine  │
//!                                                                        └──────────────────┘
//! ```
//!
//! The render unit runs on its own OS thread so that sensor round trips never
//! delay a frame. The control unit runs in whichever task calls
//! [`DeviceHandle::run_control_loop`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use fingerlight_core::{DeviceConfig, Error as CoreError};
use fingerlight_hardware::{FingerprintSensor, LedStrip, SensorParameters, StripConfig};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::animation::AnimationEngine;
use crate::error::{Error, Result};
use crate::scanner::{ScanResult, ScanSettings, ScanStateMachine, ScanStats};
use crate::shared::SharedState;

const RENDER_THREAD_NAME: &str = "fingerlight-render";

/// Summary returned by the render thread when it stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderReport {
    pub frames: u64,
}

/// Clonable flag that stops the render thread and the control loop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Entry point for bringing a device up.
pub struct Device;

impl Device {
    /// Initialize the sensor, prepare shared state and start rendering.
    ///
    /// # Errors
    ///
    /// - `SensorUnavailable` if the sensor does not complete its handshake or
    ///   cannot report how many templates it holds
    /// - `InvalidStripLength` if the strip has no pixels
    /// - a hardware error if the strip rejects its configuration
    /// - `RenderThread` if the render thread cannot be spawned
    ///
    /// # Examples
    ///
    /// ```
    /// use fingerlight_core::DeviceConfig;
    /// use fingerlight_engine::Device;
    /// use fingerlight_hardware::mock::{MockSensor, MockStrip};
    ///
    /// #[tokio::main]
    /// async fn main() -> fingerlight_engine::Result<()> {
    ///     let (sensor, _sensor_handle) = MockSensor::new();
    ///     let (strip, strip_handle) = MockStrip::new();
    ///
    ///     let device = Device::start(sensor, strip, &DeviceConfig::default()).await?;
    ///     assert!(device.shared().read_latest().is_idle());
    ///
    ///     let report = device.shutdown()?;
    ///     assert_eq!(report.frames, strip_handle.flush_count());
    ///     Ok(())
    /// }
    /// ```
    pub async fn start<S, L>(
        mut sensor: S,
        mut strip: L,
        config: &DeviceConfig,
    ) -> Result<DeviceHandle<S>>
    where
        S: FingerprintSensor,
        L: LedStrip + 'static,
    {
        let pixel_count = config.strip.pixel_count;
        if pixel_count == 0 {
            return Err(CoreError::InvalidStripLength(pixel_count).into());
        }

        match sensor.initialize(config.sensor.baud_rate).await {
            Ok(true) => info!("Found fingerprint sensor"),
            Ok(false) => {
                error!("Did not find fingerprint sensor: handshake rejected");
                return Err(CoreError::SensorUnavailable("handshake rejected".to_string()).into());
            }
            Err(e) => {
                error!("Did not find fingerprint sensor: {}", e);
                return Err(CoreError::SensorUnavailable(e.to_string()).into());
            }
        }

        if let Ok(info) = sensor.device_info().await {
            debug!("Sensor: {} ({})", info.name, info.model);
        }

        match sensor.parameters().await {
            Ok(params) => log_parameters(&params),
            Err(e) => warn!("Could not read sensor parameters: {}", e),
        }

        // Enrollment ids follow the stored count; guessing would overwrite pages.
        let template_count = match sensor.template_count().await {
            Ok(count) => count,
            Err(e) => {
                error!("Could not read template count: {}", e);
                return Err(CoreError::SensorUnavailable(format!(
                    "template count unavailable: {e}"
                ))
                .into());
            }
        };
        if template_count == 0 {
            info!("Sensor doesn't contain any fingerprint data; present a finger to enroll");
        } else {
            info!("Sensor contains {} templates", template_count);
            info!("Waiting for valid finger...");
        }

        let shared = Arc::new(SharedState::new());
        shared.set_enrolled_count(template_count);

        let mut machine = ScanStateMachine::new(
            sensor,
            Arc::clone(&shared),
            ScanSettings::from(&config.sensor),
        );
        machine.randomize_colors();

        strip.configure(&StripConfig::from(&config.strip))?;
        let engine = AnimationEngine::new(
            strip,
            Arc::clone(&shared),
            pixel_count,
            config.animation.clone(),
        )?;

        let stop = StopHandle::default();
        let render = spawn_render_thread(engine, stop.clone())?;
        info!(
            "Rendering {} pixels ({}, pin {})",
            pixel_count, config.strip.color_order, config.strip.data_pin
        );

        Ok(DeviceHandle {
            machine,
            shared,
            stop,
            render: Some(render),
            poll_interval: config.sensor.poll_interval(),
        })
    }
}

fn log_parameters(params: &SensorParameters) {
    info!("Reading sensor parameters");
    info!("Status: 0x{:X}", params.status_register);
    info!("Sys ID: 0x{:X}", params.system_id);
    info!("Capacity: {}", params.capacity);
    info!("Security level: {}", params.security_level);
    info!("Device address: 0x{:X}", params.device_address);
    info!("Packet len: {}", params.packet_length);
    info!("Baud rate: {}", params.baud_rate);
}

fn spawn_render_thread<L: LedStrip + 'static>(
    mut engine: AnimationEngine<L>,
    stop: StopHandle,
) -> Result<JoinHandle<RenderReport>> {
    thread::Builder::new()
        .name(RENDER_THREAD_NAME.to_string())
        .spawn(move || {
            debug!("Render thread started");
            while !stop.is_stopped() {
                engine.render_frame();
                thread::yield_now();
            }
            debug!("Render thread stopped after {} frames", engine.frames());
            RenderReport {
                frames: engine.frames(),
            }
        })
        .map_err(|e| Error::RenderThread(e.to_string()))
}

/// A running device.
///
/// Owns the control unit; the render unit runs on its own thread until
/// [`shutdown`](DeviceHandle::shutdown) or drop.
pub struct DeviceHandle<S> {
    machine: ScanStateMachine<S>,
    shared: Arc<SharedState>,
    stop: StopHandle,
    render: Option<JoinHandle<RenderReport>>,
    poll_interval: Duration,
}

impl<S: FingerprintSensor> DeviceHandle<S> {
    /// Run scan cycles until stopped.
    ///
    /// Sleeps `poll_interval` after idle and error cycles so an idle sensor
    /// is not polled back to back. A match is followed by the next scan at once.
    pub async fn run_control_loop(&mut self) {
        info!("Control loop started");
        while !self.stop.is_stopped() {
            let result = self.run_cycle().await;
            if let Some(pause) = pause_after(&result, self.poll_interval) {
                sleep(pause).await;
            }
        }
        info!("Control loop stopped");
    }

    /// Run one scan cycle.
    pub async fn run_cycle(&mut self) -> ScanResult {
        self.machine.run_scan_cycle().await
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn stats(&self) -> ScanStats {
        self.machine.stats()
    }

    /// Log the scan counters.
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            "Scan stats: cycles={} matches={} enrollments={} enrollment_failures={} errors={}",
            stats.cycles, stats.matches, stats.enrollments, stats.enrollment_failures, stats.errors
        );
    }

    /// Handle that stops the device from another task or a signal handler.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_rendering(&self) -> bool {
        self.render.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn sensor(&self) -> &S {
        self.machine.sensor()
    }

    /// Stop rendering and wait for the render thread.
    ///
    /// # Errors
    ///
    /// Returns `RenderThread` if the render thread panicked.
    pub fn shutdown(mut self) -> Result<RenderReport> {
        self.join_render()
    }

    fn join_render(&mut self) -> Result<RenderReport> {
        self.stop.stop();
        match self.render.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| Error::RenderThread("render thread panicked".to_string())),
            None => Ok(RenderReport { frames: 0 }),
        }
    }
}

/// Pause before the next cycle, if any.
fn pause_after(result: &ScanResult, poll_interval: Duration) -> Option<Duration> {
    match result {
        ScanResult::Matched(_) => None,
        ScanResult::Idle | ScanResult::Error(_) => Some(poll_interval),
    }
}

impl<S> Drop for DeviceHandle<S> {
    fn drop(&mut self) {
        self.stop.stop();
        if let Some(handle) = self.render.take() {
            let _ = handle.join();
        }
    }
}
