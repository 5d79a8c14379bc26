//! Mock LED strip that records what it was asked to display.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use fingerlight_core::Rgb;

use crate::{
    HardwareError, Result,
    traits::LedStrip,
    types::StripConfig,
};

#[derive(Debug, Default)]
struct StripRecord {
    config: Option<StripConfig>,
    staged: Vec<Rgb>,
    shown: Vec<Rgb>,
    wire: Vec<u8>,
    flushes: u64,
}

fn lock(record: &Mutex<StripRecord>) -> MutexGuard<'_, StripRecord> {
    record.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock LED strip for testing and development.
///
/// # Examples
///
/// ```
/// use fingerlight_core::Rgb;
/// use fingerlight_hardware::mock::MockStrip;
/// use fingerlight_hardware::traits::LedStrip;
/// use fingerlight_hardware::types::StripConfig;
///
/// let (mut strip, handle) = MockStrip::new();
/// strip.configure(&StripConfig::new(2)).unwrap();
/// strip.set_frame(&[Rgb { r: 1, g: 2, b: 3 }, Rgb::default()]);
/// strip.flush();
///
/// assert_eq!(handle.flush_count(), 1);
/// assert_eq!(handle.wire_bytes(), vec![2, 1, 3, 0, 0, 0]);
/// ```
#[derive(Debug)]
pub struct MockStrip {
    record: Arc<Mutex<StripRecord>>,
}

impl MockStrip {
    pub fn new() -> (Self, MockStripHandle) {
        let record = Arc::new(Mutex::new(StripRecord::default()));
        (
            Self {
                record: Arc::clone(&record),
            },
            MockStripHandle { record },
        )
    }
}

impl Default for MockStrip {
    fn default() -> Self {
        Self::new().0
    }
}

impl LedStrip for MockStrip {
    fn configure(&mut self, config: &StripConfig) -> Result<()> {
        if config.pixel_count == 0 {
            return Err(HardwareError::configuration("strip needs at least one pixel"));
        }
        let mut record = lock(&self.record);
        record.config = Some(*config);
        record.staged = vec![Rgb::default(); config.pixel_count];
        Ok(())
    }

    fn set_frame(&mut self, frame: &[Rgb]) {
        let mut record = lock(&self.record);
        let len = record.staged.len();
        record.staged.fill(Rgb::default());
        let n = frame.len().min(len);
        record.staged[..n].copy_from_slice(&frame[..n]);
    }

    fn flush(&mut self) {
        let mut guard = lock(&self.record);
        let record = &mut *guard;
        let order = record.config.map(|c| c.color_order).unwrap_or_default();
        record.wire = record
            .staged
            .iter()
            .flat_map(|pixel| order.channels(*pixel))
            .collect();
        record.shown = record.staged.clone();
        record.flushes += 1;
    }
}

/// Handle for inspecting a mock strip from another thread.
#[derive(Debug, Clone)]
pub struct MockStripHandle {
    record: Arc<Mutex<StripRecord>>,
}

impl MockStripHandle {
    /// Configuration passed to `configure`, if any.
    pub fn config(&self) -> Option<StripConfig> {
        lock(&self.record).config
    }

    /// The last flushed frame.
    pub fn last_frame(&self) -> Vec<Rgb> {
        lock(&self.record).shown.clone()
    }

    /// The last flushed frame in wire byte order.
    pub fn wire_bytes(&self) -> Vec<u8> {
        lock(&self.record).wire.clone()
    }

    pub fn flush_count(&self) -> u64 {
        lock(&self.record).flushes
    }

    /// Block until at least `count` flushes happened or `timeout` elapsed.
    ///
    /// Returns `true` if the count was reached.
    pub fn wait_for_flushes(&self, count: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.flush_count() >= count {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        self.flush_count() >= count
    }
}
