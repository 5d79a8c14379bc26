//! Animation engine.
//!
//! Each call to [`AnimationEngine::render_frame`] reads the active identity,
//! recomputes every pixel and flushes the strip once:
//!
//! - **idle**: a rainbow spread across the strip, drifting with wall-clock
//!   time at a fixed moderate brightness;
//! - **matched**: a short comet in the identity's color sweeping along the
//!   strip, positioned by the animation phase.
//!
//! The phase advances by elapsed time over `comet_period`, so the sweep speed
//! does not depend on how fast frames are rendered.

use std::sync::Arc;
use std::time::Instant;

use fingerlight_core::{
    Error as CoreError, Hsv, Identity, Rgb,
    color::{hsv2rgb_rainbow, scale_color},
    config::AnimationSettings,
};
use fingerlight_hardware::LedStrip;

use crate::shared::SharedState;

/// Hue of pixel `index` on an idle strip of `pixel_count` pixels.
///
/// The base hue spreads `0..255` across the strip; `elapsed_ms * drift`
/// shifts it over time. The sum wraps modulo 256.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn idle_hue(index: usize, pixel_count: usize, elapsed_ms: f64, drift_per_ms: f32) -> u8 {
    let base = (index * 255 / pixel_count.max(1)) as u64;
    let offset = (elapsed_ms * f64::from(drift_per_ms)).max(0.0) as u64;
    (base.wrapping_add(offset) % 256) as u8
}

/// Comet intensity at normalized strip position `x` for phase `phase`.
///
/// Distance to the phase is measured with wraparound; intensity falls off
/// linearly and is zero beyond `falloff`.
pub fn comet_intensity(x: f32, phase: f32, falloff: f32) -> f32 {
    let distance = (phase - x)
        .abs()
        .min((phase - 1.0 - x).abs())
        .min((phase + 1.0 - x).abs());
    (falloff - distance).max(0.0)
}

/// Renders frames from the shared identity and flushes them to a strip.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fingerlight_core::config::AnimationSettings;
/// use fingerlight_engine::{AnimationEngine, SharedState};
/// use fingerlight_hardware::mock::MockStrip;
/// use fingerlight_hardware::traits::LedStrip;
/// use fingerlight_hardware::types::StripConfig;
///
/// let (mut strip, handle) = MockStrip::new();
/// strip.configure(&StripConfig::new(35)).unwrap();
///
/// let shared = Arc::new(SharedState::new());
/// let mut engine = AnimationEngine::new(strip, shared, 35, AnimationSettings::default()).unwrap();
/// engine.render_frame();
///
/// assert_eq!(handle.flush_count(), 1);
/// assert_eq!(handle.last_frame().len(), 35);
/// ```
pub struct AnimationEngine<L> {
    strip: L,
    shared: Arc<SharedState>,
    settings: AnimationSettings,
    frame: Vec<Rgb>,
    phase: f32,
    started: Instant,
    last_tick: Option<Instant>,
    frames: u64,
}

impl<L: LedStrip> AnimationEngine<L> {
    /// Create an engine for a strip of `pixel_count` pixels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStripLength` if `pixel_count` is zero.
    pub fn new(
        strip: L,
        shared: Arc<SharedState>,
        pixel_count: usize,
        settings: AnimationSettings,
    ) -> fingerlight_core::Result<Self> {
        if pixel_count == 0 {
            return Err(CoreError::InvalidStripLength(pixel_count));
        }

        Ok(Self {
            strip,
            shared,
            settings,
            frame: vec![Rgb::default(); pixel_count],
            phase: 0.0,
            started: Instant::now(),
            last_tick: None,
            frames: 0,
        })
    }

    /// Restart the idle drift clock at `started`.
    #[must_use]
    pub fn with_start(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    /// Render and flush one frame at the current time.
    pub fn render_frame(&mut self) -> Identity {
        self.render_frame_at(Instant::now())
    }

    /// Render and flush one frame as of `now`.
    ///
    /// Returns the identity the frame was rendered for.
    pub fn render_frame_at(&mut self, now: Instant) -> Identity {
        let identity = self.shared.read_latest();

        if identity.is_idle() {
            self.render_idle(now);
        } else {
            self.render_comet(self.shared.color(identity));
        }
        self.advance_phase(now);

        self.strip.set_frame(&self.frame);
        self.strip.flush();
        self.frames += 1;
        identity
    }

    fn render_idle(&mut self, now: Instant) {
        let elapsed_ms = now.saturating_duration_since(self.started).as_secs_f64() * 1000.0;
        let pixel_count = self.frame.len();
        for (i, pixel) in self.frame.iter_mut().enumerate() {
            *pixel = hsv2rgb_rainbow(Hsv {
                hue: idle_hue(i, pixel_count, elapsed_ms, self.settings.idle_drift_per_ms),
                sat: 255,
                val: self.settings.idle_brightness,
            });
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn render_comet(&mut self, color: Rgb) {
        let pixel_count = self.frame.len() as f32;
        for (i, pixel) in self.frame.iter_mut().enumerate() {
            let x = i as f32 / pixel_count;
            let v = comet_intensity(x, self.phase, self.settings.comet_falloff);
            *pixel = scale_color(color, v);
        }
    }

    fn advance_phase(&mut self, now: Instant) {
        if let Some(last) = self.last_tick {
            let period = self.settings.comet_period().as_secs_f32();
            if period > 0.0 {
                let step = now.saturating_duration_since(last).as_secs_f32() / period;
                self.phase = (self.phase + step).fract();
            }
        }
        self.last_tick = Some(now);
    }

    /// Current animation phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// The last rendered frame.
    pub fn frame(&self) -> &[Rgb] {
        &self.frame
    }

    pub fn pixel_count(&self) -> usize {
        self.frame.len()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn strip(&self) -> &L {
        &self.strip
    }

    pub fn into_strip(self) -> L {
        self.strip
    }
}
