//! Terminal preview strip.
//!
//! Draws the strip as a row of ANSI true-color blocks, redrawn in place on a
//! single line. Redraws are throttled to `refresh` so a render loop spinning
//! at full speed does not flood the terminal.

use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use fingerlight_core::Rgb;
use tracing::trace;

use crate::{HardwareError, Result, traits::LedStrip, types::StripConfig};

/// Default redraw interval (about 30 frames per second).
pub const DEFAULT_REFRESH: Duration = Duration::from_millis(33);

/// LED strip that renders to a terminal.
pub struct TerminalStrip<W: Write + Send = Stdout> {
    writer: W,
    refresh: Duration,
    pixels: Vec<Rgb>,
    line: String,
    last_draw: Option<Instant>,
    // Boost dim LED values so they stay visible on a monitor.
    gain: f32,
}

impl TerminalStrip<Stdout> {
    /// Create a preview strip drawing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout(), DEFAULT_REFRESH)
    }
}

impl<W: Write + Send> TerminalStrip<W> {
    pub fn new(writer: W, refresh: Duration) -> Self {
        Self {
            writer,
            refresh,
            pixels: Vec::new(),
            line: String::new(),
            last_draw: None,
            gain: 1.0,
        }
    }

    /// Multiply channel values before drawing (clamped to 255).
    #[must_use]
    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain.max(0.0);
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn boost(&self, channel: u8) -> u8 {
        (f32::from(channel) * self.gain).min(255.0) as u8
    }

    fn draw(&mut self) -> io::Result<()> {
        use std::fmt::Write as _;

        self.line.clear();
        self.line.push('\r');
        for i in 0..self.pixels.len() {
            let pixel = self.pixels[i];
            let (r, g, b) = (self.boost(pixel.r), self.boost(pixel.g), self.boost(pixel.b));
            let _ = write!(self.line, "\x1b[38;2;{r};{g};{b}m\u{2588}");
        }
        self.line.push_str("\x1b[0m");

        self.writer.write_all(self.line.as_bytes())?;
        self.writer.flush()
    }
}

impl<W: Write + Send> LedStrip for TerminalStrip<W> {
    fn configure(&mut self, config: &StripConfig) -> Result<()> {
        if config.pixel_count == 0 {
            return Err(HardwareError::configuration("strip needs at least one pixel"));
        }
        self.pixels = vec![Rgb::default(); config.pixel_count];
        self.line.reserve(config.pixel_count * 24);
        Ok(())
    }

    fn set_frame(&mut self, frame: &[Rgb]) {
        self.pixels.fill(Rgb::default());
        let n = frame.len().min(self.pixels.len());
        self.pixels[..n].copy_from_slice(&frame[..n]);
    }

    fn flush(&mut self) {
        let now = Instant::now();
        if self
            .last_draw
            .is_some_and(|last| now.duration_since(last) < self.refresh)
        {
            return;
        }
        self.last_draw = Some(now);

        if let Err(e) = self.draw() {
            trace!("Terminal preview write failed: {}", e);
        }
    }
}
