//! Enum wrappers for strip dispatch.
//!
//! The render thread owns its strip by value and is chosen at startup, so the
//! concrete back end is selected through an enum rather than a trait object.
//!
//! # Examples
//!
//! ```
//! use fingerlight_hardware::devices::AnyStrip;
//! use fingerlight_hardware::mock::MockStrip;
//! use fingerlight_hardware::traits::LedStrip;
//! use fingerlight_hardware::types::StripConfig;
//!
//! let (strip, handle) = MockStrip::new();
//! let mut any_strip = AnyStrip::Mock(strip);
//! any_strip.configure(&StripConfig::new(35)).unwrap();
//! any_strip.flush();
//! assert_eq!(handle.flush_count(), 1);
//! ```

use fingerlight_core::Rgb;

use crate::Result;
use crate::mock::MockStrip;
use crate::terminal::TerminalStrip;
use crate::traits::LedStrip;
use crate::types::StripConfig;

/// Enum wrapper for LED strip dispatch.
#[non_exhaustive]
pub enum AnyStrip {
    /// Recording strip for development and testing.
    Mock(MockStrip),

    /// ANSI preview on standard output.
    Terminal(TerminalStrip),
}

impl AnyStrip {
    /// Short name of the back end, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mock(_) => "mock",
            Self::Terminal(_) => "terminal",
        }
    }
}

impl LedStrip for AnyStrip {
    fn configure(&mut self, config: &StripConfig) -> Result<()> {
        match self {
            Self::Mock(strip) => strip.configure(config),
            Self::Terminal(strip) => strip.configure(config),
        }
    }

    fn set_frame(&mut self, frame: &[Rgb]) {
        match self {
            Self::Mock(strip) => strip.set_frame(frame),
            Self::Terminal(strip) => strip.set_frame(frame),
        }
    }

    fn flush(&mut self) {
        match self {
            Self::Mock(strip) => strip.flush(),
            Self::Terminal(strip) => strip.flush(),
        }
    }
}

impl From<MockStrip> for AnyStrip {
    fn from(strip: MockStrip) -> Self {
        Self::Mock(strip)
    }
}

impl From<TerminalStrip> for AnyStrip {
    fn from(strip: TerminalStrip) -> Self {
        Self::Terminal(strip)
    }
}
