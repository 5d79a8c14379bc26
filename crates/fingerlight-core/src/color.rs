//! Color types and the hue→RGB rainbow mapping.
//!
//! Colors use the `smart-leds` RGB/HSV types so frames can be handed to any
//! `smart-leds` compatible driver unchanged. The hue mapping is the
//! "rainbow" variant popularized by FastLED: eight 32-step hue sections with
//! a boosted yellow band, which looks more even on WS2812 LEDs than a plain
//! spectrum conversion.

pub use smart_leds::RGB8 as Rgb;
pub use smart_leds::hsv::Hsv;

const K255: u8 = 255;
const K171: u8 = 171;
const K170: u8 = 170;
const K85: u8 = 85;

/// Scale an 8-bit value by a factor (0-255 = 0.0-1.0).
///
/// `scale8(255, 255) == 255`, so full scale is lossless.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn scale8(value: u8, scale: u8) -> u8 {
    ((u16::from(value) * (1 + u16::from(scale))) >> 8) as u8
}

/// Scale an 8-bit value, never dimming a non-zero value to zero.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn scale8_video(value: u8, scale: u8) -> u8 {
    let scaled = ((u16::from(value) * u16::from(scale)) >> 8) as u8;
    if value != 0 && scale != 0 {
        scaled + 1
    } else {
        scaled
    }
}

/// Convert an HSV color to RGB using the rainbow hue mapping.
pub fn hsv2rgb_rainbow(hsv: Hsv) -> Rgb {
    let hue = hsv.hue;
    let offset8 = (hue & 0x1F) << 3;
    let third = scale8(offset8, 85);

    let (mut r, mut g, mut b) = match hue >> 5 {
        // Red → orange
        0 => (K255 - third, third, 0),
        // Orange → yellow
        1 => (K171, K85 + third, 0),
        // Yellow → green
        2 => {
            let two_thirds = scale8(offset8, 170);
            (K171 - two_thirds, K170 + third, 0)
        }
        // Green → aqua
        3 => (0, K255 - third, third),
        // Aqua → blue
        4 => {
            let two_thirds = scale8(offset8, 170);
            (0, K171 - two_thirds, K85 + two_thirds)
        }
        // Blue → purple
        5 => (third, 0, K255 - third),
        // Purple → pink
        6 => (K85 + third, 0, K171 - third),
        // Pink → red
        _ => (K170 + third, 0, K85 - third),
    };

    if hsv.sat != 255 {
        if hsv.sat == 0 {
            (r, g, b) = (255, 255, 255);
        } else {
            let desat = 255 - hsv.sat;
            let desat = scale8_video(desat, desat);
            let satscale = 255 - desat;
            r = scale8(r, satscale).saturating_add(desat);
            g = scale8(g, satscale).saturating_add(desat);
            b = scale8(b, satscale).saturating_add(desat);
        }
    }

    if hsv.val != 255 {
        let val = scale8_video(hsv.val, hsv.val);
        if val == 0 {
            (r, g, b) = (0, 0, 0);
        } else {
            r = scale8(r, val);
            g = scale8(g, val);
            b = scale8(b, val);
        }
    }

    Rgb { r, g, b }
}

/// Fully saturated, full-brightness color for a hue.
pub fn color_for_hue(hue: u8) -> Rgb {
    hsv2rgb_rainbow(Hsv {
        hue,
        sat: 255,
        val: 255,
    })
}

/// Scale every channel by `factor`, clamped to `[0, 1]`.
///
/// Fractions are truncated.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale_color(color: Rgb, factor: f32) -> Rgb {
    let factor = factor.clamp(0.0, 1.0);
    Rgb {
        r: (f32::from(color.r) * factor) as u8,
        g: (f32::from(color.g) * factor) as u8,
        b: (f32::from(color.b) * factor) as u8,
    }
}

/// Pack a color into `0x00RRGGBB`.
#[inline]
pub const fn pack_rgb(color: Rgb) -> u32 {
    ((color.r as u32) << 16) | ((color.g as u32) << 8) | color.b as u32
}

/// Unpack a color from `0x00RRGGBB`.
#[inline]
pub const fn unpack_rgb(packed: u32) -> Rgb {
    Rgb {
        r: ((packed >> 16) & 0xFF) as u8,
        g: ((packed >> 8) & 0xFF) as u8,
        b: (packed & 0xFF) as u8,
    }
}
