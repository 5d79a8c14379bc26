//! Random color generation for the Color Assignment Table.

use fingerlight_core::{Identity, Rgb, color::color_for_hue};
use rand::Rng;

use crate::shared::ColorTable;

/// Pick a hue uniformly from `[0, 255)`.
pub fn random_hue<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(0..255)
}

/// Fully saturated, full-brightness color with a random hue.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    color_for_hue(random_hue(rng))
}

/// Give every table entry a random color.
pub fn fill_random<R: Rng + ?Sized>(table: &ColorTable, rng: &mut R) {
    for id in 0..table.len() {
        table.set(Identity::new(id as u8), random_color(rng));
    }
}
