//! State shared between the control unit and the render unit.
//!
//! Everything here has exactly one writer (the scan state machine) and one
//! reader (the animation engine), and nothing here takes a lock:
//!
//! - the active identity is an [`AtomicU8`], published with `Release` and
//!   read with `Acquire`;
//! - each color table entry is an [`AtomicU32`] holding `0x00RRGGBB`, so all
//!   three channels change in one store;
//! - the enrolled-template counter is an [`AtomicU16`].
//!
//! A color entry must be written before any identity referring to it is
//! published. The `Release`/`Acquire` pair on the active identity then makes
//! the color visible to the render unit.

use std::sync::atomic::{AtomicU8, AtomicU16, AtomicU32, Ordering};

use fingerlight_core::{
    Identity, Rgb,
    color::{pack_rgb, unpack_rgb},
    constants::COLOR_TABLE_CAPACITY,
};

/// Color Assignment Table: identity → display color.
#[derive(Debug)]
pub struct ColorTable {
    entries: [AtomicU32; COLOR_TABLE_CAPACITY],
}

impl ColorTable {
    /// Create a table with every entry black.
    pub fn new() -> Self {
        Self {
            entries: std::array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    pub fn get(&self, identity: Identity) -> Rgb {
        unpack_rgb(self.entries[identity.as_index()].load(Ordering::Relaxed))
    }

    pub fn set(&self, identity: Identity, color: Rgb) {
        self.entries[identity.as_index()].store(pack_rgb(color), Ordering::Relaxed);
    }

    /// Copy of every entry, in identity order.
    pub fn snapshot(&self) -> Vec<Rgb> {
        self.entries
            .iter()
            .map(|entry| unpack_rgb(entry.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared identity publication, color table and enrollment counter.
///
/// # Examples
///
/// ```
/// use fingerlight_core::{Identity, Rgb};
/// use fingerlight_engine::SharedState;
///
/// let shared = SharedState::new();
/// let id = Identity::new(3);
///
/// shared.assign_color(id, Rgb { r: 0, g: 0, b: 255 });
/// shared.publish(id);
///
/// let seen = shared.read_latest();
/// assert_eq!(seen, id);
/// assert_eq!(shared.color(seen), Rgb { r: 0, g: 0, b: 255 });
/// ```
#[derive(Debug, Default)]
pub struct SharedState {
    active: AtomicU8,
    colors: ColorTable,
    enrolled: AtomicU16,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the outcome of a scan cycle.
    pub fn publish(&self, identity: Identity) {
        self.active.store(identity.as_u8(), Ordering::Release);
    }

    /// Most recently published identity.
    pub fn read_latest(&self) -> Identity {
        Identity::new(self.active.load(Ordering::Acquire))
    }

    pub fn color(&self, identity: Identity) -> Rgb {
        self.colors.get(identity)
    }

    /// Write a color table entry. Call before publishing `identity`.
    pub fn assign_color(&self, identity: Identity, color: Rgb) {
        self.colors.set(identity, color);
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// Number of templates enrolled on the sensor.
    pub fn enrolled_count(&self) -> u16 {
        self.enrolled.load(Ordering::Acquire)
    }

    pub fn set_enrolled_count(&self, count: u16) {
        self.enrolled.store(count, Ordering::Release);
    }

    /// Identity the next successful enrollment will receive, if the table has room.
    pub fn next_identity(&self) -> Option<Identity> {
        let next = self.enrolled_count().checked_add(1)?;
        u8::try_from(next).ok().map(Identity::new)
    }
}
