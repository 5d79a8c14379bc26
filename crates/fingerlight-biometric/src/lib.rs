//! Fingerprint module drivers for the fingerlight access-feedback unit.
//!
//! [`R30xSensor`] drives R30x/AS608-class optical modules (R305, R307,
//! AS608, ZFM-20 and compatibles) over a serial link. [`AnySensor`] selects
//! between it and the scripted mock from `fingerlight-hardware` at runtime.
//!
//! The protocol layers are usable on their own:
//!
//! - [`packet`]: framing, checksum and stream reading
//! - [`instruction`]: instruction codes and confirmation-code mapping

pub mod devices;
pub mod driver;
pub mod error;
pub mod instruction;
pub mod packet;

pub use devices::AnySensor;
pub use driver::{R30xSensor, Transport, open_serial};
pub use error::{ProtocolError, Result};
pub use packet::{Packet, PacketKind};
