use std::io;

use fingerlight_hardware::HardwareError;
use thiserror::Error;

/// Framing failures on the sensor link.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Bad start code: 0x{0:04X}")]
    BadStartCode(u16),

    #[error("Unknown packet identifier: 0x{0:02X}")]
    UnknownPacketKind(u8),

    #[error("Unexpected packet: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedPacket { expected: u8, actual: u8 },

    #[error("Address mismatch: expected 0x{expected:08X}, got 0x{actual:08X}")]
    AddressMismatch { expected: u32, actual: u32 },

    #[error("Checksum mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    #[error("Invalid length field: {0}")]
    InvalidLength(u16),

    #[error("Truncated packet: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("Short reply: need {needed} payload bytes, got {actual}")]
    ShortReply { needed: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

impl From<ProtocolError> for HardwareError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) if e.kind() == io::ErrorKind::TimedOut => {
                HardwareError::communication(format!("sensor did not answer: {e}"))
            }
            ProtocolError::Io(e) => HardwareError::Io(e),
            other => HardwareError::invalid_data(other.to_string()),
        }
    }
}
