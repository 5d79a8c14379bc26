//! Wire framing for R30x/AS608 fingerprint modules.
//!
//! # Wire Format
//!
//! ```text
//! +---------+-----------+-----+--------+-----------+----------+
//! | EF 01   | address   | pid | length | payload   | checksum |
//! | 2 bytes | 4 bytes   | 1   | 2 (BE) | length-2  | 2 (BE)   |
//! +---------+-----------+-----+--------+-----------+----------+
//! ```
//!
//! `length` counts the payload plus the checksum. The checksum is the sum of
//! the packet identifier, both length bytes and every payload byte, truncated
//! to 16 bits. All multi-byte fields are big-endian.
//!
//! # Example
//!
//! ```
//! use fingerlight_biometric::packet::Packet;
//!
//! // GenImg (0x01) to the broadcast address
//! let frame = Packet::command(0xFFFF_FFFF, vec![0x01]).encode();
//! assert_eq!(
//!     frame.as_ref(),
//!     &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x03, 0x01, 0x00, 0x05]
//! );
//! ```

use std::io::Read;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ProtocolError, Result};

/// Start code opening every packet.
pub const START_CODE: u16 = 0xEF01;

/// Bytes before the payload: start code, address, packet id, length.
pub const HEADER_LEN: usize = 9;

/// Trailing checksum size.
pub const CHECKSUM_LEN: usize = 2;

/// Largest payload a module accepts in one packet.
pub const MAX_PAYLOAD_LEN: usize = 256;

/// Packet identifier byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketKind {
    /// Instruction from host to module.
    Command = 0x01,

    /// Data packet with more to follow.
    Data = 0x02,

    /// Acknowledgement from module to host.
    Ack = 0x07,

    /// Last data packet.
    EndData = 0x08,
}

impl TryFrom<u8> for PacketKind {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Command),
            0x02 => Ok(Self::Data),
            0x07 => Ok(Self::Ack),
            0x08 => Ok(Self::EndData),
            other => Err(ProtocolError::UnknownPacketKind(other)),
        }
    }
}

/// One framed packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub address: u32,
    pub kind: PacketKind,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(address: u32, kind: PacketKind, payload: impl Into<Bytes>) -> Self {
        Self {
            address,
            kind,
            payload: payload.into(),
        }
    }

    /// Build an instruction packet.
    pub fn command(address: u32, payload: impl Into<Bytes>) -> Self {
        Self::new(address, PacketKind::Command, payload)
    }

    /// Build an acknowledgement packet.
    pub fn ack(address: u32, payload: impl Into<Bytes>) -> Self {
        Self::new(address, PacketKind::Ack, payload)
    }

    /// Value of the length field.
    pub fn length_field(&self) -> u16 {
        (self.payload.len() + CHECKSUM_LEN) as u16
    }

    pub fn checksum(&self) -> u16 {
        checksum(self.kind as u8, self.length_field(), &self.payload)
    }

    /// Serialize to wire bytes.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload.len() + CHECKSUM_LEN);
        buf.put_u16(START_CODE);
        buf.put_u32(self.address);
        buf.put_u8(self.kind as u8);
        buf.put_u16(self.length_field());
        buf.put_slice(&self.payload);
        buf.put_u16(self.checksum());
        buf.freeze()
    }

    /// Parse one complete packet from `frame`.
    ///
    /// # Errors
    ///
    /// Fails on a short buffer, a bad start code, an unknown packet identifier,
    /// an out-of-range length or a checksum mismatch.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(ProtocolError::Truncated {
                needed: HEADER_LEN + CHECKSUM_LEN,
                actual: frame.len(),
            });
        }

        let (address, kind, length) = decode_header(&frame[..HEADER_LEN])?;
        let total = HEADER_LEN + usize::from(length);
        if frame.len() < total {
            return Err(ProtocolError::Truncated {
                needed: total,
                actual: frame.len(),
            });
        }

        decode_body(address, kind, length, &frame[HEADER_LEN..total])
    }

    /// Read exactly one packet from a byte stream.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut header = [0u8; HEADER_LEN];
        reader.read_exact(&mut header)?;
        let (address, kind, length) = decode_header(&header)?;

        let mut body = vec![0u8; usize::from(length)];
        reader.read_exact(&mut body)?;
        decode_body(address, kind, length, &body)
    }
}

/// Packet checksum over identifier, length and payload.
pub fn checksum(kind: u8, length: u16, payload: &[u8]) -> u16 {
    let [hi, lo] = length.to_be_bytes();
    payload
        .iter()
        .fold(u16::from(kind) + u16::from(hi) + u16::from(lo), |sum, &b| {
            sum.wrapping_add(u16::from(b))
        })
}

fn decode_header(mut header: &[u8]) -> Result<(u32, PacketKind, u16)> {
    let start = header.get_u16();
    if start != START_CODE {
        return Err(ProtocolError::BadStartCode(start));
    }
    let address = header.get_u32();
    let kind = PacketKind::try_from(header.get_u8())?;
    let length = header.get_u16();
    if usize::from(length) < CHECKSUM_LEN || usize::from(length) > MAX_PAYLOAD_LEN + CHECKSUM_LEN {
        return Err(ProtocolError::InvalidLength(length));
    }
    Ok((address, kind, length))
}

fn decode_body(address: u32, kind: PacketKind, length: u16, body: &[u8]) -> Result<Packet> {
    let (payload, mut trailer) = body.split_at(body.len() - CHECKSUM_LEN);
    let actual = trailer.get_u16();
    let expected = checksum(kind as u8, length, payload);
    if actual != expected {
        return Err(ProtocolError::ChecksumMismatch { expected, actual });
    }

    Ok(Packet {
        address,
        kind,
        payload: Bytes::copy_from_slice(payload),
    })
}
