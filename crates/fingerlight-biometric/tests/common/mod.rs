//! In-memory transport that answers each command with a scripted reply.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use fingerlight_biometric::{Packet, Transport};

pub const ADDRESS: u32 = 0xFFFF_FFFF;

#[derive(Debug, Default)]
struct LinkState {
    replies: VecDeque<Vec<u8>>,
    input: VecDeque<u8>,
    written: Vec<u8>,
    baud_rate: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedLink {
    state: Arc<Mutex<LinkState>>,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an acknowledgement carrying `payload`.
    pub fn reply(&self, payload: &[u8]) {
        self.reply_raw(Packet::ack(ADDRESS, payload.to_vec()).encode().to_vec());
    }

    /// Queue raw bytes released after the next command.
    pub fn reply_raw(&self, bytes: Vec<u8>) {
        self.state.lock().unwrap().replies.push_back(bytes);
    }

    /// Bytes already waiting on the line before the next command.
    pub fn inject_noise(&self, bytes: &[u8]) {
        self.state.lock().unwrap().input.extend(bytes);
    }

    pub fn written(&self) -> Vec<u8> {
        self.state.lock().unwrap().written.clone()
    }

    /// Command packets written so far.
    pub fn commands(&self) -> Vec<Packet> {
        let written = self.written();
        let mut cursor = io::Cursor::new(written.as_slice());
        let mut packets = Vec::new();
        while (cursor.position() as usize) < written.len() {
            packets.push(Packet::read_from(&mut cursor).unwrap());
        }
        packets
    }

    pub fn baud_rate(&self) -> Option<u32> {
        self.state.lock().unwrap().baud_rate
    }
}

impl Read for ScriptedLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        if state.input.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no reply"));
        }
        let n = buf.len().min(state.input.len());
        for (slot, byte) in buf.iter_mut().zip(state.input.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for ScriptedLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.lock().unwrap().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(reply) = state.replies.pop_front() {
            state.input.extend(reply);
        }
        Ok(())
    }
}

impl Transport for ScriptedLink {
    fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()> {
        self.state.lock().unwrap().baud_rate = Some(baud_rate);
        Ok(())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().input.clear();
        Ok(())
    }
}

/// ReadSysPara acknowledgement for a 163-template module at 57600 baud.
pub fn sys_para_reply() -> Vec<u8> {
    vec![
        0x00, // OK
        0x00, 0x04, // status register
        0x00, 0x09, // system id
        0x00, 0xA3, // capacity
        0x00, 0x05, // security level
        0xFF, 0xFF, 0xFF, 0xFF, // address
        0x00, 0x03, // packet size code
        0x00, 0x06, // baud multiplier
    ]
}
