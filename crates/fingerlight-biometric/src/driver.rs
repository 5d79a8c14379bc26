//! Serial driver for R30x/AS608-class fingerprint modules.
//!
//! The driver speaks the module's command/acknowledge protocol over any
//! byte transport. Each operation sends one command packet and reads one
//! acknowledgement. The transport is blocking, so every exchange runs on the
//! blocking thread pool via [`tokio::task::spawn_blocking`], keeping the
//! async control loop responsive.

use std::io::{self, Read, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use bytes::{Buf, Bytes};
use fingerlight_core::config::SensorConfig;
use fingerlight_hardware::{
    HardwareError, Result,
    traits::{
        CaptureStatus, ExtractStatus, FingerprintSensor, ModelStatus, SearchOutcome, StoreStatus,
    },
    types::{DeviceInfo, FeatureSlot, SensorParameters},
};
use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, trace, warn};

use crate::error::ProtocolError;
use crate::instruction::{self, Instruction, confirm};
use crate::packet::{Packet, PacketKind};

/// Read timeout for one acknowledgement.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// The module runs at `N * 9600` baud for `N` in `1..=12`.
const BAUD_UNIT: u32 = 9600;
const MAX_BAUD_MULTIPLIER: u32 = 12;

fn check_baud_rate(baud_rate: u32) -> Result<()> {
    let multiplier = baud_rate / BAUD_UNIT;
    if baud_rate % BAUD_UNIT != 0 || !(1..=MAX_BAUD_MULTIPLIER).contains(&multiplier) {
        return Err(HardwareError::unsupported(format!("baud rate {baud_rate}")));
    }
    Ok(())
}

/// Byte link to a fingerprint module.
pub trait Transport: Read + Write + Send + 'static {
    /// Change the link speed. Links without a speed setting ignore it.
    fn set_baud_rate(&mut self, _baud_rate: u32) -> io::Result<()> {
        Ok(())
    }

    /// Drop any unread input before a new command.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for Box<dyn SerialPort> {
    fn set_baud_rate(&mut self, baud_rate: u32) -> io::Result<()> {
        SerialPort::set_baud_rate(self.as_mut(), baud_rate).map_err(io::Error::from)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

/// Open a serial port for a fingerprint module.
///
/// # Errors
///
/// Returns [`HardwareError::InitializationFailed`] if the port cannot be opened.
pub fn open_serial(path: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>> {
    serialport::new(path, baud_rate)
        .timeout(DEFAULT_READ_TIMEOUT)
        .open()
        .map_err(|e| HardwareError::initialization_failed(format!("cannot open {path}: {e}")))
}

/// Fingerprint module on a byte transport.
///
/// # Examples
///
/// ```no_run
/// use fingerlight_biometric::R30xSensor;
/// use fingerlight_core::config::SensorConfig;
/// use fingerlight_hardware::traits::FingerprintSensor;
///
/// #[tokio::main]
/// async fn main() -> fingerlight_hardware::Result<()> {
///     let config = SensorConfig {
///         port: Some("/dev/ttyUSB0".into()),
///         ..SensorConfig::default()
///     };
///     let mut sensor = R30xSensor::open(&config)?;
///     if sensor.initialize(config.baud_rate).await? {
///         println!("{}", sensor.parameters().await?);
///     }
///     Ok(())
/// }
/// ```
pub struct R30xSensor<T: Transport> {
    // Taken out while an exchange runs on the blocking pool.
    link: Mutex<Option<T>>,
    name: String,
    address: u32,
    password: u32,
    capacity: Option<u16>,
}

impl R30xSensor<Box<dyn SerialPort>> {
    /// Open the serial port named by `config.port`.
    pub fn open(config: &SensorConfig) -> Result<Self> {
        let path = config
            .port
            .as_deref()
            .ok_or_else(|| HardwareError::configuration("no sensor port configured"))?;
        let port = open_serial(path, config.baud_rate)?;
        Ok(Self::new(port, config.address, config.password).with_name(path))
    }
}

impl<T: Transport> R30xSensor<T> {
    pub fn new(link: T, address: u32, password: u32) -> Self {
        Self {
            link: Mutex::new(Some(link)),
            name: "R30x".to_string(),
            address,
            password,
            capacity: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Give the transport back, if no exchange failed mid-flight.
    pub fn into_inner(self) -> Option<T> {
        self.link.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_link(&self) -> Result<T> {
        self.link
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| HardwareError::disconnected(self.name.clone()))
    }

    fn put_link(&self, link: T) {
        *self.link.lock().unwrap_or_else(PoisonError::into_inner) = Some(link);
    }

    /// Send one instruction and return the acknowledgement payload.
    ///
    /// The payload always holds at least the confirmation code.
    async fn command(&mut self, instruction: Instruction, args: &[u8]) -> Result<Bytes> {
        let mut payload = Vec::with_capacity(1 + args.len());
        payload.push(instruction.code());
        payload.extend_from_slice(args);

        let mut link = self.take_link()?;
        let address = self.address;
        let (link, reply) = tokio::task::spawn_blocking(move || {
            let reply = exchange(&mut link, address, &payload);
            (link, reply)
        })
        .await
        .map_err(|e| HardwareError::other(format!("sensor I/O task failed: {e}")))?;
        self.put_link(link);

        let reply = reply?;
        trace!(
            "{:?} -> confirmation 0x{:02X} ({} bytes)",
            instruction,
            reply.payload[0],
            reply.payload.len()
        );
        Ok(reply.payload)
    }

    /// Send an instruction whose reply is a bare confirmation code.
    async fn status(&mut self, instruction: Instruction, args: &[u8]) -> Result<u8> {
        Ok(self.command(instruction, args).await?[0])
    }

    async fn capacity(&mut self) -> Result<u16> {
        match self.capacity {
            Some(capacity) => Ok(capacity),
            None => Ok(self.parameters().await?.capacity),
        }
    }
}

fn exchange<T: Transport>(
    link: &mut T,
    address: u32,
    payload: &[u8],
) -> crate::error::Result<Packet> {
    link.discard_input()?;
    link.write_all(&Packet::command(address, payload.to_vec()).encode())?;
    link.flush()?;

    let reply = Packet::read_from(link)?;
    if reply.kind != PacketKind::Ack {
        return Err(ProtocolError::UnexpectedPacket {
            expected: PacketKind::Ack as u8,
            actual: reply.kind as u8,
        });
    }
    if reply.address != address {
        return Err(ProtocolError::AddressMismatch {
            expected: address,
            actual: reply.address,
        });
    }
    if reply.payload.is_empty() {
        return Err(ProtocolError::ShortReply {
            needed: 1,
            actual: 0,
        });
    }
    Ok(reply)
}

/// Split the confirmation code off a reply carrying `needed` data bytes.
fn reply_data(reply: Bytes, needed: usize) -> Result<(u8, Bytes)> {
    let code = reply[0];
    let data = reply.slice(1..);
    if code == confirm::OK && data.len() < needed {
        return Err(ProtocolError::ShortReply {
            needed,
            actual: data.len(),
        }
        .into());
    }
    Ok((code, data))
}

impl<T: Transport> FingerprintSensor for R30xSensor<T> {
    async fn initialize(&mut self, baud_rate: u32) -> Result<bool> {
        check_baud_rate(baud_rate)?;
        {
            let mut guard = self.link.lock().unwrap_or_else(PoisonError::into_inner);
            let link = guard
                .as_mut()
                .ok_or_else(|| HardwareError::disconnected(self.name.clone()))?;
            link.set_baud_rate(baud_rate)?;
        }

        let password = self.password.to_be_bytes();
        match self.status(Instruction::VfyPwd, &password).await? {
            confirm::OK => {
                debug!("Sensor {} accepted handshake at {} baud", self.name, baud_rate);
                Ok(true)
            }
            confirm::WRONG_PASSWORD => {
                warn!("Sensor {} rejected the password", self.name);
                Ok(false)
            }
            code => {
                warn!("Sensor {} handshake failed: 0x{:02X}", self.name, code);
                Ok(false)
            }
        }
    }

    async fn parameters(&mut self) -> Result<SensorParameters> {
        let reply = self.command(Instruction::ReadSysPara, &[]).await?;
        let (code, mut data) = reply_data(reply, 16)?;
        if code != confirm::OK {
            return Err(HardwareError::communication(format!(
                "ReadSysPara returned 0x{code:02X}"
            )));
        }

        let params = SensorParameters {
            status_register: data.get_u16(),
            system_id: data.get_u16(),
            capacity: data.get_u16(),
            security_level: data.get_u16(),
            device_address: data.get_u32(),
            packet_length: instruction::packet_length_from_code(data.get_u16()),
            baud_rate: u32::from(data.get_u16()) * BAUD_UNIT,
        };
        self.capacity = Some(params.capacity);
        Ok(params)
    }

    async fn template_count(&mut self) -> Result<u16> {
        let reply = self.command(Instruction::TemplateNum, &[]).await?;
        let (code, mut data) = reply_data(reply, 2)?;
        if code != confirm::OK {
            return Err(HardwareError::communication(format!(
                "TemplateNum returned 0x{code:02X}"
            )));
        }
        Ok(data.get_u16())
    }

    async fn capture_image(&mut self) -> Result<CaptureStatus> {
        let code = self.status(Instruction::GenImg, &[]).await?;
        Ok(instruction::capture_status(code))
    }

    async fn extract_features(&mut self, slot: FeatureSlot) -> Result<ExtractStatus> {
        let code = self.status(Instruction::Img2Tz, &[slot.buffer_id()]).await?;
        Ok(instruction::extract_status(code))
    }

    async fn search(&mut self) -> Result<SearchOutcome> {
        let [count_hi, count_lo] = self.capacity().await?.to_be_bytes();
        let args = [FeatureSlot::One.buffer_id(), 0x00, 0x00, count_hi, count_lo];

        let reply = self.command(Instruction::Search, &args).await?;
        let (code, mut data) = reply_data(reply, 4)?;
        if code != confirm::OK {
            return Ok(instruction::search_outcome(code, 0, 0));
        }
        let id = data.get_u16();
        let confidence = data.get_u16();
        Ok(instruction::search_outcome(code, id, confidence))
    }

    async fn create_model(&mut self) -> Result<ModelStatus> {
        let code = self.status(Instruction::RegModel, &[]).await?;
        Ok(instruction::model_status(code))
    }

    async fn store_model(&mut self, id: u16) -> Result<StoreStatus> {
        let [hi, lo] = id.to_be_bytes();
        let args = [FeatureSlot::One.buffer_id(), hi, lo];
        let code = self.status(Instruction::Store, &args).await?;
        Ok(instruction::store_status(code))
    }

    async fn device_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(
            self.name.clone(),
            "R30x optical fingerprint module",
        ))
    }
}
