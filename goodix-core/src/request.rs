//! Request payload encoders, one constructor per catalog command

use bitflags::bitflags;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    catalog::{self, CommandSpec},
    command::Command,
    constants::payloads,
    error::Result,
    pack::MessagePack,
    protocol::MessageProtocol,
    register::{RegisterRead, RegisterWrite},
};

bitflags! {
    /// RESET request flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResetFlags: u8 {
        const RESET_SENSOR = 0x01;
        const SOFT_RESET_MCU = 0x02;
    }
}

/// A command ready to be framed and sent
///
/// # Examples
///
/// ```
/// use goodix_core::Request;
///
/// let request = Request::read_firmware(0, 100);
/// assert_eq!(request.response_len(), Some(100));
///
/// let frame = request.encode().unwrap();
/// assert_eq!(frame[0], 0xa0);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Request {
    command: Command,
    payload: Bytes,
    response_len: Option<usize>,
    skip_response: bool,
}

impl Request {
    /// Create a request with a raw payload
    pub fn new(command: Command, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            payload: payload.into(),
            response_len: None,
            skip_response: false,
        }
    }

    /// Length a [`catalog::Shape::Requested`] response must have
    pub fn with_response_len(mut self, len: usize) -> Self {
        self.response_len = Some(len);
        self
    }

    /// Stop after the ack even if the command normally answers
    pub fn without_response(mut self) -> Self {
        self.skip_response = true;
        self
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn response_len(&self) -> Option<usize> {
        self.response_len
    }

    /// Contract of this request's command
    pub fn spec(&self) -> Result<&'static CommandSpec> {
        catalog::lookup(self.command)
    }

    /// Check if a data response follows the ack
    pub fn expects_response(&self, spec: &CommandSpec) -> bool {
        spec.has_response() && !self.skip_response
    }

    /// Frame the request: message protocol (with the command's checksum
    /// policy) inside a `0xa0` message pack
    pub fn encode(&self) -> Result<BytesMut> {
        let spec = self.spec()?;
        let inner = MessageProtocol::new(self.command, self.payload.clone())?.encode(spec.checksum);

        Ok(MessagePack::wrap(inner.freeze())?.encode())
    }

    pub fn nop() -> Self {
        Self::new(Command::Nop, payloads::NOP)
    }

    pub fn mcu_get_image() -> Self {
        Self::new(Command::McuGetImage, payloads::GET_IMAGE)
    }

    pub fn mcu_switch_to_fdt_down(mode: impl Into<Bytes>) -> Self {
        Self::new(Command::McuSwitchToFdtDown, mode)
    }

    pub fn mcu_switch_to_fdt_up(mode: impl Into<Bytes>) -> Self {
        Self::new(Command::McuSwitchToFdtUp, mode)
    }

    pub fn mcu_switch_to_fdt_mode(mode: impl Into<Bytes>) -> Self {
        Self::new(Command::McuSwitchToFdtMode, mode)
    }

    pub fn nav_0() -> Self {
        Self::new(Command::Nav0, payloads::NAV_0)
    }

    pub fn mcu_switch_to_idle_mode(sleep_time: u8) -> Self {
        Self::new(Command::McuSwitchToIdleMode, vec![sleep_time, 0x00])
    }

    pub fn write_sensor_register(write: &RegisterWrite) -> Self {
        Self::new(Command::WriteSensorRegister, write.encode())
    }

    pub fn read_sensor_register(read: &RegisterRead) -> Self {
        Self::new(Command::ReadSensorRegister, read.encode()).with_response_len(read.response_len())
    }

    pub fn upload_config_mcu(config: impl Into<Bytes>) -> Self {
        Self::new(Command::UploadConfigMcu, config)
    }

    pub fn set_powerdown_scan_frequency(frequency: u16) -> Self {
        Self::new(
            Command::SetPowerdownScanFrequency,
            frequency.to_le_bytes().to_vec(),
        )
    }

    pub fn enable_chip(enable: bool) -> Self {
        Self::new(Command::EnableChip, vec![u8::from(enable), 0x00])
    }

    /// A soft MCU reset never answers beyond the ack
    pub fn reset(flags: ResetFlags, sleep_time: u8) -> Self {
        let request = Self::new(Command::Reset, vec![flags.bits(), sleep_time]);

        if flags.contains(ResetFlags::SOFT_RESET_MCU) {
            request.without_response()
        } else {
            request
        }
    }

    pub fn mcu_erase_app(sleep_time: u8) -> Self {
        Self::new(Command::McuEraseApp, vec![0x00, sleep_time])
    }

    pub fn read_otp() -> Self {
        Self::new(Command::ReadOtp, payloads::EMPTY)
    }

    pub fn firmware_version() -> Self {
        Self::new(Command::FirmwareVersion, payloads::EMPTY)
    }

    pub fn query_mcu_state() -> Self {
        Self::new(Command::QueryMcuState, payloads::QUERY_MCU_STATE)
    }

    pub fn request_tls_connection() -> Self {
        Self::new(Command::RequestTlsConnection, payloads::EMPTY)
    }

    pub fn tls_successfully_established() -> Self {
        Self::new(Command::TlsSuccessfullyEstablished, payloads::EMPTY)
    }

    /// `length` is sent as given, independent of `data`
    pub fn preset_psk_write_r(address: u32, length: u32, data: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(8 + data.len());
        buf.put_u32_le(address);
        buf.put_u32_le(length);
        buf.put_slice(data);

        Self::new(Command::PresetPskWriteR, buf.freeze())
    }

    pub fn preset_psk_read_r(address: u32, length: u32) -> Self {
        Self::new(Command::PresetPskReadR, offset_length(address, length))
    }

    pub fn write_firmware(offset: u32, data: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(8 + data.len());
        buf.put_u32_le(offset);
        buf.put_u32_le(data.len() as u32);
        buf.put_slice(data);

        Self::new(Command::WriteFirmware, buf.freeze())
    }

    pub fn read_firmware(offset: u32, length: u32) -> Self {
        Self::new(Command::ReadFirmware, offset_length(offset, length))
            .with_response_len(length as usize)
    }

    pub fn check_firmware(offset: u32, length: u32, checksum: u32, data: Option<&[u8]>) -> Self {
        let data = data.unwrap_or_default();

        let mut buf = BytesMut::with_capacity(12 + data.len());
        buf.put_u32_le(offset);
        buf.put_u32_le(length);
        buf.put_u32_le(checksum);
        buf.put_slice(data);

        Self::new(Command::CheckFirmware, buf.freeze())
    }
}

fn offset_length(offset: u32, length: u32) -> Bytes {
    let mut buf = BytesMut::with_capacity(8);
    buf.put_u32_le(offset);
    buf.put_u32_le(length);
    buf.freeze()
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("command", &self.command)
            .field("payload", &hex::encode(&self.payload[..self.payload.len().min(32)]))
            .field("payload_len", &self.payload.len())
            .field("response_len", &self.response_len)
            .field("skip_response", &self.skip_response)
            .finish()
    }
}
