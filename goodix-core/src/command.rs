//! Goodix MCU command identifiers
//!
//! A command identifier is one byte split into two sub-fields:
//!
//! ```text
//! ┌───────────┬───────────┬───────┐
//! │   cmd0    │   cmd1    │   0   │
//! │ bits 7..4 │ bits 3..1 │ bit 0 │
//! └───────────┴───────────┴───────┘
//! ```
//!
//! Bit 0 is always clear. The identifier also matches acks and responses to
//! the request that produced them.

use std::fmt;

use crate::error::{Error, Result};

/// Encode a command identifier from its two sub-fields
///
/// `cmd0` is masked to 4 bits and `cmd1` to 3 bits.
///
/// # Examples
///
/// ```
/// use goodix_core::command::encode_command;
///
/// assert_eq!(encode_command(0xa, 0x3), 0xa6);
/// ```
pub fn encode_command(cmd0: u8, cmd1: u8) -> u8 {
    ((cmd0 & 0xf) << 4) | ((cmd1 & 0x7) << 1)
}

/// Decode a command identifier into `(cmd0, cmd1)`
///
/// # Errors
///
/// Returns [`Error::InvalidCommand`] if bit 0 is set.
pub fn decode_command(command: u8) -> Result<(u8, u8)> {
    if command & 0x1 != 0 {
        return Err(Error::InvalidCommand(command));
    }

    Ok((command >> 4 & 0xf, command >> 1 & 0x7))
}

/// Protocol command codes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Nop = 0x00,

    // Capture
    McuGetImage = 0x20,
    McuSwitchToFdtDown = 0x32,
    McuSwitchToFdtUp = 0x34,
    McuSwitchToFdtMode = 0x36,
    Nav0 = 0x50,
    McuSwitchToIdleMode = 0x70,

    // Sensor and MCU configuration
    WriteSensorRegister = 0x80,
    ReadSensorRegister = 0x82,
    UploadConfigMcu = 0x90,
    SetPowerdownScanFrequency = 0x94,
    EnableChip = 0x96,
    Reset = 0xa2,
    McuEraseApp = 0xa4,
    ReadOtp = 0xa6,
    FirmwareVersion = 0xa8,
    QueryMcuState = 0xae,

    // Ack (from device)
    Ack = 0xb0,

    // TLS bootstrap
    RequestTlsConnection = 0xd0,
    TlsSuccessfullyEstablished = 0xd4,
    PresetPskWriteR = 0xe0,
    PresetPskReadR = 0xe4,

    // Firmware
    WriteFirmware = 0xf0,
    ReadFirmware = 0xf2,
    CheckFirmware = 0xf4,
}

impl Command {
    /// Every known command, in identifier order
    pub const ALL: [Command; 25] = [
        Self::Nop,
        Self::McuGetImage,
        Self::McuSwitchToFdtDown,
        Self::McuSwitchToFdtUp,
        Self::McuSwitchToFdtMode,
        Self::Nav0,
        Self::McuSwitchToIdleMode,
        Self::WriteSensorRegister,
        Self::ReadSensorRegister,
        Self::UploadConfigMcu,
        Self::SetPowerdownScanFrequency,
        Self::EnableChip,
        Self::Reset,
        Self::McuEraseApp,
        Self::ReadOtp,
        Self::FirmwareVersion,
        Self::QueryMcuState,
        Self::Ack,
        Self::RequestTlsConnection,
        Self::TlsSuccessfullyEstablished,
        Self::PresetPskWriteR,
        Self::PresetPskReadR,
        Self::WriteFirmware,
        Self::ReadFirmware,
        Self::CheckFirmware,
    ];

    /// Raw identifier
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Split the identifier into `(cmd0, cmd1)`
    pub fn parts(self) -> (u8, u8) {
        (self.id() >> 4, self.id() >> 1 & 0x7)
    }

    /// Check if this command is sent by the device rather than the host
    pub fn is_response(self) -> bool {
        matches!(self, Self::Ack)
    }

    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::McuGetImage => "MCU_GET_IMAGE",
            Self::McuSwitchToFdtDown => "MCU_SWITCH_TO_FDT_DOWN",
            Self::McuSwitchToFdtUp => "MCU_SWITCH_TO_FDT_UP",
            Self::McuSwitchToFdtMode => "MCU_SWITCH_TO_FDT_MODE",
            Self::Nav0 => "NAV_0",
            Self::McuSwitchToIdleMode => "MCU_SWITCH_TO_IDLE_MODE",
            Self::WriteSensorRegister => "WRITE_SENSOR_REGISTER",
            Self::ReadSensorRegister => "READ_SENSOR_REGISTER",
            Self::UploadConfigMcu => "UPLOAD_CONFIG_MCU",
            Self::SetPowerdownScanFrequency => "SET_POWERDOWN_SCAN_FREQUENCY",
            Self::EnableChip => "ENABLE_CHIP",
            Self::Reset => "RESET",
            Self::McuEraseApp => "MCU_ERASE_APP",
            Self::ReadOtp => "READ_OTP",
            Self::FirmwareVersion => "FIRMWARE_VERSION",
            Self::QueryMcuState => "QUERY_MCU_STATE",
            Self::Ack => "ACK",
            Self::RequestTlsConnection => "REQUEST_TLS_CONNECTION",
            Self::TlsSuccessfullyEstablished => "TLS_SUCCESSFULLY_ESTABLISHED",
            Self::PresetPskWriteR => "PRESET_PSK_WRITE_R",
            Self::PresetPskReadR => "PRESET_PSK_READ_R",
            Self::WriteFirmware => "WRITE_FIRMWARE",
            Self::ReadFirmware => "READ_FIRMWARE",
            Self::CheckFirmware => "CHECK_FIRMWARE",
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        decode_command(value)?;

        Self::ALL
            .iter()
            .copied()
            .find(|cmd| cmd.id() == value)
            .ok_or(Error::UnknownCommand(value))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02x})", self.name(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_command_conversion() {
        assert_eq!(u8::from(Command::ReadOtp), 0xa6);
        assert_eq!(Command::try_from(0xa6).unwrap(), Command::ReadOtp);
    }

    #[test]
    fn test_all_commands_round_trip() {
        for cmd in Command::ALL {
            assert_eq!(Command::try_from(cmd.id()).unwrap(), cmd);

            let (cmd0, cmd1) = cmd.parts();
            assert_eq!(encode_command(cmd0, cmd1), cmd.id());
        }
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            Command::try_from(0x12),
            Err(Error::UnknownCommand(0x12))
        ));
    }

    #[test]
    fn test_odd_command_rejected() {
        assert!(matches!(decode_command(0xa7), Err(Error::InvalidCommand(0xa7))));
        assert!(matches!(
            Command::try_from(0x01),
            Err(Error::InvalidCommand(0x01))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::QueryMcuState.to_string(), "QUERY_MCU_STATE(0xae)");
    }

    proptest! {
        #[test]
        fn prop_command_parts_round_trip(cmd0 in 0u8..=15, cmd1 in 0u8..=7) {
            let id = encode_command(cmd0, cmd1);
            prop_assert_eq!(decode_command(id).unwrap(), (cmd0, cmd1));
        }

        #[test]
        fn prop_odd_identifiers_rejected(id in any::<u8>().prop_map(|v| v | 0x1)) {
            prop_assert!(decode_command(id).is_err());
        }
    }
}
