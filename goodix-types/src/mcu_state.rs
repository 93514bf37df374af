//! MCU state record returned by QUERY_MCU_STATE

use std::fmt;

use bitflags::bitflags;

use crate::error::{Error, Result};

bitflags! {
    /// Status byte of the MCU state record
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct McuStatus: u8 {
        const IMAGE_VALID = 0x01;
        const TLS_CONNECTED = 0x02;
        const LOCKED = 0x04;
    }
}

/// Decoded MCU state
///
/// ```text
/// ┌─────────┬────────┬──────────┬─────┬────────────┬──────────────┬────────┬──────────┐
/// │ 0       │ 1      │ 2        │ 3-8 │ 9          │ 10-11        │ 12     │ 13       │
/// │ version │ status │ captured │     │ ec falling │ wake→POV u16 │ source │ one key  │
/// └─────────┴────────┴──────────┴─────┴────────────┴──────────────┴────────┴──────────┘
/// ```
///
/// The captured count lives in the high nibble of byte 2. The device sends
/// 16 bytes, only the first 14 are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct McuState {
    pub version: u8,
    pub status: McuStatus,
    pub captured: u8,
    pub ec_falling_count: u8,
    /// Milliseconds
    pub wake_up_to_pov_time: u16,
    pub wake_up_source: u8,
    pub one_key_procedure: u8,
}

impl McuState {
    /// Bytes needed to decode a record
    pub const MIN_SIZE: usize = 14;

    pub fn is_image_valid(&self) -> bool {
        self.status.contains(McuStatus::IMAGE_VALID)
    }

    pub fn is_tls_connected(&self) -> bool {
        self.status.contains(McuStatus::TLS_CONNECTED)
    }

    pub fn is_locked(&self) -> bool {
        self.status.contains(McuStatus::LOCKED)
    }
}

impl TryFrom<&[u8]> for McuState {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE {
            return Err(Error::TooShort {
                record: "MCU state",
                min: Self::MIN_SIZE,
                actual: data.len(),
            });
        }

        Ok(Self {
            version: data[0],
            status: McuStatus::from_bits_truncate(data[1]),
            captured: data[2] >> 4,
            ec_falling_count: data[9],
            wake_up_to_pov_time: u16::from_le_bytes([data[10], data[11]]),
            wake_up_source: data[12],
            one_key_procedure: data[13],
        })
    }
}

impl fmt::Display for McuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MCU[v{}, image valid: {}, TLS: {}, locked: {}, captured: {}]",
            self.version,
            self.is_image_valid(),
            self.is_tls_connected(),
            self.is_locked(),
            self.captured
        )
    }
}
