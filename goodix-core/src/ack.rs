//! Ack record nested in a message protocol frame addressed to [`Command::Ack`]

use bitflags::bitflags;

use crate::{
    command::Command,
    error::{Error, FrameFault, Layer, Mismatch, Result},
};

bitflags! {
    /// Ack flags byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AckFlags: u8 {
        /// Set on every valid ack
        const VALID = 0x01;
        /// MCU runs without a configuration loaded
        const NO_CONFIG = 0x02;
    }
}

/// Decoded ack record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Identifier of the acknowledged command
    pub command: u8,

    /// Ack flags
    pub flags: AckFlags,
}

impl Ack {
    /// Record size in bytes
    pub const SIZE: usize = 2;

    /// Build a valid ack for `command`
    pub fn new(command: Command, has_no_config: bool) -> Self {
        let mut flags = AckFlags::VALID;
        flags.set(AckFlags::NO_CONFIG, has_no_config);

        Self {
            command: command.id(),
            flags,
        }
    }

    /// Encode to the two-byte record
    pub fn encode(&self) -> [u8; Self::SIZE] {
        [self.command, self.flags.bits()]
    }

    /// Decode an ack record
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedFrame`] if the record is short or the
    /// validity bit is clear.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::SIZE {
            return Err(Error::malformed(
                Layer::Ack,
                FrameFault::TooShort {
                    expected: Self::SIZE,
                    actual: payload.len(),
                },
            ));
        }

        let flags = AckFlags::from_bits_retain(payload[1]);
        if !flags.contains(AckFlags::VALID) {
            return Err(Error::malformed(
                Layer::Ack,
                FrameFault::NotValid { flags: payload[1] },
            ));
        }

        Ok(Self {
            command: payload[0],
            flags,
        })
    }

    /// Decode an ack and make sure it acknowledges `command`
    ///
    /// Returns whether the MCU reported it has no configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedFrame`] if another command was acknowledged.
    pub fn check(payload: &[u8], command: Command) -> Result<bool> {
        let ack = Self::decode(payload)?;

        if ack.command != command.id() {
            return Err(Error::unexpected(
                Layer::Ack,
                Mismatch::Command {
                    expected: command.id(),
                    actual: ack.command,
                },
            ));
        }

        Ok(ack.has_no_config())
    }

    /// MCU reported it has no configuration loaded
    pub fn has_no_config(&self) -> bool {
        self.flags.contains(AckFlags::NO_CONFIG)
    }
}
