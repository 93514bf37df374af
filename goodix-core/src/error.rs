//! Error types for goodix-core

use std::fmt;

use crate::catalog::Shape;
use crate::command::Command;

/// Result type alias for goodix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Frame layer a codec failure was detected in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Outer transport frame
    MessagePack,
    /// Inner command frame
    MessageProtocol,
    /// Ack record nested in a message protocol frame
    Ack,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MessagePack => "message pack",
            Self::MessageProtocol => "message protocol",
            Self::Ack => "ack",
        };
        f.write_str(name)
    }
}

/// Why a frame failed its integrity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameFault {
    #[error("expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("checksum 0x{received:02X} does not match computed 0x{expected:02X}")]
    Checksum { expected: u8, received: u8 },

    #[error("trailer 0x{received:02X}, expected sentinel 0x{expected:02X}")]
    Trailer { expected: u8, received: u8 },

    #[error("declared length {declared} leaves no room for the trailer in {available} bytes")]
    MissingTrailer { declared: usize, available: usize },

    #[error("validity bit not set in flags 0x{flags:02X}")]
    NotValid { flags: u8 },
}

/// Why a well-formed frame was not the one expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Mismatch {
    #[error("flags 0x{actual:02X}, expected 0x{expected:02X}")]
    Flags { expected: u8, actual: u8 },

    #[error("command 0x{actual:02X}, expected 0x{expected:02X}")]
    Command { expected: u8, actual: u8 },

    #[error("declared {declared} bytes but only {actual} captured")]
    Incomplete { declared: usize, actual: usize },
}

/// Why a response payload was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeFault {
    #[error("length {actual}, expected {expected}")]
    Length { expected: Shape, actual: usize },

    #[error("status byte 0x{actual:02X}, expected 0x{expected:02X}")]
    Sentinel { expected: u8, actual: u8 },

    #[error("address echo 0x{actual:08X}, expected 0x{expected:08X}")]
    AddressEcho { expected: u32, actual: u32 },

    #[error("declared {declared} bytes of key material, {available} available")]
    KeyLength { declared: usize, available: usize },

    #[error("not valid text: {0}")]
    Text(String),
}

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Checksum, trailer or ack validity failure
    #[error("Malformed {layer} frame: {fault}")]
    MalformedFrame { layer: Layer, fault: FrameFault },

    /// Frame addressed to another command or carrying unexpected flags
    #[error("Unexpected {layer} frame: {mismatch}")]
    UnexpectedFrame { layer: Layer, mismatch: Mismatch },

    /// Response payload has the wrong length or status byte
    #[error("Invalid response to {command}: {fault}")]
    ResponseShape { command: Command, fault: ShapeFault },

    /// Command identifier with bit 0 set
    #[error("Invalid command identifier: 0x{0:02X}")]
    InvalidCommand(u8),

    /// Command identifier outside the catalog
    #[error("Unknown command code: 0x{0:02X}")]
    UnknownCommand(u8),

    /// Payload does not fit the 16-bit length field
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { size: usize, max: usize },

    /// Image block not made of whole 6-byte chunks
    #[error("Image data length {0} is not a multiple of 6")]
    InvalidImageLength(usize),

    /// Exchange driven through an illegal transition
    #[error("Invalid exchange state: {0}")]
    InvalidExchangeState(String),
}

impl Error {
    pub(crate) fn malformed(layer: Layer, fault: FrameFault) -> Self {
        Self::MalformedFrame { layer, fault }
    }

    pub(crate) fn unexpected(layer: Layer, mismatch: Mismatch) -> Self {
        Self::UnexpectedFrame { layer, mismatch }
    }

    pub(crate) fn shape(command: Command, fault: ShapeFault) -> Self {
        Self::ResponseShape { command, fault }
    }

    /// Check if the frame failed its integrity check
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedFrame { .. })
    }

    /// Check if the frame was valid but not the expected one
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::UnexpectedFrame { .. })
    }

    /// Check if the response payload was rejected
    pub fn is_response_shape(&self) -> bool {
        matches!(self, Self::ResponseShape { .. })
    }
}
