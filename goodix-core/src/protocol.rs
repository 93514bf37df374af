//! Message protocol: the inner command frame

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    command::Command,
    constants::NO_CHECKSUM_TRAILER,
    error::{Error, FrameFault, Layer, Mismatch, Result},
};

/// Inner command frame
///
/// # Frame Structure
///
/// ```text
/// ┌─────────┬─────────────┬──────────────┬─────────┐
/// │ Command │   Length    │     Data     │ Trailer │
/// │ 1 byte  │   2 bytes   │ Length-1 b.  │ 1 byte  │
/// │  (u8)   │  (LE u16)   │   (bytes)    │  (u8)   │
/// └─────────┴─────────────┴──────────────┴─────────┘
/// ```
///
/// The on-wire length counts the data plus the trailer. The trailer is either
/// a checksum (`0xaa - sum(command, length, data)`) or the sentinel `0x88`;
/// which rule applies is a per-command property the caller supplies.
///
/// # Examples
///
/// ```
/// use goodix_core::{Command, MessageProtocol};
///
/// let frame = MessageProtocol::new(Command::ReadOtp, vec![0x00, 0x00]).unwrap();
/// assert_eq!(frame.encode(true).as_ref(), &[0xa6, 0x03, 0x00, 0x00, 0x00, 0x01]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct MessageProtocol {
    /// Raw command identifier
    pub command: u8,

    /// Declared data length (trailer excluded)
    pub length: u16,

    /// Frame data
    pub payload: Bytes,
}

impl MessageProtocol {
    /// Command byte plus length field
    pub const HEADER_SIZE: usize = 3;

    /// Trailer byte
    pub const TRAILER_SIZE: usize = 1;

    /// Maximum data size (the length field also counts the trailer)
    pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize - Self::TRAILER_SIZE;

    /// Create a frame declaring the payload's own length
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload plus trailer does
    /// not fit the 16-bit length field.
    pub fn new(command: impl Into<u8>, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > Self::MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: Self::MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            command: command.into(),
            length: payload.len() as u16,
            payload,
        })
    }

    /// Override the declared data length
    pub fn with_length(mut self, length: u16) -> Self {
        self.length = length;
        self
    }

    fn wire_length(&self) -> u16 {
        self.length.wrapping_add(1)
    }

    /// Trailer byte for this frame
    pub fn trailer(&self, use_checksum: bool) -> u8 {
        checksum::message_protocol(self.command, self.wire_length(), &self.payload, use_checksum)
    }

    /// Encode frame to bytes
    pub fn encode(&self, use_checksum: bool) -> BytesMut {
        let mut buf = BytesMut::with_capacity(
            Self::HEADER_SIZE + self.payload.len() + Self::TRAILER_SIZE,
        );

        buf.put_u8(self.command);
        buf.put_u16_le(self.wire_length());
        buf.put_slice(&self.payload);
        buf.put_u8(self.trailer(use_checksum));

        buf
    }

    /// Decode a frame from bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedFrame`] if the buffer cannot hold the
    /// declared frame or the trailer does not follow the expected rule.
    pub fn decode(buf: Bytes, use_checksum: bool) -> Result<Self> {
        let minimum = Self::HEADER_SIZE + Self::TRAILER_SIZE;
        if buf.len() < minimum {
            return Err(Error::malformed(
                Layer::MessageProtocol,
                FrameFault::TooShort {
                    expected: minimum,
                    actual: buf.len(),
                },
            ));
        }

        let command = buf[0];
        let wire_length = u16::from_le_bytes([buf[1], buf[2]]) as usize;

        let trailer_index = Self::HEADER_SIZE + wire_length - Self::TRAILER_SIZE;
        if wire_length == 0 || trailer_index >= buf.len() {
            return Err(Error::malformed(
                Layer::MessageProtocol,
                FrameFault::MissingTrailer {
                    declared: wire_length,
                    available: buf.len() - Self::HEADER_SIZE,
                },
            ));
        }

        let payload = buf.slice(Self::HEADER_SIZE..trailer_index);
        let received = buf[trailer_index];

        let expected =
            checksum::message_protocol(command, wire_length as u16, &payload, use_checksum);
        if expected != received {
            let fault = if use_checksum {
                FrameFault::Checksum { expected, received }
            } else {
                FrameFault::Trailer {
                    expected: NO_CHECKSUM_TRAILER,
                    received,
                }
            };
            return Err(Error::malformed(Layer::MessageProtocol, fault));
        }

        Ok(Self {
            command,
            length: (wire_length - Self::TRAILER_SIZE) as u16,
            payload,
        })
    }

    /// Decode a frame and make sure it is addressed to `command`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedFrame`] on a command mismatch. A declared
    /// length past the end of `buf` already fails in [`decode`](Self::decode)
    /// as [`Error::MalformedFrame`], since the trailer cannot be located.
    pub fn check(buf: Bytes, command: Command, use_checksum: bool) -> Result<Bytes> {
        let frame = Self::decode(buf, use_checksum)?;

        if frame.command != command.id() {
            return Err(Error::unexpected(
                Layer::MessageProtocol,
                Mismatch::Command {
                    expected: command.id(),
                    actual: frame.command,
                },
            ));
        }

        Ok(frame.payload)
    }

    /// Known command, if the identifier is in the catalog
    pub fn known_command(&self) -> Option<Command> {
        Command::try_from(self.command).ok()
    }

    /// Get total frame size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len() + Self::TRAILER_SIZE
    }
}

impl fmt::Debug for MessageProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageProtocol")
            .field("command", &format!("0x{:02X}", self.command))
            .field("length", &self.length)
            .field("payload", &hex::encode(&self.payload[..self.payload.len().min(32)]))
            .finish()
    }
}

impl fmt::Display for MessageProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.known_command() {
            Some(command) => write!(f, "MessageProtocol[{}](len={})", command, self.length),
            None => write!(
                f,
                "MessageProtocol[0x{:02x}](len={})",
                self.command, self.length
            ),
        }
    }
}
